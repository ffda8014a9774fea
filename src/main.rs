use clap::{Arg, Command as ClapCommand, ArgAction};
use std::process;
use log::{error, LevelFilter};

use codexkit::utils::logger::Logger;
use codexkit::commands::{CommandFactory, CodexCommandFactory};

fn build_cli() -> ClapCommand {
    ClapCommand::new("codexkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extract channels and z planes from CODEX microscopy experiments")
        .arg(
            Arg::new("data-dir")
                .short('d')
                .long("data-dir")
                .help("Experiment data directory (defaults to $CODEX_DATA_DIR, then the current directory)")
                .value_name("DIR")
                .global(true)
                .required(false),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Experiment configuration file (defaults to DIR/experiment.toml)")
                .value_name("FILE")
                .global(true)
                .required(false),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("File receiving the log output")
                .value_name("FILE")
                .default_value("codexkit.log")
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            ClapCommand::new("extract")
                .about("Extract channels of selected tiles into one hyperstack per tile")
                .arg(
                    Arg::new("name")
                        .help("Name of the extraction, used as the output directory name")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("channels")
                        .long("channels")
                        .help("Channels to extract, prefixed with raw_, proc_ or cyto_ (e.g. raw_DAPI,cyto_cell_mask)")
                        .value_name("CHANNELS")
                        .num_args(1..)
                        .value_delimiter(',')
                        .required(true),
                )
                .arg(
                    Arg::new("z")
                        .long("z")
                        .help("Z planes: best, all or a 1-based index expression such as 3, (1, 5) or [2, 4]")
                        .value_name("Z")
                        .default_value("best"),
                )
                .arg(
                    Arg::new("region-indexes")
                        .long("region-indexes")
                        .help("1-based region index expression; all regions when omitted")
                        .value_name("EXPR")
                        .required(false),
                )
                .arg(
                    Arg::new("tile-indexes")
                        .long("tile-indexes")
                        .help("1-based tile index expression; all tiles when omitted")
                        .value_name("EXPR")
                        .required(false),
                )
                .arg(
                    Arg::new("compression")
                        .long("compression")
                        .help("Compression of the written stacks")
                        .value_name("METHOD")
                        .value_parser(["none", "deflate", "zstd"])
                        .default_value("none"),
                ),
        )
        .subcommand_required(true)
}

fn main() {
    let matches = build_cli().get_matches();

    let log_file = matches.get_one::<String>("log-file")
        .cloned()
        .unwrap_or_else(|| "codexkit.log".to_string());
    let level = if matches.get_flag("verbose") { LevelFilter::Debug } else { LevelFilter::Info };

    if let Err(e) = Logger::init_global_logger(&log_file, level) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    // Operation summaries go to their own file next to the log
    let summary_file = format!("{}.summary", log_file);
    let logger = match Logger::new(&summary_file) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    let factory = CodexCommandFactory::new();

    let command_result = factory.create_command(&matches, &logger);
    match command_result {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
