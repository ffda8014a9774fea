//! End-to-end extraction over a small experiment on disk

use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageBuffer, Luma};
use ndarray::Array5;

use codexkit::compression::CompressionFactory;
use codexkit::tiff::{read_hyperstack, write_hyperstack};
use codexkit::utils::logger::Logger;
use codexkit::{CodexError, CodexKit};

const EXPERIMENT: &str = r#"
[experiment]
name = "integration"
n_regions = 1
region_width = 2
region_height = 1
tiling_mode = "grid"
n_z_planes = 3
tile_width = 8
tile_height = 6
tile_overlap_x = 2
tile_overlap_y = 2

[channels]
n_channels_per_cycle = 2
names = ["DAPI", "CD4", "DAPI2", "CD8"]

[paths]
raw = "raw/Cyc{cycle}_reg{region}/{region}_{tile:05}_Z{z:03}_CH{channel}.png"
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Lay out a data directory with raw planes, processed stacks and a
/// best-focus table for a 2x1 tile region
fn create_experiment(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("codexkit-it-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("experiment.toml"), EXPERIMENT).unwrap();

    for tile in 0..2u16 {
        for cycle in 0..2u16 {
            for z in 0..3u16 {
                for channel in 0..2u16 {
                    let base = tile * 20000 + cycle * 5000 + z * 1000 + channel * 100;
                    let plane: ImageBuffer<Luma<u16>, Vec<u16>> =
                        ImageBuffer::from_fn(8, 6, |x, y| Luma([base + (y * 8 + x) as u16]));
                    let path = dir.join(format!(
                        "raw/Cyc{}_reg1/1_{:05}_Z{:03}_CH{}.png",
                        cycle + 1, tile + 1, z + 1, channel + 1
                    ));
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    plane.save(&path).unwrap();
                }
            }
        }
    }

    let logger = Logger::null();
    let handler = CompressionFactory::get_handler_by_name("deflate").unwrap();
    for tile in 0..2usize {
        let stack = Array5::from_shape_fn((2, 3, 2, 4, 6), |(t, z, c, y, _)| {
            (30000 + tile * 10000 + t * 1000 + z * 100 + c * 10 + y) as u16
        });
        let path = dir.join(format!("processor/tile/R001_X{:03}_Y001.tif", tile + 1));
        write_hyperstack(&path, &stack, handler.as_ref(), &logger).unwrap();
    }

    fs::write(
        dir.join("processor/best_focus.csv"),
        "region_index,tile_x,tile_y,best_z\n0,0,0,2\n0,1,0,0\n"
    ).unwrap();

    dir
}

fn kit(dir: &Path) -> CodexKit {
    let log_file = dir.join("codexkit.log");
    CodexKit::new(dir, Some(log_file.to_str().unwrap())).unwrap()
}

#[test]
fn test_extract_best_focus_raw_and_processed() {
    init_logging();
    let dir = create_experiment("best");

    let summary = kit(&dir)
        .extract("cd8_best", &["raw_CD8", "proc_DAPI"], "best", None, None, "none")
        .unwrap();
    assert_eq!(summary.tiles_written, 2);
    assert_eq!(summary.output_dir, dir.join("output/extract/cd8_best"));

    let first = read_hyperstack(&summary.output_dir.join("R001_X001_Y001.tif")).unwrap();
    assert_eq!(first.shape(), &[1, 1, 2, 4, 6]);
    // Raw CD8 is cycle 2, channel 2; the crop starts at pixel (1, 1)
    assert_eq!(first[[0, 0, 0, 0, 0]], 5000 + 2000 + 100 + 9);
    assert_eq!(first[[0, 0, 0, 3, 5]], 5000 + 2000 + 100 + 4 * 8 + 6);
    assert_eq!(first[[0, 0, 1, 2, 0]], 30000 + 200 + 2);

    let second = read_hyperstack(&summary.output_dir.join("R001_X002_Y001.tif")).unwrap();
    assert_eq!(second[[0, 0, 0, 0, 0]], 20000 + 5000 + 100 + 9);
    assert_eq!(second[[0, 0, 1, 0, 0]], 40000);

    let log = fs::read_to_string(dir.join("codexkit.log")).unwrap();
    assert!(log.contains("cd8_best"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_extract_all_planes_of_one_tile() {
    init_logging();
    let dir = create_experiment("all");

    let summary = kit(&dir)
        .extract("dapi_stack", &["raw_DAPI"], "all", Some("1"), Some("[2]"), "zstd")
        .unwrap();
    assert_eq!(summary.tiles_written, 1);

    let path = summary.output_dir.join("R001_X002_Y001.tif");
    let tile = read_hyperstack(&path).unwrap();
    assert_eq!(tile.shape(), &[1, 3, 1, 4, 6]);
    for z in 0..3 {
        assert_eq!(tile[[0, z, 0, 0, 0]], (20000 + z * 1000 + 9) as u16);
    }
    assert!(!summary.output_dir.join("R001_X001_Y001.tif").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_invalid_channel_writes_nothing() {
    init_logging();
    let dir = create_experiment("invalid");

    let result = kit(&dir).extract("bad", &["raw_DAPI", "DAPI"], "best", None, None, "none");
    match result {
        Err(CodexError::InvalidChannelPrefix { channel, .. }) => assert_eq!(channel, "DAPI"),
        other => panic!("expected an invalid prefix error, got {:?}", other),
    }
    assert!(!dir.join("output").exists());

    let result = kit(&dir).extract("bad", &["cyto_cell_mask"], "", None, None, "none");
    assert!(matches!(result, Err(CodexError::InvalidZSelector(_))));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_missing_config_is_reported() {
    init_logging();
    let dir = create_experiment("config");

    let kit = kit(&dir).with_config(&dir.join("missing.toml"));
    assert_eq!(kit.data_dir(), dir.as_path());
    let result = kit.extract("x", &["raw_DAPI"], "all", None, None, "none");
    assert!(matches!(result, Err(CodexError::ConfigError(_))));

    let config = kit.with_config(&dir.join("experiment.toml")).config().unwrap();
    assert_eq!(config.n_cycles(), 2);
    assert_eq!(config.n_tiles_per_region(), 2);

    let _ = fs::remove_dir_all(&dir);
}
