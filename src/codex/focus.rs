//! Best focal plane table
//!
//! The focus step of the processing pipeline records the sharpest z plane of
//! every tile in a CSV file with the header
//! `region_index,tile_x,tile_y,best_z`, all values 0-based.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::errors::{CodexError, CodexResult};
use crate::extract::zslice::{FocusMapSource, TileKey};

const HEADER: [&str; 4] = ["region_index", "tile_x", "tile_y", "best_z"];

/// Best-focus table stored on disk
#[derive(Debug, Clone)]
pub struct BestFocusFile {
    path: PathBuf,
}

impl BestFocusFile {
    pub fn new(path: &Path) -> Self {
        BestFocusFile { path: path.to_path_buf() }
    }
}

impl FocusMapSource for BestFocusFile {
    fn load_focus_map(&self) -> CodexResult<HashMap<TileKey, usize>> {
        info!("Loading best focus planes from {}", self.path.display());
        let content = fs::read_to_string(&self.path).map_err(|e| {
            CodexError::ConfigError(format!("Cannot read best focus table {}: {}", self.path.display(), e))
        })?;
        parse_focus_table(&content)
    }
}

/// Parse the CSV text of a best-focus table
///
/// Columns are located by header name so extra columns are tolerated.
/// Blank lines are skipped. A tile listed twice keeps its last entry.
pub fn parse_focus_table(content: &str) -> CodexResult<HashMap<TileKey, usize>> {
    let mut lines = content.lines().enumerate().filter(|(_, line)| !line.trim().is_empty());

    let (_, header_line) = lines.next()
        .ok_or_else(|| CodexError::ConfigError("best focus table is empty".to_string()))?;
    let header: Vec<&str> = header_line.split(',').map(str::trim).collect();

    let mut columns = [0usize; 4];
    for (column, name) in columns.iter_mut().zip(HEADER) {
        *column = header.iter().position(|h| *h == name).ok_or_else(|| {
            CodexError::ConfigError(format!("best focus table has no \"{}\" column (header = {:?})", name, header))
        })?;
    }

    let mut focus_map = HashMap::new();
    for (line_index, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        let mut row = [0usize; 4];
        for (value, &column) in row.iter_mut().zip(&columns) {
            let field = fields.get(column).ok_or_else(|| {
                CodexError::ConfigError(format!("best focus table line {}: too few fields", line_index + 1))
            })?;
            *value = field.parse::<usize>().map_err(|e| {
                CodexError::ConfigError(format!(
                    "best focus table line {}: \"{}\" is not a non-negative integer ({})",
                    line_index + 1, field, e
                ))
            })?;
        }

        focus_map.insert((row[0], row[1], row[2]), row[3]);
    }

    debug!("Best focus table holds {} tiles", focus_map.len());
    Ok(focus_map)
}
