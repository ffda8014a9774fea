//! File name templates
//!
//! Templates hold `{name}` or `{name:WIDTH}` placeholders that are replaced
//! by 1-based numbers, zero-padded to WIDTH digits when given. Known names
//! are `cycle`, `region`, `tile`, `z`, `channel`, `x` and `y`.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::errors::{CodexError, CodexResult};
use crate::extract::channels::ChannelSource;
use crate::extract::locations::TileLocation;

/// Processed tile stacks, relative to the data directory
pub const PROCESSED_TILE_TEMPLATE: &str = "processor/tile/R{region:03}_X{x:03}_Y{y:03}.tif";

/// Cytometric tile stacks, relative to the data directory
pub const CYTOMETRY_TILE_TEMPLATE: &str = "cytometry/tile/R{region:03}_X{x:03}_Y{y:03}.tif";

/// Best focal plane table, relative to the data directory
pub const BEST_FOCUS_FILE: &str = "processor/best_focus.csv";

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{(\w+)(?::(\d+))?\}").unwrap();
}

/// Placeholder values for one tile, optionally one plane
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: HashMap<&'static str, usize>,
}

impl TemplateValues {
    /// Values of a tile location, converted to 1-based
    pub fn for_tile(location: &TileLocation) -> Self {
        let mut values = HashMap::new();
        values.insert("region", location.region_index + 1);
        values.insert("tile", location.tile_index + 1);
        values.insert("x", location.tile_x + 1);
        values.insert("y", location.tile_y + 1);
        TemplateValues { values }
    }

    /// Add the 0-based cycle, z and channel of a raw plane, converted to 1-based
    pub fn with_plane(mut self, cycle: usize, z: usize, channel: usize) -> Self {
        self.values.insert("cycle", cycle + 1);
        self.values.insert("z", z + 1);
        self.values.insert("channel", channel + 1);
        self
    }
}

/// Fill a template
///
/// # Arguments
/// * `template` - Template text
/// * `values` - Placeholder values
///
/// # Returns
/// The rendered path, or a `ConfigError` naming an unknown placeholder
pub fn render(template: &str, values: &TemplateValues) -> CodexResult<String> {
    let mut unknown = None;
    let rendered = PLACEHOLDER.replace_all(template, |caps: &Captures| {
        let name = &caps[1];
        let width = caps.get(2).and_then(|w| w.as_str().parse::<usize>().ok()).unwrap_or(0);
        match values.values.get(name) {
            Some(value) => format!("{:0width$}", value, width = width),
            None => {
                unknown.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });

    match unknown {
        Some(name) => Err(CodexError::ConfigError(format!(
            "unknown placeholder {{{}}} in path template \"{}\"", name, template
        ))),
        None => Ok(rendered.into_owned()),
    }
}

/// Template of the stored stack for a derived source
pub fn stack_template(source: ChannelSource) -> CodexResult<&'static str> {
    match source {
        ChannelSource::Proc => Ok(PROCESSED_TILE_TEMPLATE),
        ChannelSource::Cyto => Ok(CYTOMETRY_TILE_TEMPLATE),
        ChannelSource::Raw => Err(CodexError::ConfigError(
            "raw tiles are assembled from planes, not read from a stack".to_string()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location() -> TileLocation {
        TileLocation { region_index: 0, tile_index: 6, tile_x: 1, tile_y: 1 }
    }

    #[test]
    fn test_render_raw_plane() {
        let values = TemplateValues::for_tile(&location()).with_plane(2, 0, 3);
        let path = render(crate::config::DEFAULT_RAW_TEMPLATE, &values).unwrap();
        assert_eq!(path, "Cyc3_reg1/1_00007_Z001_CH4.tif");
    }

    #[test]
    fn test_render_stacks() {
        let values = TemplateValues::for_tile(&location());
        assert_eq!(render(stack_template(ChannelSource::Proc).unwrap(), &values).unwrap(),
                   "processor/tile/R001_X002_Y002.tif");
        assert_eq!(render(stack_template(ChannelSource::Cyto).unwrap(), &values).unwrap(),
                   "cytometry/tile/R001_X002_Y002.tif");
        assert!(stack_template(ChannelSource::Raw).is_err());
    }

    #[test]
    fn test_unknown_placeholder() {
        let values = TemplateValues::for_tile(&location());
        assert!(matches!(render("{cycle}/{region}.tif", &values), Err(CodexError::ConfigError(_))));
        assert_eq!(render("no placeholders", &values).unwrap(), "no placeholders");
    }
}
