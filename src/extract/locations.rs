//! Tile location selection

use std::fmt;

/// A tile of a region, all coordinates 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileLocation {
    pub region_index: usize,
    /// Position of the tile in acquisition order within its region
    pub tile_index: usize,
    pub tile_x: usize,
    pub tile_y: usize,
}

impl TileLocation {
    /// Output file name, 1-based: `R001_X002_Y003.tif`
    pub fn file_name(&self) -> String {
        format!("R{:03}_X{:03}_Y{:03}.tif", self.region_index + 1, self.tile_x + 1, self.tile_y + 1)
    }
}

impl fmt::Display for TileLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "region {} tile {} (x {}, y {})",
               self.region_index, self.tile_index, self.tile_x, self.tile_y)
    }
}

/// Keep the locations whose region and tile indexes pass both filters
///
/// An unset filter passes everything. Order is preserved.
///
/// # Arguments
/// * `locations` - Configured tile locations, in enumeration order
/// * `region_indexes` - Optional 0-based region indexes
/// * `tile_indexes` - Optional 0-based tile indexes
pub fn get_tile_locations<I>(
    locations: I,
    region_indexes: Option<&[usize]>,
    tile_indexes: Option<&[usize]>
) -> Vec<TileLocation>
where
    I: IntoIterator<Item = TileLocation>,
{
    locations
        .into_iter()
        .filter(|location| region_indexes.map_or(true, |regions| regions.contains(&location.region_index)))
        .filter(|location| tile_indexes.map_or(true, |tiles| tiles.contains(&location.tile_index)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 3 tiles in region 0 and 2 in region 1
    fn five_tiles() -> Vec<TileLocation> {
        [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1)]
            .iter()
            .map(|&(region_index, tile_index)| TileLocation {
                region_index,
                tile_index,
                tile_x: tile_index,
                tile_y: 0,
            })
            .collect()
    }

    #[test]
    fn test_region_filter() {
        let selected = get_tile_locations(five_tiles(), Some(&[1][..]), None);
        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|l| l.region_index == 1));
    }

    #[test]
    fn test_unset_filters_pass_everything() {
        assert_eq!(get_tile_locations(five_tiles(), None, None), five_tiles());
    }

    #[test]
    fn test_both_filters() {
        let selected = get_tile_locations(five_tiles(), Some(&[0, 1][..]), Some(&[1][..]));
        let keys: Vec<(usize, usize)> = selected.iter().map(|l| (l.region_index, l.tile_index)).collect();
        assert_eq!(keys, vec![(0, 1), (1, 1)]);
        assert!(get_tile_locations(five_tiles(), Some(&[4][..]), None).is_empty());
    }

    #[test]
    fn test_file_name_is_one_based() {
        let location = TileLocation { region_index: 0, tile_index: 7, tile_x: 2, tile_y: 11 };
        assert_eq!(location.file_name(), "R001_X003_Y012.tif");
    }
}
