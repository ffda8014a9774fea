//! Z plane selection
//!
//! A z selector is `best` (the best-focus plane of each tile), `all` (every
//! plane) or a 1-based index expression applied to every tile.

use std::collections::HashMap;

use log::info;

use crate::errors::{CodexError, CodexResult};
use crate::extract::indexes::IndexExpr;

/// Planes to take from a tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZSlice {
    /// The full z range
    All,
    /// 0-based plane indexes, in order
    Indexes(Vec<usize>),
}

impl ZSlice {
    /// Concrete plane indexes for a tile holding `n_planes` planes
    pub fn resolve(&self, n_planes: usize) -> Vec<usize> {
        match self {
            ZSlice::All => (0..n_planes).collect(),
            ZSlice::Indexes(indexes) => indexes.clone(),
        }
    }
}

/// Parsed z selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZSelector {
    Best,
    All,
    Expression(IndexExpr),
}

impl ZSelector {
    /// Parse a selector; the keywords `best` and `all` must be lowercase
    pub fn parse(z: &str) -> CodexResult<Self> {
        let trimmed = z.trim();
        if trimmed.is_empty() {
            return Err(CodexError::InvalidZSelector(z.to_string()));
        }

        match trimmed {
            "best" => Ok(ZSelector::Best),
            "all" => Ok(ZSelector::All),
            _ => IndexExpr::parse(trimmed)
                .map(ZSelector::Expression)
                .map_err(|_| CodexError::InvalidZSelector(z.to_string())),
        }
    }
}

/// Key of the best-focus map: (region_index, tile_x, tile_y), 0-based
pub type TileKey = (usize, usize, usize);

/// Provider of the best focal plane of every tile
pub trait FocusMapSource {
    /// Load the map from tile location to 0-based best z plane
    fn load_focus_map(&self) -> CodexResult<HashMap<TileKey, usize>>;
}

/// Function from (region_index, tile_x, tile_y) to the planes to extract
pub type ZSliceFn = Box<dyn Fn(usize, usize, usize) -> CodexResult<ZSlice>>;

/// Build the z slice function for a selector
///
/// The focus map is only loaded for `best`, and only once.
///
/// # Arguments
/// * `z` - Selector text: `best`, `all` or a 1-based index expression
/// * `focus` - Source of the best-focus map
///
/// # Returns
/// The function, or an error for an empty or malformed selector
pub fn get_z_slice_fn(z: &str, focus: &dyn FocusMapSource) -> CodexResult<ZSliceFn> {
    match ZSelector::parse(z)? {
        ZSelector::Best => {
            let focus_map = focus.load_focus_map()?;
            info!("Using best focus planes for {} tiles", focus_map.len());
            Ok(Box::new(move |region_index, tile_x, tile_y| {
                focus_map
                    .get(&(region_index, tile_x, tile_y))
                    .map(|best_z| ZSlice::Indexes(vec![*best_z]))
                    .ok_or(CodexError::MissingBestFocus { region_index, tile_x, tile_y })
            }))
        }
        ZSelector::All => Ok(Box::new(|_, _, _| Ok(ZSlice::All))),
        ZSelector::Expression(expr) => {
            let indexes = expr.to_zero_based()?;
            info!("Using z planes {:?} (0-based) for every tile", indexes);
            Ok(Box::new(move |_, _, _| Ok(ZSlice::Indexes(indexes.clone()))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubFocus {
        loads: Cell<usize>,
    }

    impl StubFocus {
        fn new() -> Self {
            StubFocus { loads: Cell::new(0) }
        }
    }

    impl FocusMapSource for StubFocus {
        fn load_focus_map(&self) -> CodexResult<HashMap<TileKey, usize>> {
            self.loads.set(self.loads.get() + 1);
            Ok(HashMap::from([((0, 0, 0), 3), ((1, 2, 0), 7)]))
        }
    }

    #[test]
    fn test_best_uses_focus_map() {
        let focus = StubFocus::new();
        let z_slice = get_z_slice_fn("best", &focus).unwrap();
        assert_eq!(z_slice(0, 0, 0).unwrap(), ZSlice::Indexes(vec![3]));
        assert_eq!(z_slice(1, 2, 0).unwrap(), ZSlice::Indexes(vec![7]));
        assert_eq!(focus.loads.get(), 1);
    }

    #[test]
    fn test_best_missing_tile() {
        let z_slice = get_z_slice_fn("best", &StubFocus::new()).unwrap();
        assert!(matches!(
            z_slice(0, 5, 5),
            Err(CodexError::MissingBestFocus { region_index: 0, tile_x: 5, tile_y: 5 })
        ));
    }

    #[test]
    fn test_all_ignores_location() {
        let focus = StubFocus::new();
        let z_slice = get_z_slice_fn("all", &focus).unwrap();
        assert_eq!(z_slice(0, 0, 0).unwrap(), ZSlice::All);
        assert_eq!(z_slice(4, 9, 1).unwrap(), ZSlice::All);
        assert_eq!(focus.loads.get(), 0);
        assert_eq!(ZSlice::All.resolve(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_expression_is_zero_based() {
        let z_slice = get_z_slice_fn("(2, 4)", &StubFocus::new()).unwrap();
        assert_eq!(z_slice(0, 0, 0).unwrap(), ZSlice::Indexes(vec![1, 2, 3]));
        assert_eq!(z_slice(1, 1, 1).unwrap(), ZSlice::Indexes(vec![1, 2, 3]));
    }

    #[test]
    fn test_empty_selector_rejected() {
        for z in ["", "   ", "middle", "ALL", "Best"] {
            assert!(matches!(
                get_z_slice_fn(z, &StubFocus::new()),
                Err(CodexError::InvalidZSelector(_))
            ), "{:?}", z);
        }
        assert!(get_z_slice_fn("0", &StubFocus::new()).is_err());
    }
}
