//! Cytometric tile channels
//!
//! Cytometric tiles hold a single cycle whose channels are the segmentation
//! products, always in this order.

use crate::extract::channels::ChannelLookup;

pub const CYTOMETRY_CHANNELS: [&str; 4] = ["cell_mask", "cell_boundary", "nucleus_mask", "nucleus_boundary"];

/// Channel table of cytometric tiles
#[derive(Debug, Clone, Copy, Default)]
pub struct CytometryChannels;

impl ChannelLookup for CytometryChannels {
    fn channel_coordinates(&self, name: &str) -> Option<(usize, usize)> {
        CYTOMETRY_CHANNELS
            .iter()
            .position(|channel| channel.eq_ignore_ascii_case(name))
            .map(|position| (0, position))
    }

    fn channel_names(&self) -> Vec<String> {
        CYTOMETRY_CHANNELS.iter().map(|channel| channel.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions() {
        assert_eq!(CytometryChannels.channel_coordinates("cell_mask"), Some((0, 0)));
        assert_eq!(CytometryChannels.channel_coordinates("Nucleus_Boundary"), Some((0, 3)));
        assert_eq!(CytometryChannels.channel_coordinates("DAPI"), None);
        assert_eq!(CytometryChannels.channel_names().len(), 4);
    }
}
