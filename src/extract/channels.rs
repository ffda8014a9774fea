//! Channel name resolution
//!
//! Requested channels carry a source prefix (`raw_`, `proc_` or `cyto_`)
//! followed by a channel name. Raw and processed channels are looked up in
//! the experiment configuration, cytometric channels in the cytometry table.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;

use crate::errors::{CodexError, CodexResult};

/// Where the pixels of a channel come from
///
/// The derived order is the order sources are processed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChannelSource {
    Raw,
    Proc,
    Cyto,
}

impl ChannelSource {
    pub const ALL: [ChannelSource; 3] = [ChannelSource::Raw, ChannelSource::Proc, ChannelSource::Cyto];

    /// Prefix marking the source in a requested channel name
    pub fn prefix(&self) -> &'static str {
        match self {
            ChannelSource::Raw => "raw_",
            ChannelSource::Proc => "proc_",
            ChannelSource::Cyto => "cyto_",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChannelSource::Raw => "raw",
            ChannelSource::Proc => "proc",
            ChannelSource::Cyto => "cyto",
        }
    }

    pub fn valid_prefixes() -> Vec<&'static str> {
        Self::ALL.iter().map(|source| source.prefix()).collect()
    }
}

impl fmt::Display for ChannelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A requested channel resolved to its position inside a source tile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Channel name without its source prefix
    pub channel_name: String,
    pub source: ChannelSource,
    pub cycle_index: usize,
    pub channel_index: usize,
}

/// Lookup of a channel's (cycle, channel) coordinates by name
pub trait ChannelLookup {
    /// 0-based (cycle_index, channel_index), or None for unknown names
    fn channel_coordinates(&self, name: &str) -> Option<(usize, usize)>;

    /// Known channel names, for error messages
    fn channel_names(&self) -> Vec<String>;
}

/// Split a requested channel into its source and bare name
///
/// The longest matching prefix wins. Prefixes are lowercase and matched
/// exactly; only the name after the prefix is looked up case-insensitively.
pub fn parse_channel(channel: &str) -> CodexResult<(ChannelSource, &str)> {
    ChannelSource::ALL
        .iter()
        .filter(|source| channel.starts_with(source.prefix()))
        .max_by_key(|source| source.prefix().len())
        .map(|source| (*source, &channel[source.prefix().len()..]))
        .ok_or_else(|| CodexError::InvalidChannelPrefix {
            channel: channel.to_string(),
            valid_prefixes: ChannelSource::valid_prefixes(),
        })
}

/// Resolve requested channel names to descriptors, in input order
///
/// # Arguments
/// * `channels` - Prefixed channel names, e.g. `raw_DAPI` or `cyto_cell_mask`
/// * `config` - Lookup for raw and processed channels
/// * `cytometry` - Lookup for cytometric channels
///
/// # Returns
/// One descriptor per requested channel, or the first resolution error
pub fn map_channels(
    channels: &[String],
    config: &dyn ChannelLookup,
    cytometry: &dyn ChannelLookup
) -> CodexResult<Vec<ChannelDescriptor>> {
    channels
        .iter()
        .map(|channel| {
            let (source, name) = parse_channel(channel)?;
            let lookup = match source {
                ChannelSource::Raw | ChannelSource::Proc => config,
                ChannelSource::Cyto => cytometry,
            };

            let (cycle_index, channel_index) = lookup.channel_coordinates(name).ok_or_else(|| {
                CodexError::UnknownChannel(format!(
                    "\"{}\" has no {} channel named \"{}\" (known names: {:?})",
                    channel, source, name, lookup.channel_names()
                ))
            })?;

            debug!("Channel {} resolved to source {}, cycle {}, channel {}",
                   channel, source, cycle_index, channel_index);

            Ok(ChannelDescriptor {
                channel_name: name.to_string(),
                source,
                cycle_index,
                channel_index,
            })
        })
        .collect()
}

/// Group descriptors by source
///
/// Sources come out in processing order; descriptors keep input order.
pub fn group_by_source(descriptors: &[ChannelDescriptor]) -> BTreeMap<ChannelSource, Vec<ChannelDescriptor>> {
    let mut groups: BTreeMap<ChannelSource, Vec<ChannelDescriptor>> = BTreeMap::new();
    for descriptor in descriptors {
        groups.entry(descriptor.source).or_default().push(descriptor.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubLookup(Vec<&'static str>, usize);

    impl ChannelLookup for StubLookup {
        fn channel_coordinates(&self, name: &str) -> Option<(usize, usize)> {
            self.0.iter()
                .position(|n| n.eq_ignore_ascii_case(name))
                .map(|i| (i / self.1, i % self.1))
        }

        fn channel_names(&self) -> Vec<String> {
            self.0.iter().map(|n| n.to_string()).collect()
        }
    }

    fn config() -> StubLookup {
        StubLookup(vec!["DAPI", "blank", "CD3", "CD4"], 2)
    }

    fn cytometry() -> StubLookup {
        StubLookup(vec!["cell_mask", "CD4", "nucleus_mask"], 3)
    }

    fn names(channels: &[&str]) -> Vec<String> {
        channels.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_raw_and_cyto_rows() {
        let rows = map_channels(&names(&["raw_DAPI", "cyto_CD4"]), &config(), &cytometry()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ChannelDescriptor {
            channel_name: "DAPI".to_string(),
            source: ChannelSource::Raw,
            cycle_index: 0,
            channel_index: 0,
        });
        assert_eq!(rows[1].source, ChannelSource::Cyto);
        assert_eq!((rows[1].cycle_index, rows[1].channel_index), (0, 1));
    }

    #[test]
    fn test_proc_uses_configuration() {
        let rows = map_channels(&names(&["proc_cd4", "proc_CD3"]), &config(), &cytometry()).unwrap();
        assert_eq!(rows[0].source, ChannelSource::Proc);
        assert_eq!((rows[0].cycle_index, rows[0].channel_index), (1, 1));
        assert_eq!(rows[1].channel_name, "CD3");
        assert_eq!((rows[1].cycle_index, rows[1].channel_index), (1, 0));
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        for channel in ["PROC_CD3", "Raw_DAPI", "CYTO_cell_mask"] {
            match map_channels(&names(&[channel]), &config(), &cytometry()) {
                Err(CodexError::InvalidChannelPrefix { channel: offending, .. }) => assert_eq!(offending, channel),
                other => panic!("{}: expected an invalid prefix error, got {:?}", channel, other),
            }
        }
    }

    #[test]
    fn test_invalid_prefix_names_channel() {
        let err = map_channels(&names(&["raw_DAPI", "DAPI"]), &config(), &cytometry()).unwrap_err();
        match &err {
            CodexError::InvalidChannelPrefix { channel, valid_prefixes } => {
                assert_eq!(channel, "DAPI");
                assert_eq!(valid_prefixes, &vec!["raw_", "proc_", "cyto_"]);
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("Channel with name \"DAPI\" is not valid."));
    }

    #[test]
    fn test_unknown_channel() {
        let err = map_channels(&names(&["cyto_DAPI"]), &config(), &cytometry()).unwrap_err();
        assert!(matches!(err, CodexError::UnknownChannel(msg) if msg.contains("cyto_DAPI")));
    }

    #[test]
    fn test_group_by_source_orders_sources() {
        let rows = map_channels(
            &names(&["cyto_cell_mask", "raw_CD4", "proc_DAPI", "raw_DAPI"]),
            &config(),
            &cytometry()
        ).unwrap();

        let groups = group_by_source(&rows);
        let sources: Vec<ChannelSource> = groups.keys().copied().collect();
        assert_eq!(sources, vec![ChannelSource::Raw, ChannelSource::Proc, ChannelSource::Cyto]);

        let raw: Vec<&str> = groups[&ChannelSource::Raw].iter().map(|d| d.channel_name.as_str()).collect();
        assert_eq!(raw, vec!["CD4", "DAPI"]);
    }
}
