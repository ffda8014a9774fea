//! CODEX experiment data on disk
//!
//! File-system implementations of the collaborators an extraction needs:
//! the cytometry channel table, the best-focus table, tile generation from
//! raw planes or stored stacks, overlap cropping and hyperstack output.

pub mod cytometry;
pub mod focus;
pub mod paths;
pub mod generator;
pub mod crop;
pub mod io;

pub use crop::OverlapCrop;
pub use cytometry::CytometryChannels;
pub use focus::BestFocusFile;
pub use generator::FsTileGenerator;
pub use io::HyperstackTileWriter;
