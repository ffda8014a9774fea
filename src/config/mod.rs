//! Experiment configuration loading

pub mod experiment;

pub use experiment::{ExperimentConfig, TilingMode, DEFAULT_RAW_TEMPLATE, EXPERIMENT_FILE};
