//! RelayInk CLI
//!
//! Headless replay of drawing sessions through the RelayInk engine.

mod cli;
pub mod replay;
pub mod script;

pub use cli::{CliArgs, run};
pub use replay::{ReplayError, ReplayOptions, ReplaySummary};
pub use script::{PointerStep, Script, Step};
