//! User-facing surfaces: the command-line interface and result
//! presentation.

pub mod cli;
pub mod output;

pub use cli::{Cli, Commands, ConfigAction, OutputFormat, ProfileArg};
pub use output::print_outcome;
