//! CLI subcommand implementations.

pub mod completion;
pub mod missing;
pub mod save;
pub mod sections;
pub mod source;
pub mod validate_config;
