pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{
    BuildArgs, CliArgs, Commands, ConfigArgs, InitArgs, PackagesArgs, PlanArgs, RunArgs,
};
pub use output::{OutputFormat, OutputFormatter};
