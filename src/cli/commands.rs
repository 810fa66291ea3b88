use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Reproducible, declarative development environments backed by Nix
#[derive(Parser, Debug)]
#[command(
    name = "devbox",
    about = "Instant, easy, predictable development environments",
    version,
    author,
    long_about = "devbox reads the packages and stages declared in devbox.json, infers defaults \
                  for the detected language ecosystem, and renders Nix and Docker files that \
                  realize the environment as a shell or a container image."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Initialize a directory as a devbox project")]
    Init(InitArgs),

    #[command(
        about = "Add new packages to your devbox",
        long_about = "Checks that every package exists in nixpkgs, adds the new ones to \
                      devbox.json and installs them into the project profile.\n\n\
                      Examples:\n  \
                      devbox add git\n  \
                      devbox add python310 python310Packages.pip"
    )]
    Add(PackagesArgs),

    #[command(about = "Remove packages from your devbox")]
    Remove(PackagesArgs),

    #[command(
        about = "Build a container image of the devbox environment",
        long_about = "Generates the build files under .devbox/gen and runs `docker build` with \
                      them.\n\n\
                      Examples:\n  \
                      devbox build\n  \
                      devbox build --name myapp:latest"
    )]
    Build(BuildArgs),

    #[command(about = "Generate the Nix and Docker files under .devbox/gen")]
    Generate(ConfigArgs),

    #[command(about = "Start a new shell with access to your packages")]
    Shell(ConfigArgs),

    #[command(
        about = "Show the plan devbox derives for this project",
        long_about = "Prints the shell plan (devbox.json only) or, with --build, the plan merged \
                      with the defaults inferred from the project tree.\n\n\
                      Examples:\n  \
                      devbox plan\n  \
                      devbox plan --build --format json"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Run a command inside the devbox environment",
        long_about = "Installs the environment and runs the given command with the profile's \
                      bin directory first on PATH.\n\n\
                      Examples:\n  \
                      devbox run -- make test"
    )]
    Run(RunArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    #[arg(
        short = 'c',
        long = "config",
        value_name = "DIR",
        help = "Directory containing devbox.json (searched upward; defaults to the current directory)"
    )]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn dir(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

#[derive(Args, Debug, Clone)]
pub struct InitArgs {
    #[arg(value_name = "DIR", help = "Project directory (defaults to the current directory)")]
    pub dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PackagesArgs {
    #[arg(value_name = "PKG", required = true, num_args = 1.., help = "Nix package names")]
    pub packages: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    #[arg(short = 'n', long, value_name = "NAME", help = "Image name and tag")]
    pub name: Option<String>,

    #[arg(
        short = 'f',
        long,
        value_name = "PATH",
        help = "Dockerfile to build with (defaults to the generated one)"
    )]
    pub dockerfile: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[arg(long, help = "Merge with the plan inferred from the project tree")]
    pub build: bool,

    #[arg(long, value_enum, default_value = "human", help = "Output format")]
    pub format: OutputFormatArg,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(
        value_name = "CMD",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command and arguments to run"
    )]
    pub command: Vec<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
