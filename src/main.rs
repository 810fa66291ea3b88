use devbox::cli::commands::{CliArgs, Commands};
use devbox::cli::handlers::{
    handle_add, handle_build, handle_generate, handle_init, handle_plan, handle_remove,
    handle_run, handle_shell,
};
use devbox::util::logging::parse_level;
use devbox::util::{init_logging, LoggingConfig};
use devbox::{Settings, VERSION};

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    let settings = Settings::default();

    if let Err(e) = settings.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    init_logging(logging_config(&args, &settings));

    debug!("devbox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Init(init_args) => handle_init(init_args),
        Commands::Add(add_args) => handle_add(add_args, &settings),
        Commands::Remove(remove_args) => handle_remove(remove_args, &settings),
        Commands::Build(build_args) => handle_build(build_args, &settings),
        Commands::Generate(config_args) => handle_generate(config_args, &settings),
        Commands::Shell(config_args) => handle_shell(config_args, &settings),
        Commands::Plan(plan_args) => handle_plan(plan_args, &settings),
        Commands::Run(run_args) => handle_run(run_args, &settings),
    };

    std::process::exit(exit_code);
}

/// `--log-level` wins over `-v`, which wins over `-q`, which wins over
/// `DEVBOX_LOG_LEVEL`
fn logging_config(args: &CliArgs, settings: &Settings) -> LoggingConfig {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        parse_level(&settings.log_level)
    };

    LoggingConfig::with_level(level).json(settings.log_json)
}
