//! Command handlers
//!
//! Each handler runs one subcommand and returns the process exit code. Errors
//! are printed as a single `Error: <context>: <cause>` line.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::commands::{BuildArgs, ConfigArgs, InitArgs, PackagesArgs, PlanArgs, RunArgs};
use super::output::OutputFormatter;
use crate::devbox::Devbox;
use crate::docker::BuildFlags;
use crate::settings::Settings;

fn exit_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn open(config: &ConfigArgs, settings: &Settings) -> Result<Devbox> {
    let dir = config.dir();
    debug!(dir = %dir.display(), "Opening devbox");
    let devbox = Devbox::open(&dir, settings.shell_enabled)
        .with_context(|| format!("open devbox in {}", dir.display()))?;
    Ok(devbox.with_user_shell(settings.shell.clone()))
}

pub fn handle_init(args: &InitArgs) -> i32 {
    exit_code(run_init(args))
}

fn run_init(args: &InitArgs) -> Result<()> {
    let dir = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let created = Devbox::init(&dir).context("init devbox.json")?;
    if created {
        println!("Created devbox.json in {}", display(&dir));
    } else {
        println!("devbox.json already exists in {}", display(&dir));
    }
    Ok(())
}

pub fn handle_add(args: &PackagesArgs, settings: &Settings) -> i32 {
    exit_code(run_add(args, settings))
}

fn run_add(args: &PackagesArgs, settings: &Settings) -> Result<()> {
    let mut devbox = open(&args.config, settings)?;
    let update = devbox.add(&args.packages).context("add packages")?;
    if let Some(message) = update.message {
        println!("{}", message);
    }
    Ok(())
}

pub fn handle_remove(args: &PackagesArgs, settings: &Settings) -> i32 {
    exit_code(run_remove(args, settings))
}

fn run_remove(args: &PackagesArgs, settings: &Settings) -> Result<()> {
    let mut devbox = open(&args.config, settings)?;
    let update = devbox.remove(&args.packages).context("remove packages")?;
    if let Some(message) = update.message {
        println!("{}", message);
    }
    Ok(())
}

pub fn handle_build(args: &BuildArgs, settings: &Settings) -> i32 {
    exit_code(run_build(args, settings))
}

fn run_build(args: &BuildArgs, settings: &Settings) -> Result<()> {
    let mut devbox = open(&args.config, settings)?;
    let flags = BuildFlags {
        name: args.name.clone(),
        dockerfile: args.dockerfile.clone(),
    };
    devbox.build(flags).context("build image")
}

pub fn handle_generate(args: &ConfigArgs, settings: &Settings) -> i32 {
    exit_code(run_generate(args, settings))
}

fn run_generate(args: &ConfigArgs, settings: &Settings) -> Result<()> {
    let mut devbox = open(args, settings)?;
    let written = devbox.generate().context("generate")?;
    info!(files = written.len(), "Generation complete");
    println!("Generated files in {}", display(&devbox.gen_dir()));
    Ok(())
}

pub fn handle_shell(args: &ConfigArgs, settings: &Settings) -> i32 {
    exit_code(run_shell(args, settings))
}

fn run_shell(args: &ConfigArgs, settings: &Settings) -> Result<()> {
    if settings.shell_enabled {
        anyhow::bail!("you are already in an active devbox shell");
    }
    let mut devbox = open(args, settings)?;
    devbox.shell().context("shell")
}

pub fn handle_plan(args: &PlanArgs, settings: &Settings) -> i32 {
    exit_code(run_plan(args, settings))
}

fn run_plan(args: &PlanArgs, settings: &Settings) -> Result<()> {
    let devbox = open(&args.config, settings)?;
    let plan = if args.build {
        devbox.build_plan().context("build plan")?
    } else {
        devbox.shell_plan()
    };

    let output = OutputFormatter::new(args.format.into()).format_plan(&plan)?;
    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }
    Ok(())
}

pub fn handle_run(args: &RunArgs, settings: &Settings) -> i32 {
    exit_code(run_run(args, settings))
}

fn run_run(args: &RunArgs, settings: &Settings) -> Result<()> {
    let mut devbox = open(&args.config, settings)?;
    devbox.exec(&args.command).context("run")
}

fn display(dir: &Path) -> String {
    if dir == Path::new(".") {
        "the current directory".to_string()
    } else {
        dir.display().to_string()
    }
}
