//! cmdtree CLI
//!
//! Operator interface for keeping a remote slash-command tree in step with
//! the modules declared in `cmdtree.toml`.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, ModuleAction};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        match e.category() {
            Some(category) => eprintln!("{}: {} ({})", "error".red().bold(), e, category.dimmed()),
            None => eprintln!("{}: {}", "error".red().bold(), e),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(cmd) = cli.command else {
        // No command provided - show help hint
        println!("{} command tree manager", "cmdtree".green().bold());
        println!();
        println!("Run {} for available commands.", "cmdtree --help".cyan());
        return Ok(());
    };

    let ctx = Context::load(&cli.config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(execute_command(&ctx, cmd))
}

async fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Status { json } => commands::run_status(ctx, json),
        Commands::Modules { json } => commands::run_modules(ctx, json),
        Commands::Module { action } => match action {
            ModuleAction::Load { name, guild } => {
                commands::run_module_load(ctx, &name, guild).await
            }
            ModuleAction::Unload { name, guild } => {
                commands::run_module_unload(ctx, &name, guild).await
            }
        },
        Commands::Sync {
            scope,
            modules,
            mode,
            dry_run,
            json,
        } => commands::run_sync(ctx, scope, &modules, mode, dry_run, json).await,
        Commands::Unsync { scope } => commands::run_unsync(ctx, scope).await,
        Commands::CopyGlobal { guild } => commands::run_copy_global(ctx, guild).await,
        Commands::Reconcile { scope, json } => commands::run_reconcile(ctx, scope, json).await,
        Commands::Check { scope } => commands::run_check(ctx, scope).await,
    }
}
