//! Module commands: listing declared modules, attaching and detaching them

use colored::Colorize;
use serde::Serialize;

use cmdtree_core::{GuildId, SyncReport};

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ModuleInfo {
    name: String,
    always_on: bool,
    autoload: bool,
    loaded: bool,
    commands: Vec<String>,
}

fn collect(ctx: &Context) -> Vec<ModuleInfo> {
    let loaded = ctx.session.loaded_module_names();
    ctx.manifest
        .modules
        .iter()
        .map(|(name, section)| ModuleInfo {
            name: name.clone(),
            always_on: *name == ctx.manifest.core.always_on,
            autoload: section.autoload,
            loaded: loaded.contains(name),
            commands: section.commands.iter().map(|c| c.name.clone()).collect(),
        })
        .collect()
}

/// Run the modules command
pub fn run_modules(ctx: &Context, json: bool) -> Result<()> {
    let modules = collect(ctx);

    if json {
        println!("{}", serde_json::to_string_pretty(&modules)?);
        return Ok(());
    }

    println!("{}", "Declared Modules".bold());
    println!();
    if modules.is_empty() {
        println!(
            "  {} (declare them under [modules] in {})",
            "None".dimmed(),
            ctx.manifest_path.display()
        );
        return Ok(());
    }

    for module in &modules {
        let marker = if module.loaded {
            "+".green()
        } else {
            "-".dimmed()
        };
        let mut tags = Vec::new();
        if module.always_on {
            tags.push("always on");
        }
        if module.autoload {
            tags.push("autoload");
        }
        let tags = if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        };
        println!("  {} {}{}", marker, module.name.cyan(), tags.dimmed());
        println!("      {}", module.commands.join(", "));
    }

    Ok(())
}

fn print_report(verb: &str, module: &str, report: &SyncReport) {
    println!(
        "{} {} {} ({} added, {} removed)",
        "OK".green().bold(),
        verb,
        module.cyan(),
        report.added,
        report.removed
    );
}

/// Add a module's commands to a guild, leaving other commands in place.
pub async fn run_module_load(ctx: &Context, name: &str, guild: GuildId) -> Result<()> {
    println!(
        "{} Loading {} into guild {}...",
        "=>".blue().bold(),
        name.cyan(),
        guild
    );
    ctx.ensure_loaded(name)?;
    let report = ctx.session.attach(guild, name).await?;
    print_report("Loaded", name, &report);
    Ok(())
}

/// Remove a module's commands from a guild, leaving other commands in place.
pub async fn run_module_unload(ctx: &Context, name: &str, guild: GuildId) -> Result<()> {
    println!(
        "{} Unloading {} from guild {}...",
        "=>".blue().bold(),
        name.cyan(),
        guild
    );
    ctx.ensure_loaded(name)?;
    let report = ctx.session.detach(guild, name).await?;
    print_report("Unloaded", name, &report);
    Ok(())
}
