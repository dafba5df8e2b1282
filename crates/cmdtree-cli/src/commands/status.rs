//! Status command implementation

use colored::Colorize;
use serde::Serialize;

use cmdtree_core::Scope;

use crate::context::Context;
use crate::error::Result;

#[derive(Debug, Serialize)]
struct ScopeStatus {
    scope: Scope,
    published: Vec<String>,
    pending: bool,
}

#[derive(Debug, Serialize)]
struct Status {
    manifest: String,
    state: String,
    always_on: String,
    loaded: Vec<String>,
    scopes: Vec<ScopeStatus>,
}

fn collect(ctx: &Context) -> Result<Status> {
    let mut scopes = Vec::new();
    for scope in ctx.manifest.managed_scopes() {
        scopes.push(ScopeStatus {
            scope,
            published: ctx.tree.published(scope)?,
            pending: ctx.tree.has_pending(scope)?,
        });
    }
    Ok(Status {
        manifest: ctx.manifest_path.display().to_string(),
        state: ctx.tree.path().display().to_string(),
        always_on: ctx.manifest.core.always_on.clone(),
        loaded: ctx.session.loaded_module_names().into_iter().collect(),
        scopes,
    })
}

/// Run the status command
pub fn run_status(ctx: &Context, json: bool) -> Result<()> {
    let status = collect(ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Command Tree Status".bold());
    println!();
    println!("{}: {}", "Manifest".dimmed(), status.manifest);
    println!("{}:    {}", "State".dimmed(), status.state);
    println!("{}: {}", "Always on".dimmed(), status.always_on.cyan());
    println!();

    println!("{}:", "Loaded Modules".bold());
    if status.loaded.is_empty() {
        println!("  {}", "None".dimmed());
    } else {
        for name in &status.loaded {
            println!("  {} {}", "+".green(), name.cyan());
        }
    }
    println!();

    println!("{}:", "Scopes".bold());
    for scope in &status.scopes {
        let state = if scope.pending {
            "uncommitted changes".yellow()
        } else {
            "committed".green()
        };
        println!(
            "  {} {} ({} commands, {})",
            "+".green(),
            scope.scope.to_string().cyan(),
            scope.published.len(),
            state
        );
        if !scope.published.is_empty() {
            println!("      {}", scope.published.join(", ").dimmed());
        }
    }

    Ok(())
}
