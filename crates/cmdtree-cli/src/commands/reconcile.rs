//! Reconcile and check command implementations
//!
//! `reconcile` rebuilds which modules each scope should carry from what the
//! scope exposes and re-asserts it. `check` computes the same thing and only
//! reports the drift.

use colored::Colorize;

use cmdtree_core::{ReconcileSummary, Scope, SyncPlan};

use crate::context::Context;
use crate::error::{CliError, Result};

fn print_summary(summary: &ReconcileSummary) {
    for report in &summary.copied {
        println!(
            "   {} copied {} global commands into {}",
            "+".green(),
            report.added,
            report.scope.to_string().cyan()
        );
    }
    for outcome in &summary.outcomes {
        let modules = if outcome.active_modules.is_empty() {
            "no modules".to_string()
        } else {
            outcome
                .active_modules
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "   {} {} [{}]: {} added, {} removed",
            "+".green(),
            outcome.scope.to_string().cyan(),
            modules.dimmed(),
            outcome.report.added,
            outcome.report.removed
        );
        if !outcome.orphaned.is_empty() {
            println!(
                "      {} orphaned: {}",
                "!".yellow(),
                outcome.orphaned.join(", ")
            );
        }
    }
    for failure in &summary.failures {
        let kind = if failure.module_problem {
            "module problem"
        } else if failure.retryable {
            "retryable remote problem"
        } else {
            "remote problem"
        };
        println!(
            "   {} {}: {} ({})",
            "!".red(),
            failure.scope.to_string().cyan(),
            failure.message,
            kind.dimmed()
        );
    }
}

/// Run the reconcile command
pub async fn run_reconcile(ctx: &Context, scope: Option<Scope>, json: bool) -> Result<()> {
    if !json {
        println!("{} Reconciling command tree...", "=>".blue().bold());
    }

    let summary = match scope {
        Some(scope) => ctx.controller_with_copies().reconcile_all([scope]).await,
        None => {
            ctx.controller()
                .startup(&ctx.manifest.guilds.managed, &ctx.manifest.guilds.copy_global)
                .await
        }
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
        println!(
            "{} {} added, {} removed across {} scope(s).",
            if summary.is_success() {
                "OK".green().bold()
            } else {
                "ERROR".red().bold()
            },
            summary.total_added(),
            summary.total_removed(),
            summary.outcomes.len()
        );
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "Reconciliation failed for {} scope(s)",
            summary.failures.len()
        )))
    }
}

/// Run the check command
pub async fn run_check(ctx: &Context, scope: Option<Scope>) -> Result<()> {
    println!("{} Checking command tree...", "=>".blue().bold());

    let scopes = match scope {
        Some(scope) => vec![scope],
        None => ctx.manifest.managed_scopes(),
    };
    let controller = ctx.controller_with_copies();

    let mut plans: Vec<SyncPlan> = Vec::new();
    for scope in scopes {
        plans.push(controller.plan(scope).await?);
    }

    let drifted: Vec<&SyncPlan> = plans.iter().filter(|plan| !plan.is_noop()).collect();
    if drifted.is_empty() {
        println!(
            "{} {} scope(s) in sync. No drift detected.",
            "OK".green().bold(),
            plans.len()
        );
        return Ok(());
    }

    println!("{} Command tree has drifted:", "DRIFTED".red().bold());
    for plan in drifted {
        println!("   {} {}", "!".red(), plan.scope.to_string().cyan());
        for descriptor in &plan.to_add {
            println!("      {} {} ({})", "+".green(), descriptor.name, descriptor.module.dimmed());
        }
        for name in &plan.to_remove {
            println!("      {} {}", "-".red(), name);
        }
    }
    println!();
    println!("Run {} to repair.", "cmdtree reconcile".cyan());

    Ok(())
}
