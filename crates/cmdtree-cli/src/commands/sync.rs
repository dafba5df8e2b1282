//! Sync, unsync, and copy-global command implementations

use colored::Colorize;

use cmdtree_core::{GuildId, Scope, SyncMode, SyncOptions, SyncReport};

use crate::cli::ModeArg;
use crate::context::Context;
use crate::error::Result;

/// Print the outcome of a sync in the usual human form.
pub(crate) fn print_report(report: &SyncReport) {
    if report.is_noop() {
        println!(
            "{} {} already synchronized. No changes needed.",
            "OK".green().bold(),
            report.scope.to_string().cyan()
        );
        return;
    }

    let label = if report.dry_run {
        "DRY RUN".yellow().bold()
    } else {
        "OK".green().bold()
    };
    println!("{} {}", label, report.summary());
    for name in &report.added_names {
        println!("   {} {}", "+".green(), name);
    }
    for name in &report.removed_names {
        println!("   {} {}", "-".red(), name);
    }
}

/// Run the sync command
///
/// The desired set is the listed modules' commands, or the scope's default
/// when none are listed. A guild's default includes the global commands when
/// it is configured to receive a copy of them.
pub async fn run_sync(
    ctx: &Context,
    scope: Scope,
    modules: &[String],
    mode: ModeArg,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    if !json {
        println!(
            "{} Synchronizing {}...",
            "=>".blue().bold(),
            scope.to_string().cyan()
        );
    }

    let desired = match (scope, modules.is_empty()) {
        (_, false) => ctx.desired_for(modules)?,
        (Scope::Global, true) => ctx.session.global_desired(),
        (Scope::Guild(guild), true) => {
            let mut desired = ctx.autoload_desired()?;
            if ctx.manifest.guilds.copy_global.contains(&guild) {
                desired.extend(ctx.session.global_desired().descriptors().cloned());
            }
            desired
        }
    };
    let mode = match mode {
        ModeArg::Replace => SyncMode::Replace,
        ModeArg::Merge => SyncMode::merge(),
    };

    let report = ctx
        .session
        .sync_with_options(scope, &desired, &mode, &SyncOptions { dry_run })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Run the unsync command
pub async fn run_unsync(ctx: &Context, scope: Scope) -> Result<()> {
    println!(
        "{} Removing every command from {}...",
        "=>".blue().bold(),
        scope.to_string().cyan()
    );
    let report = ctx.session.clear(scope).await?;
    print_report(&report);
    Ok(())
}

/// Run the copy-global command
pub async fn run_copy_global(ctx: &Context, guild: GuildId) -> Result<()> {
    println!(
        "{} Copying global commands into guild {}...",
        "=>".blue().bold(),
        guild
    );
    let report = ctx.session.copy_global_into(guild).await?;
    println!(
        "{} Copied {} commands into guild {}.",
        "OK".green().bold(),
        report.added,
        guild
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdtree_test_utils::fixtures::{write_manifest, SAMPLE_MANIFEST};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Context {
        Context::load(&write_manifest(dir.path(), SAMPLE_MANIFEST)).unwrap()
    }

    #[tokio::test]
    async fn sync_global_uses_always_on_module() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        run_sync(&ctx, Scope::Global, &[], ModeArg::Replace, false, false)
            .await
            .unwrap();

        assert_eq!(ctx.tree.published(Scope::Global).unwrap(), vec!["dev", "module"]);
    }

    #[tokio::test]
    async fn sync_guild_defaults_to_autoload_modules() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        run_sync(&ctx, Scope::guild(123), &[], ModeArg::Replace, false, true)
            .await
            .unwrap();

        assert_eq!(
            ctx.tree.published(Scope::guild(123)).unwrap(),
            vec!["cancel", "schedule"]
        );
    }

    #[tokio::test]
    async fn sync_copy_guild_keeps_global_copies() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let scope = Scope::guild(999);

        run_copy_global(&ctx, GuildId(999)).await.unwrap();
        run_sync(&ctx, scope, &[], ModeArg::Replace, false, false)
            .await
            .unwrap();

        assert_eq!(
            ctx.tree.published(scope).unwrap(),
            vec!["cancel", "dev", "module", "schedule"]
        );
    }

    #[tokio::test]
    async fn dry_run_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);

        run_sync(&ctx, Scope::guild(1), &["gw2".to_string()], ModeArg::Replace, true, false)
            .await
            .unwrap();

        assert!(ctx.tree.published(Scope::guild(1)).unwrap().is_empty());
        assert!(!ctx.tree.path().exists());
    }

    #[tokio::test]
    async fn merge_keeps_existing_commands() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let scope = Scope::guild(2);

        run_sync(&ctx, scope, &[], ModeArg::Replace, false, false)
            .await
            .unwrap();
        run_sync(&ctx, scope, &["gw2".to_string()], ModeArg::Merge, false, false)
            .await
            .unwrap();

        assert_eq!(
            ctx.tree.published(scope).unwrap(),
            vec!["build", "cancel", "schedule"]
        );
    }

    #[tokio::test]
    async fn unsync_and_copy_global() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let scope = Scope::guild(999);

        run_copy_global(&ctx, GuildId(999)).await.unwrap();
        assert_eq!(ctx.tree.published(scope).unwrap(), vec!["dev", "module"]);

        run_unsync(&ctx, scope).await.unwrap();
        assert!(ctx.tree.published(scope).unwrap().is_empty());
    }
}
