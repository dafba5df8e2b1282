//! Scenario tests
//!
//! Drive the whole stack (manifest, registry session, reconciliation
//! controller and the file-backed tree) through the situations an operator
//! actually meets: first deployment, module changes, restarts with drift.

use std::path::Path;
use std::sync::Arc;

use cmdtree_core::{
    GuildId, Manifest, ReconciliationController, RegistrySession, RemoteTreeClient, Scope,
    SyncMode,
};
use cmdtree_store::FileTree;
use cmdtree_test_utils::fixtures::{write_manifest, SAMPLE_MANIFEST};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

/// A running process: manifest-built session over the state file in `dir`.
struct Bot {
    manifest: Manifest,
    tree: Arc<FileTree>,
    session: RegistrySession,
}

impl Bot {
    fn start(dir: &Path) -> Self {
        let manifest = Manifest::load(&dir.join("cmdtree.toml")).unwrap();
        let tree = Arc::new(FileTree::open(manifest.state_path(dir)).unwrap());
        let session = RegistrySession::new(manifest.build_registry().unwrap(), tree.clone());
        Self {
            manifest,
            tree,
            session,
        }
    }

    fn controller(&self) -> ReconciliationController {
        ReconciliationController::new(self.session.clone())
            .with_concurrency(self.manifest.core.concurrency)
    }

    fn published(&self, scope: Scope) -> Vec<String> {
        self.tree.published(scope).unwrap()
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

fn deploy() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), SAMPLE_MANIFEST);
    dir
}

#[tokio::test]
async fn first_deployment_then_restart_is_stable() {
    let dir = deploy();
    let bot = Bot::start(dir.path());
    let guilds = &bot.manifest.guilds;

    bot.session.attach(GuildId(123), "events").await.unwrap();
    let first = bot
        .controller()
        .startup(&guilds.managed, &guilds.copy_global)
        .await;
    assert!(first.is_success());
    assert_eq!(first.copied.len(), 1);
    assert_eq!(bot.published(Scope::Global), strings(&["dev", "module"]));
    assert_eq!(bot.published(Scope::guild(123)), strings(&["cancel", "schedule"]));
    assert_eq!(bot.published(Scope::guild(999)), strings(&["dev", "module"]));

    // A restart forgets the copy-down and overwrites the copies with
    // identical descriptors; reconciliation then finds nothing to change.
    let restarted = Bot::start(dir.path());
    let guilds = &restarted.manifest.guilds;
    let second = restarted
        .controller()
        .startup(&guilds.managed, &guilds.copy_global)
        .await;
    assert!(second.is_success());
    assert_eq!(second.copied[0].added, 2);
    assert_eq!(restarted.published(Scope::guild(999)), strings(&["dev", "module"]));
    assert_eq!(second.total_added(), 0);
    assert_eq!(second.total_removed(), 0);
}

#[tokio::test]
async fn module_removed_from_manifest_is_cleaned_on_restart() {
    let dir = deploy();
    let bot = Bot::start(dir.path());
    bot.session
        .load_module(bot.manifest.module("gw2").unwrap())
        .unwrap();
    bot.session.attach(GuildId(123), "gw2").await.unwrap();
    bot.session.attach(GuildId(123), "events").await.unwrap();
    assert_eq!(
        bot.published(Scope::guild(123)),
        strings(&["build", "cancel", "schedule"])
    );

    // gw2 is not autoloaded, so after a restart nothing provides `build`.
    let restarted = Bot::start(dir.path());
    let outcome = restarted
        .controller()
        .reconcile(Scope::guild(123))
        .await
        .unwrap();

    assert_eq!(outcome.orphaned, strings(&["build"]));
    assert_eq!(
        restarted.published(Scope::guild(123)),
        strings(&["cancel", "schedule"])
    );
}

#[tokio::test]
async fn unloading_one_module_leaves_the_other_in_place() {
    let dir = deploy();
    let bot = Bot::start(dir.path());
    let scope = Scope::guild(321);
    bot.session
        .load_module(bot.manifest.module("gw2").unwrap())
        .unwrap();
    bot.session.attach(GuildId(321), "events").await.unwrap();
    bot.session.attach(GuildId(321), "gw2").await.unwrap();

    let report = bot.session.unload_and_sync(scope, "gw2").await.unwrap();

    assert_eq!(report.removed_names, strings(&["build"]));
    assert_eq!(bot.published(scope), strings(&["cancel", "schedule"]));
}

#[tokio::test]
async fn global_commands_never_leak_into_guilds() {
    let dir = deploy();
    let bot = Bot::start(dir.path());

    bot.session.sync_global().await.unwrap();
    bot.session.attach(GuildId(555), "events").await.unwrap();
    bot.controller()
        .reconcile_all([Scope::Global, Scope::guild(555)])
        .await;

    assert_eq!(bot.published(Scope::guild(555)), strings(&["cancel", "schedule"]));
    assert_eq!(bot.published(Scope::Global), strings(&["dev", "module"]));
}

#[tokio::test]
async fn staged_leftovers_are_published_by_next_sync() {
    let dir = deploy();
    let bot = Bot::start(dir.path());
    let scope = Scope::guild(42);

    // An earlier run staged a change and died before committing.
    let staged = bot.session.commands_of("events").unwrap();
    for descriptor in staged.descriptors() {
        bot.tree.upsert(scope, descriptor).await.unwrap();
    }
    assert!(bot.tree.has_pending(scope).unwrap());

    let restarted = Bot::start(dir.path());
    let desired = restarted.session.commands_of("events").unwrap();
    let report = restarted
        .session
        .sync(scope, &desired, &SyncMode::Replace)
        .await
        .unwrap();

    assert!(report.is_noop());
    assert!(!restarted.tree.has_pending(scope).unwrap());
    assert_eq!(restarted.published(scope), strings(&["cancel", "schedule"]));
}
