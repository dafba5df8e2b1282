//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use cmdtree_core::{GuildId, MANIFEST_FILE, Scope};

/// cmdtree - Keep a remote slash-command tree in step with local modules
#[derive(Parser, Debug)]
#[command(name = "cmdtree")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the manifest
    #[arg(short, long, global = true, env = "CMDTREE_CONFIG", default_value = MANIFEST_FILE)]
    pub config: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// How `sync` treats remote commands outside the desired set
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModeArg {
    /// Remove everything not desired
    #[default]
    Replace,
    /// Only add; leave other commands alone
    Merge,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show loaded modules and the state of each managed scope
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// List the modules declared in the manifest
    Modules {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Attach or detach a module's commands in a guild
    Module {
        #[command(subcommand)]
        action: ModuleAction,
    },

    /// Make a scope match the selected modules
    ///
    /// Without --module, the global scope gets the always-on module and a
    /// guild gets every autoload module.
    ///
    /// Examples:
    ///   cmdtree sync                                 # Global scope
    ///   cmdtree sync --scope guild:123 -m events     # One module into a guild
    ///   cmdtree sync --scope 123 --mode merge        # Add without removing
    Sync {
        /// Scope to synchronize (`global`, `guild:<id>` or `<id>`)
        #[arg(short, long, default_value = "global")]
        scope: Scope,

        /// Modules whose commands make up the desired set
        #[arg(short, long = "module")]
        modules: Vec<String>,

        /// Replace removes unlisted commands, merge keeps them
        #[arg(long, value_enum, default_value_t = ModeArg::Replace)]
        mode: ModeArg,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Remove every command from a scope
    Unsync {
        /// Scope to clear
        #[arg(short, long)]
        scope: Scope,
    },

    /// Copy the global commands into a guild
    CopyGlobal {
        /// Guild to receive the copies
        #[arg(short, long)]
        guild: GuildId,
    },

    /// Rebuild desired state from what each scope exposes and re-assert it
    ///
    /// Without --scope, copies the global commands into the configured
    /// guilds and reconciles the global scope and every managed guild.
    Reconcile {
        /// Reconcile only this scope
        #[arg(short, long)]
        scope: Option<Scope>,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Report drift between the modules and the remote scopes
    Check {
        /// Check only this scope
        #[arg(short, long)]
        scope: Option<Scope>,
    },
}

/// Module subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ModuleAction {
    /// Add a module's commands to a guild
    Load {
        /// Module name
        name: String,

        /// Target guild
        #[arg(short, long)]
        guild: GuildId,
    },

    /// Remove a module's commands from a guild
    Unload {
        /// Module name
        name: String,

        /// Target guild
        #[arg(short, long)]
        guild: GuildId,
    },
}
