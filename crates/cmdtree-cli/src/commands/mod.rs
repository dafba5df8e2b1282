//! Command implementations for cmdtree-cli

pub mod modules;
pub mod reconcile;
pub mod status;
pub mod sync;

pub use modules::{run_module_load, run_module_unload, run_modules};
pub use reconcile::{run_check, run_reconcile};
pub use status::run_status;
pub use sync::{run_copy_global, run_sync, run_unsync};
