//! Convergence under injected failures
//!
//! Whatever the starting tree and wherever a transient failure strikes,
//! repeating the identical Replace sync ends with exactly the desired set
//! published, and a further sync is a no-op.

use std::collections::BTreeSet;

use cmdtree_core::{CommandDescriptor, DesiredSet, RemoteError, Scope, SyncEngine, SyncMode};
use cmdtree_test_utils::{MockTree, Op};
use proptest::prelude::*;

const MAX_ATTEMPTS: usize = 4;

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::List),
        Just(Op::Upsert),
        Just(Op::Remove),
        Just(Op::Commit),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn replace_sync_converges_after_transient_failure(
        initial in proptest::collection::btree_set("[a-f]", 0..6),
        want in proptest::collection::btree_set("[a-f]", 0..6),
        fault_op in op_strategy(),
        nth in 1usize..4,
    ) {
        let scope = Scope::guild(1);
        let seeded: Vec<&str> = initial.iter().map(String::as_str).collect();
        let tree = MockTree::new().with_commands(scope, &seeded);
        tree.fail_nth(fault_op, nth, RemoteError::transient("injected"));
        let desired: DesiredSet = want
            .iter()
            .map(|name| CommandDescriptor::new(name.clone(), "m"))
            .collect();

        let rt = runtime();
        let engine = SyncEngine::new(&tree);
        let mut attempts = 0;
        loop {
            attempts += 1;
            match rt.block_on(engine.sync(scope, &desired, &SyncMode::Replace)) {
                Ok(_) => break,
                Err(err) => {
                    prop_assert!(err.is_retryable());
                    prop_assert!(attempts < MAX_ATTEMPTS);
                }
            }
        }

        let published: BTreeSet<String> = tree.published(scope).into_iter().collect();
        prop_assert_eq!(&published, &want);
        prop_assert!(!tree.has_pending(scope));

        tree.clear_faults();
        let again = rt
            .block_on(engine.sync(scope, &desired, &SyncMode::Replace))
            .unwrap();
        prop_assert!(again.is_noop());
    }

    #[test]
    fn merge_sync_never_removes_foreign_names(
        initial in proptest::collection::btree_set("[a-f]", 0..6),
        want in proptest::collection::btree_set("[a-f]", 0..6),
        retract in proptest::collection::btree_set("[a-f]", 0..6),
    ) {
        let scope = Scope::guild(2);
        let seeded: Vec<&str> = initial.iter().map(String::as_str).collect();
        let tree = MockTree::new().with_commands(scope, &seeded);
        let desired: DesiredSet = want
            .iter()
            .map(|name| CommandDescriptor::new(name.clone(), "m"))
            .collect();
        let mode = SyncMode::merge_retracting(retract.iter().cloned());

        let rt = runtime();
        rt.block_on(SyncEngine::new(&tree).sync(scope, &desired, &mode))
            .unwrap();

        let published: BTreeSet<String> = tree.published(scope).into_iter().collect();
        for name in &initial {
            if !retract.contains(name) || want.contains(name) {
                prop_assert!(published.contains(name), "{} was removed", name);
            }
        }
        for name in &want {
            prop_assert!(published.contains(name), "{} is missing", name);
        }
    }
}
