mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicBool, Ordering};

use common::{KeyValueStore, Logger, RecordingLogger};
use wirebox::prelude::*;

struct Audit;
struct Ledger;

#[test]
fn panicking_initializer_leaves_no_entry() {
    let armed = Arc::new(AtomicBool::new(true));
    let container = Container::new();
    container
        .register_with::<Audit, Audit, ()>({
            let armed = armed.clone();
            move |()| {
                if armed.swap(false, Ordering::SeqCst) {
                    panic!("audit backend unavailable");
                }
                Ok(Audit)
            }
        })
        .unwrap();

    let outcome = catch_unwind(AssertUnwindSafe(|| container.resolve::<Audit>()));
    assert!(outcome.is_err());
    assert_eq!(container.state::<Audit>(), ResolutionState::Registered);
    assert_eq!(container.resolved_count(), 0);

    // Locks were released on unwind; the next attempt builds normally.
    assert!(container.resolve::<Audit>().is_ok());
    assert_eq!(container.state::<Audit>(), ResolutionState::Resolved);
}

#[test]
fn error_from_deep_dependency_bubbles_up_unchanged() {
    let container = Container::new();
    container
        .register_with::<Audit, Audit, ()>(|()| {
            Err(WireboxError::construction::<Audit>("audit disabled"))
        })
        .unwrap();
    container
        .register_with::<Ledger, Ledger, Arc<Audit>>(|_| Ok(Ledger))
        .unwrap();
    container
        .register_with::<dyn Logger, RecordingLogger, Arc<Ledger>>(|_| {
            Ok(RecordingLogger::default())
        })
        .unwrap();

    match container.resolve::<dyn Logger>() {
        Err(WireboxError::ConstructionFailed { key, source }) => {
            assert_eq!(key, DependencyKey::of::<Audit>());
            assert_eq!(source.to_string(), "audit disabled");
        }
        other => panic!("Expected ConstructionFailed, got: {:?}", other.err()),
    }
    assert_eq!(container.resolved_count(), 0);
}

#[test]
fn cycle_through_trait_objects() {
    struct Loop;
    impl KeyValueStore for Loop {
        fn add_value(&self, _: &str, _: &str) {}
        fn get_value(&self, _: &str) -> Option<String> {
            None
        }
        fn len(&self) -> usize {
            0
        }
    }
    struct LoopLogger;
    impl Logger for LoopLogger {
        fn log(&self, _: &str) {}
    }

    wirebox::implements!(Loop => dyn KeyValueStore);
    wirebox::implements!(LoopLogger => dyn Logger);

    let container = Container::new();
    container
        .register_with::<dyn KeyValueStore, Loop, Arc<dyn Logger>>(|_| Ok(Loop))
        .unwrap();
    container
        .register_with::<dyn Logger, LoopLogger, Arc<dyn KeyValueStore>>(|_| Ok(LoopLogger))
        .unwrap();

    match container.resolve::<dyn KeyValueStore>() {
        Err(err @ WireboxError::CyclicDependency(_)) => {
            assert!(err.to_string().contains("Loop → LoopLogger → Loop"));
        }
        other => panic!("Expected CyclicDependency, got: {:?}", other.err()),
    }

    assert!(matches!(
        container.validate(),
        Err(WireboxError::CyclicDependency(_))
    ));
}

#[test]
fn self_dependency_is_a_cycle() {
    let container = Container::new();
    container
        .register_with::<Ledger, Ledger, Arc<Ledger>>(|_| Ok(Ledger))
        .unwrap();

    match container.resolve::<Ledger>() {
        Err(WireboxError::CyclicDependency(err)) => {
            assert_eq!(
                err.chain,
                vec![DependencyKey::of::<Ledger>(), DependencyKey::of::<Ledger>()]
            );
        }
        other => panic!("Expected CyclicDependency, got: {:?}", other.err()),
    }
}

/// Registers `T` with a factory that resolves `D` back through the container
/// instead of declaring it.
fn register_reentrant<T, D>(container: &Arc<Container>, make: fn() -> T)
where
    T: Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    let weak: Weak<Container> = Arc::downgrade(container);
    container
        .register_with::<T, T, ()>(move |()| {
            if let Some(container) = weak.upgrade() {
                container.resolve::<D>()?;
            }
            Ok(make())
        })
        .unwrap();
}

#[test]
fn initializer_resolving_itself_through_the_container_is_a_cycle() {
    let container = Arc::new(Container::new());
    register_reentrant::<Audit, Audit>(&container, || Audit);

    match container.resolve::<Audit>() {
        Err(WireboxError::CyclicDependency(err)) => {
            assert_eq!(
                err.chain,
                vec![DependencyKey::of::<Audit>(), DependencyKey::of::<Audit>()]
            );
        }
        other => panic!("Expected CyclicDependency, got: {:?}", other.err()),
    }

    assert_eq!(container.state::<Audit>(), ResolutionState::Registered);
    assert_eq!(container.resolved_count(), 0);
}

#[test]
fn reentrant_cycle_mixed_with_declared_dependencies() {
    let container = Arc::new(Container::new());
    register_reentrant::<Audit, Ledger>(&container, || Audit);
    container
        .register_with::<Ledger, Ledger, Arc<Audit>>(|_| Ok(Ledger))
        .unwrap();

    match container.resolve::<Audit>() {
        Err(err @ WireboxError::CyclicDependency(_)) => {
            assert!(err.to_string().contains("Audit → Ledger → Audit"));
        }
        other => panic!("Expected CyclicDependency, got: {:?}", other.err()),
    }

    // Starting from the other end finds the same loop.
    assert!(matches!(
        container.resolve::<Ledger>(),
        Err(WireboxError::CyclicDependency(_))
    ));
    assert_eq!(container.resolved_count(), 0);
}

#[test]
fn frozen_container_keeps_resolving() {
    let container = Container::builder()
        .bind::<dyn Logger, RecordingLogger>()
        .build()
        .unwrap();

    assert!(matches!(
        container.register::<dyn Logger, RecordingLogger>(),
        Err(WireboxError::ContainerFrozen)
    ));
    assert!(container.resolve::<dyn Logger>().is_ok());
}
