//! Composition root wiring a logger and an in-memory key-value store.
//!
//! Run with `RUST_LOG=wirebox_container=trace` to watch resolution.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wirebox::prelude::*;

// === Logger ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("{msg}");
    }
}

wirebox::implements!(ConsoleLogger => dyn Logger);

impl Injectable for ConsoleLogger {
    type Deps = ();

    fn init(_: ()) -> Result<Self> {
        Ok(ConsoleLogger)
    }
}

// === Key-value store (depends on Logger) ===

trait KeyValueStore: Send + Sync {
    fn add_value(&self, key: &str, value: &str);
    fn get_value(&self, key: &str) -> Option<String>;
}

struct InMemoryKeyValueStore {
    logger: Arc<dyn Logger>,
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn add_value(&self, key: &str, value: &str) {
        self.logger
            .log(&format!("AddValue called with key {key} and value {value}"));

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        println!("Key value map now has {} values", entries.len());
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }
}

wirebox::implements!(InMemoryKeyValueStore => dyn KeyValueStore);

impl Injectable for InMemoryKeyValueStore {
    type Deps = Arc<dyn Logger>;

    fn init(logger: Arc<dyn Logger>) -> Result<Self> {
        Ok(Self {
            logger,
            entries: Mutex::new(HashMap::new()),
        })
    }
}

fn resolve_store(container: &Container) -> Result<Arc<dyn KeyValueStore>> {
    container.resolve::<dyn KeyValueStore>()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("key_value=info,wirebox_container=debug")),
        )
        .init();

    println!("Dependency injection demo");

    let container = Container::builder()
        .bind::<dyn Logger, ConsoleLogger>()
        .bind::<dyn KeyValueStore, InMemoryKeyValueStore>()
        .build()?;

    let store = container.resolve::<dyn KeyValueStore>()?;
    store.add_value("one", "two");

    // Same instance, so the map already holds "one".
    let again = resolve_store(&container)?;
    if let Some(value) = again.get_value("one") {
        println!("one = {value} (seen through the second handle)");
    }
    again.add_value("three", "four");

    if let Some(value) = store.get_value("three") {
        println!("three = {value}");
    }

    info!(?container, "Demo finished");
    Ok(())
}
