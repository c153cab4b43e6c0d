#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use wirebox::prelude::*;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("wirebox_container=trace")
        .with_test_writer()
        .try_init();
}

// === Logger ===

pub trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

/// Prints to stdout.
pub struct ConsoleLogger;

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

/// Keeps every line so tests can look at it.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, msg: &str) {
        self.lines.lock().push(msg.to_string());
    }
}

wirebox::implements!(RecordingLogger => dyn Logger);

impl Injectable for RecordingLogger {
    type Deps = ();

    fn init(_: ()) -> Result<Self> {
        Ok(Self::default())
    }
}

// === Key-value store ===

pub trait KeyValueStore: Send + Sync {
    fn add_value(&self, key: &str, value: &str);
    fn get_value(&self, key: &str) -> Option<String>;
    fn len(&self) -> usize;
}

pub struct InMemoryKeyValueStore {
    logger: Arc<dyn Logger>,
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn add_value(&self, key: &str, value: &str) {
        self.logger
            .log(&format!("AddValue called with key {key} and value {value}"));

        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.logger
            .log(&format!("Key value map now has {} values", entries.len()));
    }

    fn get_value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn len(&self) -> usize {
        self.entries.lock().len()
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

/// Logger bound to `RecordingLogger` and the store, registered on a fresh
/// container. Returns the container and the logger the store writes to.
pub fn recording_container() -> (Container, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::default());
    let container = Container::new();

    container
        .register_with::<dyn Logger, SharedRecorder, ()>({
            let logger = logger.clone();
            move |()| Ok(SharedRecorder(logger.clone()))
        })
        .expect("logger registers");
    container
        .register::<dyn KeyValueStore, InMemoryKeyValueStore>()
        .expect("store registers");

    (container, logger)
}

/// Forwards to a `RecordingLogger` owned by the test.
pub struct SharedRecorder(pub Arc<RecordingLogger>);

impl Logger for SharedRecorder {
    fn log(&self, msg: &str) {
        self.0.log(msg);
    }
}

wirebox::implements!(SharedRecorder => dyn Logger);
