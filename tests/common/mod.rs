//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use deeplink_router::routing::{handler, Handler, Parameters};

/// Records every invocation as `(name, parameters)`.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, Parameters)>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler that logs under `name` and returns `accept`.
    pub fn handler(&self, name: &str, accept: bool) -> Handler {
        let calls = self.calls.clone();
        let name = name.to_string();
        handler(move |parameters: &Parameters| {
            calls.lock().unwrap().push((name.clone(), parameters.clone()));
            accept
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    #[allow(dead_code)]
    pub fn last(&self) -> Option<Parameters> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .map(|(_, parameters)| parameters.clone())
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}
