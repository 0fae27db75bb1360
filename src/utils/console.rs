/// Append-only user-visible run log. Every state transition and major step
/// emits one line here; lines are mirrored to the `log` crate so they also
/// land in the process log.

use log::info;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct Console {
    lines: Arc<Mutex<Vec<String>>>,
}

impl Console {
    pub fn new() -> Self {
        Console::default()
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        self.lines.lock().expect("console lock poisoned").push(message);
    }

    pub fn clear(&self) {
        self.lines.lock().expect("console lock poisoned").clear();
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("console lock poisoned").clone()
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }
}
