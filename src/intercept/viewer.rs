//! Guard for the embedded document viewer's global application object.
//!
//! The viewer exposes its source address and loading tasks on a well-known
//! global. [`ViewerApplication`] replaces direct property access: the source
//! address always reads as a fixed stand-in name, and tasks that carry a
//! protected `url` are refused.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::warn;

use super::context::InterceptContext;

/// Name reported for the viewer's source address.
pub const DISPLAY_DOCUMENT_NAME: &str = "secure-document.pdf";

/// Task-bearing properties of the viewer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskSlot {
    LoadingTask,
    PdfDocument,
    PdfLoadingTask,
}

pub struct ViewerApplication {
    ctx: Arc<InterceptContext>,
    source_url: Mutex<Option<String>>,
    tasks: Mutex<HashMap<TaskSlot, Value>>,
}

impl ViewerApplication {
    pub fn new(ctx: Arc<InterceptContext>) -> Self {
        Self {
            ctx,
            source_url: Mutex::new(None),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn url(&self) -> &'static str {
        DISPLAY_DOCUMENT_NAME
    }

    /// Store the viewer's source address; protected addresses are ignored.
    pub fn set_url(&self, url: &str) {
        if self.ctx.is_sensitive(url) {
            return;
        }
        *self.source_url.lock().unwrap_or_else(|e| e.into_inner()) = Some(url.to_string());
    }

    /// The stored source address, for the viewer's own loader.
    pub fn source_url(&self) -> Option<String> {
        self.source_url
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Assign a task. Returns `false` and logs a warning if its `url` is protected.
    pub fn set_task(&self, slot: TaskSlot, task: Value) -> bool {
        let sensitive = task
            .get("url")
            .and_then(Value::as_str)
            .is_some_and(|url| self.ctx.is_sensitive(url));
        if sensitive {
            warn!(?slot, "Blocked sensitive URL in PDF task");
            self.ctx.console().warn("Blocked sensitive URL in PDF task");
            return false;
        }
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(slot, task);
        true
    }

    pub fn task(&self, slot: TaskSlot) -> Option<Value> {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(&slot)
            .cloned()
    }
}
