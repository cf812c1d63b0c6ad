//! Built-in task catalog
//!
//! Every single-shot operation the service offers is a [`TaskDefinition`]
//! value registered here. Adding a task means adding data to one of the
//! submodules; no new execution code.

mod assessment;
mod assistant;
mod planning;
mod study;

use crate::flow::TaskDefinition;
use crate::prompt::TemplateError;
use std::collections::BTreeMap;
use std::sync::Arc;

pub use study::{summarize_video_description, SUMMARIZE_VIDEO_DESCRIPTION};

/// Immutable name → definition map, built once at startup
#[derive(Debug, Clone, Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, Arc<TaskDefinition>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in tasks
    ///
    /// # Errors
    ///
    /// A built-in template is malformed. Surfaces at startup, never per request.
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut registry = Self::new();
        for task in study::definitions()?
            .into_iter()
            .chain(assessment::definitions()?)
            .chain(planning::definitions()?)
            .chain(assistant::definitions()?)
        {
            registry.register(task);
        }
        Ok(registry)
    }

    /// Add or replace a task
    pub fn register(&mut self, task: TaskDefinition) {
        self.tasks.insert(task.name().to_string(), Arc::new(task));
    }

    pub fn get(&self, name: &str) -> Option<Arc<TaskDefinition>> {
        self.tasks.get(name).cloned()
    }

    /// Tasks in name order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TaskDefinition>> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
