use thiserror::Error;
use uuid::Uuid;

pub mod navigation;
pub mod project;
pub mod relations;
pub mod selection;
pub mod store;
pub mod task;

pub use navigation::{Area, DetailField, NavEffect, NavKey, Navigator};
pub use project::{Project, PROJECT_PALETTE};
pub use relations::RelationMap;
pub use selection::Selection;
pub use store::{TaskEdit, TaskStats, TaskStore};
pub use task::{Task, TaskStatus, MAX_TASK_DEPTH};

/// Errors returned by store commands. A failed command leaves the store
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("task not found: {0}")]
    TaskNotFound(Uuid),
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),
    #[error("moving {task} under {parent} would create a cycle")]
    Cycle { task: Uuid, parent: Uuid },
    #[error("duplicate task id: {0}")]
    DuplicateId(Uuid),
    #[error("maximum nesting depth of 10 levels reached")]
    MaxDepth,
    #[error("parent task belongs to a different project")]
    CrossProject,
    #[error("no project selected")]
    NoProject,
}
