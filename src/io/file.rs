use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::model::{Project, Task};

#[derive(Debug, Error)]
pub enum FileError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed workspace file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a workspace file carries. Selection state rides along so a
/// restart lands the user where they left off.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub projects: Vec<Project>,
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub selected_project_id: Option<Uuid>,
    #[serde(default)]
    pub selected_task_ids: Vec<Uuid>,
}

/// Save a workspace snapshot as pretty JSON, creating parent directories
/// as needed.
pub fn save_snapshot(snapshot: &Snapshot, path: &Path) -> Result<(), FileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Load a workspace snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, FileError> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Default workspace location in the OS data directory.
pub fn default_data_path() -> PathBuf {
    match directories::ProjectDirs::from("", "", "Taskline") {
        Some(dirs) => dirs.data_dir().join("workspace.json"),
        None => PathBuf::from("taskline_workspace.json"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn snapshot_survives_a_disk_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("workspace.json");

        let project = Project::new("Release", crate::model::PROJECT_PALETTE[0]);
        let start = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let task = Task::new("Ship it", project.id, start);
        let snapshot = Snapshot {
            selected_project_id: Some(project.id),
            selected_task_ids: vec![task.id],
            projects: vec![project],
            tasks: vec![task],
        };

        save_snapshot(&snapshot, &path).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.projects[0].name, "Release");
        assert_eq!(loaded.tasks[0].name, "Ship it");
        assert_eq!(loaded.selected_task_ids, snapshot.selected_task_ids);
    }

    #[test]
    fn missing_file_reports_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, FileError::Io(_)));
    }

    #[test]
    fn selection_fields_are_optional_in_old_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.json");
        std::fs::write(&path, r#"{"projects": [], "tasks": []}"#).unwrap();
        let loaded = load_snapshot(&path).unwrap();
        assert_eq!(loaded.selected_project_id, None);
        assert!(loaded.selected_task_ids.is_empty());
    }
}
