use std::path::Path;

use crate::model::TaskStore;

use super::CsvError;

const HEADERS: [&str; 10] = [
    "Project",
    "Task",
    "Parent",
    "Level",
    "Start Date",
    "Due Date",
    "Completed",
    "Completed At",
    "Assignee",
    "Notes",
];

/// Export every task to a semicolon-delimited CSV file, one row per task
/// in document order with subtasks after their parent. The filter and
/// collapse state are ignored so the file always holds the full workspace.
/// Returns the number of rows written.
pub fn export_csv(store: &TaskStore, path: &Path) -> Result<usize, CsvError> {
    let mut writer = csv::WriterBuilder::new().delimiter(b';').from_path(path)?;

    writer.write_record(HEADERS)?;

    let mut written = 0usize;
    for project in store.projects() {
        let roots: Vec<_> = store
            .relations()
            .roots()
            .iter()
            .copied()
            .filter(|id| store.task(*id).is_some_and(|t| t.project_id == project.id))
            .collect();
        for root in roots {
            let mut order = vec![root];
            order.extend(store.relations().descendants(root));
            for id in order {
                let Some(task) = store.task(id) else { continue };
                let parent_name = task
                    .parent_id
                    .and_then(|p| store.task(p))
                    .map(|p| p.name.as_str())
                    .unwrap_or("");
                let level = task.level.to_string();
                let start = task.start_date.format("%Y-%m-%d").to_string();
                let due = task.due_date.format("%Y-%m-%d").to_string();
                let completed_at = task
                    .completion_date
                    .map(|d| d.to_rfc3339())
                    .unwrap_or_default();
                writer.write_record([
                    project.name.as_str(),
                    task.name.as_str(),
                    parent_name,
                    level.as_str(),
                    start.as_str(),
                    due.as_str(),
                    if task.completed { "yes" } else { "no" },
                    completed_at.as_str(),
                    task.assignee.as_str(),
                    task.notes.as_str(),
                ])?;
                written += 1;
            }
        }
    }

    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskEdit, TaskStore};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_store() -> TaskStore {
        let mut store = TaskStore::new();
        store.add_project("Alpha");
        let root = store.add_task(date(2024, 6, 10)).unwrap();
        store.apply_edit(root, TaskEdit::Name("Parent".into())).unwrap();
        let child = store.add_child(root).unwrap();
        store.apply_edit(child, TaskEdit::Name("Child".into())).unwrap();
        store.apply_edit(child, TaskEdit::Assignee("Maya".into())).unwrap();
        store
    }

    #[test]
    fn writes_one_row_per_task_with_hierarchy_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.csv");
        let written = export_csv(&sample_store(), &path).unwrap();
        assert_eq!(written, 2);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Project;Task;Parent;Level"));
        assert!(lines[1].contains("Alpha;Parent;;0;2024-06-10"));
        assert!(lines[2].contains("Alpha;Child;Parent;1;"));
        assert!(lines[2].contains("Maya"));
    }

    #[test]
    fn exports_completed_flags() {
        let mut store = sample_store();
        let root = store.visible_task_ids()[0];
        store.toggle_completion(root).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.csv");
        export_csv(&store, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.lines().any(|l| l.contains(";yes;")));
    }
}
