use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::model::{Task, MAX_TASK_DEPTH};

use super::CsvError;

/// Column roles incoming headers can map onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Col {
    Name,
    Parent,
    Start,
    Due,
    Completed,
    Assignee,
    Notes,
}

fn normalize_header(raw: &str) -> String {
    raw.trim().to_lowercase().replace([' ', '-', '_'], "")
}

fn header_col(normalized: &str) -> Option<Col> {
    match normalized {
        "task" | "name" | "taskname" | "tasklabel" | "title" | "label" | "todo" | "item" => {
            Some(Col::Name)
        }
        "parent" | "parenttask" | "parentname" | "subtaskof" => Some(Col::Parent),
        "start" | "startdate" | "from" | "begin" | "begindate" => Some(Col::Start),
        "due" | "duedate" | "end" | "enddate" | "deadline" | "to" | "finish" | "finishdate" => {
            Some(Col::Due)
        }
        "completed" | "done" | "complete" | "status" | "state" => Some(Col::Completed),
        "assignee" | "assignedto" | "owner" | "responsible" => Some(Col::Assignee),
        "notes" | "note" | "description" | "details" | "comment" | "comments" => Some(Col::Notes),
        _ => None,
    }
}

/// Try several common date formats.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    None
}

fn parse_completed(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "done" | "complete" | "completed" | "finished"
    )
}

/// Pick the delimiter by counting candidates in the header line.
fn detect_delimiter(first_line: &str) -> u8 {
    let semis = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();
    if semis >= commas && semis >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Import tasks from a CSV file into `project_id`.
///
/// The delimiter is auto-detected and headers are matched loosely
/// ("Due Date", "due_date" and "deadline" all work). Task name and start
/// date columns are required; rows missing either are skipped. Parents
/// are referenced by task name and resolved after all rows are read.
/// Returns the parsed tasks and how many rows were skipped.
pub fn import_csv(path: &Path, project_id: Uuid) -> Result<(Vec<Task>, usize), CsvError> {
    let content = std::fs::read_to_string(path)?;
    let delimiter = detect_delimiter(content.lines().next().unwrap_or(""));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let cols: Vec<Option<Col>> = headers
        .iter()
        .map(|h| header_col(&normalize_header(h)))
        .collect();

    if !cols.contains(&Some(Col::Name)) || !cols.contains(&Some(Col::Start)) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(CsvError::Invalid(format!(
            "missing task name or start date column, found headers {found:?}"
        )));
    }

    let mut tasks: Vec<Task> = Vec::new();
    let mut parent_names: Vec<Option<String>> = Vec::new();
    let mut skipped = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping csv row {}: {e}", row + 2);
                skipped += 1;
                continue;
            }
        };

        let field = |col: Col| -> Option<&str> {
            cols.iter()
                .zip(record.iter())
                .find_map(|(c, value)| (*c == Some(col)).then_some(value))
        };

        let name = match field(Col::Name) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let start = match field(Col::Start).and_then(parse_date) {
            Some(d) => d,
            None => {
                log::warn!(
                    "skipping row {}: unreadable start date {:?}",
                    row + 2,
                    field(Col::Start).unwrap_or("")
                );
                skipped += 1;
                continue;
            }
        };

        let mut task = Task::new(name, project_id, start);
        if let Some(due) = field(Col::Due).and_then(parse_date) {
            task.due_date = due.max(start);
        }
        if let Some(done) = field(Col::Completed) {
            task.completed = parse_completed(done);
        }
        if let Some(assignee) = field(Col::Assignee) {
            task.assignee = assignee.to_string();
        }
        if let Some(notes) = field(Col::Notes) {
            task.notes = notes.to_string();
        }

        parent_names.push(field(Col::Parent).filter(|p| !p.is_empty()).map(str::to_string));
        tasks.push(task);
    }

    if tasks.is_empty() {
        return Err(CsvError::Invalid(if skipped > 0 {
            format!("no usable rows ({skipped} skipped)")
        } else {
            "no data rows".to_string()
        }));
    }

    // resolve parents by name, first match wins, case-insensitive
    let mut by_name: HashMap<String, Uuid> = HashMap::new();
    for task in &tasks {
        by_name.entry(task.name.to_lowercase()).or_insert(task.id);
    }
    for (task, parent) in tasks.iter_mut().zip(&parent_names) {
        if let Some(pname) = parent {
            match by_name.get(&pname.to_lowercase()) {
                Some(&pid) if pid != task.id => task.parent_id = Some(pid),
                Some(_) => {}
                None => log::warn!("parent {pname:?} not found for task {:?}", task.name),
            }
        }
    }

    // levels from the parent chains; links that loop or run past the
    // depth cap degrade to root tasks
    let parent_of: HashMap<Uuid, Option<Uuid>> =
        tasks.iter().map(|t| (t.id, t.parent_id)).collect();
    for task in tasks.iter_mut() {
        let mut level = 0u8;
        let mut cursor = task.parent_id;
        while let Some(pid) = cursor {
            level += 1;
            if level >= MAX_TASK_DEPTH {
                log::warn!(
                    "dropping parent link for {:?}: chain too deep or cyclic",
                    task.name
                );
                task.parent_id = None;
                level = 0;
                break;
            }
            cursor = parent_of.get(&pid).copied().flatten();
        }
        task.level = level;
    }

    Ok((tasks, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskEdit, TaskStore};

    fn write_csv(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.csv");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn imports_rows_with_loose_headers() {
        let (_dir, path) = write_csv(
            "Task;Start Date;Deadline;Done;Owner;Notes\n\
             Write docs;2024-06-10;2024-06-14;no;Maya;first pass\n\
             Review;10/06/2024;;yes;;\n",
        );
        let (tasks, skipped) = import_csv(&path, Uuid::new_v4()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].name, "Write docs");
        assert_eq!(tasks[0].due_date, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap());
        assert_eq!(tasks[0].assignee, "Maya");
        assert_eq!(tasks[0].notes, "first pass");
        assert!(!tasks[0].completed);
        assert!(tasks[1].completed);
        assert_eq!(tasks[1].start_date, NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    }

    #[test]
    fn resolves_parents_by_name() {
        let (_dir, path) = write_csv(
            "name,start,parent\n\
             Build,2024-06-10,\n\
             Compile,2024-06-11,Build\n\
             Link,2024-06-12,Compile\n",
        );
        let (tasks, _) = import_csv(&path, Uuid::new_v4()).unwrap();
        assert_eq!(tasks[1].parent_id, Some(tasks[0].id));
        assert_eq!(tasks[1].level, 1);
        assert_eq!(tasks[2].parent_id, Some(tasks[1].id));
        assert_eq!(tasks[2].level, 2);
    }

    #[test]
    fn cyclic_parents_degrade_to_roots() {
        let (_dir, path) = write_csv(
            "name,start,parent\n\
             Egg,2024-06-10,Hen\n\
             Hen,2024-06-10,Egg\n",
        );
        let (tasks, _) = import_csv(&path, Uuid::new_v4()).unwrap();
        assert!(tasks.iter().all(|t| t.parent_id.is_none() && t.level == 0));
    }

    #[test]
    fn bad_rows_are_skipped_not_fatal() {
        let (_dir, path) = write_csv(
            "name,start\n\
             ,2024-06-10\n\
             Broken,junk\n\
             Fine,2024-06-10\n",
        );
        let (tasks, skipped) = import_csv(&path, Uuid::new_v4()).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Fine");
        assert_eq!(skipped, 2);
    }

    #[test]
    fn missing_required_columns_is_an_error() {
        let (_dir, path) = write_csv("owner,notes\nMaya,hello\n");
        let err = import_csv(&path, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CsvError::Invalid(_)));
    }

    #[test]
    fn reads_back_what_export_writes() {
        let mut store = TaskStore::new();
        store.add_project("Alpha");
        let today = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        let root = store.add_task(today).unwrap();
        store.apply_edit(root, TaskEdit::Name("Parent".into())).unwrap();
        let child = store.add_child(root).unwrap();
        store.apply_edit(child, TaskEdit::Name("Child".into())).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.csv");
        crate::io::export_csv(&store, &path).unwrap();

        let (tasks, skipped) = import_csv(&path, Uuid::new_v4()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(tasks.len(), 2);
        let parent = tasks.iter().find(|t| t.name == "Parent").unwrap();
        let child = tasks.iter().find(|t| t.name == "Child").unwrap();
        assert_eq!(child.parent_id, Some(parent.id));
        assert_eq!(child.level, 1);
    }
}
