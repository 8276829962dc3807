use std::collections::HashMap;

use uuid::Uuid;

use super::task::Task;
use super::ModelError;

/// Parent/child index over the task list. `children` is keyed by
/// `Option<parent id>`, with `None` holding the root tasks; child vectors
/// keep document order. The map is patched incrementally by the store and
/// can always be compared against a from-scratch rebuild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationMap {
    children: HashMap<Option<Uuid>, Vec<Uuid>>,
    parent: HashMap<Uuid, Option<Uuid>>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from scratch. Fails on the first duplicate id, which
    /// signals a corrupt task list.
    pub fn rebuild(tasks: &[Task]) -> Result<Self, ModelError> {
        let mut map = Self::new();
        for task in tasks {
            if map.parent.contains_key(&task.id) {
                return Err(ModelError::DuplicateId(task.id));
            }
            map.insert(task);
        }
        Ok(map)
    }

    /// Register a task appended to the document.
    pub fn insert(&mut self, task: &Task) {
        self.children
            .entry(task.parent_id)
            .or_default()
            .push(task.id);
        self.parent.insert(task.id, task.parent_id);
    }

    /// Unregister a task. Safe to call in any order while removing a whole
    /// subtree; links to already-removed tasks are skipped.
    pub fn remove(&mut self, id: Uuid) {
        if let Some(parent_id) = self.parent.remove(&id) {
            if let Some(siblings) = self.children.get_mut(&parent_id) {
                siblings.retain(|child| *child != id);
                if siblings.is_empty() {
                    self.children.remove(&parent_id);
                }
            }
        }
        self.children.remove(&Some(id));
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.parent.contains_key(&id)
    }

    /// Parent of `id`, `None` for roots and unknown ids.
    pub fn parent_of(&self, id: Uuid) -> Option<Uuid> {
        self.parent.get(&id).copied().flatten()
    }

    pub fn children_of(&self, parent: Option<Uuid>) -> &[Uuid] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn roots(&self) -> &[Uuid] {
        self.children_of(None)
    }

    pub fn has_children(&self, id: Uuid) -> bool {
        !self.children_of(Some(id)).is_empty()
    }

    /// All transitive children of `id`, depth-first in document order.
    pub fn descendants(&self, id: Uuid) -> Vec<Uuid> {
        let mut out = Vec::new();
        let mut stack: Vec<Uuid> = self.children_of(Some(id)).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children_of(Some(next)).iter().rev());
        }
        out
    }

    /// Ancestors of `id`, nearest parent first.
    pub fn ancestor_chain(&self, id: Uuid) -> Vec<Uuid> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent_id) = current {
            chain.push(parent_id);
            current = self.parent_of(parent_id);
        }
        chain
    }

    /// True when `ancestor` is `id` itself or appears in its ancestor chain.
    pub fn is_ancestor_or_self(&self, ancestor: Uuid, id: Uuid) -> bool {
        ancestor == id || self.ancestor_chain(id).contains(&ancestor)
    }

    /// Depth of `id` (0 for roots).
    pub fn depth(&self, id: Uuid) -> usize {
        self.ancestor_chain(id).len()
    }

    pub fn len(&self) -> usize {
        self.parent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// Invariant check used by tests: the incrementally patched map must be
    /// identical to a rebuild from the current task list.
    pub fn matches_rebuild(&self, tasks: &[Task]) -> bool {
        match Self::rebuild(tasks) {
            Ok(fresh) => fresh == *self,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn task(name: &str, project: Uuid, parent: Option<&Task>) -> Task {
        let start = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let mut t = Task::new(name, project, start);
        if let Some(p) = parent {
            t.parent_id = Some(p.id);
            t.level = p.level + 1;
        }
        t
    }

    fn sample() -> (Vec<Task>, RelationMap) {
        let project = Uuid::new_v4();
        let a = task("a", project, None);
        let b = task("b", project, Some(&a));
        let c = task("c", project, Some(&b));
        let d = task("d", project, None);
        let tasks = vec![a, b, c, d];
        let map = RelationMap::rebuild(&tasks).unwrap();
        (tasks, map)
    }

    #[test]
    fn rebuild_indexes_children_in_document_order() {
        let (tasks, map) = sample();
        assert_eq!(map.roots(), &[tasks[0].id, tasks[3].id]);
        assert_eq!(map.children_of(Some(tasks[0].id)), &[tasks[1].id]);
        assert_eq!(map.children_of(Some(tasks[1].id)), &[tasks[2].id]);
        assert!(map.children_of(Some(tasks[2].id)).is_empty());
    }

    #[test]
    fn rebuild_refuses_duplicate_ids() {
        let (mut tasks, _) = sample();
        let dup = tasks[1].clone();
        tasks.push(dup);
        assert_eq!(
            RelationMap::rebuild(&tasks),
            Err(ModelError::DuplicateId(tasks[1].id))
        );
    }

    #[test]
    fn descendants_are_depth_first() {
        let (tasks, map) = sample();
        assert_eq!(map.descendants(tasks[0].id), vec![tasks[1].id, tasks[2].id]);
        assert!(map.descendants(tasks[3].id).is_empty());
    }

    #[test]
    fn ancestor_chain_walks_to_root() {
        let (tasks, map) = sample();
        assert_eq!(
            map.ancestor_chain(tasks[2].id),
            vec![tasks[1].id, tasks[0].id]
        );
        assert_eq!(map.depth(tasks[2].id), 2);
        assert!(map.is_ancestor_or_self(tasks[0].id, tasks[2].id));
        assert!(!map.is_ancestor_or_self(tasks[3].id, tasks[2].id));
    }

    #[test]
    fn incremental_removal_matches_rebuild() {
        let (mut tasks, mut map) = sample();
        // remove b and its child c, in parent-first order on purpose
        let b = tasks[1].id;
        let c = tasks[2].id;
        map.remove(b);
        map.remove(c);
        tasks.retain(|t| t.id != b && t.id != c);
        assert!(map.matches_rebuild(&tasks));
        assert!(!map.contains(b));
        assert!(map.children_of(Some(tasks[0].id)).is_empty());
    }

    #[test]
    fn incremental_insert_matches_rebuild() {
        let (mut tasks, mut map) = sample();
        let e = task("e", tasks[0].project_id, Some(&tasks[0]));
        map.insert(&e);
        tasks.push(e);
        assert!(map.matches_rebuild(&tasks));
    }
}
