use uuid::Uuid;

/// Multi-select state over the visible task list. `selected_ids` keeps
/// selection order (most recent last) without duplicates; `selected_id` is
/// always the most recently selected id. `last_index` is the range anchor,
/// an index into the visible list the selection was made against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected_id: Option<Uuid>,
    selected_ids: Vec<Uuid>,
    multi: bool,
    last_index: Option<usize>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a saved id list (selection order, most recent last).
    pub fn from_saved(ids: Vec<Uuid>) -> Self {
        let mut selected_ids: Vec<Uuid> = Vec::with_capacity(ids.len());
        for id in ids {
            if !selected_ids.contains(&id) {
                selected_ids.push(id);
            }
        }
        Self {
            selected_id: selected_ids.last().copied(),
            multi: selected_ids.len() > 1,
            selected_ids,
            last_index: None,
        }
    }

    /// Plain click: collapse to a single selection and leave multi mode.
    pub fn select(&mut self, id: Uuid, index: usize) {
        self.selected_id = Some(id);
        self.selected_ids = vec![id];
        self.multi = false;
        self.last_index = Some(index);
    }

    /// Ctrl-click: toggle membership and enter multi mode. Removing the
    /// current primary promotes the most recently selected remaining id.
    pub fn toggle(&mut self, id: Uuid, index: usize) {
        self.multi = true;
        self.last_index = Some(index);
        if let Some(pos) = self.selected_ids.iter().position(|x| *x == id) {
            self.selected_ids.remove(pos);
            if self.selected_id == Some(id) {
                self.selected_id = self.selected_ids.last().copied();
            }
        } else {
            self.selected_ids.push(id);
            self.selected_id = Some(id);
        }
    }

    /// Shift-click: replace the selection with a contiguous visible-order
    /// range. The anchor is preserved so further shift-clicks re-range from
    /// the same spot.
    pub fn select_range(&mut self, range: Vec<Uuid>, clicked: Uuid) {
        if range.is_empty() {
            return;
        }
        self.multi = true;
        self.selected_ids = range;
        self.selected_id = Some(clicked);
    }

    pub fn select_all(&mut self, visible: &[Uuid]) {
        if visible.is_empty() {
            return;
        }
        self.multi = true;
        self.selected_ids = visible.to_vec();
        self.selected_id = visible.first().copied();
        self.last_index = Some(0);
    }

    pub fn clear(&mut self) {
        self.selected_id = None;
        self.selected_ids.clear();
        self.multi = false;
        self.last_index = None;
    }

    /// Leaving multi mode keeps only the primary selection.
    pub fn set_multi(&mut self, multi: bool) {
        self.multi = multi;
        if !multi {
            match self.selected_id {
                Some(id) => self.selected_ids = vec![id],
                None => self.selected_ids.clear(),
            }
        }
    }

    /// Drop ids that no longer pass `keep` (deleted or filtered out) and
    /// repair the primary. The anchor is invalidated since the visible list
    /// has changed shape.
    pub fn retain(&mut self, keep: impl Fn(Uuid) -> bool) {
        let before = self.selected_ids.len();
        self.selected_ids.retain(|id| keep(*id));
        if self.selected_ids.len() != before {
            self.last_index = None;
        }
        match self.selected_id {
            Some(id) if keep(id) => {}
            _ => self.selected_id = self.selected_ids.last().copied(),
        }
    }

    pub fn set_anchor(&mut self, index: usize) {
        self.last_index = Some(index);
    }

    pub fn anchor(&self) -> Option<usize> {
        self.last_index
    }

    pub fn primary(&self) -> Option<Uuid> {
        self.selected_id
    }

    pub fn ids(&self) -> &[Uuid] {
        &self.selected_ids
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.selected_ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.selected_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_ids.is_empty()
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}
