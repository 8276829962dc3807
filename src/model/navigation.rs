use chrono::NaiveDate;

use super::store::TaskStore;
use super::ModelError;

/// Which part of the window keyboard input is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Projects,
    Tasks,
    Details,
}

/// Fields of the detail panel, in Tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DetailField {
    Name,
    StartDate,
    DueDate,
    Notes,
}

impl DetailField {
    pub fn next(self) -> Option<Self> {
        match self {
            DetailField::Name => Some(DetailField::StartDate),
            DetailField::StartDate => Some(DetailField::DueDate),
            DetailField::DueDate => Some(DetailField::Notes),
            DetailField::Notes => None,
        }
    }

    pub fn prev(self) -> Option<Self> {
        match self {
            DetailField::Name => None,
            DetailField::StartDate => Some(DetailField::Name),
            DetailField::DueDate => Some(DetailField::StartDate),
            DetailField::Notes => Some(DetailField::DueDate),
        }
    }
}

/// Keys the navigator understands, already stripped of their egui shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Tab,
    Space,
    Delete,
    Escape,
    Copy,
    Paste,
    SelectAll,
}

/// What the UI layer has to do after a key was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavEffect {
    None,
    /// Give egui focus to a detail panel field.
    FocusDetail(DetailField),
    /// Bring the selected row into view.
    ScrollToSelection,
    /// The Tab cycle ended; let focus leave the panel normally.
    FocusOut,
}

/// Keyboard navigation state machine: tracks the active area, the detail
/// panel visibility and the logical focus inside it, and turns keys into
/// store commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigator {
    pub area: Area,
    pub detail_visible: bool,
    pub detail_field: Option<DetailField>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self {
            area: Area::Tasks,
            detail_visible: false,
            detail_field: None,
        }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the detail panel (selecting a task shows it).
    pub fn show_details(&mut self) {
        self.detail_visible = true;
    }

    /// Mouse focus on a detail field moves the machine into the details
    /// area without going through the Tab cycle.
    pub fn sync_detail_focus(&mut self, field: DetailField) {
        self.area = Area::Details;
        self.detail_field = Some(field);
        self.detail_visible = true;
    }

    /// Drop out of states whose target is no longer renderable, e.g. the
    /// details area after the selection went away.
    pub fn ensure_valid(&mut self, store: &TaskStore) {
        if self.area == Area::Details
            && (!self.detail_visible || store.selected_task().is_none())
        {
            self.area = Area::Tasks;
            self.detail_field = None;
        }
        if self.area == Area::Projects && store.projects().is_empty() {
            self.area = Area::Tasks;
        }
    }

    pub fn handle(
        &mut self,
        key: NavKey,
        ctrl: bool,
        shift: bool,
        today: NaiveDate,
        store: &mut TaskStore,
    ) -> Result<NavEffect, ModelError> {
        match self.area {
            Area::Projects => self.handle_projects(key, store),
            Area::Tasks => self.handle_tasks(key, ctrl, shift, today, store),
            Area::Details => Ok(self.handle_details(key, shift)),
        }
    }

    fn handle_projects(
        &mut self,
        key: NavKey,
        store: &mut TaskStore,
    ) -> Result<NavEffect, ModelError> {
        match key {
            NavKey::Up => {
                store.move_project_selection(-1);
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::Down => {
                store.move_project_selection(1);
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::Right => {
                let visible = store.visible_task_ids();
                if visible.is_empty() {
                    return Ok(NavEffect::None);
                }
                self.area = Area::Tasks;
                if store.selection().is_empty() {
                    store.select_task(visible[0])?;
                }
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::Escape => {
                store.clear_selection();
                Ok(NavEffect::None)
            }
            _ => Ok(NavEffect::None),
        }
    }

    fn handle_tasks(
        &mut self,
        key: NavKey,
        ctrl: bool,
        shift: bool,
        today: NaiveDate,
        store: &mut TaskStore,
    ) -> Result<NavEffect, ModelError> {
        match key {
            NavKey::Up => {
                store.move_selection(-1, shift);
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::Down => {
                store.move_selection(1, shift);
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::Right if ctrl => {
                if let Some(id) = store.selection().primary() {
                    if store.relations().has_children(id) {
                        store.toggle_task_collapsed(id)?;
                    }
                }
                Ok(NavEffect::None)
            }
            NavKey::Right => {
                if store.selected_task().is_some() && self.detail_visible {
                    self.area = Area::Details;
                    self.detail_field = Some(DetailField::Name);
                    Ok(NavEffect::FocusDetail(DetailField::Name))
                } else {
                    Ok(NavEffect::None)
                }
            }
            NavKey::Left => {
                if store.select_parent() {
                    Ok(NavEffect::ScrollToSelection)
                } else if !store.projects().is_empty() {
                    self.area = Area::Projects;
                    Ok(NavEffect::None)
                } else {
                    Ok(NavEffect::None)
                }
            }
            NavKey::Enter => {
                store.add_task(today)?;
                self.detail_visible = true;
                self.area = Area::Details;
                self.detail_field = Some(DetailField::Name);
                Ok(NavEffect::FocusDetail(DetailField::Name))
            }
            NavKey::Tab => match store.selection().primary() {
                Some(id) => {
                    store.add_child(id)?;
                    self.detail_visible = true;
                    self.area = Area::Details;
                    self.detail_field = Some(DetailField::Name);
                    Ok(NavEffect::FocusDetail(DetailField::Name))
                }
                None => Ok(NavEffect::None),
            },
            NavKey::Space => {
                store.space_toggle()?;
                Ok(NavEffect::None)
            }
            NavKey::Delete => {
                store.delete_selected()?;
                Ok(NavEffect::None)
            }
            NavKey::Copy => {
                store.copy_selection();
                Ok(NavEffect::None)
            }
            NavKey::Paste => {
                store.paste()?;
                Ok(NavEffect::ScrollToSelection)
            }
            NavKey::SelectAll => {
                store.select_all_visible();
                Ok(NavEffect::None)
            }
            NavKey::Escape => {
                // two-stage: close the panel first, then clear the selection
                if self.detail_visible && !store.selection().is_empty() {
                    self.detail_visible = false;
                } else {
                    store.clear_selection();
                }
                Ok(NavEffect::None)
            }
        }
    }

    fn handle_details(&mut self, key: NavKey, shift: bool) -> NavEffect {
        match key {
            NavKey::Tab => {
                let current = match self.detail_field {
                    Some(field) => field,
                    None => {
                        self.detail_field = Some(DetailField::Name);
                        return NavEffect::FocusDetail(DetailField::Name);
                    }
                };
                let next = if shift { current.prev() } else { current.next() };
                match next {
                    Some(field) => {
                        self.detail_field = Some(field);
                        NavEffect::FocusDetail(field)
                    }
                    None => {
                        // past the first or last field: normal focus-out
                        self.detail_field = None;
                        self.area = Area::Tasks;
                        NavEffect::FocusOut
                    }
                }
            }
            NavKey::Left => {
                self.area = Area::Tasks;
                self.detail_field = None;
                NavEffect::None
            }
            NavKey::Escape => {
                self.detail_visible = false;
                self.detail_field = None;
                self.area = Area::Tasks;
                NavEffect::None
            }
            _ => NavEffect::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskEdit;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    /// Store with one project and tasks a > b, plus root c.
    fn sample() -> (TaskStore, Uuid, Uuid, Uuid) {
        let mut store = TaskStore::new();
        store.add_project("Alpha");
        let a = store.add_task(today()).unwrap();
        store.apply_edit(a, TaskEdit::Name("a".into())).unwrap();
        let b = store.add_child(a).unwrap();
        store.apply_edit(b, TaskEdit::Name("b".into())).unwrap();
        store.clear_selection();
        let c = store.add_task(today()).unwrap();
        store.apply_edit(c, TaskEdit::Name("c".into())).unwrap();
        store.clear_selection();
        (store, a, b, c)
    }

    fn press(
        nav: &mut Navigator,
        store: &mut TaskStore,
        key: NavKey,
    ) -> NavEffect {
        nav.handle(key, false, false, today(), store).unwrap()
    }

    #[test]
    fn right_from_projects_enters_tasks_and_selects_first() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        nav.area = Area::Projects;
        let effect = press(&mut nav, &mut store, NavKey::Right);
        assert_eq!(nav.area, Area::Tasks);
        assert_eq!(store.selection().primary(), Some(a));
        assert_eq!(effect, NavEffect::ScrollToSelection);
    }

    #[test]
    fn arrows_walk_the_visible_list() {
        let (mut store, a, b, c) = sample();
        let mut nav = Navigator::new();
        press(&mut nav, &mut store, NavKey::Down);
        assert_eq!(store.selection().primary(), Some(a));
        press(&mut nav, &mut store, NavKey::Down);
        assert_eq!(store.selection().primary(), Some(b));
        press(&mut nav, &mut store, NavKey::Down);
        press(&mut nav, &mut store, NavKey::Down);
        assert_eq!(store.selection().primary(), Some(c));
        press(&mut nav, &mut store, NavKey::Up);
        assert_eq!(store.selection().primary(), Some(b));
    }

    #[test]
    fn left_steps_to_parent_before_leaving_the_area() {
        let (mut store, a, b, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(b).unwrap();
        press(&mut nav, &mut store, NavKey::Left);
        assert_eq!(store.selection().primary(), Some(a));
        assert_eq!(nav.area, Area::Tasks);
        press(&mut nav, &mut store, NavKey::Left);
        assert_eq!(nav.area, Area::Projects);
    }

    #[test]
    fn enter_adds_a_sibling_and_focuses_the_name_field() {
        let (mut store, _, b, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(b).unwrap();
        let effect = press(&mut nav, &mut store, NavKey::Enter);
        assert_eq!(effect, NavEffect::FocusDetail(DetailField::Name));
        assert_eq!(nav.area, Area::Details);
        assert!(nav.detail_visible);
        let new = store.selected_task().unwrap();
        assert_eq!(new.parent_id, store.task(b).unwrap().parent_id);
        assert_eq!(new.level, 1);
    }

    #[test]
    fn tab_adds_a_child_and_shifts_focus_into_it() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        let effect = press(&mut nav, &mut store, NavKey::Tab);
        assert_eq!(effect, NavEffect::FocusDetail(DetailField::Name));
        let new = store.selected_task().unwrap();
        assert_eq!(new.parent_id, Some(a));
        assert_eq!(new.level, 1);
    }

    #[test]
    fn space_and_delete_operate_on_the_selection() {
        let (mut store, a, b, c) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        press(&mut nav, &mut store, NavKey::Space);
        assert!(store.task(a).unwrap().completed);
        assert!(store.task(b).unwrap().completed);
        assert!(!store.task(c).unwrap().completed);

        press(&mut nav, &mut store, NavKey::Delete);
        assert!(store.task(a).is_none());
        assert!(store.task(b).is_none());
        assert!(store.task(c).is_some());
    }

    #[test]
    fn ctrl_right_toggles_collapse_instead_of_moving() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        nav.detail_visible = true;
        store.select_task(a).unwrap();
        let effect = nav
            .handle(NavKey::Right, true, false, today(), &mut store)
            .unwrap();
        assert_eq!(effect, NavEffect::None);
        assert_eq!(nav.area, Area::Tasks);
        assert!(store.task(a).unwrap().collapsed);
    }

    #[test]
    fn right_enters_details_only_with_selection_and_panel() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        press(&mut nav, &mut store, NavKey::Right);
        assert_eq!(nav.area, Area::Tasks);

        store.select_task(a).unwrap();
        nav.detail_visible = true;
        let effect = press(&mut nav, &mut store, NavKey::Right);
        assert_eq!(nav.area, Area::Details);
        assert_eq!(effect, NavEffect::FocusDetail(DetailField::Name));
    }

    #[test]
    fn detail_tab_cycle_runs_forward_and_out() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        nav.detail_visible = true;
        nav.area = Area::Details;
        nav.detail_field = Some(DetailField::Name);

        for expected in [DetailField::StartDate, DetailField::DueDate, DetailField::Notes] {
            let effect = press(&mut nav, &mut store, NavKey::Tab);
            assert_eq!(effect, NavEffect::FocusDetail(expected));
        }
        // past the last field the cycle releases focus
        let effect = press(&mut nav, &mut store, NavKey::Tab);
        assert_eq!(effect, NavEffect::FocusOut);
        assert_eq!(nav.area, Area::Tasks);
    }

    #[test]
    fn detail_shift_tab_reverses_and_exits_at_the_front() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        nav.detail_visible = true;
        nav.area = Area::Details;
        nav.detail_field = Some(DetailField::DueDate);

        let effect = nav
            .handle(NavKey::Tab, false, true, today(), &mut store)
            .unwrap();
        assert_eq!(effect, NavEffect::FocusDetail(DetailField::StartDate));
        nav.handle(NavKey::Tab, false, true, today(), &mut store).unwrap();
        let effect = nav
            .handle(NavKey::Tab, false, true, today(), &mut store)
            .unwrap();
        assert_eq!(effect, NavEffect::FocusOut);
        assert_eq!(nav.area, Area::Tasks);
    }

    #[test]
    fn escape_closes_the_panel_before_clearing_the_selection() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        nav.detail_visible = true;

        press(&mut nav, &mut store, NavKey::Escape);
        assert!(!nav.detail_visible);
        assert_eq!(store.selection().primary(), Some(a));

        press(&mut nav, &mut store, NavKey::Escape);
        assert!(store.selection().is_empty());
    }

    #[test]
    fn escape_inside_details_returns_to_tasks_first() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        nav.detail_visible = true;
        nav.area = Area::Details;
        nav.detail_field = Some(DetailField::Notes);

        press(&mut nav, &mut store, NavKey::Escape);
        assert_eq!(nav.area, Area::Tasks);
        assert!(!nav.detail_visible);
        assert_eq!(store.selection().primary(), Some(a));
    }

    #[test]
    fn copy_paste_through_the_navigator() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        press(&mut nav, &mut store, NavKey::Copy);
        let effect = press(&mut nav, &mut store, NavKey::Paste);
        assert_eq!(effect, NavEffect::ScrollToSelection);
        assert_eq!(store.tasks().len(), 5); // a+b pasted as a copy pair
        let pasted = store.selected_task().unwrap();
        assert_eq!(pasted.name, "a (copy)");
    }

    #[test]
    fn ensure_valid_drops_stale_detail_focus() {
        let (mut store, a, _, _) = sample();
        let mut nav = Navigator::new();
        store.select_task(a).unwrap();
        nav.sync_detail_focus(DetailField::Notes);
        assert_eq!(nav.area, Area::Details);

        store.clear_selection();
        nav.ensure_valid(&store);
        assert_eq!(nav.area, Area::Tasks);
        assert_eq!(nav.detail_field, None);
    }
}
