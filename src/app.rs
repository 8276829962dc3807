use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use egui::Color32;
use uuid::Uuid;

use crate::io::{self, AppSettings, Snapshot};
use crate::model::{
    Area, DetailField, ModelError, NavEffect, NavKey, Navigator, Project, Task, TaskStore,
};
use crate::timeline::{DateRange, DynamicSizes, ScrollPane, ScrollSync, TimelineZoom, ViewUnit};
use crate::ui::detail_panel::{self, DetailAction, DetailState};
use crate::ui::project_panel::{self, ProjectPanelAction};
use crate::ui::task_table::{self, TaskTableAction};
use crate::ui::timeline_chart::{self, ChartAction};
use crate::ui::{dialogs, theme, toolbar};

/// Top-level application state.
pub struct TasklineApp {
    pub store: TaskStore,
    pub navigator: Navigator,
    pub zoom: TimelineZoom,
    pub unit: ViewUnit,

    pub data_path: PathBuf,
    settings_path: PathBuf,
    last_saved_revision: u64,

    scroll_sync: ScrollSync,
    chart_viewport_width: f32,
    pending_center_today: bool,
    pending_focus: Option<DetailField>,
    ensure_visible: Option<Uuid>,
    detail_state: DetailState,

    pub show_about: bool,
    pub show_shortcuts: bool,
    pub edit_project_id: Option<Uuid>,
    pub edit_project_name: String,
    pub edit_project_color: Color32,

    pub status_message: String,
}

impl TasklineApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Register Phosphor icon font as a fallback so icons render inline with text
        let mut fonts = egui::FontDefinitions::default();
        egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
        cc.egui_ctx.set_fonts(fonts);

        let settings_path = AppSettings::settings_path();
        let settings = AppSettings::load(&settings_path);
        let data_path = io::default_data_path();

        let mut store = match io::load_snapshot(&data_path) {
            Ok(snapshot) => match TaskStore::from_parts(
                snapshot.projects,
                snapshot.tasks,
                snapshot.selected_project_id,
                snapshot.selected_task_ids,
            ) {
                Ok(store) => store,
                Err(err) => {
                    log::warn!("workspace file is unusable: {err}");
                    Self::sample_workspace()
                }
            },
            Err(err) => {
                log::info!("no workspace at {}: {err}", data_path.display());
                Self::sample_workspace()
            }
        };
        store.set_show_completed(settings.show_completed);

        let mut navigator = Navigator::new();
        navigator.detail_visible = settings.detail_visible && store.selected_task().is_some();

        let last_saved_revision = store.revision();

        Self {
            store,
            navigator,
            zoom: settings.zoom(),
            unit: settings.view_unit,
            data_path,
            settings_path,
            last_saved_revision,
            scroll_sync: ScrollSync::default(),
            chart_viewport_width: 0.0,
            pending_center_today: true,
            pending_focus: None,
            ensure_visible: None,
            detail_state: DetailState::default(),
            show_about: false,
            show_shortcuts: false,
            edit_project_id: None,
            edit_project_name: String::new(),
            edit_project_color: theme::ACCENT,
            status_message: "Ready".to_string(),
        }
    }

    /// Starter content for first launch or an unreadable workspace file.
    fn sample_workspace() -> TaskStore {
        let today = chrono::Local::now().date_naive();

        let work = Project::new("Website Redesign", Project::palette_color(0));
        let personal = Project::new("Personal", Project::palette_color(1));

        let mut design = Task::new("Design mockups", work.id, today - Duration::days(10));
        design.due_date = today + Duration::days(4);

        let mut wireframes = Task::new_child("Wireframes", &design);
        wireframes.start_date = today - Duration::days(10);
        wireframes.due_date = today - Duration::days(6);
        wireframes.set_completed(true, Utc::now());

        let mut visual = Task::new_child("Visual design", &design);
        visual.start_date = today - Duration::days(5);
        visual.due_date = today + Duration::days(4);
        visual.assignee = "Maya".to_string();

        let mut frontend = Task::new("Implement frontend", work.id, today + Duration::days(2));
        frontend.due_date = today + Duration::days(16);

        let mut launch = Task::new("Launch checklist", work.id, today + Duration::days(14));
        launch.due_date = today + Duration::days(21);

        let mut taxes = Task::new("File taxes", personal.id, today - Duration::days(20));
        taxes.due_date = today - Duration::days(3);

        let selected = work.id;
        match TaskStore::from_parts(
            vec![work, personal],
            vec![design, wireframes, visual, frontend, launch, taxes],
            Some(selected),
            Vec::new(),
        ) {
            Ok(store) => store,
            Err(err) => {
                log::warn!("sample workspace rejected: {err}");
                TaskStore::new()
            }
        }
    }

    // ── File operations ──

    pub fn new_workspace(&mut self) {
        self.store = TaskStore::new();
        self.store.add_project("My Tasks");
        self.navigator = Navigator::new();
        self.detail_state = DetailState::default();
        self.data_path = io::default_data_path();
        self.last_saved_revision = u64::MAX;
        self.status_message = "New workspace".to_string();
    }

    pub fn open_workspace(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Taskline Workspace", &["json"])
            .pick_file()
        else {
            return;
        };
        let loaded = io::load_snapshot(&path)
            .map_err(|err| err.to_string())
            .and_then(|snap| {
                TaskStore::from_parts(
                    snap.projects,
                    snap.tasks,
                    snap.selected_project_id,
                    snap.selected_task_ids,
                )
                .map_err(|err| err.to_string())
            });
        match loaded {
            Ok(mut store) => {
                store.set_show_completed(self.store.show_completed());
                self.store = store;
                self.data_path = path;
                self.navigator = Navigator::new();
                self.detail_state = DetailState::default();
                self.last_saved_revision = self.store.revision();
                self.pending_center_today = true;
                self.status_message = "Workspace loaded".to_string();
            }
            Err(err) => self.status_message = format!("Error loading workspace: {err}"),
        }
    }

    pub fn save_workspace(&mut self) {
        match io::save_snapshot(&self.snapshot(), &self.data_path) {
            Ok(()) => {
                self.last_saved_revision = self.store.revision();
                self.status_message = "Workspace saved".to_string();
            }
            Err(err) => self.status_message = format!("Error saving workspace: {err}"),
        }
    }

    pub fn save_workspace_as(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Taskline Workspace", &["json"])
            .set_file_name("taskline_workspace.json")
            .save_file()
        else {
            return;
        };
        self.data_path = path;
        self.save_workspace();
    }

    pub fn import_csv(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv", "txt"])
            .pick_file()
        else {
            return;
        };
        if self.store.selected_project_id().is_none() {
            let name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("Imported")
                .to_string();
            self.store.add_project(name);
        }
        let Some(project_id) = self.store.selected_project_id() else {
            return;
        };
        match io::import_csv(&path, project_id) {
            Ok((tasks, skipped)) => {
                if let Some(count) = self.run(|store| store.import_tasks(tasks)) {
                    self.status_message = if skipped > 0 {
                        format!("Imported {count} tasks ({skipped} rows skipped)")
                    } else {
                        format!("Imported {count} tasks")
                    };
                }
            }
            Err(err) => self.status_message = format!("CSV import failed: {err}"),
        }
    }

    pub fn export_csv(&mut self) {
        if self.store.tasks().is_empty() {
            self.status_message = "Nothing to export: workspace has no tasks".to_string();
            return;
        }
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name("taskline_export.csv")
            .save_file()
        else {
            return;
        };
        match io::export_csv(&self.store, &path) {
            Ok(count) => self.status_message = format!("Exported {count} tasks to CSV"),
            Err(err) => self.status_message = format!("CSV export failed: {err}"),
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            projects: self.store.projects().to_vec(),
            tasks: self.store.tasks().to_vec(),
            selected_project_id: self.store.selected_project_id(),
            selected_task_ids: self.store.selection().ids().to_vec(),
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.store.revision() != self.last_saved_revision
    }

    fn persist(&mut self) {
        if self.is_dirty() {
            match io::save_snapshot(&self.snapshot(), &self.data_path) {
                Ok(()) => self.last_saved_revision = self.store.revision(),
                Err(err) => log::warn!("could not save workspace on exit: {err}"),
            }
        }
        let settings = AppSettings {
            view_unit: self.unit,
            zoom_level: self.zoom.level(),
            show_completed: self.store.show_completed(),
            detail_visible: self.navigator.detail_visible,
        };
        settings.save(&self.settings_path);
    }

    // ── View commands ──

    pub fn fit_to_window(&mut self) {
        let today = chrono::Local::now().date_naive();
        let range = DateRange::around(today, self.unit);
        if self
            .zoom
            .fit_to_screen(self.chart_viewport_width, range.bucket_count(), self.unit)
        {
            self.status_message = format!("Zoom {}%", self.zoom.level());
        }
        self.pending_center_today = true;
    }

    pub fn center_on_today(&mut self) {
        self.pending_center_today = true;
    }

    // ── Project edit dialog ──

    fn open_project_editor(&mut self, id: Uuid) {
        if let Some(project) = self.store.project(id) {
            self.edit_project_name = project.name.clone();
            self.edit_project_color = project.color;
            self.edit_project_id = Some(id);
        }
    }

    pub fn apply_project_edit(&mut self) {
        let Some(id) = self.edit_project_id.take() else {
            return;
        };
        let trimmed = self.edit_project_name.trim();
        let name = if trimmed.is_empty() {
            "Untitled".to_string()
        } else {
            trimmed.to_string()
        };
        let color = self.edit_project_color;
        self.run(|store| store.rename_project(id, name));
        self.run(|store| store.set_project_color(id, color));
    }

    fn delete_project_confirmed(&mut self, id: Uuid) {
        let Some(name) = self.store.project(id).map(|p| p.name.clone()) else {
            return;
        };
        let count = self
            .store
            .tasks()
            .iter()
            .filter(|task| task.project_id == id)
            .count();
        let confirm = rfd::MessageDialog::new()
            .set_title("Delete Project")
            .set_description(format!("Delete '{name}' and its {count} tasks?"))
            .set_buttons(rfd::MessageButtons::YesNo)
            .show();
        if confirm == rfd::MessageDialogResult::Yes {
            if self.run(|store| store.delete_project(id)).is_some() {
                self.status_message = format!("Deleted '{name}'");
            }
        }
    }

    // ── Command plumbing ──

    /// Run a store command; failures land in the status bar.
    fn run<T>(
        &mut self,
        command: impl FnOnce(&mut TaskStore) -> Result<T, ModelError>,
    ) -> Option<T> {
        match command(&mut self.store) {
            Ok(value) => Some(value),
            Err(err) => {
                log::warn!("command failed: {err}");
                self.status_message = err.to_string();
                None
            }
        }
    }

    /// Put the primary task in the detail panel with the name field focused.
    fn edit_primary_task(&mut self) {
        self.navigator.sync_detail_focus(DetailField::Name);
        self.pending_focus = Some(DetailField::Name);
        self.ensure_visible = self.store.selection().primary();
    }

    fn apply_effect(&mut self, ctx: &egui::Context, effect: NavEffect) {
        match effect {
            NavEffect::None => {}
            NavEffect::FocusDetail(field) => self.pending_focus = Some(field),
            NavEffect::ScrollToSelection => {
                self.ensure_visible = self.store.selection().primary();
            }
            NavEffect::FocusOut => ctx.memory_mut(|mem| {
                if let Some(focused) = mem.focused() {
                    mem.surrender_focus(focused);
                }
            }),
        }
    }

    fn handle_keys(&mut self, ctx: &egui::Context, today: NaiveDate) {
        use egui::{Key, Modifiers};

        // Modal dialogs own the keyboard while they are open.
        if self.show_about || self.show_shortcuts || self.edit_project_id.is_some() {
            return;
        }

        if ctx.input_mut(|i| i.consume_key(Modifiers::CTRL, Key::S)) {
            self.save_workspace();
        }

        let typing = ctx.wants_keyboard_input();
        let in_details = self.navigator.area == Area::Details;
        let consume =
            |modifiers: Modifiers, key: Key| ctx.input_mut(|i| i.consume_key(modifiers, key));

        let mut pressed: Option<(NavKey, bool, bool)> = None;
        if consume(Modifiers::NONE, Key::Escape) {
            pressed = Some((NavKey::Escape, false, false));
        } else if in_details && consume(Modifiers::SHIFT, Key::Tab) {
            pressed = Some((NavKey::Tab, false, true));
        } else if (in_details || !typing) && consume(Modifiers::NONE, Key::Tab) {
            pressed = Some((NavKey::Tab, false, false));
        } else if !typing {
            if consume(Modifiers::CTRL, Key::ArrowRight) {
                pressed = Some((NavKey::Right, true, false));
            } else if consume(Modifiers::SHIFT, Key::ArrowUp) {
                pressed = Some((NavKey::Up, false, true));
            } else if consume(Modifiers::SHIFT, Key::ArrowDown) {
                pressed = Some((NavKey::Down, false, true));
            } else if consume(Modifiers::NONE, Key::ArrowUp) {
                pressed = Some((NavKey::Up, false, false));
            } else if consume(Modifiers::NONE, Key::ArrowDown) {
                pressed = Some((NavKey::Down, false, false));
            } else if consume(Modifiers::NONE, Key::ArrowLeft) {
                pressed = Some((NavKey::Left, false, false));
            } else if consume(Modifiers::NONE, Key::ArrowRight) {
                pressed = Some((NavKey::Right, false, false));
            } else if consume(Modifiers::NONE, Key::Enter) {
                pressed = Some((NavKey::Enter, false, false));
            } else if consume(Modifiers::NONE, Key::Space) {
                pressed = Some((NavKey::Space, false, false));
            } else if consume(Modifiers::NONE, Key::Delete)
                || consume(Modifiers::NONE, Key::Backspace)
            {
                pressed = Some((NavKey::Delete, false, false));
            } else if consume(Modifiers::CTRL, Key::C) {
                pressed = Some((NavKey::Copy, true, false));
            } else if consume(Modifiers::CTRL, Key::V) {
                pressed = Some((NavKey::Paste, true, false));
            } else if consume(Modifiers::CTRL, Key::A) {
                pressed = Some((NavKey::SelectAll, true, false));
            }
        }

        if let Some((key, ctrl, shift)) = pressed {
            match self.navigator.handle(key, ctrl, shift, today, &mut self.store) {
                Ok(effect) => self.apply_effect(ctx, effect),
                Err(err) => {
                    log::warn!("command failed: {err}");
                    self.status_message = err.to_string();
                }
            }
        }
    }

    // ── Panel action dispatch ──

    fn dispatch_project(&mut self, action: ProjectPanelAction) {
        match action {
            ProjectPanelAction::None => {}
            ProjectPanelAction::Select(id) => {
                self.run(|store| store.select_project(id));
            }
            ProjectPanelAction::Add => {
                let id = self.store.add_project("New Project");
                self.open_project_editor(id);
            }
            ProjectPanelAction::Edit(id) => self.open_project_editor(id),
            ProjectPanelAction::Delete(id) => self.delete_project_confirmed(id),
            ProjectPanelAction::ToggleCollapsed(id) => {
                self.run(|store| store.toggle_project_collapsed(id));
            }
        }
    }

    fn dispatch_table(&mut self, action: TaskTableAction, today: NaiveDate) {
        match action {
            TaskTableAction::None => {}
            TaskTableAction::Clicked { id, ctrl, shift } => {
                if self.run(|store| store.click_task(id, ctrl, shift)).is_some() {
                    self.navigator.area = Area::Tasks;
                    self.navigator.show_details();
                }
            }
            TaskTableAction::OpenDetails(id) => {
                if self.run(|store| store.click_task(id, false, false)).is_some() {
                    self.edit_primary_task();
                }
            }
            TaskTableAction::ToggleCompleted(id) => {
                self.run(|store| store.toggle_completion(id));
            }
            TaskTableAction::ToggleCollapse(id) => {
                self.run(|store| store.toggle_task_collapsed(id));
            }
            TaskTableAction::Delete(id) => {
                if self.run(|store| store.delete_many(&[id])).is_some() {
                    self.status_message = "Task deleted".to_string();
                }
            }
            TaskTableAction::Add => {
                if self.run(|store| store.add_task(today)).is_some() {
                    self.edit_primary_task();
                }
            }
        }
    }

    fn dispatch_detail(&mut self, action: DetailAction) {
        match action {
            DetailAction::None => {}
            DetailAction::Edit(edit) => {
                if let Some(id) = self.store.selection().primary() {
                    self.run(|store| store.apply_edit(id, edit));
                }
            }
            DetailAction::AddSubtask(parent) => {
                if self.run(|store| store.add_child(parent)).is_some() {
                    self.edit_primary_task();
                }
            }
            DetailAction::Delete(id) => {
                if self.run(|store| store.delete_many(&[id])).is_some() {
                    self.status_message = "Task deleted".to_string();
                }
            }
            DetailAction::Close => {
                self.navigator.detail_visible = false;
                self.navigator.detail_field = None;
                self.navigator.area = Area::Tasks;
            }
        }
    }

    fn dispatch_chart(&mut self, action: ChartAction) {
        match action {
            ChartAction::None => {}
            ChartAction::Clicked { id, ctrl, shift } => {
                if self.run(|store| store.click_task(id, ctrl, shift)).is_some() {
                    self.navigator.area = Area::Tasks;
                    self.navigator.show_details();
                }
            }
            ChartAction::DragDates { id, start, due } => {
                if !self.store.selection().contains(id) {
                    self.run(|store| store.click_task(id, false, false));
                }
                if self.run(|store| store.set_dates(id, start, due)).is_some() {
                    if let Some(task) = self.store.task(id) {
                        self.status_message = format!(
                            "'{}'  {} → {}",
                            task.name,
                            task.start_date.format("%Y-%m-%d"),
                            task.due_date.format("%Y-%m-%d")
                        );
                    }
                }
            }
            ChartAction::SelectProject(id) => {
                self.run(|store| store.select_project(id));
            }
            ChartAction::ClearSelection => self.store.clear_selection(),
        }
    }
}

impl eframe::App for TasklineApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        theme::apply_theme(ctx);
        let today = chrono::Local::now().date_naive();
        let now = ctx.input(|i| i.time);

        self.handle_keys(ctx, today);
        self.navigator.ensure_valid(&self.store);

        let range = DateRange::around(today, self.unit);
        let sizes = DynamicSizes::compute(self.zoom.level(), self.unit);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(theme::font_status())
                            .color(theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let totals = self.store.totals(today);
                        ui.label(
                            egui::RichText::new(format!(
                                "{}%  ·  {}",
                                self.zoom.level(),
                                self.unit.label()
                            ))
                            .size(10.5)
                            .color(theme::TEXT_DIM),
                        );
                        if totals.overdue > 0 {
                            ui.label(
                                egui::RichText::new(format!("{} late  ·", totals.overdue))
                                    .size(10.5)
                                    .color(theme::STATUS_OVERDUE),
                            );
                        }
                        ui.label(
                            egui::RichText::new(format!(
                                "{}/{} done  ·",
                                totals.completed, totals.total
                            ))
                            .size(10.5)
                            .color(theme::TEXT_DIM),
                        );
                    });
                });
            });

        let project_action = egui::SidePanel::left("project_panel")
            .default_width(190.0)
            .min_width(150.0)
            .max_width(280.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(6.0)),
            )
            .show(ctx, |ui| {
                project_panel::show_project_panel(
                    &self.store,
                    today,
                    self.navigator.area == Area::Projects,
                    ui,
                )
            })
            .inner;
        self.dispatch_project(project_action);

        if self.navigator.detail_visible && self.store.selected_task().is_some() {
            let focus = self.pending_focus.take();
            let detail_out = egui::SidePanel::right("detail_panel")
                .default_width(270.0)
                .min_width(220.0)
                .max_width(400.0)
                .resizable(true)
                .frame(
                    egui::Frame::default()
                        .fill(theme::BG_PANEL)
                        .inner_margin(egui::Margin::same(8.0)),
                )
                .show(ctx, |ui| {
                    let Some(task) = self.store.selected_task() else {
                        return detail_panel::DetailOutput {
                            action: DetailAction::None,
                            focused_field: None,
                        };
                    };
                    detail_panel::show_detail_panel(
                        task,
                        &self.store,
                        &mut self.detail_state,
                        focus,
                        today,
                        ui,
                    )
                })
                .inner;
            if let Some(field) = detail_out.focused_field {
                if self.navigator.area != Area::Details
                    || self.navigator.detail_field != Some(field)
                {
                    self.navigator.sync_detail_focus(field);
                }
            }
            self.dispatch_detail(detail_out.action);
        }

        let table_scroll = self.scroll_sync.take_pending(ScrollPane::Table);
        let ensure = self.ensure_visible.take();
        let table_out = egui::SidePanel::left("task_panel")
            .default_width(360.0)
            .min_width(260.0)
            .max_width(520.0)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(6.0)),
            )
            .show(ctx, |ui| {
                task_table::show_task_table(
                    &self.store,
                    today,
                    self.navigator.area == Area::Tasks,
                    ensure,
                    table_scroll,
                    ui,
                )
            })
            .inner;
        self.scroll_sync
            .report(now, ScrollPane::Table, table_out.scroll_offset);
        self.dispatch_table(table_out.action, today);

        let chart_scroll_y = self.scroll_sync.take_pending(ScrollPane::Chart);
        let chart_scroll_x = if self.pending_center_today && self.chart_viewport_width > 0.0 {
            self.pending_center_today = false;
            Some(range.centered_scroll_x(today, sizes.cell_width, self.chart_viewport_width))
        } else {
            None
        };
        let chart_out = egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(theme::BG_DARK))
            .show(ctx, |ui| {
                timeline_chart::show_timeline_chart(
                    &self.store,
                    &range,
                    &sizes,
                    &mut self.zoom,
                    today,
                    chart_scroll_x,
                    chart_scroll_y,
                    ui,
                )
            })
            .inner;
        self.chart_viewport_width = chart_out.viewport_width;
        self.scroll_sync
            .report(now, ScrollPane::Chart, chart_out.scroll_offset);
        self.dispatch_chart(chart_out.action);

        // Dialogs sit on top of everything else.
        if self.show_about {
            dialogs::show_about_dialog(self, ctx);
        }
        if self.show_shortcuts {
            dialogs::show_shortcuts_dialog(self, ctx);
        }
        if self.edit_project_id.is_some() {
            dialogs::show_edit_project_dialog(self, ctx);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.persist();
    }
}
