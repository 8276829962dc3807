use chrono::NaiveDate;
use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::model::{DetailField, Task, TaskEdit, TaskStore};
use crate::ui::theme;

/// Actions the detail panel can request.
pub enum DetailAction {
    None,
    Edit(TaskEdit),
    AddSubtask(Uuid),
    Delete(Uuid),
    Close,
}

pub struct DetailOutput {
    pub action: DetailAction,
    /// Field that currently owns keyboard focus, if any. Lets the
    /// keyboard layer track focus moved by mouse clicks.
    pub focused_field: Option<DetailField>,
}

/// Text scratch buffers for the editable fields. Refreshed from the
/// store whenever the shown task or the document revision changes, so
/// edits applied elsewhere (clamping, paste) show up immediately.
#[derive(Default)]
pub struct DetailState {
    task_id: Option<Uuid>,
    revision: u64,
    name: String,
    notes: String,
    assignee: String,
}

impl DetailState {
    fn refresh(&mut self, task: &Task, revision: u64) {
        if self.task_id == Some(task.id) && self.revision == revision {
            return;
        }
        self.task_id = Some(task.id);
        self.revision = revision;
        self.name = task.name.clone();
        self.notes = task.notes.clone();
        self.assignee = task.assignee.clone();
    }
}

/// Render the detail side panel for the selected task. Every change is
/// reported as a [`TaskEdit`]; the panel never mutates the store itself.
pub fn show_detail_panel(
    task: &Task,
    store: &TaskStore,
    state: &mut DetailState,
    focus: Option<DetailField>,
    today: NaiveDate,
    ui: &mut Ui,
) -> DetailOutput {
    let mut action = DetailAction::None;
    let mut focused_field = None;
    let task_id = task.id;
    state.refresh(task, store.revision());

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Details")
                .strong()
                .size(13.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let close = ui.add(
                egui::Button::new(
                    RichText::new(egui_phosphor::regular::X)
                        .size(11.0)
                        .color(theme::TEXT_DIM),
                )
                .frame(false),
            );
            if close.on_hover_text("Close panel (Esc)").clicked() {
                action = DetailAction::Close;
            }
        });
    });

    // breadcrumb for subtasks
    if task.level > 0 {
        let chain = store.relations().ancestor_chain(task_id);
        let path: Vec<&str> = chain
            .iter()
            .rev()
            .filter_map(|id| store.task(*id).map(|t| t.name.as_str()))
            .collect();
        if !path.is_empty() {
            ui.label(
                RichText::new(format!("{} /", path.join(" / ")))
                    .size(9.5)
                    .color(theme::TEXT_DIM),
            );
        }
    }
    ui.add_space(4.0);

    let frame = egui::Frame {
        fill: theme::BG_DARK,
        rounding: egui::Rounding::same(5.0),
        inner_margin: egui::Margin::same(8.0),
        outer_margin: egui::Margin::ZERO,
        stroke: egui::Stroke::new(1.0, theme::BORDER_SUBTLE),
        shadow: egui::epaint::Shadow::NONE,
    };

    frame.show(ui, |ui| {
        ui.spacing_mut().item_spacing.y = 6.0;
        ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;

        // ── Name ─────────────────────────────────────────────────────
        ui.label(
            RichText::new("Name")
                .size(10.0)
                .color(theme::TEXT_DIM)
                .strong(),
        );
        let name_resp = ui.add_sized(
            [ui.available_width(), 24.0],
            egui::TextEdit::singleline(&mut state.name)
                .font(egui::FontId::proportional(12.0))
                .text_color(theme::TEXT_PRIMARY),
        );
        if focus == Some(DetailField::Name) {
            name_resp.request_focus();
        }
        if name_resp.has_focus() {
            focused_field = Some(DetailField::Name);
        }
        if name_resp.changed() {
            action = DetailAction::Edit(TaskEdit::Name(state.name.clone()));
        }

        ui.add_space(2.0);

        // ── Dates ────────────────────────────────────────────────────
        ui.horizontal(|ui| {
            ui.vertical(|ui| {
                ui.label(
                    RichText::new("Start")
                        .size(10.0)
                        .color(theme::TEXT_DIM)
                        .strong(),
                );
                let mut start = task.start_date;
                let resp = ui.add(
                    egui_extras::DatePickerButton::new(&mut start).id_salt("dp_start"),
                );
                if focus == Some(DetailField::StartDate) {
                    resp.request_focus();
                }
                if resp.has_focus() {
                    focused_field = Some(DetailField::StartDate);
                }
                if resp.changed() && start != task.start_date {
                    action = DetailAction::Edit(TaskEdit::StartDate(start));
                }
            });

            ui.add_space(8.0);

            ui.vertical(|ui| {
                ui.label(
                    RichText::new("Due")
                        .size(10.0)
                        .color(theme::TEXT_DIM)
                        .strong(),
                );
                let mut due = task.due_date;
                let resp = ui.add(
                    egui_extras::DatePickerButton::new(&mut due).id_salt("dp_due"),
                );
                if focus == Some(DetailField::DueDate) {
                    resp.request_focus();
                }
                if resp.has_focus() {
                    focused_field = Some(DetailField::DueDate);
                }
                if resp.changed() && due != task.due_date {
                    action = DetailAction::Edit(TaskEdit::DueDate(due));
                }
            });
        });

        ui.label(
            RichText::new(format!("{} days", task.duration_days()))
                .size(9.5)
                .color(theme::TEXT_DIM),
        );

        ui.add_space(2.0);

        // ── Assignee ─────────────────────────────────────────────────
        ui.label(
            RichText::new("Assignee")
                .size(10.0)
                .color(theme::TEXT_DIM)
                .strong(),
        );
        let assignee_resp = ui.add_sized(
            [ui.available_width(), 22.0],
            egui::TextEdit::singleline(&mut state.assignee)
                .font(egui::FontId::proportional(11.0))
                .hint_text("Unassigned")
                .text_color(theme::TEXT_SECONDARY),
        );
        if assignee_resp.changed() {
            action = DetailAction::Edit(TaskEdit::Assignee(state.assignee.clone()));
        }

        ui.add_space(2.0);

        // ── Status ───────────────────────────────────────────────────
        let status = task.status(today);
        ui.horizontal(|ui| {
            let mut done = task.completed;
            let resp = ui.checkbox(&mut done, "");
            ui.label(
                RichText::new("Completed")
                    .size(11.0)
                    .color(theme::TEXT_SECONDARY),
            );
            ui.label(
                RichText::new(status.label())
                    .size(10.0)
                    .color(theme::status_color(status)),
            );
            if resp.changed() {
                action = DetailAction::Edit(TaskEdit::Completed(done));
            }
        });
        if let Some(stamp) = task.completion_date {
            ui.label(
                RichText::new(format!("Done {}", stamp.format("%Y-%m-%d %H:%M")))
                    .size(9.0)
                    .color(theme::TEXT_DIM),
            );
        }

        ui.add_space(2.0);

        // ── Notes ────────────────────────────────────────────────────
        ui.label(
            RichText::new("Notes")
                .size(10.0)
                .color(theme::TEXT_DIM)
                .strong(),
        );
        let notes_resp = ui.add_sized(
            [ui.available_width(), 60.0],
            egui::TextEdit::multiline(&mut state.notes)
                .font(egui::FontId::proportional(11.0))
                .text_color(theme::TEXT_SECONDARY)
                .hint_text("Add notes..."),
        );
        if focus == Some(DetailField::Notes) {
            notes_resp.request_focus();
        }
        if notes_resp.has_focus() {
            focused_field = Some(DetailField::Notes);
        }
        if notes_resp.changed() {
            action = DetailAction::Edit(TaskEdit::Notes(state.notes.clone()));
        }

        ui.add_space(4.0);
        ui.separator();
        ui.add_space(2.0);

        // ── Actions ──────────────────────────────────────────────────
        let can_nest = (task.level as usize + 1) < crate::model::MAX_TASK_DEPTH as usize;
        if can_nest {
            let btn = egui::Button::new(
                RichText::new(format!("{}  Add Subtask", egui_phosphor::regular::PLUS))
                    .color(Color32::WHITE)
                    .size(12.0),
            )
            .fill(theme::ACCENT)
            .rounding(egui::Rounding::same(4.0));
            if ui.add_sized([ui.available_width(), 26.0], btn).clicked() {
                action = DetailAction::AddSubtask(task_id);
            }
        }

        let del_btn = egui::Button::new(
            RichText::new("Delete Task")
                .color(theme::STATUS_OVERDUE)
                .size(11.0),
        )
        .frame(false);
        if ui.add(del_btn).clicked() {
            action = DetailAction::Delete(task_id);
        }
    });

    DetailOutput { action, focused_field }
}
