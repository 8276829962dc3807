use chrono::NaiveDate;
use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use crate::model::{TaskStatus, TaskStore};
use crate::ui::theme;

/// Actions the task table can request.
pub enum TaskTableAction {
    None,
    Clicked { id: Uuid, ctrl: bool, shift: bool },
    OpenDetails(Uuid),
    ToggleCompleted(Uuid),
    ToggleCollapse(Uuid),
    Delete(Uuid),
    Add,
}

pub struct TableOutput {
    pub action: TaskTableAction,
    pub scroll_offset: f32,
}

/// Render the task list for the selected project. Rows follow the visible
/// order (collapsed subtrees and filtered tasks excluded), which is also
/// the order keyboard navigation moves through.
pub fn show_task_table(
    store: &TaskStore,
    today: NaiveDate,
    focused: bool,
    ensure_visible: Option<Uuid>,
    scroll_to: Option<f32>,
    ui: &mut Ui,
) -> TableOutput {
    let mut action = TaskTableAction::None;
    let (ctrl, shift) = ui.input(|i| (i.modifiers.ctrl, i.modifiers.shift));

    let rows: Vec<_> = store
        .selected_project_id()
        .map(|id| store.visible_rows_for(id))
        .unwrap_or_default();

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Tasks")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", rows.len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(
        RichText::new(format!("{}  Add Task", egui_phosphor::regular::PLUS))
            .color(Color32::WHITE)
            .size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = TaskTableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(2.0);

    if rows.is_empty() {
        ui.add_space(20.0);
        ui.vertical_centered(|ui| {
            let hint = if store.selected_project_id().is_none() {
                "No project selected"
            } else {
                "No tasks yet. Press Enter to add one."
            };
            ui.label(RichText::new(hint).size(11.0).color(theme::TEXT_DIM));
        });
        return TableOutput { action, scroll_offset: 0.0 };
    }

    let mut scroll = egui::ScrollArea::vertical()
        .id_salt("task_table_scroll")
        .auto_shrink([false, false]);
    if let Some(offset) = scroll_to {
        scroll = scroll.vertical_scroll_offset(offset);
    }

    let output = scroll.show(ui, |ui| {
        for (i, task) in rows.iter().enumerate() {
            let is_selected = store.selection().contains(task.id);
            let is_primary = store.selection().primary() == Some(task.id);
            let status = task.status(today);
            let has_children = store.relations().has_children(task.id);

            let row_bg = if is_selected {
                theme::BG_SELECTED
            } else if i % 2 == 0 {
                theme::BG_PANEL
            } else {
                theme::BG_DARK
            };

            let frame = egui::Frame {
                fill: row_bg,
                rounding: egui::Rounding::same(4.0),
                inner_margin: egui::Margin::symmetric(6.0, 4.0),
                outer_margin: egui::Margin::ZERO,
                stroke: if is_primary && focused {
                    egui::Stroke::new(1.0, theme::BORDER_ACCENT)
                } else {
                    egui::Stroke::NONE
                },
                shadow: egui::epaint::Shadow::NONE,
            };

            let frame_resp = frame.show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.spacing_mut().item_spacing.x = 6.0;

                    ui.add_space(task.level as f32 * theme::INDENT_PER_LEVEL);

                    if has_children {
                        let chevron = if task.collapsed {
                            egui_phosphor::regular::CARET_RIGHT
                        } else {
                            egui_phosphor::regular::CARET_DOWN
                        };
                        let chev = ui.add(
                            egui::Button::new(
                                RichText::new(chevron).size(10.0).color(theme::TEXT_DIM),
                            )
                            .frame(false),
                        );
                        if chev.clicked() {
                            action = TaskTableAction::ToggleCollapse(task.id);
                        }
                    } else {
                        ui.add_space(14.0);
                    }

                    let (check_icon, check_color) = if task.completed {
                        (egui_phosphor::regular::CHECK_CIRCLE, theme::STATUS_COMPLETED)
                    } else {
                        (egui_phosphor::regular::CIRCLE, theme::TEXT_DIM)
                    };
                    let check = ui.add(
                        egui::Button::new(RichText::new(check_icon).size(13.0).color(check_color))
                            .frame(false),
                    );
                    if check.clicked() {
                        action = TaskTableAction::ToggleCompleted(task.id);
                    }

                    let mut name_text = RichText::new(&task.name).size(12.0).color(
                        if task.completed {
                            theme::TEXT_DIM
                        } else if is_selected {
                            Color32::WHITE
                        } else {
                            theme::TEXT_PRIMARY
                        },
                    );
                    if task.completed {
                        name_text = name_text.strikethrough();
                    }
                    ui.add(egui::Label::new(name_text).truncate());

                    ui.with_layout(
                        egui::Layout::right_to_left(egui::Align::Center),
                        |ui| {
                            ui.spacing_mut().item_spacing.x = 4.0;

                            let del = ui.add(
                                egui::Button::new(
                                    RichText::new(egui_phosphor::regular::X)
                                        .size(10.0)
                                        .color(theme::TEXT_DIM),
                                )
                                .frame(false),
                            );
                            if del.on_hover_text("Delete task").clicked() {
                                action = TaskTableAction::Delete(task.id);
                            }

                            ui.label(
                                RichText::new(status.label())
                                    .size(9.0)
                                    .color(theme::status_color(status)),
                            );

                            let due_color = if status == TaskStatus::Overdue {
                                theme::STATUS_OVERDUE
                            } else {
                                theme::TEXT_SECONDARY
                            };
                            ui.label(
                                RichText::new(task.due_date.format("%d %b").to_string())
                                    .size(10.0)
                                    .color(due_color),
                            );

                            if !task.assignee.is_empty() {
                                ui.label(
                                    RichText::new(&task.assignee)
                                        .size(9.5)
                                        .color(theme::TEXT_DIM),
                                );
                            }
                        },
                    );
                });
            });

            let row_rect = frame_resp.response.rect;
            if ensure_visible == Some(task.id) {
                ui.scroll_to_rect(row_rect, Some(egui::Align::Center));
            }

            let row_click = ui.interact(
                row_rect,
                egui::Id::new(("task-row", task.id)),
                egui::Sense::click(),
            );
            if row_click.double_clicked() {
                action = TaskTableAction::OpenDetails(task.id);
            } else if row_click.clicked() {
                action = TaskTableAction::Clicked { id: task.id, ctrl, shift };
            }

            ui.add_space(1.0);
        }
    });

    TableOutput {
        action,
        scroll_offset: output.state.offset.y,
    }
}
