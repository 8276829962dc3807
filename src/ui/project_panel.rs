use chrono::NaiveDate;
use egui::{RichText, Ui};
use uuid::Uuid;

use crate::model::TaskStore;
use crate::ui::theme;

/// Actions the project sidebar can request.
pub enum ProjectPanelAction {
    None,
    Select(Uuid),
    Add,
    Edit(Uuid),
    Delete(Uuid),
    ToggleCollapsed(Uuid),
}

/// Render the project sidebar. `focused` marks keyboard focus so the
/// selected row gets an accent ring.
pub fn show_project_panel(
    store: &TaskStore,
    today: NaiveDate,
    focused: bool,
    ui: &mut Ui,
) -> ProjectPanelAction {
    let mut action = ProjectPanelAction::None;

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(
            RichText::new("Projects")
                .strong()
                .size(15.0)
                .color(theme::TEXT_PRIMARY),
        );
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({})", store.projects().len()))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(
        RichText::new(format!("{}  Add Project", egui_phosphor::regular::PLUS))
            .color(egui::Color32::WHITE)
            .size(12.0),
    )
    .fill(theme::ACCENT)
    .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 30.0], btn).clicked() {
        action = ProjectPanelAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();
    ui.add_space(2.0);

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for project in store.projects() {
                let is_selected = store.selected_project_id() == Some(project.id);
                let stats = store.project_stats(project.id, today);

                let row_bg = if is_selected {
                    theme::BG_SELECTED
                } else {
                    theme::BG_PANEL
                };
                let frame = egui::Frame {
                    fill: row_bg,
                    rounding: egui::Rounding::same(4.0),
                    inner_margin: egui::Margin::symmetric(6.0, 5.0),
                    outer_margin: egui::Margin::ZERO,
                    stroke: if is_selected && focused {
                        egui::Stroke::new(1.0, theme::BORDER_ACCENT)
                    } else {
                        egui::Stroke::NONE
                    },
                    shadow: egui::epaint::Shadow::NONE,
                };

                let frame_resp = frame.show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.spacing_mut().item_spacing.x = 6.0;

                        let chevron = if project.collapsed {
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
                            action = ProjectPanelAction::ToggleCollapsed(project.id);
                        }

                        let (dot_rect, _) =
                            ui.allocate_exact_size(egui::vec2(8.0, 8.0), egui::Sense::hover());
                        ui.painter().circle_filled(dot_rect.center(), 4.0, project.color);

                        let name_text = RichText::new(&project.name).size(12.0).color(
                            if is_selected {
                                egui::Color32::WHITE
                            } else {
                                theme::TEXT_PRIMARY
                            },
                        );
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
                                if del.on_hover_text("Delete project").clicked() {
                                    action = ProjectPanelAction::Delete(project.id);
                                }

                                let edit = ui.add(
                                    egui::Button::new(
                                        RichText::new(egui_phosphor::regular::PENCIL_SIMPLE)
                                            .size(10.0)
                                            .color(theme::TEXT_DIM),
                                    )
                                    .frame(false),
                                );
                                if edit.on_hover_text("Rename / recolor").clicked() {
                                    action = ProjectPanelAction::Edit(project.id);
                                }

                                if stats.overdue > 0 {
                                    ui.label(
                                        RichText::new(format!("{} late", stats.overdue))
                                            .size(9.0)
                                            .color(theme::STATUS_OVERDUE),
                                    );
                                }
                                ui.label(
                                    RichText::new(format!("{}/{}", stats.completed, stats.total))
                                        .size(10.0)
                                        .color(theme::TEXT_DIM),
                                );
                            },
                        );
                    });
                });

                let row_click = ui.interact(
                    frame_resp.response.rect,
                    egui::Id::new(("project-row", project.id)),
                    egui::Sense::click(),
                );
                if row_click.clicked() {
                    action = ProjectPanelAction::Select(project.id);
                }

                ui.add_space(1.0);
            }
        });

    action
}
