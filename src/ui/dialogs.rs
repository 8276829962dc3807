use crate::app::TasklineApp;
use crate::model::PROJECT_PALETTE;
use crate::ui::theme;
use egui::{Color32, Context, RichText, Window};

/// Render the "About" dialog.
pub fn show_about_dialog(app: &mut TasklineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new("About")
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([260.0, 150.0])
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                ui.heading(RichText::new("Taskline").strong());
                ui.add_space(2.0);
                ui.label(
                    RichText::new(format!("Version {}", env!("CARGO_PKG_VERSION")))
                        .color(theme::TEXT_SECONDARY),
                );
                ui.add_space(10.0);
                ui.label("A keyboard-driven to-do and");
                ui.label("timeline planner built with Rust and egui.");
                ui.add_space(14.0);
                if ui.add_sized([100.0, 28.0], egui::Button::new("Close")).clicked() {
                    should_close = true;
                }
            });
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_about = false;
    }
}

/// Render the keyboard shortcut reference.
pub fn show_shortcuts_dialog(app: &mut TasklineApp, ctx: &Context) {
    let mut should_close = false;
    Window::new(RichText::new("Keyboard Shortcuts").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.add_space(4.0);
            egui::Grid::new("shortcut_grid")
                .num_columns(2)
                .striped(true)
                .spacing([18.0, 5.0])
                .show(ui, |ui| {
                    let rows: &[(&str, &str)] = &[
                        ("↑ / ↓", "Move selection (Shift extends)"),
                        ("←", "Jump to parent, then to the project list"),
                        ("→", "Into the task list / detail panel"),
                        ("Ctrl+→", "Collapse or expand the selected subtree"),
                        ("Enter", "New task after the selection"),
                        ("Tab", "New subtask (in details: next field)"),
                        ("Shift+Tab", "Previous detail field"),
                        ("Space", "Complete / reopen the selection"),
                        ("Delete", "Delete the selection and its subtasks"),
                        ("Ctrl+C / Ctrl+V", "Copy and paste tasks"),
                        ("Ctrl+A", "Select all visible tasks"),
                        ("Ctrl+S", "Save the workspace"),
                        ("Esc", "Close the panel, then clear the selection"),
                        ("Ctrl+Scroll", "Zoom the timeline"),
                    ];
                    for (keys, what) in rows {
                        ui.label(RichText::new(*keys).monospace().size(11.0));
                        ui.label(RichText::new(*what).size(11.0).color(theme::TEXT_SECONDARY));
                        ui.end_row();
                    }
                });
            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);
            if ui.add_sized([80.0, 26.0], egui::Button::new("Close")).clicked() {
                should_close = true;
            }
            ui.add_space(2.0);
        });
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.show_shortcuts = false;
    }
}

/// Render the project name / color editor.
pub fn show_edit_project_dialog(app: &mut TasklineApp, ctx: &Context) {
    let mut should_close = false;
    let mut should_save = false;
    Window::new(RichText::new("Edit Project").strong().size(14.0))
        .resizable(false)
        .collapsible(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .fixed_size([280.0, 0.0])
        .show(ctx, |ui| {
            ui.visuals_mut().extreme_bg_color = theme::BG_FIELD;
            ui.add_space(4.0);

            egui::Grid::new("edit_project_grid")
                .num_columns(2)
                .striped(false)
                .spacing([12.0, 8.0])
                .show(ui, |ui| {
                    ui.label(RichText::new("Name").color(theme::TEXT_SECONDARY));
                    let resp = ui.add_sized(
                        [200.0, 24.0],
                        egui::TextEdit::singleline(&mut app.edit_project_name)
                            .hint_text("Project name...")
                            .text_color(theme::TEXT_PRIMARY),
                    );
                    if resp.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        should_save = true;
                    }
                    ui.end_row();

                    ui.label(RichText::new("Color").color(theme::TEXT_SECONDARY));
                    ui.horizontal(|ui| {
                        for color in PROJECT_PALETTE {
                            let selected = app.edit_project_color == color;
                            let stroke = if selected {
                                egui::Stroke::new(2.0, Color32::WHITE)
                            } else {
                                egui::Stroke::new(1.0, theme::BORDER_SUBTLE)
                            };
                            let swatch = egui::Button::new("")
                                .fill(color)
                                .stroke(stroke)
                                .rounding(egui::Rounding::same(3.0));
                            if ui.add_sized([20.0, 20.0], swatch).clicked() {
                                app.edit_project_color = color;
                            }
                        }
                    });
                    ui.end_row();
                });

            ui.add_space(6.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let save_btn = egui::Button::new(RichText::new("Save").color(Color32::WHITE))
                    .fill(theme::ACCENT)
                    .rounding(egui::Rounding::same(4.0));
                if ui.add_sized([80.0, 28.0], save_btn).clicked() {
                    should_save = true;
                }
                if ui.add_sized([80.0, 28.0], egui::Button::new("Cancel")).clicked() {
                    should_close = true;
                }
            });
            ui.add_space(2.0);
        });

    if should_save {
        app.apply_project_edit();
    }
    if should_close || ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
        app.edit_project_id = None;
    }
}
