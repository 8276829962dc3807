use crate::app::TasklineApp;
use crate::timeline::ViewUnit;
use crate::ui::theme;
use egui::{menu, RichText, Ui};

/// Render the top toolbar / menu bar.
pub fn show_toolbar(app: &mut TasklineApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button(RichText::new("  File  ").font(theme::font_menu()), |ui| {
            if ui.button("  New Workspace").clicked() {
                app.new_workspace();
                ui.close_menu();
            }
            if ui.button("  Open...").clicked() {
                app.open_workspace();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Save          Ctrl+S").clicked() {
                app.save_workspace();
                ui.close_menu();
            }
            if ui.button("  Save As...").clicked() {
                app.save_workspace_as();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Import CSV...").clicked() {
                app.import_csv();
                ui.close_menu();
            }
            if ui.button("  Export CSV...").clicked() {
                app.export_csv();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Show Data Folder").clicked() {
                if let Some(dir) = app.data_path.parent() {
                    let _ = open::that(dir);
                }
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  View  ").font(theme::font_menu()), |ui| {
            let zoom_in = egui::Button::new("  Zoom In        Ctrl+Scroll ↑");
            if ui.add_enabled(app.zoom.can_zoom_in(), zoom_in).clicked() {
                app.zoom.zoom_in();
                ui.close_menu();
            }
            let zoom_out = egui::Button::new("  Zoom Out      Ctrl+Scroll ↓");
            if ui.add_enabled(app.zoom.can_zoom_out(), zoom_out).clicked() {
                app.zoom.zoom_out();
                ui.close_menu();
            }
            if ui.button("  Reset Zoom").clicked() {
                app.zoom.reset();
                ui.close_menu();
            }
            if ui.button("  Fit to Window").clicked() {
                app.fit_to_window();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Timeline Unit").small().weak());
            if ui
                .radio_value(&mut app.unit, ViewUnit::Day, "Days")
                .changed()
            {
                app.center_on_today();
                ui.close_menu();
            }
            if ui
                .radio_value(&mut app.unit, ViewUnit::Week, "Weeks")
                .changed()
            {
                app.center_on_today();
                ui.close_menu();
            }
            ui.separator();
            let mut show_completed = app.store.show_completed();
            if ui.checkbox(&mut show_completed, "Show completed").changed() {
                app.store.set_show_completed(show_completed);
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Go to Today").clicked() {
                app.center_on_today();
                ui.close_menu();
            }
        });

        ui.menu_button(RichText::new("  Help  ").font(theme::font_menu()), |ui| {
            if ui.button("Keyboard Shortcuts").clicked() {
                app.show_shortcuts = true;
                ui.close_menu();
            }
            if ui.button("About").clicked() {
                app.show_about = true;
                ui.close_menu();
            }
        });

        // Right-aligned workspace name with a dirty marker
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let name = app
                .data_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("workspace");
            let dirty = if app.is_dirty() { " •" } else { "" };
            ui.label(RichText::new(format!("{name}{dirty}")).size(11.0).weak());
        });
    });
}
