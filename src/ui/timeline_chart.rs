use chrono::{Datelike, Duration, NaiveDate};
use egui::{Color32, Id, Pos2, Rect, Rounding, Sense, Stroke, Ui, Vec2};
use uuid::Uuid;

use crate::model::{Project, Task, TaskStore};
use crate::timeline::{DateRange, DynamicSizes, TimelineZoom, ViewUnit};
use crate::ui::theme;

const HEADER_HEIGHT: f32 = theme::HEADER_HEIGHT;
const HANDLE_WIDTH: f32 = theme::HANDLE_WIDTH;

/// Pointer state captured when a bar drag starts. Kept in egui memory so
/// the delta is always measured from the original dates, not the ones of
/// the previous frame.
#[derive(Debug, Clone)]
struct DragSnapshot {
    start: NaiveDate,
    due: NaiveDate,
    start_pointer_x: f32,
}

/// Actions the chart reports back. The chart never mutates the store.
#[derive(Debug, Clone)]
pub enum ChartAction {
    None,
    Clicked { id: Uuid, ctrl: bool, shift: bool },
    DragDates { id: Uuid, start: NaiveDate, due: NaiveDate },
    SelectProject(Uuid),
    ClearSelection,
}

pub struct ChartOutput {
    pub action: ChartAction,
    /// Vertical offset, reported for scroll sync with the table.
    pub scroll_offset: f32,
    /// Visible width of the scroll viewport, used for fit-to-window.
    pub viewport_width: f32,
}

enum ChartRow<'a> {
    Project(&'a Project),
    Task(&'a Task),
}

/// Render the timeline chart. `scroll_x`/`scroll_y` force the scroll
/// position for one frame (today centering, table sync).
pub fn show_timeline_chart(
    store: &TaskStore,
    range: &DateRange,
    sizes: &DynamicSizes,
    zoom: &mut TimelineZoom,
    today: NaiveDate,
    scroll_x: Option<f32>,
    scroll_y: Option<f32>,
    ui: &mut Ui,
) -> ChartOutput {
    let mut action = ChartAction::None;
    let cell = sizes.cell_width;
    let available = ui.available_size();
    let chart_width = range.total_width(cell).max(available.x);

    let (ctrl, modifiers_shift) = ui.input(|i| (i.modifiers.ctrl, i.modifiers.shift));

    // Ctrl+scroll zooms instead of scrolling
    let scroll_delta = ui.input(|i| i.smooth_scroll_delta);
    if ui.rect_contains_pointer(ui.max_rect()) && ctrl {
        if scroll_delta.y > 0.0 {
            zoom.zoom_in();
        } else if scroll_delta.y < 0.0 {
            zoom.zoom_out();
        }
    }

    // Row layout: project header rows, then the visible tasks of every
    // expanded project. Heights vary per row kind.
    let mut layout: Vec<(ChartRow, f32, f32)> = Vec::new();
    let mut y_cursor = HEADER_HEIGHT;
    for project in store.projects() {
        layout.push((ChartRow::Project(project), y_cursor, sizes.row.project));
        y_cursor += sizes.row.project;
        if !project.collapsed {
            for task in store.visible_rows_for(project.id) {
                let height = sizes.task_row_height(task.level);
                layout.push((ChartRow::Task(task), y_cursor, height));
                y_cursor += height;
            }
        }
    }
    let chart_height = (y_cursor + 40.0).max(available.y);

    let mut area = egui::ScrollArea::both()
        .id_salt("timeline_chart_scroll")
        .auto_shrink([false, false]);
    if let Some(x) = scroll_x {
        area = area.horizontal_scroll_offset(x);
    }
    if let Some(y) = scroll_y {
        area = area.vertical_scroll_offset(y);
    }

    let output = area.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(
            Vec2::new(chart_width, chart_height),
            Sense::click(),
        );
        let origin = response.rect.min;
        let viewport = ui.clip_rect();
        let mut consumed_click = false;

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);

        if range.unit() == ViewUnit::Day {
            draw_weekend_shading(&painter, origin, range, cell, chart_height);
        }

        // ── Rows ─────────────────────────────────────────────────────
        let mut task_row_index = 0usize;
        for (row, y, height) in &layout {
            let row_rect = Rect::from_min_size(
                Pos2::new(origin.x, origin.y + y),
                Vec2::new(chart_width, *height),
            );
            match row {
                ChartRow::Project(project) => {
                    painter.rect_filled(row_rect, 0.0, theme::BG_PROJECT_ROW);
                    painter.rect_filled(
                        Rect::from_min_size(row_rect.min, Vec2::new(3.0, *height)),
                        0.0,
                        project.color,
                    );
                    // name pinned to the viewport so it stays readable
                    // while scrolling horizontally
                    let stats = store.project_stats(project.id, today);
                    let text_x = viewport.left().max(row_rect.left()) + 10.0;
                    painter.text(
                        Pos2::new(text_x, row_rect.center().y),
                        egui::Align2::LEFT_CENTER,
                        &project.name,
                        egui::FontId::proportional(sizes.font.base),
                        theme::TEXT_PRIMARY,
                    );
                    let name_width = painter
                        .layout_no_wrap(
                            project.name.clone(),
                            egui::FontId::proportional(sizes.font.base),
                            theme::TEXT_PRIMARY,
                        )
                        .size()
                        .x;
                    painter.text(
                        Pos2::new(text_x + name_width + 8.0, row_rect.center().y),
                        egui::Align2::LEFT_CENTER,
                        format!("{}/{}", stats.completed, stats.total),
                        egui::FontId::proportional(sizes.font.small),
                        theme::TEXT_DIM,
                    );
                    task_row_index = 0;
                }
                ChartRow::Task(_) => {
                    if task_row_index % 2 == 0 {
                        painter.rect_filled(row_rect, 0.0, theme::BG_ROW_EVEN);
                    }
                    task_row_index += 1;
                }
            }
            painter.line_segment(
                [row_rect.left_bottom(), row_rect.right_bottom()],
                Stroke::new(0.5, theme::BORDER_SUBTLE),
            );
        }

        draw_header(&painter, origin, range, sizes, chart_width, chart_height);

        if store.projects().is_empty() {
            painter.text(
                Pos2::new(viewport.center().x, origin.y + HEADER_HEIGHT + 60.0),
                egui::Align2::CENTER_CENTER,
                "No projects yet",
                theme::font_menu(),
                theme::TEXT_DIM,
            );
        }

        // ── Bars and interactions ────────────────────────────────────
        for (row, y, height) in &layout {
            match row {
                ChartRow::Project(project) => {
                    let row_rect = Rect::from_min_size(
                        Pos2::new(origin.x, origin.y + y),
                        Vec2::new(chart_width, *height),
                    );
                    let resp = ui.interact(
                        row_rect,
                        Id::new(("chart-project", project.id)),
                        Sense::click(),
                    );
                    if resp.clicked() {
                        action = ChartAction::SelectProject(project.id);
                        consumed_click = true;
                    }
                }
                ChartRow::Task(task) => {
                    let is_selected = store.selection().contains(task.id);
                    let bar_rect = draw_task_bar(
                        &painter,
                        origin,
                        range,
                        sizes,
                        task,
                        origin.y + y,
                        *height,
                        today,
                        is_selected,
                    );

                    let bar_response = ui.interact(
                        bar_rect,
                        ui.make_persistent_id(("task-bar", task.id)),
                        Sense::click_and_drag(),
                    );
                    let left_handle = Rect::from_min_max(
                        Pos2::new(bar_rect.left() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                        Pos2::new(bar_rect.left() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                    );
                    let right_handle = Rect::from_min_max(
                        Pos2::new(bar_rect.right() - HANDLE_WIDTH * 0.5, bar_rect.top()),
                        Pos2::new(bar_rect.right() + HANDLE_WIDTH * 0.5, bar_rect.bottom()),
                    );
                    let left_response = ui.interact(
                        left_handle.expand(4.0),
                        ui.make_persistent_id(("task-resize-left", task.id)),
                        Sense::drag(),
                    );
                    let right_response = ui.interact(
                        right_handle.expand(4.0),
                        ui.make_persistent_id(("task-resize-right", task.id)),
                        Sense::drag(),
                    );

                    if bar_response.clicked() {
                        action = ChartAction::Clicked {
                            id: task.id,
                            ctrl,
                            shift: modifiers_shift,
                        };
                        consumed_click = true;
                    }

                    for (resp, mode) in [
                        (&left_response, "left"),
                        (&right_response, "right"),
                        (&bar_response, "move"),
                    ] {
                        if resp.drag_started() {
                            let ptr_x =
                                resp.interact_pointer_pos().map(|p| p.x).unwrap_or(0.0);
                            ui.ctx().data_mut(|data| {
                                data.insert_persisted(
                                    drag_id(task.id, mode),
                                    DragSnapshot {
                                        start: task.start_date,
                                        due: task.due_date,
                                        start_pointer_x: ptr_x,
                                    },
                                );
                            });
                            consumed_click = true;
                        }
                        if resp.drag_stopped() {
                            ui.ctx().data_mut(|data| {
                                data.remove::<DragSnapshot>(drag_id(task.id, mode));
                            });
                        }
                    }

                    if left_response.dragged() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                        if let Some((start, due)) =
                            dragged_dates(ui, &left_response, task.id, "left", cell)
                        {
                            action = ChartAction::DragDates { id: task.id, start, due };
                        }
                    } else if right_response.dragged() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                        if let Some((start, due)) =
                            dragged_dates(ui, &right_response, task.id, "right", cell)
                        {
                            action = ChartAction::DragDates { id: task.id, start, due };
                        }
                    } else if bar_response.dragged() {
                        ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                        if let Some((start, due)) =
                            dragged_dates(ui, &bar_response, task.id, "move", cell)
                        {
                            action = ChartAction::DragDates { id: task.id, start, due };
                        }
                    }

                    if is_selected || left_response.hovered() || right_response.hovered() {
                        if left_response.hovered() || right_response.hovered() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::ResizeHorizontal);
                        } else if bar_response.hovered() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                        }
                        draw_handles(&painter, bar_rect);
                    }

                    if bar_response.hovered()
                        || left_response.hovered()
                        || right_response.hovered()
                    {
                        egui::show_tooltip_at_pointer(
                            ui.ctx(),
                            ui.layer_id(),
                            Id::new(("task-tip", task.id)),
                            |ui| {
                                ui.strong(&task.name);
                                ui.label(format!(
                                    "{} → {}",
                                    task.start_date.format("%d/%m/%Y"),
                                    task.due_date.format("%d/%m/%Y"),
                                ));
                                let status = task.status(today);
                                ui.colored_label(theme::status_color(status), status.label());
                                if !task.assignee.is_empty() {
                                    ui.label(&task.assignee);
                                }
                            },
                        );
                    }
                }
            }
        }

        draw_today_line(&painter, origin, range, cell, today, chart_height);

        if response.clicked() && !consumed_click {
            action = ChartAction::ClearSelection;
        }
    });

    ChartOutput {
        action,
        scroll_offset: output.state.offset.y,
        viewport_width: output.inner_rect.width(),
    }
}

fn drag_id(task_id: Uuid, mode: &'static str) -> Id {
    Id::new(("drag", task_id, mode))
}

/// Dates for an in-flight drag, derived from the snapshot plus the whole
/// pointer delta rounded to days. Resizes clamp so the bar never inverts.
fn dragged_dates(
    ui: &Ui,
    resp: &egui::Response,
    task_id: Uuid,
    mode: &'static str,
    cell_width: f32,
) -> Option<(NaiveDate, NaiveDate)> {
    let ptr_x = resp.interact_pointer_pos().map(|p| p.x)?;
    let snapshot = ui
        .ctx()
        .data_mut(|data| data.get_persisted::<DragSnapshot>(drag_id(task_id, mode)))?;
    if cell_width <= 0.0 {
        return None;
    }
    let day_delta = ((ptr_x - snapshot.start_pointer_x) / cell_width).round() as i64;
    let shifted = Duration::days(day_delta);
    Some(match mode {
        "left" => {
            let start = (snapshot.start + shifted).min(snapshot.due);
            (start, snapshot.due)
        }
        "right" => {
            let due = (snapshot.due + shifted).max(snapshot.start);
            (snapshot.start, due)
        }
        _ => (snapshot.start + shifted, snapshot.due + shifted),
    })
}

fn draw_weekend_shading(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    cell_width: f32,
    height: f32,
) {
    for date in range.visible_dates() {
        if date.weekday().num_days_from_monday() >= 5 {
            let x = origin.x + range.date_x(date, cell_width);
            painter.rect_filled(
                Rect::from_min_size(
                    Pos2::new(x, origin.y + HEADER_HEIGHT),
                    Vec2::new(cell_width, height - HEADER_HEIGHT),
                ),
                0.0,
                theme::WEEKEND_SHADE,
            );
        }
    }
}

/// Two-band calendar header: months on top, day or week columns below.
fn draw_header(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    sizes: &DynamicSizes,
    width: f32,
    height: f32,
) {
    let cell = sizes.cell_width;

    painter.rect_filled(
        Rect::from_min_size(origin, Vec2::new(width, HEADER_HEIGHT)),
        0.0,
        theme::BG_HEADER,
    );
    painter.line_segment(
        [
            Pos2::new(origin.x, origin.y + HEADER_HEIGHT),
            Pos2::new(origin.x + width, origin.y + HEADER_HEIGHT),
        ],
        Stroke::new(1.0, theme::BORDER_SUBTLE),
    );

    // month band
    let mut month_x = origin.x;
    for span in range.months() {
        let span_width = span.days as f32 * cell;
        if span_width > 34.0 {
            let clipped = painter.with_clip_rect(Rect::from_min_size(
                Pos2::new(month_x, origin.y),
                Vec2::new(span_width, theme::HEADER_MONTH_BAND),
            ));
            clipped.text(
                Pos2::new(month_x + 4.0, origin.y + theme::HEADER_MONTH_BAND / 2.0),
                egui::Align2::LEFT_CENTER,
                span.label(),
                egui::FontId::proportional(sizes.font.base),
                theme::TEXT_PRIMARY,
            );
        }
        month_x += span_width;
        painter.line_segment(
            [
                Pos2::new(month_x, origin.y),
                Pos2::new(month_x, origin.y + theme::HEADER_MONTH_BAND),
            ],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }

    // unit band plus vertical grid
    let band_y = origin.y + theme::HEADER_MONTH_BAND;
    for date in range.visible_dates() {
        let x = origin.x + range.date_x(date, cell);
        painter.line_segment(
            [Pos2::new(x, band_y), Pos2::new(x, origin.y + height)],
            Stroke::new(0.5, theme::GRID_LINE),
        );
        match range.unit() {
            ViewUnit::Day => {
                if cell >= 14.0 {
                    let is_weekend = date.weekday().num_days_from_monday() >= 5;
                    painter.text(
                        Pos2::new(x + 3.0, band_y + theme::HEADER_UNIT_BAND / 2.0),
                        egui::Align2::LEFT_CENTER,
                        date.format("%d").to_string(),
                        egui::FontId::proportional(sizes.font.small),
                        if is_weekend { theme::TEXT_DIM } else { theme::TEXT_SECONDARY },
                    );
                }
            }
            ViewUnit::Week => {
                if cell * 7.0 >= 26.0 {
                    painter.text(
                        Pos2::new(x + 3.0, band_y + theme::HEADER_UNIT_BAND / 2.0),
                        egui::Align2::LEFT_CENTER,
                        date.format("W%V").to_string(),
                        egui::FontId::proportional(sizes.font.week),
                        theme::TEXT_SECONDARY,
                    );
                }
            }
        }
    }
}

fn draw_today_line(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    cell_width: f32,
    today: NaiveDate,
    height: f32,
) {
    if !range.contains(today) {
        return;
    }
    let x = origin.x + range.date_x(today, cell_width) + cell_width / 2.0;

    painter.line_segment(
        [
            Pos2::new(x, origin.y + HEADER_HEIGHT),
            Pos2::new(x, origin.y + height),
        ],
        Stroke::new(1.5, theme::TODAY_LINE),
    );

    let badge_w = 42.0;
    let badge_rect = Rect::from_min_size(
        Pos2::new(x - badge_w / 2.0, origin.y + HEADER_HEIGHT - 1.0),
        Vec2::new(badge_w, 14.0),
    );
    painter.rect_filled(badge_rect, Rounding::same(3.0), theme::TODAY_LINE);
    painter.text(
        badge_rect.center(),
        egui::Align2::CENTER_CENTER,
        "Today",
        theme::font_small(),
        Color32::WHITE,
    );
}

#[allow(clippy::too_many_arguments)]
fn draw_task_bar(
    painter: &egui::Painter,
    origin: Pos2,
    range: &DateRange,
    sizes: &DynamicSizes,
    task: &Task,
    row_y: f32,
    row_height: f32,
    today: NaiveDate,
    is_selected: bool,
) -> Rect {
    let cell = sizes.cell_width;
    let x_start = origin.x + range.date_x(task.start_date, cell);
    // the bar covers the due day's whole cell
    let x_end = origin.x + range.date_x(task.due_date, cell) + cell;
    let bar_width = (x_end - x_start).max(theme::BAR_MIN_WIDTH);

    let bar_height = sizes.task_bar_height.min(row_height - 6.0).max(4.0);
    let bar_rect = Rect::from_min_size(
        Pos2::new(x_start, row_y + (row_height - bar_height) / 2.0),
        Vec2::new(bar_width, bar_height),
    );
    let rounding = Rounding::same(theme::BAR_ROUNDING);

    let shadow_rect = bar_rect.translate(Vec2::new(1.0, 2.0));
    painter.rect_filled(shadow_rect, rounding, Color32::from_black_alpha(35));

    let fill = theme::status_color(task.status(today));
    painter.rect_filled(bar_rect, rounding, fill);

    let highlight_rect = Rect::from_min_size(
        bar_rect.min,
        Vec2::new(bar_width, (bar_rect.height() * 0.45).max(4.0)),
    );
    painter.rect_filled(
        highlight_rect,
        Rounding {
            nw: theme::BAR_ROUNDING,
            ne: theme::BAR_ROUNDING,
            sw: 0.0,
            se: 0.0,
        },
        Color32::from_white_alpha(25),
    );

    if is_selected {
        painter.rect_stroke(
            bar_rect.expand(1.5),
            Rounding::same(theme::BAR_ROUNDING + 1.5),
            Stroke::new(2.0, theme::BORDER_ACCENT),
        );
    }

    if bar_width > 30.0 {
        let galley = painter.layout_no_wrap(
            task.name.clone(),
            egui::FontId::proportional(sizes.font.base),
            theme::TEXT_ON_BAR,
        );
        let clipped = painter.with_clip_rect(bar_rect);
        let text_y = bar_rect.top() + (bar_rect.height() - galley.size().y) / 2.0;
        clipped.galley(
            Pos2::new(bar_rect.left() + 6.0, text_y),
            galley,
            Color32::TRANSPARENT,
        );
    }

    bar_rect
}

fn draw_handles(painter: &egui::Painter, bar_rect: Rect) {
    let handle_h = bar_rect.height() * 0.55;
    let handle_y = bar_rect.center().y - handle_h / 2.0;
    let lh = Rect::from_min_size(
        Pos2::new(bar_rect.left() - 1.5, handle_y),
        Vec2::new(4.0, handle_h),
    );
    let rh = Rect::from_min_size(
        Pos2::new(bar_rect.right() - 2.5, handle_y),
        Vec2::new(4.0, handle_h),
    );
    painter.rect_filled(lh, Rounding::same(2.0), Color32::from_white_alpha(140));
    painter.rect_filled(rh, Rounding::same(2.0), Color32::from_white_alpha(140));
}
