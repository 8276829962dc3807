use serde::{Deserialize, Serialize};

/// Base cell width in px at 100% zoom. The cell width is always per day;
/// a week bucket spans `7 × cell_width`.
pub const BASE_CELL_WIDTH_DAY: f32 = 30.0;
pub const BASE_CELL_WIDTH_WEEK: f32 = 20.0;

const BASE_ROW_PROJECT: f32 = 32.0;
const BASE_ROW_TASK: f32 = 48.0;
const BASE_ROW_SUBTASK: f32 = 40.0;
const BASE_TASK_BAR: f32 = 32.0;

/// Granularity of the timeline columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewUnit {
    Day,
    Week,
}

impl ViewUnit {
    pub fn days_per_bucket(self) -> i64 {
        match self {
            ViewUnit::Day => 1,
            ViewUnit::Week => 7,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ViewUnit::Day => "Day",
            ViewUnit::Week => "Week",
        }
    }
}

pub fn base_cell_width(unit: ViewUnit) -> f32 {
    match unit {
        ViewUnit::Day => BASE_CELL_WIDTH_DAY,
        ViewUnit::Week => BASE_CELL_WIDTH_WEEK,
    }
}

/// Row heights by row kind, scaled by the zoom ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowHeights {
    pub project: f32,
    pub task: f32,
    pub subtask: f32,
}

/// Stepped font sizes. `week` is used for week-bucket header labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub base: f32,
    pub small: f32,
    pub large: f32,
    pub week: f32,
}

impl FontSizes {
    /// Font step for a zoom percentage. Steps, not continuous scaling, so
    /// text stays crisp at every zoom.
    pub fn for_zoom(zoom_level: u32) -> Self {
        match zoom_level {
            0..=30 => Self { base: 8.0, small: 7.0, large: 9.0, week: 8.0 },
            31..=50 => Self { base: 10.0, small: 9.0, large: 11.0, week: 10.0 },
            51..=80 => Self { base: 12.0, small: 11.0, large: 13.0, week: 12.0 },
            81..=120 => Self { base: 14.0, small: 12.0, large: 16.0, week: 13.0 },
            121..=150 => Self { base: 16.0, small: 14.0, large: 18.0, week: 15.0 },
            _ => Self { base: 18.0, small: 16.0, large: 20.0, week: 17.0 },
        }
    }
}

/// Every pixel dimension the timeline needs, derived from
/// `(zoom_level, unit)` alone. Equal inputs always produce equal output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicSizes {
    pub zoom_ratio: f32,
    pub cell_width: f32,
    pub row: RowHeights,
    pub font: FontSizes,
    pub task_bar_height: f32,
}

impl DynamicSizes {
    pub fn compute(zoom_level: u32, unit: ViewUnit) -> Self {
        let ratio = zoom_level as f32 / 100.0;
        Self {
            zoom_ratio: ratio,
            cell_width: (base_cell_width(unit) * ratio).round(),
            row: RowHeights {
                project: (BASE_ROW_PROJECT * ratio).round(),
                task: (BASE_ROW_TASK * ratio).round(),
                subtask: (BASE_ROW_SUBTASK * ratio).round(),
            },
            font: FontSizes::for_zoom(zoom_level),
            task_bar_height: (BASE_TASK_BAR * ratio).round(),
        }
    }

    /// Row height for a task row: subtasks get the tighter row.
    pub fn task_row_height(&self, level: u8) -> f32 {
        if level > 0 {
            self.row.subtask
        } else {
            self.row.task
        }
    }
}

/// Zoom state in percent. All mutations clamp; invalid input is never
/// rejected, only clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineZoom {
    level: u32,
}

impl Default for TimelineZoom {
    fn default() -> Self {
        Self { level: Self::DEFAULT }
    }
}

impl TimelineZoom {
    pub const MIN: u32 = 10;
    pub const MAX: u32 = 200;
    pub const DEFAULT: u32 = 100;
    pub const STEP: u32 = 10;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(level: u32) -> Self {
        Self { level: Self::clamp(level) }
    }

    pub fn clamp(level: u32) -> u32 {
        level.clamp(Self::MIN, Self::MAX)
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn ratio(&self) -> f32 {
        self.level as f32 / 100.0
    }

    pub fn set(&mut self, level: u32) {
        self.level = Self::clamp(level);
    }

    pub fn zoom_in(&mut self) {
        self.set(self.level.saturating_add(Self::STEP));
    }

    pub fn zoom_out(&mut self) {
        self.set(self.level.saturating_sub(Self::STEP));
    }

    pub fn reset(&mut self) {
        self.level = Self::DEFAULT;
    }

    pub fn can_zoom_in(&self) -> bool {
        self.level < Self::MAX
    }

    pub fn can_zoom_out(&self) -> bool {
        self.level > Self::MIN
    }

    /// Zoom that fits `bucket_count` buckets into `container_width` px:
    /// the required per-day cell width converted back to the nearest
    /// clamped percentage. `None` (no change) for a degenerate container.
    pub fn fit_level(container_width: f32, bucket_count: usize, unit: ViewUnit) -> Option<u32> {
        if container_width <= 0.0 || bucket_count == 0 {
            return None;
        }
        let days = (bucket_count as i64 * unit.days_per_bucket()) as f32;
        let required_cell_width = container_width / days;
        let level = (required_cell_width / base_cell_width(unit) * 100.0).round();
        Some(Self::clamp(level.max(0.0) as u32))
    }

    pub fn fit_to_screen(
        &mut self,
        container_width: f32,
        bucket_count: usize,
        unit: ViewUnit,
    ) -> bool {
        match Self::fit_level(container_width, bucket_count, unit) {
            Some(level) => {
                self.level = level;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zoom_is_always_clamped() {
        let mut zoom = TimelineZoom::with_level(999);
        assert_eq!(zoom.level(), 200);
        zoom.set(3);
        assert_eq!(zoom.level(), 10);
        zoom.zoom_out();
        assert_eq!(zoom.level(), 10);
        zoom.set(200);
        zoom.zoom_in();
        assert_eq!(zoom.level(), 200);
        zoom.reset();
        assert_eq!(zoom.level(), 100);
    }

    #[test]
    fn steps_move_by_ten() {
        let mut zoom = TimelineZoom::new();
        zoom.zoom_in();
        assert_eq!(zoom.level(), 110);
        zoom.zoom_out();
        zoom.zoom_out();
        assert_eq!(zoom.level(), 90);
        assert!(zoom.can_zoom_in());
        assert!(zoom.can_zoom_out());
    }

    #[test]
    fn sizes_are_pure_in_zoom_and_unit() {
        let a = DynamicSizes::compute(70, ViewUnit::Day);
        let b = DynamicSizes::compute(70, ViewUnit::Day);
        assert_eq!(a, b);
        assert_eq!(a.cell_width, 21.0); // 30 × 0.7
        assert_eq!(a.row.task, 34.0); // 48 × 0.7 rounded
        assert_ne!(a, DynamicSizes::compute(70, ViewUnit::Week));
    }

    #[test]
    fn default_sizes_match_the_base_table() {
        let sizes = DynamicSizes::compute(100, ViewUnit::Day);
        assert_eq!(sizes.cell_width, 30.0);
        assert_eq!(sizes.row.project, 32.0);
        assert_eq!(sizes.row.task, 48.0);
        assert_eq!(sizes.row.subtask, 40.0);
        assert_eq!(sizes.task_bar_height, 32.0);
        assert_eq!(sizes.task_row_height(0), 48.0);
        assert_eq!(sizes.task_row_height(2), 40.0);

        let week = DynamicSizes::compute(100, ViewUnit::Week);
        assert_eq!(week.cell_width, 20.0);
    }

    #[test]
    fn fonts_step_with_zoom_level() {
        let f = FontSizes::for_zoom(35);
        assert_eq!((f.base, f.small, f.large), (10.0, 9.0, 11.0));
        assert_eq!(FontSizes::for_zoom(30).base, 8.0);
        assert_eq!(FontSizes::for_zoom(80).base, 12.0);
        assert_eq!(FontSizes::for_zoom(100).base, 14.0);
        assert_eq!(FontSizes::for_zoom(150).week, 15.0);
        assert_eq!(FontSizes::for_zoom(200).large, 20.0);
    }

    #[test]
    fn fit_to_screen_fits_within_one_cell() {
        let mut zoom = TimelineZoom::new();
        assert!(zoom.fit_to_screen(1200.0, 365, ViewUnit::Day));
        let sizes = DynamicSizes::compute(zoom.level(), ViewUnit::Day);
        assert!(365.0 * sizes.cell_width <= 1200.0 + sizes.cell_width);

        assert!(zoom.fit_to_screen(1100.0, 53, ViewUnit::Week));
        let sizes = DynamicSizes::compute(zoom.level(), ViewUnit::Week);
        assert!(53.0 * 7.0 * sizes.cell_width <= 1100.0 + 7.0 * sizes.cell_width);
    }

    #[test]
    fn fit_to_screen_ignores_degenerate_containers() {
        let mut zoom = TimelineZoom::with_level(120);
        assert!(!zoom.fit_to_screen(0.0, 100, ViewUnit::Day));
        assert!(!zoom.fit_to_screen(-50.0, 100, ViewUnit::Day));
        assert!(!zoom.fit_to_screen(800.0, 0, ViewUnit::Day));
        assert_eq!(zoom.level(), 120);
    }

    #[test]
    fn fit_to_screen_clamps_at_the_bounds() {
        // a tiny container wants less than 10%
        assert_eq!(TimelineZoom::fit_level(100.0, 365, ViewUnit::Day), Some(10));
        // a huge container wants more than 200%
        assert_eq!(TimelineZoom::fit_level(40000.0, 30, ViewUnit::Day), Some(200));
    }
}
