use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::zoom::ViewUnit;

/// Total days in the visible window.
pub const WINDOW_DAYS: u32 = 365;
/// Share of the window placed before today.
pub const BEFORE_RATIO: f64 = 0.3;

fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.weekday().num_days_from_monday() as u64)
}

fn sunday_on_or_after(date: NaiveDate) -> NaiveDate {
    date + Days::new(Weekday::Sun.num_days_from_monday() as u64
        - date.weekday().num_days_from_monday() as u64)
}

/// One calendar month's slice of the window, for the header band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthSpan {
    pub first: NaiveDate,
    pub days: i64,
}

impl MonthSpan {
    pub fn label(&self) -> String {
        self.first.format("%b %Y").to_string()
    }
}

/// The fixed date window the timeline renders, anchored around a date.
/// In week view both edges snap outward to whole weeks so every bucket
/// is a full Monday-to-Sunday span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
    unit: ViewUnit,
}

impl DateRange {
    pub fn around(today: NaiveDate, unit: ViewUnit) -> Self {
        let before = (WINDOW_DAYS as f64 * BEFORE_RATIO).floor() as u64;
        let after = WINDOW_DAYS as u64 - before - 1;
        let mut start = today - Days::new(before);
        let mut end = today + Days::new(after);
        if unit == ViewUnit::Week {
            start = monday_on_or_before(start);
            end = sunday_on_or_after(end);
        }
        Self { start, end, unit }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn unit(&self) -> ViewUnit {
        self.unit
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Days in the window, inclusive of both edges.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Column count: days in day view, whole weeks in week view.
    pub fn bucket_count(&self) -> usize {
        match self.unit {
            ViewUnit::Day => self.num_days() as usize,
            ViewUnit::Week => (self.num_days() / 7) as usize,
        }
    }

    /// First date of every bucket, in order.
    pub fn visible_dates(&self) -> Vec<NaiveDate> {
        let step = self.unit.days_per_bucket() as usize;
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .step_by(step)
            .collect()
    }

    /// Calendar months intersecting the window, with the day count each
    /// one contributes. Spans sum to `num_days`.
    pub fn months(&self) -> Vec<MonthSpan> {
        let mut spans: Vec<MonthSpan> = Vec::new();
        for date in self.start.iter_days().take_while(|d| *d <= self.end) {
            match spans.last_mut() {
                Some(span)
                    if span.first.month() == date.month()
                        && span.first.year() == date.year() =>
                {
                    span.days += 1;
                }
                _ => spans.push(MonthSpan { first: date, days: 1 }),
            }
        }
        spans
    }

    /// Horizontal position of a date in px. `cell_width` is the scaled
    /// per-day width; a week column is seven cells wide, with each day
    /// offset by its weekday index inside the column.
    pub fn date_x(&self, date: NaiveDate, cell_width: f32) -> f32 {
        match self.unit {
            ViewUnit::Day => (date - self.start).num_days() as f32 * cell_width,
            ViewUnit::Week => {
                let monday = monday_on_or_before(date);
                let weeks = (monday - self.start).num_days() as f32 / 7.0;
                let weekday = date.weekday().num_days_from_monday() as f32;
                weeks * cell_width * 7.0 + weekday * cell_width
            }
        }
    }

    /// Inverse of `date_x`, clamped to the window. Used to turn a drag
    /// position back into a date.
    pub fn x_to_date(&self, x: f32, cell_width: f32) -> NaiveDate {
        if cell_width <= 0.0 {
            return self.start;
        }
        let days = (x / cell_width).floor() as i64;
        let days = days.clamp(0, self.num_days() - 1);
        self.start + Days::new(days as u64)
    }

    /// Full pixel width of the window.
    pub fn total_width(&self, cell_width: f32) -> f32 {
        self.num_days() as f32 * cell_width
    }

    /// Scroll offset that puts `date` in the middle of the container,
    /// clamped so the window never scrolls past its left edge.
    pub fn centered_scroll_x(&self, date: NaiveDate, cell_width: f32, container_width: f32) -> f32 {
        (self.date_x(date, cell_width) - container_width / 2.0).max(0.0)
    }
}
