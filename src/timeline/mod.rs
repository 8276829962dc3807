pub mod range;
pub mod scroll;
pub mod zoom;

pub use range::{DateRange, MonthSpan, BEFORE_RATIO, WINDOW_DAYS};
pub use scroll::{ScrollPane, ScrollSync};
pub use zoom::{
    base_cell_width, DynamicSizes, FontSizes, RowHeights, TimelineZoom, ViewUnit,
    BASE_CELL_WIDTH_DAY, BASE_CELL_WIDTH_WEEK,
};
