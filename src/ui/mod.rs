pub mod detail_panel;
pub mod dialogs;
pub mod project_panel;
pub mod task_table;
pub mod theme;
pub mod timeline_chart;
pub mod toolbar;
