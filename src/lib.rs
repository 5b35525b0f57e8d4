//! Date-range picking: calendar grids, the two-click selection state
//! machine, time selectors, presets, and a popup controller with a
//! terminal front end.

pub mod calc;
pub mod data;
pub mod ui;

pub use calc::{RangeController, build_month, build_presets, build_time_options};
pub use ui::picker::DateRangePicker;
pub use ui::position::compute_placement;
