pub mod controller;
pub mod dates;
pub mod grid;
pub mod presets;
pub mod time_picker;

pub use controller::{ParseRangeError, Phase, PresetChoice, RangeController, Transition};
pub use dates::{Span, YearMonth};
pub use grid::{CalendarCell, CalendarMonthView, GridContext, Side, WeekNumbers, build_month};
pub use presets::{RangePreset, build_presets};
pub use time_picker::{TimeOption, TimeOptions, build_time_options};
