pub mod hooks;
pub mod locale;
pub mod persistence;
pub mod picker_config;
pub mod selection;

pub use hooks::{CustomDateConfig, DateHooks};
pub use locale::{Direction, Locale, LocaleConfig};
pub use persistence::Persistable;
pub use picker_config::{ButtonClasses, PickerConfig, PickerFile, PickerOptions, PresetConfig};
pub use selection::{SelectionData, SelectionRecord};
