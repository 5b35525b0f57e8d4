use crate::calc::dates::{month_name, weekday_from_index};
use chrono::Weekday;
use serde::{Deserialize, Serialize};

const DEFAULT_DAYS_OF_WEEK: [&str; 7] = ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// Locale section of picker.yaml as written by the user. Every field is
/// optional; anything missing or malformed keeps the default.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(default)]
pub struct LocaleConfig {
    pub direction: Option<String>,
    pub format: Option<String>,
    pub separator: Option<String>,
    pub apply_label: Option<String>,
    pub cancel_label: Option<String>,
    pub week_label: Option<String>,
    pub custom_range_label: Option<String>,
    pub days_of_week: Option<Vec<String>>,
    pub month_names: Option<Vec<String>>,
    pub first_day: Option<i64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Locale {
    pub direction: Direction,
    /// chrono format string used to display and parse dates.
    pub format: String,
    pub separator: String,
    pub apply_label: String,
    pub cancel_label: String,
    pub week_label: String,
    pub custom_range_label: String,
    /// Sunday-first, as configured.
    pub days_of_week: Vec<String>,
    pub month_names: Vec<String>,
    pub first_day: Weekday,
}

impl Default for Locale {
    fn default() -> Self {
        Locale {
            direction: Direction::Ltr,
            format: "%m/%d/%Y".to_string(),
            separator: " - ".to_string(),
            apply_label: "Apply".to_string(),
            cancel_label: "Cancel".to_string(),
            week_label: "W".to_string(),
            custom_range_label: "Custom Range".to_string(),
            days_of_week: DEFAULT_DAYS_OF_WEEK.iter().map(|d| d.to_string()).collect(),
            month_names: (1..=12).map(|m| month_name(m).to_string()).collect(),
            first_day: Weekday::Sun,
        }
    }
}

impl Locale {
    pub fn from_config(cfg: &LocaleConfig) -> Self {
        let mut locale = Locale::default();

        match cfg.direction.as_deref() {
            None => {}
            Some("ltr") => locale.direction = Direction::Ltr,
            Some("rtl") => locale.direction = Direction::Rtl,
            Some(other) => {
                tracing::warn!(target: "rangepick::config", "ignoring locale.direction '{}'", other)
            }
        }
        if let Some(format) = &cfg.format {
            if format.trim().is_empty() {
                tracing::warn!(target: "rangepick::config", "ignoring empty locale.format");
            } else {
                locale.format = format.clone();
            }
        }
        if let Some(separator) = &cfg.separator {
            if separator.is_empty() {
                tracing::warn!(target: "rangepick::config", "ignoring empty locale.separator");
            } else {
                locale.separator = separator.clone();
            }
        }
        if let Some(label) = &cfg.apply_label {
            locale.apply_label = label.clone();
        }
        if let Some(label) = &cfg.cancel_label {
            locale.cancel_label = label.clone();
        }
        if let Some(label) = &cfg.week_label {
            locale.week_label = label.clone();
        }
        if let Some(label) = &cfg.custom_range_label {
            locale.custom_range_label = label.clone();
        }
        match &cfg.days_of_week {
            Some(days) if days.len() == 7 => locale.days_of_week = days.clone(),
            Some(days) => tracing::warn!(
                target: "rangepick::config",
                "locale.days_of_week needs 7 entries, got {}; using defaults",
                days.len()
            ),
            None => {}
        }
        match &cfg.month_names {
            Some(names) if names.len() == 12 => locale.month_names = names.clone(),
            Some(names) => tracing::warn!(
                target: "rangepick::config",
                "locale.month_names needs 12 entries, got {}; using defaults",
                names.len()
            ),
            None => {}
        }
        match cfg.first_day {
            Some(day @ 0..=6) => locale.first_day = weekday_from_index(day as u32),
            Some(day) => tracing::warn!(
                target: "rangepick::config",
                "locale.first_day must be 0-6, got {}; keeping Sunday",
                day
            ),
            None => {}
        }
        locale
    }

    /// Weekday labels in display order, starting at `first_day`.
    pub fn ordered_days_of_week(&self) -> Vec<String> {
        let shift = self.first_day.num_days_from_sunday() as usize;
        let mut days = self.days_of_week.clone();
        let len = days.len().max(1);
        days.rotate_left(shift % len);
        days
    }

    pub fn month_label(&self, month: u32) -> &str {
        self.month_names
            .get(month.saturating_sub(1) as usize)
            .map(String::as_str)
            .unwrap_or("")
    }
}
