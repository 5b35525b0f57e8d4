use crate::calc::dates::{Span, end_of_day, parse_date_time, start_of_day};
use crate::data::hooks::{CustomDateConfig, DateHooks};
use crate::data::locale::{Locale, LocaleConfig};
use crate::data::persistence::Persistable;
use crate::ui::position::{Drops, Opens};
use anyhow::Result;
use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One named entry of the presets menu. `start` and `end` are date
/// expressions such as `today`, `today-6d`, `month_start-1m` or an absolute
/// date in the locale format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PresetConfig {
    pub label: String,
    pub start: String,
    pub end: String,
}

impl PresetConfig {
    pub fn new(label: &str, start: &str, end: &str) -> Self {
        PresetConfig {
            label: label.to_string(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }
}

/// picker.yaml as written on disk. Option-typed and loosely validated; see
/// [`PickerOptions::from_config`] for the checked form.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct PickerConfig {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub max_span: Option<Span>,
    pub auto_apply: bool,
    pub single_date_picker: bool,
    pub show_dropdowns: bool,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub show_week_numbers: bool,
    pub show_iso_week_numbers: bool,
    pub show_custom_range_label: bool,
    pub time_picker: bool,
    pub time_picker_24_hour: bool,
    pub time_picker_increment: u32,
    pub time_picker_seconds: bool,
    pub linked_calendars: bool,
    pub auto_update_input: bool,
    pub always_show_calendars: bool,
    pub ranges: Vec<PresetConfig>,
    pub locale: LocaleConfig,
    pub opens: Option<String>,
    pub drops: Option<String>,
    pub button_classes: Option<String>,
    pub apply_button_classes: Option<String>,
    pub cancel_button_classes: Option<String>,
    pub invalid_dates: Vec<String>,
    pub invalid_weekdays: Vec<String>,
    pub custom_dates: Vec<CustomDateConfig>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        PickerConfig {
            start_date: None,
            end_date: None,
            min_date: None,
            max_date: None,
            max_span: None,
            auto_apply: false,
            single_date_picker: false,
            show_dropdowns: false,
            min_year: None,
            max_year: None,
            show_week_numbers: false,
            show_iso_week_numbers: false,
            show_custom_range_label: true,
            time_picker: false,
            time_picker_24_hour: false,
            time_picker_increment: 1,
            time_picker_seconds: false,
            linked_calendars: true,
            auto_update_input: true,
            always_show_calendars: false,
            ranges: Vec::new(),
            locale: LocaleConfig::default(),
            opens: None,
            drops: None,
            button_classes: None,
            apply_button_classes: None,
            cancel_button_classes: None,
            invalid_dates: Vec::new(),
            invalid_weekdays: Vec::new(),
            custom_dates: Vec::new(),
        }
    }
}

/// Wrapper for the `picker` key of picker.yaml.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct PickerFile {
    #[serde(default)]
    pub picker: PickerConfig,
}

impl Persistable for PickerFile {
    fn filename() -> &'static str {
        "picker.yaml"
    }
    fn is_json() -> bool {
        false
    }
}

impl PickerConfig {
    pub fn load() -> Result<Self> {
        Ok(PickerFile::load()?.picker)
    }

    pub fn save(&self) -> Result<()> {
        PickerFile {
            picker: self.clone(),
        }
        .save()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ButtonClasses {
    pub base: String,
    pub apply: String,
    pub cancel: String,
}

impl Default for ButtonClasses {
    fn default() -> Self {
        ButtonClasses {
            base: "btn btn-sm".to_string(),
            apply: "btn-primary".to_string(),
            cancel: "btn-default".to_string(),
        }
    }
}

/// Checked, fully-defaulted picker configuration.
#[derive(Clone, Debug)]
pub struct PickerOptions {
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    /// True when start or end came from the configuration rather than
    /// defaulting to today; a text input's value only seeds the range
    /// when this is false.
    pub dates_configured: bool,
    pub min_date: Option<NaiveDateTime>,
    pub max_date: Option<NaiveDateTime>,
    pub max_span: Option<Span>,
    pub auto_apply: bool,
    pub single_date_picker: bool,
    pub show_dropdowns: bool,
    pub min_year: i32,
    pub max_year: i32,
    pub show_week_numbers: bool,
    pub show_iso_week_numbers: bool,
    pub show_custom_range_label: bool,
    pub time_picker: bool,
    pub time_picker_24_hour: bool,
    pub time_picker_increment: u32,
    pub time_picker_seconds: bool,
    pub linked_calendars: bool,
    pub auto_update_input: bool,
    pub always_show_calendars: bool,
    pub ranges: Vec<PresetConfig>,
    pub locale: Locale,
    pub opens: Opens,
    pub drops: Drops,
    pub buttons: ButtonClasses,
    pub hooks: DateHooks,
}

impl PickerOptions {
    /// Defaults relative to `now`: today's full day, no bounds, no presets.
    pub fn new(now: NaiveDateTime) -> Self {
        PickerOptions::from_config(&PickerConfig::default(), now)
    }

    /// Validates `cfg` once. Malformed values fall back to their defaults
    /// with a warning rather than failing.
    pub fn from_config(cfg: &PickerConfig, now: NaiveDateTime) -> Self {
        let locale = Locale::from_config(&cfg.locale);
        let today = now.date();
        let parse = |field: &str, raw: &Option<String>| -> Option<NaiveDateTime> {
            let raw = raw.as_deref()?;
            let parsed = parse_date_time(raw, &locale.format);
            if parsed.is_none() {
                tracing::warn!(target: "rangepick::config", "ignoring {} '{}': not a date", field, raw);
            }
            parsed
        };

        let configured_start = parse("start_date", &cfg.start_date);
        let configured_end = parse("end_date", &cfg.end_date);
        let dates_configured = configured_start.is_some() || configured_end.is_some();
        let mut start_date = configured_start.unwrap_or_else(|| start_of_day(today));
        let mut end_date = configured_end.unwrap_or_else(|| end_of_day(today));
        let mut min_date = parse("min_date", &cfg.min_date);
        let mut max_date = parse("max_date", &cfg.max_date);

        if !cfg.time_picker {
            start_date = start_of_day(start_date.date());
            end_date = end_of_day(end_date.date());
            min_date = min_date.map(|d| start_of_day(d.date()));
            max_date = max_date.map(|d| end_of_day(d.date()));
        }
        if let (Some(min), Some(max)) = (min_date, max_date) {
            if max < min {
                tracing::warn!(
                    target: "rangepick::config",
                    "max_date {} precedes min_date {}; dropping max_date",
                    max,
                    min
                );
                max_date = None;
            }
        }

        let max_span = match &cfg.max_span {
            Some(span) if span.is_zero() => {
                tracing::warn!(target: "rangepick::config", "ignoring zero-length max_span");
                None
            }
            Some(span) if !span.is_representable() => {
                tracing::warn!(target: "rangepick::config", "ignoring max_span {:?}: out of range", span);
                None
            }
            other => other.clone(),
        };

        let time_picker_increment = if cfg.time_picker_increment == 0 || cfg.time_picker_increment > 60 {
            tracing::warn!(
                target: "rangepick::config",
                "time_picker_increment must be 1-60, got {}; using 1",
                cfg.time_picker_increment
            );
            1
        } else {
            cfg.time_picker_increment
        };

        let mut auto_apply = cfg.auto_apply;
        if cfg.time_picker && auto_apply {
            tracing::debug!(target: "rangepick::config", "auto_apply is disabled while the time picker is on");
            auto_apply = false;
        }

        let opens = match cfg.opens.as_deref().map(str::parse::<Opens>) {
            None => Opens::Right,
            Some(Ok(opens)) => opens,
            Some(Err(raw)) => {
                tracing::warn!(target: "rangepick::config", "ignoring opens '{}'", raw);
                Opens::Right
            }
        };
        let drops = match cfg.drops.as_deref().map(str::parse::<Drops>) {
            None => Drops::Down,
            Some(Ok(drops)) => drops,
            Some(Err(raw)) => {
                tracing::warn!(target: "rangepick::config", "ignoring drops '{}'", raw);
                Drops::Down
            }
        };

        let mut buttons = ButtonClasses::default();
        if let Some(classes) = &cfg.button_classes {
            buttons.base = classes.clone();
        }
        if let Some(classes) = &cfg.apply_button_classes {
            buttons.apply = classes.clone();
        }
        if let Some(classes) = &cfg.cancel_button_classes {
            buttons.cancel = classes.clone();
        }

        let hooks = DateHooks::from_config(
            &cfg.invalid_dates,
            &cfg.invalid_weekdays,
            &cfg.custom_dates,
            &locale.format,
        );

        PickerOptions {
            start_date,
            end_date,
            dates_configured,
            min_date,
            max_date,
            max_span,
            auto_apply,
            single_date_picker: cfg.single_date_picker,
            show_dropdowns: cfg.show_dropdowns,
            min_year: cfg.min_year.unwrap_or(today.year() - 100),
            max_year: cfg.max_year.unwrap_or(today.year() + 100),
            show_week_numbers: cfg.show_week_numbers,
            show_iso_week_numbers: cfg.show_iso_week_numbers,
            show_custom_range_label: cfg.show_custom_range_label,
            time_picker: cfg.time_picker,
            time_picker_24_hour: cfg.time_picker_24_hour,
            time_picker_increment,
            time_picker_seconds: cfg.time_picker_seconds,
            linked_calendars: cfg.linked_calendars,
            auto_update_input: cfg.auto_update_input,
            always_show_calendars: cfg.always_show_calendars,
            ranges: cfg.ranges.clone(),
            locale,
            opens,
            drops,
            buttons,
            hooks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn dt(y: i32, m: u32, day: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, day)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_defaults_cover_today() {
        let opts = PickerOptions::new(now());
        assert_eq!(opts.start_date, dt(2024, 6, 15, 0, 0, 0));
        assert_eq!(opts.end_date.date(), now().date());
        assert!(!opts.dates_configured);
        assert!(opts.linked_calendars);
        assert!(opts.auto_update_input);
        assert!(opts.show_custom_range_label);
        assert_eq!(opts.opens, Opens::Right);
        assert_eq!(opts.drops, Drops::Down);
        assert_eq!(opts.min_year, 1924);
        assert_eq!(opts.max_year, 2124);
    }

    #[test]
    fn test_dates_parse_with_locale_format() {
        let cfg = PickerConfig {
            start_date: Some("01/05/2024".to_string()),
            end_date: Some("01/09/2024".to_string()),
            min_date: Some("2024-01-01".to_string()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        assert!(opts.dates_configured);
        assert_eq!(opts.start_date, dt(2024, 1, 5, 0, 0, 0));
        assert_eq!(opts.end_date.date(), NaiveDate::from_ymd_opt(2024, 1, 9).unwrap());
        assert_eq!(opts.min_date, Some(dt(2024, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_bad_date_falls_back_to_default() {
        let cfg = PickerConfig {
            start_date: Some("yesterday-ish".to_string()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        assert!(!opts.dates_configured);
        assert_eq!(opts.start_date, dt(2024, 6, 15, 0, 0, 0));
    }

    #[test]
    fn test_max_date_extends_to_end_of_day_without_time_picker() {
        let cfg = PickerConfig {
            max_date: Some("2024-01-20".to_string()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        let max = opts.max_date.unwrap();
        assert_eq!(max.date(), NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
        assert!(max > dt(2024, 1, 20, 23, 59, 0));
    }

    #[test]
    fn test_inverted_bounds_drop_max() {
        let cfg = PickerConfig {
            min_date: Some("2024-02-01".to_string()),
            max_date: Some("2024-01-01".to_string()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        assert!(opts.min_date.is_some());
        assert!(opts.max_date.is_none());
    }

    #[test]
    fn test_time_picker_disables_auto_apply() {
        let cfg = PickerConfig {
            time_picker: true,
            auto_apply: true,
            ..PickerConfig::default()
        };
        assert!(!PickerOptions::from_config(&cfg, now()).auto_apply);
    }

    #[test]
    fn test_bad_increment_and_positions_fall_back() {
        let cfg = PickerConfig {
            time_picker_increment: 0,
            opens: Some("diagonal".to_string()),
            drops: Some("auto".to_string()),
            max_span: Some(Span::default()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        assert_eq!(opts.time_picker_increment, 1);
        assert_eq!(opts.opens, Opens::Right);
        assert_eq!(opts.drops, Drops::Auto);
        assert!(opts.max_span.is_none());
    }

    #[test]
    fn test_out_of_range_max_span_is_dropped() {
        let cfg = PickerConfig {
            max_span: Some(Span::days(4_000_000_000)),
            ..PickerConfig::default()
        };
        assert!(PickerOptions::from_config(&cfg, now()).max_span.is_none());
        let cfg = PickerConfig {
            max_span: Some(Span::days(30)),
            ..PickerConfig::default()
        };
        assert_eq!(PickerOptions::from_config(&cfg, now()).max_span, Some(Span::days(30)));
    }

    #[test]
    fn test_button_classes_override() {
        let cfg = PickerConfig {
            apply_button_classes: Some("btn-success".to_string()),
            ..PickerConfig::default()
        };
        let opts = PickerOptions::from_config(&cfg, now());
        assert_eq!(opts.buttons.apply, "btn-success");
        assert_eq!(opts.buttons.cancel, "btn-default");
    }

    #[test]
    fn test_picker_file_yaml_roundtrip() {
        let file = PickerFile {
            picker: PickerConfig {
                single_date_picker: true,
                max_span: Some(Span::days(7)),
                ranges: vec![PresetConfig::new("Today", "today", "today")],
                ..PickerConfig::default()
            },
        };
        let yaml = serde_norway::to_string(&file).unwrap();
        let parsed: PickerFile = serde_norway::from_str(&yaml).unwrap();
        assert!(parsed.picker.single_date_picker);
        assert_eq!(parsed.picker.max_span, Some(Span::days(7)));
        assert_eq!(parsed.picker.ranges.len(), 1);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "picker:\n  time_picker: true\n  max_span:\n    days: 3\n";
        let parsed: PickerFile = serde_norway::from_str(yaml).unwrap();
        assert!(parsed.picker.time_picker);
        assert!(parsed.picker.linked_calendars);
        assert_eq!(parsed.picker.time_picker_increment, 1);
        assert_eq!(parsed.picker.max_span, Some(Span::days(3)));
    }
}
