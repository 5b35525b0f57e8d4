use crate::calc::dates::parse_date_time;
use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

type InvalidDateFn = Rc<dyn Fn(NaiveDate) -> bool>;
type CustomDateFn = Rc<dyn Fn(NaiveDate) -> Vec<String>>;

/// Extra classes attached to one date in the calendar grid.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct CustomDateConfig {
    pub date: String,
    pub classes: Vec<String>,
}

/// Per-date predicates consulted by the grid builder: one marks dates as
/// unselectable, the other attaches custom classes.
#[derive(Clone)]
pub struct DateHooks {
    is_invalid_date: InvalidDateFn,
    is_custom_date: CustomDateFn,
}

impl Default for DateHooks {
    fn default() -> Self {
        DateHooks {
            is_invalid_date: Rc::new(|_| false),
            is_custom_date: Rc::new(|_| Vec::new()),
        }
    }
}

impl fmt::Debug for DateHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateHooks").finish_non_exhaustive()
    }
}

impl DateHooks {
    pub fn with_invalid_date(mut self, f: impl Fn(NaiveDate) -> bool + 'static) -> Self {
        self.is_invalid_date = Rc::new(f);
        self
    }

    pub fn with_custom_date(mut self, f: impl Fn(NaiveDate) -> Vec<String> + 'static) -> Self {
        self.is_custom_date = Rc::new(f);
        self
    }

    pub fn is_invalid(&self, date: NaiveDate) -> bool {
        (self.is_invalid_date)(date)
    }

    pub fn custom_classes(&self, date: NaiveDate) -> Vec<String> {
        (self.is_custom_date)(date)
    }

    /// Builds hooks from the `invalid_dates`, `invalid_weekdays` and
    /// `custom_dates` lists of picker.yaml. Entries that do not parse are
    /// skipped with a warning.
    pub fn from_config(
        invalid_dates: &[String],
        invalid_weekdays: &[String],
        custom_dates: &[CustomDateConfig],
        format: &str,
    ) -> Self {
        let mut hooks = DateHooks::default();

        let dates: HashSet<NaiveDate> = invalid_dates
            .iter()
            .filter_map(|raw| {
                let parsed = parse_date_time(raw, format).map(|dt| dt.date());
                if parsed.is_none() {
                    tracing::warn!(target: "rangepick::config", "skipping invalid_dates entry '{}'", raw);
                }
                parsed
            })
            .collect();
        let weekdays: HashSet<Weekday> = invalid_weekdays
            .iter()
            .filter_map(|raw| {
                let parsed = raw.parse::<Weekday>().ok();
                if parsed.is_none() {
                    tracing::warn!(target: "rangepick::config", "skipping invalid_weekdays entry '{}'", raw);
                }
                parsed
            })
            .collect();
        if !dates.is_empty() || !weekdays.is_empty() {
            hooks = hooks.with_invalid_date(move |date| {
                dates.contains(&date) || weekdays.contains(&date.weekday())
            });
        }

        let mut classes: HashMap<NaiveDate, Vec<String>> = HashMap::new();
        for entry in custom_dates {
            match parse_date_time(&entry.date, format) {
                Some(dt) => classes
                    .entry(dt.date())
                    .or_default()
                    .extend(entry.classes.iter().cloned()),
                None => {
                    tracing::warn!(target: "rangepick::config", "skipping custom_dates entry '{}'", entry.date)
                }
            }
        }
        if !classes.is_empty() {
            hooks = hooks.with_custom_date(move |date| classes.get(&date).cloned().unwrap_or_default());
        }
        hooks
    }
}
