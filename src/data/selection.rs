use crate::data::persistence::Persistable;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The last range the user applied, kept between runs in selection.json.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SelectionRecord {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Serialize, Deserialize, Default, Debug)]
pub struct SelectionData {
    #[serde(default)]
    pub last: Option<SelectionRecord>,
}

impl Persistable for SelectionData {
    fn filename() -> &'static str {
        "selection.json"
    }
    fn is_json() -> bool {
        true
    }
}

impl SelectionData {
    pub fn record(&mut self, start: NaiveDateTime, end: NaiveDateTime, label: Option<String>) {
        self.last = Some(SelectionRecord { start, end, label });
    }
}
