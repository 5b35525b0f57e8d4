use anyhow::{Context, Result};
use rangepick::data::{Persistable, PickerConfig, PickerFile, PresetConfig, SelectionData};
use std::fs;
use std::path::Path;

pub fn run() -> Result<()> {
    let dir = rangepick::data::persistence::get_data_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    run_in_dir(&dir)?;
    println!("Data files initialized successfully.");
    Ok(())
}

/// Writes the default data files into `dir`. Exposed for unit testing.
pub(crate) fn run_in_dir(dir: &Path) -> Result<()> {
    PickerFile {
        picker: default_config(),
    }
    .save_to(dir)?;
    SelectionData::default().save_to(dir)?;
    Ok(())
}

/// A starter configuration with the usual reporting presets.
pub(crate) fn default_config() -> PickerConfig {
    PickerConfig {
        ranges: vec![
            PresetConfig::new("Today", "today", "today"),
            PresetConfig::new("Yesterday", "yesterday", "yesterday"),
            PresetConfig::new("Last 7 Days", "today-6d", "today"),
            PresetConfig::new("Last 30 Days", "today-29d", "today"),
            PresetConfig::new("This Month", "month_start", "month_end"),
            PresetConfig::new("Last Month", "month_start-1m", "month_end-1m"),
        ],
        show_dropdowns: true,
        ..PickerConfig::default()
    }
}
