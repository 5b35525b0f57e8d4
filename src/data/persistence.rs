use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Set once at startup by main() from the --data-dir argument.
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Call this from main() before any load/save operations.
pub fn set_data_dir(path: PathBuf) {
    let _ = DATA_DIR.set(path);
}

pub fn get_data_dir() -> Result<PathBuf> {
    if let Some(dir) = DATA_DIR.get() {
        return Ok(dir.clone());
    }
    // Fallback when running tests or if set_data_dir was not called
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(cwd.join("config"))
}

pub fn get_file_path(name: &str) -> Result<PathBuf> {
    Ok(get_data_dir()?.join(name))
}

/// A document stored as one file in the data directory, YAML or JSON.
/// Missing files load as `Default`.
pub trait Persistable: Sized + Default + Serialize + for<'de> Deserialize<'de> {
    fn filename() -> &'static str;
    fn is_json() -> bool;

    fn load() -> Result<Self> {
        Self::load_from(&get_data_dir()?)
    }

    fn save(&self) -> Result<()> {
        self.save_to(&get_data_dir()?)
    }

    /// Load from an explicit directory, bypassing the global `DATA_DIR`.
    fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(Self::filename());
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::decode(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Save to an explicit directory, bypassing the global `DATA_DIR`.
    fn save_to(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create dir {}", dir.display()))?;
        let path = dir.join(Self::filename());
        fs::write(&path, self.encode()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    fn decode(contents: &str) -> Result<Self> {
        if Self::is_json() {
            serde_json::from_str(contents).context("invalid JSON")
        } else {
            serde_norway::from_str(contents).context("invalid YAML")
        }
    }

    fn encode(&self) -> Result<String> {
        if Self::is_json() {
            serde_json::to_string_pretty(self).context("failed to serialize JSON")
        } else {
            serde_norway::to_string(self).context("failed to serialize YAML")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
    struct TestJsonData {
        value: String,
    }

    impl Persistable for TestJsonData {
        fn filename() -> &'static str {
            "test_data.json"
        }
        fn is_json() -> bool {
            true
        }
    }

    #[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
    struct TestYamlData {
        count: u32,
    }

    impl Persistable for TestYamlData {
        fn filename() -> &'static str {
            "test_data.yaml"
        }
        fn is_json() -> bool {
            false
        }
    }

    #[test]
    fn test_get_data_dir_returns_a_path() {
        assert!(get_data_dir().is_ok());
    }

    #[test]
    fn test_get_file_path_appends_filename() {
        let path = get_file_path("picker.yaml").unwrap();
        assert!(path.ends_with("picker.yaml"));
    }

    #[test]
    fn test_load_from_returns_default_when_file_missing() {
        let tmp = TempDir::new().unwrap();
        let result = TestJsonData::load_from(tmp.path()).unwrap();
        assert_eq!(result, TestJsonData::default());
    }

    #[test]
    fn test_json_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let data = TestJsonData {
            value: "selection".to_string(),
        };
        data.save_to(tmp.path()).unwrap();
        assert_eq!(TestJsonData::load_from(tmp.path()).unwrap(), data);
    }

    #[test]
    fn test_yaml_save_to_and_load_from() {
        let tmp = TempDir::new().unwrap();
        let data = TestYamlData { count: 42 };
        data.save_to(tmp.path()).unwrap();
        assert_eq!(TestYamlData::load_from(tmp.path()).unwrap(), data);
    }

    #[test]
    fn test_save_to_creates_directory_if_missing() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let data = TestYamlData { count: 7 };
        data.save_to(&nested).unwrap();
        assert_eq!(TestYamlData::load_from(&nested).unwrap(), data);
    }

    #[test]
    fn test_load_from_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("test_data.json"), "{not json").unwrap();
        let err = TestJsonData::load_from(tmp.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("test_data.json"));
    }

    #[test]
    fn test_picker_file_save_to_load_from() {
        use crate::data::picker_config::{PickerConfig, PickerFile};
        let tmp = TempDir::new().unwrap();
        let file = PickerFile {
            picker: PickerConfig {
                show_week_numbers: true,
                ..PickerConfig::default()
            },
        };
        file.save_to(tmp.path()).unwrap();
        let loaded = PickerFile::load_from(tmp.path()).unwrap();
        assert!(loaded.picker.show_week_numbers);
    }
}
