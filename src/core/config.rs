use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::core::error::SyncError;

const DOWNLOAD_DIR: &str = "downloadDir";

/// Default `filesizeThresh` written by the editor (1 GB).
pub const DEFAULT_FILESIZE_THRESH: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseId {
    Number(u64),
    Text(String),
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseId::Number(id) => write!(f, "{id}"),
            CourseId::Text(id) => f.write_str(id),
        }
    }
}

/// A sync-utility configuration file in either of its two schemas.
///
/// Only the keys that select the schema and the courses are typed, and even
/// those are optional so that a missing field is reported by
/// [`CourseConfig::validate`] by name instead of as a serde error. Everything
/// else belongs to the utility: it lives in `extra` and is written back as
/// it was read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<CourseId>,
    #[serde(rename = "canvasURL", default, skip_serializing_if = "Option::is_none")]
    pub canvas_url: Option<String>,
    #[serde(rename = "courseIDs", default, skip_serializing_if = "Option::is_none")]
    pub course_ids: Option<Vec<CourseId>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSchema {
    /// `token`, `base_url`, `course_id`
    Single,
    /// `token`, `canvasURL`, `courseIDs`
    Legacy,
}

impl CourseConfig {
    /// Legacy-schema configuration with the defaults the editor writes.
    pub fn legacy(
        token: impl Into<String>,
        canvas_url: impl Into<String>,
        course_ids: Vec<CourseId>,
        download_dir: impl Into<String>,
    ) -> Self {
        let mut extra = Map::new();
        extra.insert(DOWNLOAD_DIR.to_string(), Value::from(download_dir.into()));
        extra.insert("filesizeThresh".to_string(), Value::from(DEFAULT_FILESIZE_THRESH));
        for flag in ["allowAudio", "allowVideo", "allowImage"] {
            extra.insert(flag.to_string(), Value::Bool(true));
        }
        extra.insert("courseCodes".to_string(), Value::Array(Vec::new()));
        Self {
            token: Some(token.into()),
            canvas_url: Some(canvas_url.into()),
            course_ids: Some(course_ids),
            extra,
            ..Self::default()
        }
    }

    pub fn schema(&self) -> ConfigSchema {
        if self.base_url.is_some() && self.course_id.is_some() {
            ConfigSchema::Single
        } else {
            ConfigSchema::Legacy
        }
    }

    pub fn validate(&self) -> Result<ConfigSchema, SyncError> {
        let schema = self.schema();
        let required: [(&'static str, bool); 3] = match schema {
            ConfigSchema::Single => [
                ("token", self.token.is_some()),
                ("base_url", self.base_url.is_some()),
                ("course_id", self.course_id.is_some()),
            ],
            ConfigSchema::Legacy => [
                ("token", self.token.is_some()),
                ("canvasURL", self.canvas_url.is_some()),
                ("courseIDs", self.course_ids.is_some()),
            ],
        };

        if let Some((field, _)) = required.iter().find(|(_, present)| !present) {
            return Err(SyncError::MissingField { field: *field });
        }

        if schema == ConfigSchema::Legacy
            && self.course_ids.as_ref().map_or(true, |ids| ids.is_empty())
        {
            return Err(SyncError::NoCourseIds);
        }

        Ok(schema)
    }

    pub fn site_url(&self) -> Option<&str> {
        self.canvas_url.as_deref().or(self.base_url.as_deref())
    }

    pub fn courses(&self) -> Vec<CourseId> {
        match self.schema() {
            ConfigSchema::Single => self.course_id.iter().cloned().collect(),
            ConfigSchema::Legacy => self.course_ids.clone().unwrap_or_default(),
        }
    }

    /// `downloadDir`, or the `download_path` spelling of the single schema.
    pub fn download_dir(&self) -> Option<&str> {
        [DOWNLOAD_DIR, "download_path"]
            .into_iter()
            .find_map(|key| self.extra.get(key).and_then(Value::as_str))
    }

    /// String entries of an array-valued key such as `includes`. Any other
    /// shape reads as empty; the raw value is still passed on untouched.
    pub fn string_list(&self, key: &str) -> Vec<String> {
        self.extra
            .get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copy of this configuration restricted to one course.
    pub fn single_course(&self, course: &CourseId) -> Self {
        let mut copy = self.clone();
        copy.course_ids = Some(vec![course.clone()]);
        copy
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Writes this configuration to a fresh temp file. The file is removed
    /// when the returned handle is dropped.
    pub fn write_temp(&self) -> Result<NamedTempFile, SyncError> {
        let mut file = tempfile::Builder::new()
            .prefix("syncflow-")
            .suffix(".json")
            .tempfile()
            .map_err(SyncError::TempConfig)?;
        let body = self
            .to_json_pretty()
            .map_err(|e| SyncError::TempConfig(e.into()))?;
        file.write_all(body.as_bytes())
            .and_then(|_| file.flush())
            .map_err(SyncError::TempConfig)?;
        Ok(file)
    }
}

pub fn load_config(path: &Path) -> Result<CourseConfig, SyncError> {
    if !path.is_file() {
        return Err(SyncError::ConfigNotFound {
            path: path.to_path_buf(),
        });
    }
    let raw = fs::read_to_string(path).map_err(|source| SyncError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SyncError::ConfigMalformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves `config` to `path`, appending `.json` when missing. Returns the
/// path actually written.
pub fn save_config(config: &CourseConfig, path: &Path) -> Result<PathBuf, SyncError> {
    let path = if path.extension().map_or(false, |ext| ext == "json") {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".json");
        PathBuf::from(name)
    };
    let body = config
        .to_json_pretty()
        .map(|body| body + "\n")
        .map_err(|e| SyncError::ConfigWrite {
            path: path.clone(),
            source: e.into(),
        })?;
    fs::write(&path, body).map_err(|source| SyncError::ConfigWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Resolves the configuration list for one run: a single file, or every
/// `*.json` file directly inside a directory, sorted by name.
pub fn collect_config_files(
    file: Option<&Path>,
    dir: Option<&Path>,
) -> Result<Vec<PathBuf>, SyncError> {
    if let Some(file) = file {
        if !file.is_file() {
            return Err(SyncError::ConfigNotFound {
                path: file.to_path_buf(),
            });
        }
        return Ok(vec![file.to_path_buf()]);
    }

    let Some(dir) = dir else {
        return Ok(Vec::new());
    };

    if !dir.is_dir() {
        return Err(SyncError::ConfigDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = fs::read_dir(dir).map_err(|source| SyncError::ConfigRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(SyncError::NoConfigFiles {
            path: dir.to_path_buf(),
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn parse(raw: &str) -> CourseConfig {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn single_schema_requires_token() {
        let config = parse(r#"{"base_url": "https://canvas.example.edu", "course_id": 42}"#);
        assert_eq!(config.schema(), ConfigSchema::Single);
        assert!(matches!(
            config.validate(),
            Err(SyncError::MissingField { field: "token" })
        ));
    }

    #[test]
    fn legacy_schema_reports_first_missing_field() {
        let config = parse(r#"{"token": "t", "courseIDs": [1]}"#);
        assert!(matches!(
            config.validate(),
            Err(SyncError::MissingField { field: "canvasURL" })
        ));
    }

    #[test]
    fn legacy_schema_rejects_empty_course_list() {
        let config = parse(r#"{"token": "t", "canvasURL": "u", "courseIDs": []}"#);
        assert!(matches!(config.validate(), Err(SyncError::NoCourseIds)));
    }

    #[test]
    fn valid_configs_list_their_courses() {
        let single = parse(r#"{"token": "t", "base_url": "u", "course_id": "abc"}"#);
        assert_eq!(single.validate().unwrap(), ConfigSchema::Single);
        assert_eq!(single.courses(), vec![CourseId::Text("abc".into())]);

        let legacy = parse(r#"{"token": "t", "canvasURL": "u", "courseIDs": [3, 5]}"#);
        assert_eq!(legacy.validate().unwrap(), ConfigSchema::Legacy);
        assert_eq!(legacy.courses(), vec![CourseId::Number(3), CourseId::Number(5)]);
    }

    #[test]
    fn single_course_copy_keeps_unknown_keys() {
        let config = parse(
            r#"{"token": "t", "canvasURL": "u", "courseIDs": [3, 5], "downloadDir": "d", "connectionCount": 8}"#,
        );
        let copy = config.single_course(&CourseId::Number(5));
        let value: Value = serde_json::from_str(&copy.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["courseIDs"], serde_json::json!([5]));
        assert_eq!(value["connectionCount"], serde_json::json!(8));
        assert_eq!(value["downloadDir"], serde_json::json!("d"));
    }

    #[test]
    fn utility_keys_pass_through_unchanged() {
        let raw = r#"{
            "token": "t",
            "canvasURL": "u",
            "courseIDs": [1, 2],
            "courseCodes": [101],
            "downloadDir": null,
            "filesizeThresh": "1e9",
            "allowAudio": 1,
            "includes": ["pdf", "pdf", "docx"]
        }"#;
        let config = parse(raw);
        assert_eq!(config.validate().unwrap(), ConfigSchema::Legacy);
        assert_eq!(config.download_dir(), None);

        let file = config.single_course(&CourseId::Number(2)).write_temp().unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(file.path()).unwrap()).unwrap();

        let mut expected: Value = serde_json::from_str(raw).unwrap();
        expected["courseIDs"] = serde_json::json!([2]);
        assert_eq!(written, expected);
    }

    #[test]
    fn temp_config_is_removed_on_drop() {
        let config = CourseConfig::legacy("t", "u", vec![CourseId::Number(1)], "d");
        let file = config.write_temp().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(load_config(&path).unwrap(), config);
        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn save_appends_json_extension() {
        let dir = TempDir::new().unwrap();
        let config = CourseConfig::legacy("t", "u", vec![CourseId::Number(1)], "d");
        let written = save_config(&config, &dir.path().join("course")).unwrap();
        assert_eq!(written, dir.path().join("course.json"));
        assert_eq!(load_config(&written).unwrap(), config);
    }

    #[test]
    fn directory_discovery_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();

        let files = collect_config_files(None, Some(dir.path())).unwrap();
        assert_eq!(files, vec![dir.path().join("a.json"), dir.path().join("b.json")]);
    }

    #[test]
    fn discovery_errors() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            collect_config_files(None, Some(dir.path())),
            Err(SyncError::NoConfigFiles { .. })
        ));
        assert!(matches!(
            collect_config_files(Some(&dir.path().join("missing.json")), None),
            Err(SyncError::ConfigNotFound { .. })
        ));
        assert!(matches!(
            collect_config_files(None, Some(&dir.path().join("nope"))),
            Err(SyncError::ConfigDirNotFound { .. })
        ));
    }

    #[test]
    fn malformed_json_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(SyncError::ConfigMalformed { .. })));
    }
}
