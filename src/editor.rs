use std::collections::BTreeSet;

use serde_json::Value;

use crate::core::config::{CourseConfig, CourseId};

/// File types offered by the editor's include/exclude lists.
pub const COMMON_TYPES: [&str; 10] = [
    "pdf", "docx", "pptx", "xlsx", "txt", "zip", "mp4", "mp3", "jpg", "png",
];

/// Form state behind the TUI configuration editor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Editor {
    pub token: String,
    pub url: String,
    pub courses: Vec<CourseId>,
    pub download_dir: String,
    pub includes: BTreeSet<String>,
    pub excludes: BTreeSet<String>,
}

impl Editor {
    /// Takes what the editor understands from either schema.
    pub fn from_config(config: &CourseConfig) -> Self {
        Self {
            token: config.token.clone().unwrap_or_default(),
            url: config.site_url().unwrap_or_default().to_string(),
            courses: config.courses(),
            download_dir: config.download_dir().unwrap_or_default().to_string(),
            includes: config.string_list("includes").into_iter().collect(),
            excludes: config.string_list("excludes").into_iter().collect(),
        }
    }

    /// Legacy-schema configuration, filters only when non-empty.
    pub fn to_config(&self) -> CourseConfig {
        let mut config = CourseConfig::legacy(
            self.token.clone(),
            self.url.clone(),
            self.courses.clone(),
            self.download_dir.clone(),
        );
        for (key, types) in [("includes", &self.includes), ("excludes", &self.excludes)] {
            if !types.is_empty() {
                let list: Vec<String> = types.iter().cloned().collect();
                config.extra.insert(key.to_string(), Value::from(list));
            }
        }
        config
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.token.trim().is_empty() {
            return Err("Please enter the Canvas API token");
        }
        if self.url.trim().is_empty() {
            return Err("Please enter the Canvas URL");
        }
        if self.courses.is_empty() {
            return Err("Please enter at least one course id");
        }
        if self.download_dir.trim().is_empty() {
            return Err("Please choose a download directory");
        }
        Ok(())
    }

    /// Sets the course list from numeric ids; returns the rejected inputs.
    pub fn set_courses(&mut self, raw: &[String]) -> Vec<String> {
        let mut rejected = Vec::new();
        let mut courses = Vec::new();
        for value in raw {
            match value.trim().parse::<u64>() {
                Ok(id) => courses.push(CourseId::Number(id)),
                Err(_) => rejected.push(value.clone()),
            }
        }
        self.courses = courses;
        rejected
    }
}

pub fn normalize_types(raw: &[String]) -> BTreeSet<String> {
    raw.iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn filled() -> Editor {
        let mut editor = Editor {
            token: "tok".into(),
            url: "https://canvas.example.edu".into(),
            download_dir: "/tmp/canvas".into(),
            ..Editor::default()
        };
        editor.set_courses(&["101".into()]);
        editor
    }

    #[test]
    fn validation_checks_fields_in_form_order() {
        assert_eq!(Editor::default().validate(), Err("Please enter the Canvas API token"));
        let mut editor = filled();
        editor.courses.clear();
        assert_eq!(editor.validate(), Err("Please enter at least one course id"));
        assert_eq!(filled().validate(), Ok(()));
    }

    #[test]
    fn non_numeric_course_ids_are_rejected() {
        let mut editor = Editor::default();
        let rejected = editor.set_courses(&["12".into(), "abc".into(), " 34 ".into()]);
        assert_eq!(rejected, vec!["abc".to_string()]);
        assert_eq!(editor.courses, vec![CourseId::Number(12), CourseId::Number(34)]);
    }

    #[test]
    fn produces_legacy_config_with_defaults() {
        let mut editor = filled();
        editor.includes = normalize_types(&[".PDF".into(), "docx".into()]);
        let config = editor.to_config();

        assert_eq!(config.validate().unwrap(), crate::core::config::ConfigSchema::Legacy);
        assert_eq!(config.extra["allowVideo"], json!(true));
        assert_eq!(config.extra["filesizeThresh"], json!(1e9));
        assert_eq!(config.extra["courseCodes"], json!([]));
        assert_eq!(config.extra["includes"], json!(["docx", "pdf"]));
        assert_eq!(config.extra.get("excludes"), None);
    }

    #[test]
    fn loads_either_schema() {
        let single: CourseConfig = serde_json::from_str(
            r#"{"token": "t", "base_url": "https://b", "course_id": 9, "download_path": "/d"}"#,
        )
        .unwrap();
        let editor = Editor::from_config(&single);
        assert_eq!(editor.url, "https://b");
        assert_eq!(editor.courses, vec![CourseId::Number(9)]);
        assert_eq!(editor.download_dir, "/d");
        assert_eq!(Editor::from_config(&editor.to_config()), editor);
    }

    #[test]
    fn odd_shaped_filters_load_as_empty() {
        let config: CourseConfig = serde_json::from_str(
            r#"{"token": "t", "canvasURL": "u", "courseIDs": [1], "includes": "pdf", "excludes": ["zip", 3]}"#,
        )
        .unwrap();
        let editor = Editor::from_config(&config);
        assert!(editor.includes.is_empty());
        assert_eq!(editor.excludes, BTreeSet::from(["zip".to_string()]));
    }
}
