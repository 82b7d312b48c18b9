use std::env;
use std::path::{Component, Path, PathBuf};

use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub data_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            data_dir: env::var("QUIZ_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            images_dir: env::var("QUIZ_IMAGES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("images")),
        }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Where a question image reference resolves for a course:
    /// `<images_dir>/<course>/<topic_id>/<filename>`. References that would
    /// leave the course directory are refused.
    pub fn image_path(&self, course_id: &str, reference: &str) -> AppResult<PathBuf> {
        Ok(self
            .images_dir
            .join(relative_path(course_id)?)
            .join(relative_path(reference)?))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            data_dir: PathBuf::from("test-data"),
            images_dir: PathBuf::from("test-images"),
        }
    }
}

/// Accepts only plain relative paths; `..`, roots and prefixes are refused.
pub fn relative_path(reference: &str) -> AppResult<PathBuf> {
    let path = PathBuf::from(reference);
    let plain = !reference.is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(AppError::ValidationError(format!(
            "Invalid path reference: '{}'",
            reference
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_with_defaults() {
        let config = Config::from_env();

        // Should use env vars if set, or fall back to defaults
        assert!(!config.data_dir.as_os_str().is_empty());
        assert!(!config.images_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_with_data_dir_overrides_only_data_dir() {
        let config = Config::test_config().with_data_dir("/tmp/quiz");

        assert_eq!(config.data_dir(), Path::new("/tmp/quiz"));
        assert_eq!(config.images_dir, PathBuf::from("test-images"));
    }

    #[test]
    fn test_image_path_is_scoped_to_course() {
        let config = Config::test_config();

        assert_eq!(
            config.image_path("math", "algebra/graph.png").unwrap(),
            PathBuf::from("test-images/math/algebra/graph.png")
        );
    }

    #[test]
    fn test_image_path_refuses_escaping_references() {
        let config = Config::test_config();

        assert!(config.image_path("math", "../../etc/passwd").is_err());
        assert!(config.image_path("math", "algebra/../../x.png").is_err());
        assert!(config.image_path("math", "/abs/x.png").is_err());
        assert!(config.image_path("..", "x.png").is_err());
    }

    #[test]
    fn test_relative_path_refuses_escaping_paths() {
        assert!(relative_path("topic/a.json").is_ok());
        assert!(relative_path("../secrets.json").is_err());
        assert!(relative_path("/etc/passwd").is_err());
        assert!(relative_path("").is_err());
    }
}
