use crate::domain::{ContentNode, CourseMode, CourseSettings, Enrollment, User};
use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Fixture file layout used to seed and persist the in-memory store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub courses: Vec<SeedCourse>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedCourse {
    #[serde(flatten)]
    pub settings: CourseSettings,
    #[serde(default)]
    pub modes: Vec<CourseMode>,
    /// All blocks of the course, root included
    #[serde(default)]
    pub items: Vec<ContentNode>,
}

impl Seed {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ApiError::Config(format!("Failed to read seed file '{}': {}", path.display(), e))
        })?;
        let seed: Seed = serde_json::from_str(&content)?;
        info!(
            path = %path.display(),
            courses = seed.courses.len(),
            users = seed.users.len(),
            "Loaded seed file"
        );
        Ok(seed)
    }

    /// Write the fixture atomically: a sibling temp file is renamed over the target
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(self)?)?;
        fs::rename(&tmp, path)?;
        info!(path = %path.display(), "Saved seed file");
        Ok(())
    }
}
