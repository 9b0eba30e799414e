//! Opaque identifiers for courses and the blocks inside them.
//!
//! Course keys are written `course-v1:{org}+{course}+{run}`. The slash
//! separated `{org}/{course}/{run}` form is accepted when parsing and always
//! normalized to the canonical form on output.
//!
//! Usage keys locate a block inside a course:
//! `block-v1:{org}+{course}+{run}+type@{block_type}+block@{block_id}`.

use crate::constants::{COURSE_CATEGORY, COURSE_ROOT_BLOCK_ID};
use crate::error::ApiError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const COURSE_PREFIX: &str = "course-v1:";
const BLOCK_PREFIX: &str = "block-v1:";
const TYPE_TAG: &str = "type@";
const BLOCK_TAG: &str = "block@";

static KEY_PART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w\-~.:]+$").expect("key part pattern is valid"));

fn valid_part(part: &str) -> bool {
    KEY_PART.is_match(part)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseKey {
    pub org: String,
    pub course: String,
    pub run: String,
}

impl CourseKey {
    pub fn new(org: impl Into<String>, course: impl Into<String>, run: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            course: course.into(),
            run: run.into(),
        }
    }

    /// Location of the course root block
    pub fn root_location(&self) -> UsageKey {
        self.make_usage_key(COURSE_CATEGORY, COURSE_ROOT_BLOCK_ID)
    }

    pub fn make_usage_key(&self, block_type: impl Into<String>, block_id: impl Into<String>) -> UsageKey {
        UsageKey {
            course_key: self.clone(),
            block_type: block_type.into(),
            block_id: block_id.into(),
        }
    }

    /// Path of a course asset, as served by the static asset handler
    pub fn asset_path(&self, filename: &str) -> String {
        format!(
            "/asset-v1:{}+{}+{}+type@asset+block@{}",
            self.org, self.course, self.run, filename
        )
    }

    fn from_parts(parts: &[&str], raw: &str) -> Result<Self, ApiError> {
        match parts {
            [org, course, run] if parts.iter().all(|p| valid_part(p)) => {
                Ok(Self::new(*org, *course, *run))
            }
            _ => Err(ApiError::InvalidKey(raw.to_string())),
        }
    }
}

impl FromStr for CourseKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(rest) = s.strip_prefix(COURSE_PREFIX) {
            let parts: Vec<&str> = rest.split('+').collect();
            return Self::from_parts(&parts, s);
        }
        let parts: Vec<&str> = s.split('/').collect();
        Self::from_parts(&parts, s)
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}+{}+{}", COURSE_PREFIX, self.org, self.course, self.run)
    }
}

impl TryFrom<String> for CourseKey {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CourseKey> for String {
    fn from(key: CourseKey) -> Self {
        key.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UsageKey {
    pub course_key: CourseKey,
    pub block_type: String,
    pub block_id: String,
}

impl UsageKey {
    /// Category of the block this key points at
    pub fn category(&self) -> &str {
        &self.block_type
    }

    pub fn is_course_root(&self) -> bool {
        self.block_type == COURSE_CATEGORY
    }
}

impl FromStr for UsageKey {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ApiError::InvalidKey(s.to_string());
        let rest = s.strip_prefix(BLOCK_PREFIX).ok_or_else(invalid)?;
        let parts: Vec<&str> = rest.split('+').collect();
        let [org, course, run, block_type, block_id] = parts.as_slice() else {
            return Err(invalid());
        };
        let block_type = block_type.strip_prefix(TYPE_TAG).ok_or_else(invalid)?;
        let block_id = block_id.strip_prefix(BLOCK_TAG).ok_or_else(invalid)?;
        if ![org, course, run, &block_type, &block_id]
            .iter()
            .all(|p| valid_part(p))
        {
            return Err(invalid());
        }
        Ok(CourseKey::new(*org, *course, *run).make_usage_key(block_type, block_id))
    }
}

impl fmt::Display for UsageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}+{}+{}+{}{}+{}{}",
            BLOCK_PREFIX,
            self.course_key.org,
            self.course_key.course,
            self.course_key.run,
            TYPE_TAG,
            self.block_type,
            BLOCK_TAG,
            self.block_id
        )
    }
}

impl TryFrom<String> for UsageKey {
    type Error = ApiError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<UsageKey> for String {
    fn from(key: UsageKey) -> Self {
        key.to_string()
    }
}
