use crate::keys::{CourseKey, UsageKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type PartitionId = u32;
pub type GroupId = u32;

/// Group access rules of a single block: partition id -> allowed group ids.
/// An empty list leaves the partition unrestricted.
pub type GroupAccess = BTreeMap<PartitionId, Vec<GroupId>>;

/// A node of the course content tree (course, chapter, sequential, vertical, leaf blocks)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub location: UsageKey,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub due: Option<DateTime<Utc>>,
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub children: Vec<UsageKey>,
    #[serde(default)]
    pub group_access: GroupAccess,
    /// Raw body for html-like blocks (about, course_info, static_tab, html)
    #[serde(default)]
    pub data: Option<String>,
    /// Any other block fields, addressable through `include_fields`
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl ContentNode {
    pub fn new(location: UsageKey) -> Self {
        Self {
            location,
            display_name: None,
            due: None,
            start: None,
            end: None,
            children: Vec::new(),
            group_access: GroupAccess::new(),
            data: None,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn category(&self) -> &str {
        self.location.category()
    }

    pub fn is_course_root(&self) -> bool {
        self.location.is_course_root()
    }

    pub fn course_key(&self) -> &CourseKey {
        &self.location.course_key
    }

    /// Body of the block, treating blank data as absent
    pub fn non_empty_data(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseTab {
    #[serde(rename = "type")]
    pub tab_type: String,
    pub name: String,
    #[serde(default)]
    pub url_slug: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPartition {
    pub id: PartitionId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub groups: Vec<Group>,
}

impl UserPartition {
    pub fn has_group(&self, group_id: GroupId) -> bool {
        self.groups.iter().any(|g| g.id == group_id)
    }
}

/// Course-wide settings stored next to the course root block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSettings {
    pub key: CourseKey,
    #[serde(default)]
    pub course_image: Option<String>,
    #[serde(default)]
    pub tabs: Vec<CourseTab>,
    #[serde(default)]
    pub user_partitions: Vec<UserPartition>,
    #[serde(default)]
    pub enrollment_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub enrollment_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invite_only: bool,
}

impl CourseSettings {
    pub fn new(key: CourseKey) -> Self {
        Self {
            key,
            course_image: None,
            tabs: Vec::new(),
            user_partitions: Vec::new(),
            enrollment_start: None,
            enrollment_end: None,
            invite_only: false,
        }
    }

    pub fn course_image_url(&self) -> String {
        match self.course_image.as_deref() {
            Some(image) if !image.is_empty() => self.key.asset_path(image),
            _ => String::new(),
        }
    }
}

/// A course as returned by the store: its settings plus the root block
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    pub settings: CourseSettings,
    pub root: ContentNode,
}

impl Course {
    pub fn key(&self) -> &CourseKey {
        &self.settings.key
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub username: String,
    pub course_id: CourseKey,
    pub mode: String,
    pub is_active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMode {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub min_price: u32,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub expiration_datetime: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "usd".to_string()
}

impl CourseMode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_datetime.map_or(false, |exp| exp <= now)
    }
}
