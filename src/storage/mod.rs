//! Content store accessor.
//!
//! Handlers and the maintenance commands only talk to `dyn Storage`; the
//! in-memory implementation backs the server and the tests, and `seed` moves
//! its contents to and from a JSON fixture file.

pub mod in_memory;
pub mod seed;

pub use in_memory::InMemoryStorage;
pub use seed::{Seed, SeedCourse};

use crate::error::Result;
use crate::domain::{ContentNode, Course, CourseMode, CourseSettings, Enrollment, User};
use crate::keys::{CourseKey, UsageKey};
use async_trait::async_trait;

/// Storage trait for course content, users and enrollments
#[async_trait]
pub trait Storage: Send + Sync {
    // Course operations
    async fn create_course(&self, settings: CourseSettings, root: ContentNode) -> Result<()>;
    async fn get_course(&self, key: &CourseKey) -> Result<Option<Course>>;
    async fn list_courses(&self) -> Result<Vec<Course>>;
    async fn has_course(&self, key: &CourseKey) -> Result<bool>;

    // Content operations
    async fn get_item(&self, location: &UsageKey) -> Result<Option<ContentNode>>;
    /// Every block stored under the course, reachable or not
    async fn get_items(&self, course: &CourseKey) -> Result<Vec<ContentNode>>;
    async fn update_item(&self, node: &ContentNode) -> Result<()>;
    async fn delete_item(&self, location: &UsageKey) -> Result<bool>;

    // User operations
    async fn create_user(&self, user: &User) -> Result<()>;
    async fn get_user_by_token(&self, token: &str) -> Result<Option<User>>;

    // Enrollment operations
    async fn get_enrollment(&self, username: &str, course: &CourseKey) -> Result<Option<Enrollment>>;
    async fn get_enrollments(&self, username: &str) -> Result<Vec<Enrollment>>;
    async fn save_enrollment(&self, enrollment: &Enrollment) -> Result<()>;
    async fn get_course_modes(&self, course: &CourseKey) -> Result<Vec<CourseMode>>;
    async fn set_course_modes(&self, course: &CourseKey, modes: Vec<CourseMode>) -> Result<()>;
}
