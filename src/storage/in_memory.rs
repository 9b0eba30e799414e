use super::seed::{Seed, SeedCourse};
use super::Storage;
use crate::content::group_access::validate_group_access;
use crate::domain::{ContentNode, Course, CourseMode, CourseSettings, Enrollment, User};
use crate::error::{ApiError, Result};
use crate::keys::{CourseKey, UsageKey};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    courses: Arc<Mutex<HashMap<CourseKey, CourseSettings>>>,
    items: Arc<Mutex<HashMap<UsageKey, ContentNode>>>,
    users: Arc<Mutex<HashMap<String, User>>>,
    enrollments: Arc<Mutex<HashMap<(String, CourseKey), Enrollment>>>,
    course_modes: Arc<Mutex<HashMap<CourseKey, Vec<CourseMode>>>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(table: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    table.lock().map_err(|e| ApiError::Storage {
        message: format!("store table poisoned: {e}"),
    })
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            courses: Arc::new(Mutex::new(HashMap::new())),
            items: Arc::new(Mutex::new(HashMap::new())),
            users: Arc::new(Mutex::new(HashMap::new())),
            enrollments: Arc::new(Mutex::new(HashMap::new())),
            course_modes: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build a store from a fixture. Every course must carry its root block.
    pub fn from_seed(seed: Seed) -> Result<Self> {
        let store = Self::new();
        {
            let mut courses = lock(&store.courses)?;
            let mut items = lock(&store.items)?;
            let mut modes = lock(&store.course_modes)?;

            for course in seed.courses {
                let key = course.settings.key.clone();
                let root = key.root_location();
                if !course.items.iter().any(|n| n.location == root) {
                    return Err(ApiError::Config(format!(
                        "course {key} has no root block {root}"
                    )));
                }
                for node in course.items {
                    if node.location.course_key != key {
                        return Err(ApiError::Config(format!(
                            "block {} is listed under course {key}",
                            node.location
                        )));
                    }
                    for message in validate_group_access(&node, &course.settings.user_partitions) {
                        warn!(block = %node.location, "{message}");
                    }
                    items.insert(node.location.clone(), node);
                }
                if !course.modes.is_empty() {
                    modes.insert(key.clone(), course.modes);
                }
                courses.insert(key, course.settings);
            }
        }
        {
            let mut users = lock(&store.users)?;
            for user in seed.users {
                users.insert(user.username.clone(), user);
            }
        }
        {
            let mut enrollments = lock(&store.enrollments)?;
            for enrollment in seed.enrollments {
                enrollments.insert(
                    (enrollment.username.clone(), enrollment.course_id.clone()),
                    enrollment,
                );
            }
        }
        Ok(store)
    }

    /// Dump the whole store back into fixture form, in a stable order
    pub fn snapshot(&self) -> Result<Seed> {
        let courses = lock(&self.courses)?;
        let items = lock(&self.items)?;
        let modes = lock(&self.course_modes)?;

        let mut seed_courses: Vec<SeedCourse> = courses
            .values()
            .map(|settings| {
                let mut course_items: Vec<ContentNode> = items
                    .values()
                    .filter(|n| n.location.course_key == settings.key)
                    .cloned()
                    .collect();
                course_items.sort_by(|a, b| a.location.cmp(&b.location));
                SeedCourse {
                    settings: settings.clone(),
                    modes: modes.get(&settings.key).cloned().unwrap_or_default(),
                    items: course_items,
                }
            })
            .collect();
        seed_courses.sort_by(|a, b| a.settings.key.cmp(&b.settings.key));

        let mut users: Vec<User> = lock(&self.users)?.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));

        let mut enrollments: Vec<Enrollment> =
            lock(&self.enrollments)?.values().cloned().collect();
        enrollments.sort_by(|a, b| {
            (&a.username, &a.course_id).cmp(&(&b.username, &b.course_id))
        });

        Ok(Seed {
            courses: seed_courses,
            users,
            enrollments,
        })
    }

    fn course_with_root(
        settings: &CourseSettings,
        items: &HashMap<UsageKey, ContentNode>,
    ) -> Option<Course> {
        items
            .get(&settings.key.root_location())
            .map(|root| Course {
                settings: settings.clone(),
                root: root.clone(),
            })
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_course(&self, settings: CourseSettings, root: ContentNode) -> Result<()> {
        if root.location != settings.key.root_location() {
            return Err(ApiError::BadRequest(format!(
                "{} is not the root block of {}",
                root.location, settings.key
            )));
        }
        let key = settings.key.clone();
        lock(&self.items)?.insert(root.location.clone(), root);
        lock(&self.courses)?.insert(key.clone(), settings);

        debug!("Created course {}", key);
        Ok(())
    }

    async fn get_course(&self, key: &CourseKey) -> Result<Option<Course>> {
        let courses = lock(&self.courses)?;
        let items = lock(&self.items)?;
        Ok(courses
            .get(key)
            .and_then(|settings| Self::course_with_root(settings, &items)))
    }

    async fn list_courses(&self) -> Result<Vec<Course>> {
        let courses = lock(&self.courses)?;
        let items = lock(&self.items)?;
        let mut all_courses: Vec<Course> = courses
            .values()
            .filter_map(|settings| Self::course_with_root(settings, &items))
            .collect();
        all_courses.sort_by(|a, b| a.key().cmp(b.key()));
        Ok(all_courses)
    }

    async fn has_course(&self, key: &CourseKey) -> Result<bool> {
        Ok(lock(&self.courses)?.contains_key(key))
    }

    async fn get_item(&self, location: &UsageKey) -> Result<Option<ContentNode>> {
        Ok(lock(&self.items)?.get(location).cloned())
    }

    async fn get_items(&self, course: &CourseKey) -> Result<Vec<ContentNode>> {
        let items = lock(&self.items)?;
        let mut course_items: Vec<ContentNode> = items
            .values()
            .filter(|n| &n.location.course_key == course)
            .cloned()
            .collect();
        course_items.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(course_items)
    }

    async fn update_item(&self, node: &ContentNode) -> Result<()> {
        if !self.has_course(node.course_key()).await? {
            return Err(ApiError::NotFound(format!(
                "course {} for block {}",
                node.course_key(),
                node.location
            )));
        }
        lock(&self.items)?.insert(node.location.clone(), node.clone());

        debug!("Updated block {}", node.location);
        Ok(())
    }

    async fn delete_item(&self, location: &UsageKey) -> Result<bool> {
        let removed = lock(&self.items)?.remove(location).is_some();
        if removed {
            debug!("Deleted block {}", location);
        }
        Ok(removed)
    }

    async fn create_user(&self, user: &User) -> Result<()> {
        lock(&self.users)?.insert(user.username.clone(), user.clone());

        debug!("Created user {}", user.username);
        Ok(())
    }

    async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|u| u.token == token).cloned())
    }

    async fn get_enrollment(&self, username: &str, course: &CourseKey) -> Result<Option<Enrollment>> {
        let enrollments = lock(&self.enrollments)?;
        Ok(enrollments
            .get(&(username.to_string(), course.clone()))
            .cloned())
    }

    async fn get_enrollments(&self, username: &str) -> Result<Vec<Enrollment>> {
        let enrollments = lock(&self.enrollments)?;
        let mut user_enrollments: Vec<Enrollment> = enrollments
            .values()
            .filter(|e| e.username == username)
            .cloned()
            .collect();
        user_enrollments.sort_by(|a, b| a.created.cmp(&b.created));
        Ok(user_enrollments)
    }

    async fn save_enrollment(&self, enrollment: &Enrollment) -> Result<()> {
        lock(&self.enrollments)?.insert(
            (enrollment.username.clone(), enrollment.course_id.clone()),
            enrollment.clone(),
        );

        debug!(
            "Saved enrollment of {} in {} (mode {}, active {})",
            enrollment.username, enrollment.course_id, enrollment.mode, enrollment.is_active
        );
        Ok(())
    }

    async fn get_course_modes(&self, course: &CourseKey) -> Result<Vec<CourseMode>> {
        Ok(lock(&self.course_modes)?
            .get(course)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_course_modes(&self, course: &CourseKey, modes: Vec<CourseMode>) -> Result<()> {
        lock(&self.course_modes)?.insert(course.clone(), modes);
        Ok(())
    }
}
