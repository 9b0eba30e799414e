//! Enrollment operations behind the enrollment API.
//!
//! Responses embed the course's enrollment details so clients can show the
//! available modes next to the enrollment itself.

use crate::constants::DEFAULT_COURSE_MODE;
use crate::domain::{CourseMode, CourseSettings, Enrollment};
use crate::error::{ApiError, Result};
use crate::keys::CourseKey;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseEnrollmentDetails {
    pub course_id: CourseKey,
    pub enrollment_start: Option<DateTime<Utc>>,
    pub enrollment_end: Option<DateTime<Utc>>,
    pub course_modes: Vec<CourseMode>,
    pub invite_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentRecord {
    pub created: DateTime<Utc>,
    pub mode: String,
    pub is_active: bool,
    pub user: String,
    pub course_details: CourseEnrollmentDetails,
}

fn default_mode() -> CourseMode {
    CourseMode {
        slug: DEFAULT_COURSE_MODE.to_string(),
        name: "Honor Code Certificate".to_string(),
        min_price: 0,
        currency: "usd".to_string(),
        expiration_datetime: None,
    }
}

/// Modes a student can enroll in right now. A course with no configured
/// modes offers the default honor mode.
async fn available_modes(storage: &dyn Storage, course: &CourseKey) -> Result<Vec<CourseMode>> {
    let configured = storage.get_course_modes(course).await?;
    if configured.is_empty() {
        return Ok(vec![default_mode()]);
    }
    let now = Utc::now();
    Ok(configured
        .into_iter()
        .filter(|m| !m.is_expired(now))
        .collect())
}

async fn course_settings(storage: &dyn Storage, course: &CourseKey) -> Result<CourseSettings> {
    storage
        .get_course(course)
        .await?
        .map(|c| c.settings)
        .ok_or_else(|| ApiError::BadRequest(format!("course {course} does not exist")))
}

pub async fn get_course_enrollment_details(
    storage: &dyn Storage,
    course: &CourseKey,
) -> Result<CourseEnrollmentDetails> {
    let settings = course_settings(storage, course).await?;
    Ok(CourseEnrollmentDetails {
        course_id: settings.key.clone(),
        enrollment_start: settings.enrollment_start,
        enrollment_end: settings.enrollment_end,
        course_modes: available_modes(storage, course).await?,
        invite_only: settings.invite_only,
    })
}

async fn to_record(storage: &dyn Storage, enrollment: Enrollment) -> Result<EnrollmentRecord> {
    let course_details = get_course_enrollment_details(storage, &enrollment.course_id).await?;
    Ok(EnrollmentRecord {
        created: enrollment.created,
        mode: enrollment.mode,
        is_active: enrollment.is_active,
        user: enrollment.username,
        course_details,
    })
}

/// The user's enrollment in the course, or `None` if they never enrolled
pub async fn get_enrollment(
    storage: &dyn Storage,
    username: &str,
    course: &CourseKey,
) -> Result<Option<EnrollmentRecord>> {
    if !storage.has_course(course).await? {
        return Err(ApiError::BadRequest(format!("course {course} does not exist")));
    }
    match storage.get_enrollment(username, course).await? {
        Some(enrollment) => Ok(Some(to_record(storage, enrollment).await?)),
        None => Ok(None),
    }
}

/// Every enrollment of the user, oldest first. Enrollments in courses that
/// no longer exist are left out.
pub async fn get_enrollments(storage: &dyn Storage, username: &str) -> Result<Vec<EnrollmentRecord>> {
    let mut records = Vec::new();
    for enrollment in storage.get_enrollments(username).await? {
        if !storage.has_course(&enrollment.course_id).await? {
            continue;
        }
        records.push(to_record(storage, enrollment).await?);
    }
    Ok(records)
}

/// Enroll the user, or reactivate and update an existing enrollment
pub async fn add_enrollment(
    storage: &dyn Storage,
    username: &str,
    course: &CourseKey,
    mode: Option<&str>,
) -> Result<EnrollmentRecord> {
    let details = get_course_enrollment_details(storage, course).await?;
    let mode = mode.unwrap_or(DEFAULT_COURSE_MODE);
    if !details.course_modes.iter().any(|m| m.slug == mode) {
        return Err(ApiError::EnrollmentFailure {
            message: format!("mode '{mode}' is not available for course {course}"),
            data: Some(serde_json::to_value(&details)?),
        });
    }

    let enrollment = match storage.get_enrollment(username, course).await? {
        Some(existing) => Enrollment {
            mode: mode.to_string(),
            is_active: true,
            ..existing
        },
        None => Enrollment {
            username: username.to_string(),
            course_id: course.clone(),
            mode: mode.to_string(),
            is_active: true,
            created: Utc::now(),
        },
    };
    storage.save_enrollment(&enrollment).await?;
    info!("Enrolled {} in {} as {}", username, course, mode);

    Ok(EnrollmentRecord {
        created: enrollment.created,
        mode: enrollment.mode,
        is_active: enrollment.is_active,
        user: enrollment.username,
        course_details: details,
    })
}

pub async fn deactivate_enrollment(
    storage: &dyn Storage,
    username: &str,
    course: &CourseKey,
) -> Result<EnrollmentRecord> {
    if !storage.has_course(course).await? {
        return Err(ApiError::BadRequest(format!("course {course} does not exist")));
    }
    let existing = storage
        .get_enrollment(username, course)
        .await?
        .ok_or_else(|| {
            ApiError::BadRequest(format!("{username} is not enrolled in {course}"))
        })?;
    let enrollment = Enrollment {
        is_active: false,
        ..existing
    };
    storage.save_enrollment(&enrollment).await?;
    info!("Unenrolled {} from {}", username, course);

    to_record(storage, enrollment).await
}
