use super::auth::CurrentUser;
use super::AppState;
use crate::content::delete_orphans;
use crate::error::{ApiError, Result};
use crate::keys::CourseKey;
use axum::{
    extract::{Path, State},
    http::Method,
    Json,
};

/// GET lists a course's orphans, DELETE removes them. Staff only.
pub async fn orphan_handler(
    State(state): State<AppState>,
    method: Method,
    Path(course_id): Path<String>,
    user: Option<CurrentUser>,
) -> Result<Json<Vec<String>>> {
    let user = user.ok_or(ApiError::Unauthorized)?;
    user.require_staff()?;

    let course_id = course_id.trim_matches('/');
    let course: CourseKey = course_id
        .parse()
        .map_err(|_| ApiError::NotFound(format!("course {course_id}")))?;
    let commit = method == Method::DELETE;
    let orphans = delete_orphans(state.storage.as_ref(), &course, commit).await?;
    Ok(Json(orphans))
}
