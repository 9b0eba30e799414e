//! Handlers for `/api/enrollment/v0/...`.
//!
//! Every route is throttled per caller. All routes except the course
//! enrollment details need a bearer token, and a caller may only read or
//! change their own enrollments.

use super::auth::CurrentUser;
use super::routes::{resolve_enrollment_path, EnrollmentRoute};
use super::AppState;
use crate::enrollment;
use crate::error::{ApiError, Result};
use crate::keys::CourseKey;
use crate::metrics::ApiMetrics;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header::LOCATION, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tracing::debug;

const ENROLLMENT_PREFIX: &str = "/api/enrollment/v0";
const ANONYMOUS_THROTTLE_KEY: &str = "anonymous";

#[derive(Debug, Default, Deserialize)]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub mode: Option<String>,
}

fn parse_course(course_id: &str) -> Result<CourseKey> {
    course_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("course {course_id} does not exist")))
}

/// Users are throttled by name, anonymous callers by their remote address
fn throttle_key(user: Option<&CurrentUser>, peer: Option<SocketAddr>) -> String {
    match (user, peer) {
        (Some(user), _) => format!("user:{}", user.username()),
        (None, Some(addr)) => format!("ip:{}", addr.ip()),
        (None, None) => ANONYMOUS_THROTTLE_KEY.to_string(),
    }
}

fn require_user(user: Option<CurrentUser>) -> Result<CurrentUser> {
    user.ok_or(ApiError::Unauthorized)
}

/// The path user must be the caller
fn require_self(user: Option<CurrentUser>, path_user: &str) -> Result<CurrentUser> {
    let user = require_user(user)?;
    if user.username() != path_user {
        return Err(ApiError::Unauthorized);
    }
    Ok(user)
}

fn found(location: String) -> Response {
    (StatusCode::FOUND, [(LOCATION, location)]).into_response()
}

pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    user: Option<CurrentUser>,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Option<Json<EnrollmentRequest>>,
) -> Result<Response> {
    let route = resolve_enrollment_path(&path)
        .ok_or_else(|| ApiError::NotFound(format!("no enrollment resource at '{path}'")))?;
    debug!(?route, %method, "Resolved enrollment route");

    let throttle_key = throttle_key(user.as_ref(), peer.map(|ConnectInfo(addr)| addr));
    if !state.throttle.check(&throttle_key).await {
        ApiMetrics::record_throttled("enrollment");
        return Err(ApiError::Throttled);
    }

    let storage = state.storage.as_ref();
    let is_get = method == Method::GET;
    match route {
        EnrollmentRoute::UserEnrollments { user: path_user } if is_get => {
            let user = require_self(user, &path_user)?;
            let records = enrollment::get_enrollments(storage, user.username()).await?;
            Ok(Json(records).into_response())
        }
        EnrollmentRoute::UserEnrollment {
            user: path_user,
            course_id,
        } => {
            let user = require_self(user, &path_user)?;
            let course = parse_course(&course_id)?;
            if method == Method::GET {
                let record = enrollment::get_enrollment(storage, user.username(), &course).await?;
                Ok(Json(record).into_response())
            } else if method == Method::POST {
                let mode = body.and_then(|Json(req)| req.mode);
                let record =
                    enrollment::add_enrollment(storage, user.username(), &course, mode.as_deref())
                        .await?;
                Ok(Json(record).into_response())
            } else if method == Method::DELETE {
                let record =
                    enrollment::deactivate_enrollment(storage, user.username(), &course).await?;
                Ok(Json(record).into_response())
            } else {
                Ok(StatusCode::METHOD_NOT_ALLOWED.into_response())
            }
        }
        EnrollmentRoute::CourseDetails { course_id } if is_get => {
            let course = parse_course(&course_id)?;
            let details = enrollment::get_course_enrollment_details(storage, &course).await?;
            Ok(Json(details).into_response())
        }
        EnrollmentRoute::UserRedirect if is_get => {
            let user = require_user(user)?;
            Ok(found(format!("{ENROLLMENT_PREFIX}/user/{}", user.username())))
        }
        EnrollmentRoute::CourseRedirect { course_id } if is_get => {
            let user = require_user(user)?;
            Ok(found(format!(
                "{ENROLLMENT_PREFIX}/user/{}/course/{}",
                user.username(),
                course_id
            )))
        }
        _ => Ok(StatusCode::METHOD_NOT_ALLOWED.into_response()),
    }
}
