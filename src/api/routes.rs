//! URL resolution tables for the wildcard-mounted APIs.
//!
//! Patterns are tried in order and the first match wins, so more specific
//! routes (content children) sit above the general ones (content detail).
//! Paths are matched without the API prefix and with an optional trailing slash.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Accepts both `course-v1:org+course+run` and `org/course/run`
pub const COURSE_ID_PATTERN: &str = r"(?P<course_id>[^/+]+(?:/|\+)[^/+]+(?:/|\+)[^/?]+)";
pub const CONTENT_ID_PATTERN: &str = r"(?P<content_id>[^/]+)";
pub const USER_PATTERN: &str = r"(?P<user>[\w.+-]+)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseRoute {
    Detail { course_id: String },
    ContentList { course_id: String },
    ContentChildren { course_id: String, content_id: String },
    ContentDetail { course_id: String, content_id: String },
    Overview { course_id: String },
    StaticTabs { course_id: String },
    StaticTabDetail { course_id: String, tab_id: String },
    Updates { course_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentRoute {
    UserEnrollments { user: String },
    UserEnrollment { user: String, course_id: String },
    CourseDetails { course_id: String },
    /// Redirects to the caller's own list
    UserRedirect,
    /// Redirects to the caller's enrollment in the course
    CourseRedirect { course_id: String },
}

#[derive(Debug, Clone, Copy)]
enum CoursePattern {
    Detail,
    ContentList,
    ContentChildren,
    ContentDetail,
    Overview,
    StaticTabs,
    StaticTabDetail,
    Updates,
}

#[derive(Debug, Clone, Copy)]
enum EnrollmentPattern {
    UserEnrollments,
    UserEnrollment,
    CourseDetails,
    UserRedirect,
    CourseRedirect,
}

fn table<K>(entries: Vec<(String, K)>) -> Vec<(Regex, K)> {
    entries
        .into_iter()
        .map(|(pattern, kind)| {
            let anchored = format!("^{pattern}/?$");
            let regex = Regex::new(&anchored)
                .unwrap_or_else(|e| panic!("route pattern {anchored} is invalid: {e}"));
            (regex, kind)
        })
        .collect()
}

static COURSE_ROUTES: Lazy<Vec<(Regex, CoursePattern)>> = Lazy::new(|| {
    let c = COURSE_ID_PATTERN;
    let content = CONTENT_ID_PATTERN;
    table(vec![
        (c.to_string(), CoursePattern::Detail),
        (format!("{c}/content"), CoursePattern::ContentList),
        (format!("{c}/content/{content}/children"), CoursePattern::ContentChildren),
        (format!("{c}/content/{content}"), CoursePattern::ContentDetail),
        (format!("{c}/overview"), CoursePattern::Overview),
        (format!("{c}/static_tabs"), CoursePattern::StaticTabs),
        (format!("{c}/static_tabs/(?P<tab_id>[^/]+)"), CoursePattern::StaticTabDetail),
        (format!("{c}/updates"), CoursePattern::Updates),
    ])
});

static ENROLLMENT_ROUTES: Lazy<Vec<(Regex, EnrollmentPattern)>> = Lazy::new(|| {
    let c = COURSE_ID_PATTERN;
    let u = USER_PATTERN;
    table(vec![
        (format!("user/{u}"), EnrollmentPattern::UserEnrollments),
        (format!("user/{u}/course/{c}"), EnrollmentPattern::UserEnrollment),
        (format!("course/{c}/details"), EnrollmentPattern::CourseDetails),
        // redirects stay at the bottom so they never shadow the routes above
        ("user".to_string(), EnrollmentPattern::UserRedirect),
        (format!("course/{c}"), EnrollmentPattern::CourseRedirect),
    ])
});

fn resolve<'p, K: Copy>(routes: &[(Regex, K)], path: &'p str) -> Option<(K, Captures<'p>)> {
    let path = path.trim_start_matches('/');
    routes
        .iter()
        .find_map(|(regex, kind)| regex.captures(path).map(|caps| (*kind, caps)))
}

fn cap(caps: &Captures, name: &str) -> String {
    caps.name(name).map(|m| m.as_str().to_string()).unwrap_or_default()
}

/// Resolve a path below `/api/courses/`
pub fn resolve_course_path(path: &str) -> Option<CourseRoute> {
    let (kind, caps) = resolve(&COURSE_ROUTES, path)?;
    let course_id = cap(&caps, "course_id");
    Some(match kind {
        CoursePattern::Detail => CourseRoute::Detail { course_id },
        CoursePattern::ContentList => CourseRoute::ContentList { course_id },
        CoursePattern::ContentChildren => CourseRoute::ContentChildren {
            course_id,
            content_id: cap(&caps, "content_id"),
        },
        CoursePattern::ContentDetail => CourseRoute::ContentDetail {
            course_id,
            content_id: cap(&caps, "content_id"),
        },
        CoursePattern::Overview => CourseRoute::Overview { course_id },
        CoursePattern::StaticTabs => CourseRoute::StaticTabs { course_id },
        CoursePattern::StaticTabDetail => CourseRoute::StaticTabDetail {
            course_id,
            tab_id: cap(&caps, "tab_id"),
        },
        CoursePattern::Updates => CourseRoute::Updates { course_id },
    })
}

/// Resolve a path below `/api/enrollment/v0/`
pub fn resolve_enrollment_path(path: &str) -> Option<EnrollmentRoute> {
    let (kind, caps) = resolve(&ENROLLMENT_ROUTES, path)?;
    Some(match kind {
        EnrollmentPattern::UserEnrollments => EnrollmentRoute::UserEnrollments {
            user: cap(&caps, "user"),
        },
        EnrollmentPattern::UserEnrollment => EnrollmentRoute::UserEnrollment {
            user: cap(&caps, "user"),
            course_id: cap(&caps, "course_id"),
        },
        EnrollmentPattern::CourseDetails => EnrollmentRoute::CourseDetails {
            course_id: cap(&caps, "course_id"),
        },
        EnrollmentPattern::UserRedirect => EnrollmentRoute::UserRedirect,
        EnrollmentPattern::CourseRedirect => EnrollmentRoute::CourseRedirect {
            course_id: cap(&caps, "course_id"),
        },
    })
}
