#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use courseware_api::api::{create_server, AppState};
use courseware_api::config::{Config, MicrositeConfig};
use courseware_api::domain::{ContentNode, CourseMode, CourseSettings, CourseTab, Enrollment, User};
use courseware_api::keys::CourseKey;
use courseware_api::storage::{InMemoryStorage, Seed, SeedCourse};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const BASE: &str = "https://testserver";
pub const API_KEY: &str = "test-server-key";
pub const STAFF_TOKEN: &str = "staff-token";
pub const STUDENT_TOKEN: &str = "student-token";
pub const OTHER_TOKEN: &str = "other-token";

pub fn robot_course() -> CourseKey {
    CourseKey::new("edX", "Robot_Super_Course", "2014")
}

pub fn empty_course() -> CourseKey {
    CourseKey::new("MTD", "Empty", "2014")
}

pub fn orphan_course() -> CourseKey {
    CourseKey::new("edX", "Orphans", "2014")
}

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn block(key: &CourseKey, category: &str, id: &str, name: &str, children: &[(&str, &str)]) -> ContentNode {
    let mut node = ContentNode::new(key.make_usage_key(category, id)).with_display_name(name);
    node.children = children
        .iter()
        .map(|(c, i)| key.make_usage_key(*c, *i))
        .collect();
    node
}

fn tab(tab_type: &str, name: &str, slug: Option<&str>) -> CourseTab {
    CourseTab {
        tab_type: tab_type.to_string(),
        name: name.to_string(),
        url_slug: slug.map(String::from),
    }
}

/// A course with chapters, a subsection, units, a video and static pages
fn robot_seed() -> SeedCourse {
    let key = robot_course();
    let mut settings = CourseSettings::new(key.clone());
    settings.course_image = Some("logo.png".into());
    settings.tabs = vec![
        tab("courseware", "Courseware", None),
        tab("static_tab", "Syllabus", Some("syllabus")),
        tab("static_tab", "Readings", Some("readings")),
    ];

    let mut root = ContentNode::new(key.root_location()).with_display_name("Robot Super Course");
    root.start = Some(at(2014, 6, 16, 14, 30));
    root.end = Some(at(2015, 1, 16, 0, 0));
    root.children = vec![
        key.make_usage_key("chapter", "overview"),
        key.make_usage_key("chapter", "group_project"),
        key.make_usage_key("chapter", "group_project2"),
    ];

    let mut overview = block(
        &key,
        "chapter",
        "overview",
        "Overview",
        &[
            ("videosequence", "video_sequence"),
            ("sequential", "test_subsection"),
            ("problem", "problem_0"),
            ("problem", "problem_1"),
        ],
    );
    overview.due = Some(at(2014, 5, 16, 14, 30));
    overview.group_access.insert(1, vec![1, 2]);

    let mut unit = block(&key, "vertical", "test_unit", "test unit", &[]);
    unit.fields.insert("graded".into(), Value::Bool(true));
    unit.fields.insert("format".into(), Value::String("Homework".into()));
    unit.group_access.insert(1, vec![2, 3]);

    let items = vec![
        root,
        overview,
        block(&key, "chapter", "group_project", "Group Project", &[]),
        block(&key, "chapter", "group_project2", "Group Project2", &[]),
        block(
            &key,
            "videosequence",
            "video_sequence",
            "Video_Sequence",
            &[("video", "video_resources")],
        ),
        block(&key, "video", "video_resources", "Video_Resources", &[]),
        block(
            &key,
            "sequential",
            "test_subsection",
            "test subsection",
            &[("vertical", "test_unit"), ("vertical", "vertical-with-dash")],
        ),
        unit,
        block(&key, "vertical", "vertical-with-dash", "test unit 2", &[]),
        block(&key, "problem", "problem_0", "Problem 0", &[]),
        block(&key, "problem", "problem_1", "Problem 1", &[]),
        ContentNode::new(key.make_usage_key("about", "overview"))
            .with_data("<h2>About This Course</h2><p>Robots.</p>"),
        ContentNode::new(key.make_usage_key("about", "video"))
            .with_data("<iframe src=\"//www.youtube.com/embed/robot\"></iframe>"),
        ContentNode::new(key.make_usage_key("course_info", "updates"))
            .with_data("<ol><li><h2>April 18, 2014</h2>A course update.</li></ol>"),
        ContentNode::new(key.make_usage_key("static_tab", "syllabus"))
            .with_display_name("Syllabus")
            .with_data("<div>Syllabus body</div>"),
        ContentNode::new(key.make_usage_key("static_tab", "readings"))
            .with_display_name("Readings")
            .with_data("<div>Readings body</div>"),
    ];

    SeedCourse {
        settings,
        modes: vec![],
        items,
    }
}

/// A course with no content and only an audit mode
fn empty_seed() -> SeedCourse {
    let key = empty_course();
    SeedCourse {
        settings: CourseSettings::new(key.clone()),
        modes: vec![CourseMode {
            slug: "audit".into(),
            name: "Audit".into(),
            min_price: 0,
            currency: "usd".into(),
            expiration_datetime: None,
        }],
        items: vec![
            ContentNode::new(key.root_location()).with_display_name("Empty Course"),
            ContentNode::new(key.make_usage_key("about", "overview")).with_data("   "),
        ],
    }
}

/// A course with three orphans, one of which parents a block that is
/// also reachable from the root
fn orphan_seed() -> SeedCourse {
    let key = orphan_course();
    let mut root = ContentNode::new(key.root_location()).with_display_name("Orphan Course");
    root.children = vec![
        key.make_usage_key("chapter", "Chapter1"),
        key.make_usage_key("chapter", "Chapter2"),
    ];
    SeedCourse {
        settings: CourseSettings::new(key.clone()),
        modes: vec![],
        items: vec![
            root,
            block(&key, "chapter", "Chapter1", "Chapter 1", &[("vertical", "Vertical1")]),
            block(&key, "chapter", "Chapter2", "Chapter 2", &[]),
            block(
                &key,
                "vertical",
                "Vertical1",
                "Vertical 1",
                &[("html", "Html1"), ("html", "html_different_parents")],
            ),
            block(&key, "html", "Html1", "Html 1", &[]),
            block(&key, "html", "html_different_parents", "Shared", &[]),
            block(&key, "chapter", "OrphanChapter", "Orphan Chapter", &[]),
            block(
                &key,
                "vertical",
                "OrphanVert",
                "Orphan Vertical",
                &[("html", "html_different_parents")],
            ),
            block(&key, "html", "OrphanHtml", "Orphan Html", &[]),
            ContentNode::new(key.make_usage_key("static_tab", "staticuno")),
            ContentNode::new(key.make_usage_key("about", "overview")),
            ContentNode::new(key.make_usage_key("course_info", "updates")),
        ],
    }
}

fn user(username: &str, token: &str, is_staff: bool) -> User {
    User {
        username: username.to_string(),
        token: token.to_string(),
        is_staff,
        is_active: true,
    }
}

pub fn seed() -> Seed {
    Seed {
        courses: vec![robot_seed(), empty_seed(), orphan_seed()],
        users: vec![
            user("staff", STAFF_TOKEN, true),
            user("testuser0", STUDENT_TOKEN, false),
            user("testuser1", OTHER_TOKEN, false),
        ],
        enrollments: vec![Enrollment {
            username: "testuser0".into(),
            course_id: robot_course(),
            mode: "honor".into(),
            is_active: true,
            created: at(2014, 6, 1, 9, 0),
        }],
    }
}

pub fn config() -> Config {
    let mut config = Config::default();
    config.server.public_url = BASE.to_string();
    config.auth.api_key = Some(API_KEY.to_string());
    config.microsites = vec![MicrositeConfig {
        key: "test_microsite".into(),
        domain_prefix: "testmicrosite".into(),
        course_org_filter: Some("MTD".into()),
        platform_name: Some("Test Microsite".into()),
    }];
    config
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStorage>,
}

pub fn app_with(config: Config) -> TestApp {
    let store = Arc::new(InMemoryStorage::from_seed(seed()).unwrap());
    let state = AppState::new(store.clone(), config).unwrap();
    TestApp {
        router: create_server(state),
        store,
    }
}

pub fn app() -> TestApp {
    app_with(config())
}

/// Request against the courses API, carrying the server api key
pub fn api_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-edx-api-key", API_KEY)
        .body(Body::empty())
        .unwrap()
}

/// Request authenticated with a bearer token
pub fn authed(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send a request and decode its JSON body (`Null` for an empty body)
pub async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
