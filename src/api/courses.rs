//! Handlers for `/api/courses` and everything below it.

use super::microsite::CurrentMicrosite;
use super::pagination::{paginate, Page};
use super::routes::{resolve_course_path, CourseRoute};
use super::AppState;
use crate::constants::{
    ABOUT_CATEGORY, ABOUT_OVERVIEW, ABOUT_VIDEO, COURSE_INFO_CATEGORY, COURSE_INFO_UPDATES,
    STATIC_TAB_CATEGORY, STATIC_TAB_TYPE,
};
use crate::content::{content_children, ContentSerializer, CourseTree};
use crate::domain::{ContentNode, Course, CourseTab};
use crate::error::{ApiError, Result};
use crate::keys::{CourseKey, UsageKey};
use axum::{
    extract::{Path, Query, State},
    http::Uri,
    Extension, Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::debug;

type Params = HashMap<String, String>;

/// A course together with a snapshot of its blocks
struct LoadedCourse {
    course: Course,
    tree: CourseTree,
}

impl LoadedCourse {
    fn key(&self) -> &CourseKey {
        self.course.key()
    }

    /// Body of a course-level block such as about/overview
    fn block_data(&self, category: &str, name: &str) -> Option<&str> {
        self.tree
            .get(&self.key().make_usage_key(category, name))
            .and_then(|node| node.non_empty_data())
    }

    fn static_tabs(&self) -> impl Iterator<Item = &CourseTab> {
        self.course
            .settings
            .tabs
            .iter()
            .filter(|tab| tab.tab_type == STATIC_TAB_TYPE)
    }

    fn static_tab_content(&self, tab: &CourseTab) -> String {
        tab.url_slug
            .as_deref()
            .and_then(|slug| self.tree.get(&self.key().make_usage_key(STATIC_TAB_CATEGORY, slug)))
            .and_then(|node| node.data.clone())
            .unwrap_or_default()
    }
}

/// Unknown or malformed course ids are both reported as missing
async fn load_course(state: &AppState, course_id: &str) -> Result<LoadedCourse> {
    let not_found = || ApiError::NotFound(format!("course {course_id}"));
    let key: CourseKey = course_id.parse().map_err(|_| not_found())?;
    let course = state.storage.get_course(&key).await?.ok_or_else(not_found)?;
    let tree = CourseTree::load(state.storage.as_ref(), &key).await?;
    Ok(LoadedCourse { course, tree })
}

fn depth_param(params: &Params) -> Result<u32> {
    match params.get("depth") {
        None => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::BadRequest(format!("depth must be a non-negative integer, got '{raw}'"))),
    }
}

fn serializer<'a>(state: &'a AppState, loaded: &'a LoadedCourse, params: &'a Params) -> ContentSerializer<'a> {
    ContentSerializer::new(&loaded.tree, state.config.base_uri())
        .with_include_fields(params.get("include_fields").map(String::as_str))
}

/// GET /api/courses
pub async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<Params>,
    Extension(microsite): Extension<CurrentMicrosite>,
    uri: Uri,
) -> Result<Json<Value>> {
    let depth = depth_param(&params)?;

    let mut courses = match params.get("course_id") {
        Some(ids) => {
            let mut selected = Vec::new();
            for id in ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
                let Ok(key) = id.parse::<CourseKey>() else {
                    debug!("Skipping malformed course id {}", id);
                    continue;
                };
                if let Some(course) = state.storage.get_course(&key).await? {
                    selected.push(course);
                }
            }
            selected
        }
        None => state.storage.list_courses().await?,
    };
    if let Some(org) = microsite.org_filter() {
        courses.retain(|c| c.key().org == org);
    }

    let page = paginate(
        courses,
        params.get("page").map(String::as_str),
        params.get("page_size").map(String::as_str),
        &state.config.pagination,
    );

    let mut results = Vec::with_capacity(page.results.len());
    for course in &page.results {
        let tree = CourseTree::load(state.storage.as_ref(), course.key()).await?;
        let loaded = LoadedCourse {
            course: course.clone(),
            tree,
        };
        results.push(serializer(&state, &loaded, &params).course_data(&loaded.course, depth));
    }

    let request_uri = format!("{}{}", state.config.base_uri(), uri);
    let body = Page {
        count: page.count,
        num_pages: page.num_pages,
        number: page.number,
        results,
    }
    .into_json(&request_uri);
    Ok(Json(body))
}

/// GET /api/courses/{path}: resolved through the course URL table
pub async fn dispatch(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(params): Query<Params>,
) -> Result<Json<Value>> {
    let route = resolve_course_path(&path)
        .ok_or_else(|| ApiError::NotFound(format!("no course resource at '{path}'")))?;
    debug!(?route, "Resolved course route");

    match route {
        CourseRoute::Detail { course_id } => course_detail(&state, &course_id, &params).await,
        CourseRoute::ContentList { course_id } => {
            content_list(&state, &course_id, None, &params).await
        }
        CourseRoute::ContentChildren {
            course_id,
            content_id,
        } => content_list(&state, &course_id, Some(&content_id), &params).await,
        CourseRoute::ContentDetail {
            course_id,
            content_id,
        } => content_detail(&state, &course_id, &content_id, &params).await,
        CourseRoute::Overview { course_id } => overview(&state, &course_id).await,
        CourseRoute::StaticTabs { course_id } => static_tabs(&state, &course_id, &params).await,
        CourseRoute::StaticTabDetail { course_id, tab_id } => {
            static_tab_detail(&state, &course_id, &tab_id).await
        }
        CourseRoute::Updates { course_id } => updates(&state, &course_id).await,
    }
}

async fn course_detail(state: &AppState, course_id: &str, params: &Params) -> Result<Json<Value>> {
    let depth = depth_param(params)?;
    let loaded = load_course(state, course_id).await?;
    Ok(Json(
        serializer(state, &loaded, params).course_data(&loaded.course, depth),
    ))
}

/// Whether `content_id` names the course itself rather than a block inside it
fn is_course_itself(course_id: &str, content_id: &str, key: &CourseKey) -> bool {
    content_id == course_id || content_id.parse::<CourseKey>().map_or(false, |k| &k == key)
}

fn find_content<'a>(loaded: &'a LoadedCourse, content_id: &str) -> Result<&'a ContentNode> {
    let not_found = || ApiError::NotFound(format!("content {content_id}"));
    let location: UsageKey = content_id.parse().map_err(|_| not_found())?;
    loaded.tree.get(&location).ok_or_else(not_found)
}

/// Children of the course root, or of `content_id`, filtered by `type`
async fn content_list(
    state: &AppState,
    course_id: &str,
    content_id: Option<&str>,
    params: &Params,
) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let node = match content_id {
        Some(id) if !is_course_itself(course_id, id, loaded.key()) => find_content(&loaded, id)?,
        _ => &loaded.course.root,
    };
    let children = content_children(
        &loaded.tree,
        node,
        params.get("type").map(String::as_str),
    );
    Ok(Json(Value::Array(
        serializer(state, &loaded, params).serialize_children(&children),
    )))
}

async fn content_detail(
    state: &AppState,
    course_id: &str,
    content_id: &str,
    params: &Params,
) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let (node, element) = if is_course_itself(course_id, content_id, loaded.key()) {
        (&loaded.course.root, "content")
    } else {
        (find_content(&loaded, content_id)?, "children")
    };

    let serializer = serializer(state, &loaded, params);
    let children = content_children(
        &loaded.tree,
        node,
        params.get("type").map(String::as_str),
    );
    let mut data = serializer.serialize_content(node);
    if let Value::Object(map) = &mut data {
        map.insert(
            element.to_string(),
            Value::Array(serializer.serialize_children(&children)),
        );
        map.insert("resources".into(), json!([]));
    }
    Ok(Json(data))
}

async fn overview(state: &AppState, course_id: &str) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let overview_html = loaded
        .block_data(ABOUT_CATEGORY, ABOUT_OVERVIEW)
        .ok_or_else(|| ApiError::NotFound(format!("overview of {course_id}")))?;
    Ok(Json(json!({
        "overview_html": overview_html,
        "course_image_url": loaded.course.settings.course_image_url(),
        "course_video": loaded.block_data(ABOUT_CATEGORY, ABOUT_VIDEO),
    })))
}

async fn updates(state: &AppState, course_id: &str) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let content = loaded
        .block_data(COURSE_INFO_CATEGORY, COURSE_INFO_UPDATES)
        .ok_or_else(|| ApiError::NotFound(format!("updates of {course_id}")))?;
    Ok(Json(json!({ "content": content })))
}

async fn static_tabs(state: &AppState, course_id: &str, params: &Params) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let detail = matches!(params.get("detail").map(String::as_str), Some("true" | "True"));
    let tabs: Vec<Value> = loaded
        .static_tabs()
        .map(|tab| {
            let mut data = json!({ "id": tab.url_slug, "name": tab.name });
            if detail {
                data["content"] = json!(loaded.static_tab_content(tab));
            }
            data
        })
        .collect();
    Ok(Json(json!({ "tabs": tabs })))
}

async fn static_tab_detail(state: &AppState, course_id: &str, tab_id: &str) -> Result<Json<Value>> {
    let loaded = load_course(state, course_id).await?;
    let tab = loaded
        .static_tabs()
        .find(|tab| tab.url_slug.as_deref() == Some(tab_id))
        .ok_or_else(|| ApiError::NotFound(format!("static tab {tab_id}")))?;
    Ok(Json(json!({
        "id": tab.url_slug,
        "name": tab.name,
        "content": loaded.static_tab_content(tab),
    })))
}
