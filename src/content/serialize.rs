use super::group_access::merged_group_access;
use super::tree::{content_children, CourseTree};
use crate::constants::COURSE_RESOURCES;
use crate::domain::{ContentNode, Course};
use crate::keys::{CourseKey, UsageKey};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

pub fn course_uri(base_uri: &str, course_key: &CourseKey) -> String {
    format!("{}/api/courses/{}", base_uri, course_key)
}

pub fn content_uri(base_uri: &str, course_key: &CourseKey, location: &UsageKey) -> String {
    format!("{}/content/{}", course_uri(base_uri, course_key), location)
}

pub fn course_resource_uri(base_uri: &str, course_key: &CourseKey, resource: &str) -> String {
    format!("{}/{}", course_uri(base_uri, course_key), resource)
}

/// Shapes content nodes of one course into API payloads.
///
/// Every payload carries `name`, `due`, `start`, `end`, `category`, `id` and
/// `uri`; the course root additionally carries `course`, `org` and `run`.
/// Extra fields requested through `include_fields` are looked up on the node
/// and come back as `null` when the node has no such field.
pub struct ContentSerializer<'a> {
    tree: &'a CourseTree,
    base_uri: &'a str,
    include_fields: Vec<String>,
}

impl<'a> ContentSerializer<'a> {
    pub fn new(tree: &'a CourseTree, base_uri: &'a str) -> Self {
        Self {
            tree,
            base_uri,
            include_fields: Vec::new(),
        }
    }

    /// Accepts the raw comma separated `include_fields` query value
    pub fn with_include_fields(mut self, include_fields: Option<&str>) -> Self {
        self.include_fields = include_fields
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|f| !f.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        self
    }

    pub fn serialize_content(&self, node: &ContentNode) -> Value {
        let course_key = self.tree.course_key();
        let mut data = Map::new();
        data.insert("name".into(), json!(node.display_name));
        data.insert("due".into(), json!(node.due));
        data.insert("start".into(), json!(node.start));
        data.insert("end".into(), json!(node.end));
        data.insert("category".into(), json!(node.category()));

        if node.is_course_root() {
            data.insert("course".into(), json!(course_key.course));
            data.insert("org".into(), json!(course_key.org));
            data.insert("run".into(), json!(course_key.run));
            data.insert("id".into(), json!(course_key.to_string()));
            data.insert("uri".into(), json!(course_uri(self.base_uri, course_key)));
        } else {
            data.insert("id".into(), json!(node.location.to_string()));
            data.insert(
                "uri".into(),
                json!(content_uri(self.base_uri, course_key, &node.location)),
            );
        }

        for field in &self.include_fields {
            data.insert(field.clone(), self.field_value(node, field));
        }
        Value::Object(data)
    }

    fn field_value(&self, node: &ContentNode, field: &str) -> Value {
        match field {
            "merged_group_access" => json!(merged_group_access(self.tree, &node.location)),
            "group_access" => json!(node.group_access),
            "display_name" => json!(node.display_name),
            "data" => json!(node.data),
            "children" => json!(node.children),
            other => node.fields.get(other).cloned().unwrap_or(Value::Null),
        }
    }

    pub fn serialize_children(&self, children: &[&ContentNode]) -> Vec<Value> {
        children
            .iter()
            .map(|child| self.serialize_content(child))
            .collect()
    }

    /// Serializes `node` and, while `depth` allows, its descendants under `children`.
    /// A child that is already an ancestor on the current path is left out.
    pub fn serialize_content_with_children(&self, node: &ContentNode, depth: u32) -> Value {
        let mut path = HashSet::new();
        self.serialize_subtree(node, depth, &mut path)
    }

    fn serialize_subtree(
        &self,
        node: &ContentNode,
        depth: u32,
        path: &mut HashSet<UsageKey>,
    ) -> Value {
        let mut data = self.serialize_content(node);
        if depth > 0 {
            path.insert(node.location.clone());
            let mut children = Vec::new();
            for child in content_children(self.tree, node, None) {
                if path.contains(&child.location) {
                    continue;
                }
                children.push(self.serialize_subtree(child, depth - 1, path));
            }
            path.remove(&node.location);
            if let Value::Object(map) = &mut data {
                map.insert("children".into(), Value::Array(children));
            }
        }
        data
    }

    /// Course detail payload: the root serialized to `depth` with its
    /// descendants under `content`, plus the image url and resource links
    pub fn course_data(&self, course: &Course, depth: u32) -> Value {
        let mut data = if depth > 0 {
            let mut data = self.serialize_content_with_children(&course.root, depth);
            if let Value::Object(map) = &mut data {
                let content = map.remove("children").unwrap_or_else(|| json!([]));
                map.insert("content".into(), content);
            }
            data
        } else {
            self.serialize_content(&course.root)
        };

        let resources: Vec<Value> = COURSE_RESOURCES
            .iter()
            .map(|r| json!({ "uri": course_resource_uri(self.base_uri, course.key(), r) }))
            .collect();
        if let Value::Object(map) = &mut data {
            map.insert(
                "course_image_url".into(),
                json!(course.settings.course_image_url()),
            );
            map.insert("resources".into(), Value::Array(resources));
        }
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CourseSettings;

    const BASE: &str = "https://testserver";

    fn key() -> CourseKey {
        CourseKey::new("edX", "Serialize", "2014")
    }

    fn fixture() -> (Course, CourseTree) {
        let key = key();
        let mut root = ContentNode::new(key.root_location()).with_display_name("Robot Super Course");
        let mut chapter = ContentNode::new(key.make_usage_key("chapter", "overview"))
            .with_display_name("Overview");
        let mut sequential = ContentNode::new(key.make_usage_key("sequential", "intro"));
        let video = ContentNode::new(key.make_usage_key("video", "welcome"));
        sequential.children.push(video.location.clone());
        chapter.children.push(sequential.location.clone());
        chapter.group_access.insert(1, vec![11]);
        chapter.fields.insert("graded".into(), json!(true));
        root.children.push(chapter.location.clone());

        let mut settings = CourseSettings::new(key.clone());
        settings.course_image = Some("logo.png".into());
        let course = Course {
            settings,
            root: root.clone(),
        };
        let tree = CourseTree::from_nodes(key, vec![root, chapter, sequential, video]);
        (course, tree)
    }

    #[test]
    fn test_course_and_content_uris_differ() {
        let (course, tree) = fixture();
        let serializer = ContentSerializer::new(&tree, BASE);

        let data = serializer.serialize_content(&course.root);
        assert_eq!(data["id"], "course-v1:edX+Serialize+2014");
        assert_eq!(data["uri"], "https://testserver/api/courses/course-v1:edX+Serialize+2014");
        assert_eq!(data["org"], "edX");
        assert_eq!(data["name"], "Robot Super Course");

        let chapter = tree.get(&key().make_usage_key("chapter", "overview")).unwrap();
        let data = serializer.serialize_content(chapter);
        assert_eq!(data["id"], "block-v1:edX+Serialize+2014+type@chapter+block@overview");
        assert_eq!(
            data["uri"],
            "https://testserver/api/courses/course-v1:edX+Serialize+2014/content/block-v1:edX+Serialize+2014+type@chapter+block@overview"
        );
        assert!(data.get("org").is_none());
        assert_eq!(data["category"], "chapter");
        assert!(data["due"].is_null());
    }

    #[test]
    fn test_include_fields() {
        let (_, tree) = fixture();
        let serializer = ContentSerializer::new(&tree, BASE)
            .with_include_fields(Some("graded,merged_group_access,no_such_field"));
        let chapter = tree.get(&key().make_usage_key("chapter", "overview")).unwrap();
        let data = serializer.serialize_content(chapter);
        assert_eq!(data["graded"], true);
        assert_eq!(data["merged_group_access"], json!({ "1": [11] }));
        assert!(data["no_such_field"].is_null());
    }

    #[test]
    fn test_course_data_depth() {
        let (course, tree) = fixture();
        let serializer = ContentSerializer::new(&tree, BASE);

        let shallow = serializer.course_data(&course, 0);
        assert!(shallow.get("content").is_none());
        assert_eq!(
            shallow["course_image_url"],
            "/asset-v1:edX+Serialize+2014+type@asset+block@logo.png"
        );
        assert_eq!(shallow["resources"].as_array().unwrap().len(), 4);
        assert_eq!(
            shallow["resources"][1]["uri"],
            "https://testserver/api/courses/course-v1:edX+Serialize+2014/overview"
        );

        let deep = serializer.course_data(&course, 2);
        assert!(deep.get("children").is_none());
        let chapters = deep["content"].as_array().unwrap();
        assert_eq!(chapters.len(), 1);
        let sequentials = chapters[0]["children"].as_array().unwrap();
        assert_eq!(sequentials.len(), 1);
        assert!(sequentials[0].get("children").is_none());
    }

    #[test]
    fn test_cyclic_children_stop_at_the_repeated_block() {
        let key = key();
        let mut root = ContentNode::new(key.root_location());
        let mut chapter = ContentNode::new(key.make_usage_key("chapter", "a"));
        let mut vertical = ContentNode::new(key.make_usage_key("vertical", "v"));
        root.children.push(chapter.location.clone());
        chapter.children.push(vertical.location.clone());
        vertical.children.push(chapter.location.clone());
        let tree = CourseTree::from_nodes(key, vec![root.clone(), chapter, vertical]);

        let data = ContentSerializer::new(&tree, BASE).serialize_content_with_children(&root, 200_000);
        let chapter = &data["children"][0];
        assert_eq!(chapter["category"], "chapter");
        let vertical = &chapter["children"][0];
        assert_eq!(vertical["category"], "vertical");
        assert_eq!(vertical["children"], json!([]));
    }
}
