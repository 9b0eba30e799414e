use crate::domain::ContentNode;
use crate::error::Result;
use crate::keys::{CourseKey, UsageKey};
use crate::storage::Storage;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Snapshot of every block stored under one course, with a parent index.
///
/// Loaded once per request; all traversals after that are synchronous.
#[derive(Debug, Clone)]
pub struct CourseTree {
    course_key: CourseKey,
    nodes: HashMap<UsageKey, ContentNode>,
    parents: HashMap<UsageKey, Vec<UsageKey>>,
    reachable: HashSet<UsageKey>,
}

impl CourseTree {
    pub async fn load(storage: &dyn Storage, course_key: &CourseKey) -> Result<Self> {
        let items = storage.get_items(course_key).await?;
        debug!(course = %course_key, blocks = items.len(), "Loaded course tree");
        Ok(Self::from_nodes(course_key.clone(), items))
    }

    pub fn from_nodes(course_key: CourseKey, nodes: impl IntoIterator<Item = ContentNode>) -> Self {
        let mut sorted: Vec<ContentNode> = nodes.into_iter().collect();
        sorted.sort_by(|a, b| a.location.cmp(&b.location));

        let mut parents: HashMap<UsageKey, Vec<UsageKey>> = HashMap::new();
        for node in &sorted {
            for child in &node.children {
                parents
                    .entry(child.clone())
                    .or_default()
                    .push(node.location.clone());
            }
        }

        let nodes: HashMap<UsageKey, ContentNode> = sorted
            .into_iter()
            .map(|n| (n.location.clone(), n))
            .collect();
        let reachable = reachable_from(&nodes, course_key.root_location());

        Self {
            course_key,
            nodes,
            parents,
            reachable,
        }
    }

    pub fn course_key(&self) -> &CourseKey {
        &self.course_key
    }

    pub fn root_location(&self) -> UsageKey {
        self.course_key.root_location()
    }

    pub fn root(&self) -> Option<&ContentNode> {
        self.nodes.get(&self.root_location())
    }

    pub fn get(&self, location: &UsageKey) -> Option<&ContentNode> {
        self.nodes.get(location)
    }

    pub fn locations(&self) -> impl Iterator<Item = &UsageKey> {
        self.nodes.keys()
    }

    /// Blocks listing `location` among their children
    pub fn parents_of(&self, location: &UsageKey) -> &[UsageKey] {
        self.parents
            .get(location)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Parent of a block. With several parents, the lowest key reachable from
    /// the root wins, so an orphan never shadows the real ancestor; blocks
    /// without a reachable parent resolve to their lowest parent key.
    pub fn parent(&self, location: &UsageKey) -> Option<&ContentNode> {
        let parents = self.parents_of(location);
        parents
            .iter()
            .find(|p| self.reachable.contains(*p))
            .or_else(|| parents.first())
            .and_then(|p| self.nodes.get(p))
    }

    /// The chain from the course root (or the topmost known ancestor) down to
    /// `location`, inclusive. Stops at the first repeated block.
    pub fn lineage(&self, location: &UsageKey) -> Vec<&ContentNode> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.nodes.get(location);
        while let Some(node) = current {
            if !seen.insert(&node.location) {
                break;
            }
            chain.push(node);
            current = self.parent(&node.location);
        }
        chain.reverse();
        chain
    }

    /// Every block reachable from the course root by following child lists
    pub fn reachable_from_root(&self) -> &HashSet<UsageKey> {
        &self.reachable
    }
}

fn reachable_from(nodes: &HashMap<UsageKey, ContentNode>, root: UsageKey) -> HashSet<UsageKey> {
    let mut reached = HashSet::new();
    let mut stack = vec![root];
    while let Some(location) = stack.pop() {
        let Some(node) = nodes.get(&location) else {
            continue;
        };
        if !reached.insert(location) {
            continue;
        }
        stack.extend(node.children.iter().cloned());
    }
    reached
}

/// Children of `node` in their stored order, optionally restricted to one category.
/// Child references that no longer resolve are skipped.
pub fn content_children<'a>(
    tree: &'a CourseTree,
    node: &ContentNode,
    content_type: Option<&str>,
) -> Vec<&'a ContentNode> {
    node.children
        .iter()
        .filter_map(|child| tree.get(child))
        .filter(|child| content_type.map_or(true, |t| child.category() == t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CourseKey {
        CourseKey::new("edX", "Tree", "2014")
    }

    fn node(category: &str, name: &str, children: &[(&str, &str)]) -> ContentNode {
        let mut node = ContentNode::new(key().make_usage_key(category, name));
        node.children = children
            .iter()
            .map(|(c, n)| key().make_usage_key(*c, *n))
            .collect();
        node
    }

    #[test]
    fn test_children_keep_order_and_filter_by_type() {
        let tree = CourseTree::from_nodes(
            key(),
            vec![
                node(
                    "course",
                    "course",
                    &[("chapter", "b"), ("html", "x"), ("chapter", "a"), ("chapter", "gone")],
                ),
                node("chapter", "a", &[]),
                node("chapter", "b", &[]),
                node("html", "x", &[]),
            ],
        );
        let root = tree.root().unwrap();

        let all: Vec<&str> = content_children(&tree, root, None)
            .iter()
            .map(|n| n.location.block_id.as_str())
            .collect();
        assert_eq!(all, vec!["b", "x", "a"]);

        let chapters = content_children(&tree, root, Some("chapter"));
        assert_eq!(chapters.len(), 2);
        assert!(content_children(&tree, root, Some("video")).is_empty());
        assert!(tree.get(&key().make_usage_key("chapter", "gone")).is_none());
    }

    #[test]
    fn test_lineage_runs_root_first() {
        let tree = CourseTree::from_nodes(
            key(),
            vec![
                node("course", "course", &[("chapter", "c")]),
                node("chapter", "c", &[("sequential", "s")]),
                node("sequential", "s", &[("video", "v")]),
                node("video", "v", &[]),
            ],
        );
        let categories: Vec<&str> = tree
            .lineage(&key().make_usage_key("video", "v"))
            .iter()
            .map(|n| n.category())
            .collect();
        assert_eq!(categories, vec!["course", "chapter", "sequential", "video"]);
        assert!(tree.parent(&key().root_location()).is_none());
    }

    #[test]
    fn test_reachability_survives_cycles() {
        let tree = CourseTree::from_nodes(
            key(),
            vec![
                node("course", "course", &[("chapter", "a")]),
                node("chapter", "a", &[("vertical", "v")]),
                node("vertical", "v", &[("chapter", "a")]),
                node("chapter", "lost", &[("html", "h")]),
                node("html", "h", &[("chapter", "lost")]),
            ],
        );
        let reached = tree.reachable_from_root();
        assert_eq!(reached.len(), 3);
        assert!(!reached.contains(&key().make_usage_key("chapter", "lost")));

        // chapter "lost" and html "h" only point at each other
        let lineage = tree.lineage(&key().make_usage_key("html", "h"));
        assert_eq!(lineage.len(), 2);
    }

    #[test]
    fn test_parent_prefers_reachable_parent() {
        // "OrphanVert" sorts before "Vertical1" but is not under the root
        let tree = CourseTree::from_nodes(
            key(),
            vec![
                node("course", "course", &[("chapter", "Chapter1")]),
                node("chapter", "Chapter1", &[("vertical", "Vertical1")]),
                node("vertical", "Vertical1", &[("html", "shared")]),
                node("vertical", "OrphanVert", &[("html", "shared")]),
                node("html", "shared", &[]),
            ],
        );
        let shared = key().make_usage_key("html", "shared");
        assert_eq!(tree.parents_of(&shared).len(), 2);
        assert_eq!(tree.parent(&shared).unwrap().location.block_id, "Vertical1");

        let categories: Vec<&str> = tree.lineage(&shared).iter().map(|n| n.category()).collect();
        assert_eq!(categories, vec!["course", "chapter", "vertical", "html"]);
    }
}
