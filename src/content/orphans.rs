use super::tree::CourseTree;
use crate::constants::is_root_singleton;
use crate::error::{ApiError, Result};
use crate::keys::{CourseKey, UsageKey};
use crate::metrics::OrphanMetrics;
use crate::storage::Storage;
use std::collections::HashSet;
use tracing::{debug, info};

/// Blocks stored under the course that the root cannot reach, sorted by key.
/// Course-level singletons (about, course_info, static tabs) never count.
pub fn find_orphans(tree: &CourseTree) -> Vec<UsageKey> {
    let reachable = tree.reachable_from_root();
    let mut orphans: Vec<UsageKey> = tree
        .locations()
        .filter(|loc| !reachable.contains(*loc))
        .filter(|loc| !is_root_singleton(loc.category()))
        .cloned()
        .collect();
    orphans.sort();
    orphans
}

/// Find the course's orphans and, when `commit` is set, delete them along
/// with every descendant the root cannot reach. Returns the orphan ids.
pub async fn delete_orphans(
    storage: &dyn Storage,
    course_key: &CourseKey,
    commit: bool,
) -> Result<Vec<String>> {
    if !storage.has_course(course_key).await? {
        return Err(ApiError::NotFound(format!("course {course_key}")));
    }

    let tree = CourseTree::load(storage, course_key).await?;
    let orphans = find_orphans(&tree);
    OrphanMetrics::record_scan(orphans.len());

    if !commit {
        info!(course = %course_key, orphans = orphans.len(), "Dry run, nothing deleted");
        return Ok(orphans.iter().map(UsageKey::to_string).collect());
    }

    let reachable = tree.reachable_from_root();
    let mut visited: HashSet<UsageKey> = HashSet::new();
    let mut stack: Vec<UsageKey> = orphans.clone();
    let mut deleted = 0;
    while let Some(location) = stack.pop() {
        if reachable.contains(&location) || !visited.insert(location.clone()) {
            continue;
        }
        if let Some(node) = tree.get(&location) {
            stack.extend(node.children.iter().cloned());
        }
        if storage.delete_item(&location).await? {
            debug!("Deleted orphaned block {}", location);
            deleted += 1;
        }
    }
    OrphanMetrics::record_deleted(deleted);

    info!(
        course = %course_key,
        orphans = orphans.len(),
        blocks = deleted,
        "Deleted orphans"
    );
    Ok(orphans.iter().map(UsageKey::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentNode, CourseSettings};
    use crate::storage::InMemoryStorage;

    fn key() -> CourseKey {
        CourseKey::new("edX", "Orphans", "2014")
    }

    fn node(category: &str, name: &str, children: &[(&str, &str)]) -> ContentNode {
        let mut node = ContentNode::new(key().make_usage_key(category, name));
        node.children = children
            .iter()
            .map(|(c, n)| key().make_usage_key(*c, *n))
            .collect();
        node
    }

    /// Two chapters under the root, three orphans, one block with an orphan
    /// parent and a legitimate one, plus the course-level singletons
    fn orphan_course() -> Vec<ContentNode> {
        vec![
            node("course", "course", &[("chapter", "Chapter1"), ("chapter", "Chapter2")]),
            node("chapter", "Chapter1", &[("vertical", "Vertical1")]),
            node("chapter", "Chapter2", &[]),
            node("chapter", "OrphanChapter", &[]),
            node(
                "vertical",
                "Vertical1",
                &[("html", "Html1"), ("html", "html_different_parents")],
            ),
            node("vertical", "OrphanVert", &[("html", "html_different_parents")]),
            node("html", "Html1", &[]),
            node("html", "html_different_parents", &[]),
            node("html", "OrphanHtml", &[]),
            node("static_tab", "staticuno", &[]),
            node("about", "overview", &[]),
            node("course_info", "updates", &[]),
        ]
    }

    async fn store() -> InMemoryStorage {
        let store = InMemoryStorage::new();
        let mut nodes = orphan_course().into_iter();
        let root = nodes.next().unwrap();
        store
            .create_course(CourseSettings::new(key()), root)
            .await
            .unwrap();
        for n in nodes {
            store.update_item(&n).await.unwrap();
        }
        store
    }

    fn expected_orphans() -> Vec<String> {
        let mut ids = vec![
            key().make_usage_key("chapter", "OrphanChapter").to_string(),
            key().make_usage_key("vertical", "OrphanVert").to_string(),
            key().make_usage_key("html", "OrphanHtml").to_string(),
        ];
        ids.sort();
        ids
    }

    #[test]
    fn test_find_orphans() {
        let tree = CourseTree::from_nodes(key(), orphan_course());
        let orphans: Vec<String> = find_orphans(&tree).iter().map(|k| k.to_string()).collect();
        assert_eq!(orphans, expected_orphans());
    }

    #[tokio::test]
    async fn test_delete_orphans_no_commit() {
        let store = store().await;
        let reported = delete_orphans(&store, &key(), false).await.unwrap();
        assert_eq!(reported, expected_orphans());
        for (category, name) in [
            ("html", "html_different_parents"),
            ("vertical", "OrphanVert"),
            ("chapter", "OrphanChapter"),
            ("html", "OrphanHtml"),
        ] {
            let loc = key().make_usage_key(category, name);
            assert!(store.get_item(&loc).await.unwrap().is_some(), "{loc}");
        }
    }

    #[tokio::test]
    async fn test_delete_orphans_commit() {
        let store = store().await;
        let deleted = delete_orphans(&store, &key(), true).await.unwrap();
        assert_eq!(deleted, expected_orphans());

        let survivor = key().make_usage_key("html", "html_different_parents");
        assert!(store.get_item(&survivor).await.unwrap().is_some());
        for (category, name) in [
            ("vertical", "OrphanVert"),
            ("chapter", "OrphanChapter"),
            ("html", "OrphanHtml"),
        ] {
            let loc = key().make_usage_key(category, name);
            assert!(store.get_item(&loc).await.unwrap().is_none(), "{loc}");
        }
        for (category, name) in [("static_tab", "staticuno"), ("about", "overview")] {
            let loc = key().make_usage_key(category, name);
            assert!(store.get_item(&loc).await.unwrap().is_some(), "{loc}");
        }

        // a second scan comes back clean
        assert!(delete_orphans(&store, &key(), false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_orphan_subtree_is_deleted() {
        let store = store().await;
        let mut lost = node("chapter", "LostChapter", &[("vertical", "LostVert")]);
        lost.display_name = Some("Lost".into());
        store.update_item(&lost).await.unwrap();
        store
            .update_item(&node("vertical", "LostVert", &[]))
            .await
            .unwrap();

        let deleted = delete_orphans(&store, &key(), true).await.unwrap();
        // LostVert has an orphan parent, so it is itself unreachable and reported
        assert_eq!(deleted.len(), 5);
        assert!(store
            .get_item(&key().make_usage_key("vertical", "LostVert"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_course() {
        let store = store().await;
        let err = delete_orphans(&store, &CourseKey::new("no", "such", "course"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
