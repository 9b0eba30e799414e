//! Group access rules and their inheritance down the content tree.
//!
//! A block's own `group_access` restricts it to some groups of a partition.
//! The *merged* access of a block folds the rules of every ancestor into its
//! own: per partition the allowed groups are intersected, and partitions seen
//! anywhere on the chain are kept. An empty intersection becomes
//! [`MergedAccess::Denied`] (serialized as `false`): no group of that
//! partition may see the block.

use super::tree::CourseTree;
use crate::domain::{ContentNode, Group, GroupAccess, GroupId, PartitionId, UserPartition};
use crate::keys::UsageKey;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergedAccess {
    Groups(Vec<GroupId>),
    Denied,
}

impl Serialize for MergedAccess {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MergedAccess::Groups(groups) => groups.serialize(serializer),
            MergedAccess::Denied => serializer.serialize_bool(false),
        }
    }
}

pub type MergedGroupAccess = BTreeMap<PartitionId, MergedAccess>;

/// Merge a block's own rules into the merged rules inherited from its parent
pub fn merge_group_access(inherited: &MergedGroupAccess, own: &GroupAccess) -> MergedGroupAccess {
    let mut merged = inherited.clone();
    for (partition_id, group_ids) in own {
        // an empty local list leaves the partition unrestricted
        if group_ids.is_empty() {
            continue;
        }
        let value = match merged.get(partition_id) {
            Some(MergedAccess::Denied) => continue,
            Some(MergedAccess::Groups(allowed)) => {
                let intersection: Vec<GroupId> = allowed
                    .iter()
                    .copied()
                    .filter(|g| group_ids.contains(g))
                    .collect();
                if intersection.is_empty() {
                    MergedAccess::Denied
                } else {
                    MergedAccess::Groups(intersection)
                }
            }
            None => MergedAccess::Groups(group_ids.clone()),
        };
        merged.insert(*partition_id, value);
    }
    merged
}

/// Merged access of a block, folded from the course root down to the block
pub fn merged_group_access(tree: &CourseTree, location: &UsageKey) -> MergedGroupAccess {
    tree.lineage(location)
        .into_iter()
        .fold(MergedGroupAccess::new(), |inherited, node| {
            merge_group_access(&inherited, &node.group_access)
        })
}

/// Whether the block's own rules let members of `group` see it
pub fn is_visible_to_group(node: &ContentNode, partition: &UserPartition, group: &Group) -> bool {
    match node.group_access.get(&partition.id) {
        Some(allowed) if !allowed.is_empty() => allowed.contains(&group.id),
        _ => true,
    }
}

pub const INVALID_USER_PARTITION: &str =
    "This xblock refers to a deleted or invalid content group configuration.";
pub const INVALID_USER_PARTITION_GROUP: &str =
    "This xblock refers to a deleted or invalid content group.";

/// Check the block's rules against the partitions configured on its course.
/// Reports at most one message per kind of problem.
pub fn validate_group_access(node: &ContentNode, partitions: &[UserPartition]) -> Vec<&'static str> {
    let mut invalid_partition = false;
    let mut invalid_group = false;
    for (partition_id, group_ids) in &node.group_access {
        match partitions.iter().find(|p| p.id == *partition_id) {
            None => invalid_partition = true,
            Some(partition) => {
                if group_ids.iter().any(|g| !partition.has_group(*g)) {
                    invalid_group = true;
                }
            }
        }
    }

    let mut messages = Vec::new();
    if invalid_partition {
        messages.push(INVALID_USER_PARTITION);
    }
    if invalid_group {
        messages.push(INVALID_USER_PARTITION_GROUP);
    }
    messages
}
