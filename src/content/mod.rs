//! Course content tree engine: snapshots of a course's blocks, response
//! shaping, group access inheritance and orphan maintenance.

pub mod group_access;
pub mod orphans;
pub mod serialize;
pub mod tree;

pub use group_access::{merge_group_access, merged_group_access, MergedAccess, MergedGroupAccess};
pub use orphans::{delete_orphans, find_orphans};
pub use serialize::ContentSerializer;
pub use tree::{content_children, CourseTree};
