//! Ancestor reconstruction for the credential tree
//!
//! Groups and entries carry no parent pointers, so the ordered ancestor
//! chain of a node is rebuilt by a preorder depth-first walk from the root,
//! comparing UUIDs at every step. The cost is O(tree size) per call and is
//! paid on every parent or path query; results always reflect the current
//! tree state, never a cache.

use uuid::Uuid;

use crate::models::{Entry, Group};

/// Identifies the node whose ancestry is being reconstructed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeId {
    Group(Uuid),
    Entry(Uuid),
}

/// Reconstruct the ordered ancestor chain of `target`, from the root down
/// to the nearest ancestor (last element). Returns an empty vector when the
/// target is the root itself or is unreachable from `root`.
pub fn find_ancestors<'a>(root: &'a Group, target: NodeId) -> Vec<&'a Group> {
    walk(root, target).unwrap_or_default()
}

fn walk<'a>(group: &'a Group, target: NodeId) -> Option<Vec<&'a Group>> {
    let direct_child = match target {
        NodeId::Group(uuid) => group.groups().iter().any(|g| g.uuid() == uuid),
        NodeId::Entry(uuid) => group.entries().iter().any(|e| e.uuid() == uuid),
    };
    if direct_child {
        return Some(vec![group]);
    }

    for child in group.groups() {
        if let Some(mut chain) = walk(child, target) {
            chain.insert(0, group);
            return Some(chain);
        }
    }

    None
}

/// The parent group of `target`, or `None` for the root and for orphaned
/// nodes with no findable chain from `root`
pub fn parent_of<'a>(root: &'a Group, target: NodeId) -> Option<&'a Group> {
    find_ancestors(root, target).last().copied()
}

/// Render the canonical path of a group.
///
/// The root renders as `/`; every other reachable group renders as the
/// concatenation of each ancestor's name plus `/`, then its own name plus
/// `/`. A group with no findable ancestor chain renders a degenerate
/// bare-name path without a leading separator.
pub fn group_path(root: &Group, group: &Group) -> String {
    if group.uuid() == root.uuid() {
        return "/".to_string();
    }

    let mut path = String::new();
    for ancestor in find_ancestors(root, NodeId::Group(group.uuid())) {
        path.push_str(ancestor.name());
        path.push('/');
    }
    path.push_str(group.name());
    path.push('/');
    path
}

/// Render the canonical path of an entry: its parent group's path plus the
/// entry title, with no trailing slash
pub fn entry_path(root: &Group, entry: &Entry) -> String {
    let mut path = String::new();
    for ancestor in find_ancestors(root, NodeId::Entry(entry.uuid())) {
        path.push_str(ancestor.name());
        path.push('/');
    }
    path.push_str(&entry.title());
    path
}
