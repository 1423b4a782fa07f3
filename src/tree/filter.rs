//! Selective pruning for targeted re-execution.
//!
//! Given a target path, the filter removes every subtree that neither
//! contains the target nor lies inside it. What remains is the spine of
//! ancestors down to the target plus the target's own subtree, so a single
//! node can be re-run without rebuilding the tree.

use std::rc::Rc;

use crate::tree::path::ScopePath;
use crate::tree::{GroupScope, Scope};

/// Prunes `root`'s subtree in place. The root itself is never removed; a
/// target foreign to this tree leaves an empty root.
pub fn apply(root: &Rc<GroupScope>, target: &ScopePath) {
    prune(root, target);
}

fn prune(group: &Rc<GroupScope>, target: &ScopePath) {
    group.children_mut().retain(|child| {
        let path = child.path();
        path.is_ancestor_of(target) || target.contains(&path)
    });
    // Only groups on the spine above the target need further narrowing;
    // a matched subtree is kept whole.
    let children = group.children_snapshot();
    for child in &children {
        if let Scope::Group(nested) = child {
            if nested.path().is_ancestor_of(target) {
                prune(nested, target);
            }
        }
    }
}
