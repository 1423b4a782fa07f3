//! A canonical, type-safe address for every node in a scope tree.
//!
//! Paths are immutable: `append` produces a new path that structurally shares
//! its prefix with the original. Equality and hashing are structural, so a
//! `ScopePath` can serve directly as a map key and as stable node identity
//! across runs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of tree node a path segment addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentKind {
    /// The root of one specification instance.
    Spec,
    /// A nested group (actions are addressed as groups).
    Group,
    /// A test leaf.
    Test,
}

/// One typed step in a [`ScopePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub name: String,
}

impl Segment {
    pub fn new(kind: SegmentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

/// Hierarchical identity of a scope: an ordered sequence of typed segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopePath(im::Vector<Segment>);

impl ScopePath {
    /// The root path of a specification instance.
    pub fn spec_root(name: impl Into<String>) -> Self {
        let mut segments = im::Vector::new();
        segments.push_back(Segment::new(SegmentKind::Spec, name));
        Self(segments)
    }

    /// Returns a new path with one segment appended; `self` is unchanged.
    pub fn append(&self, kind: SegmentKind, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push_back(Segment::new(kind, name));
        Self(segments)
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.0.back()
    }

    /// Name of the final segment, or `""` for the empty path.
    pub fn name(&self) -> &str {
        self.last().map(|s| s.name.as_str()).unwrap_or("")
    }

    /// The path with the final segment removed, or `None` for the empty path.
    pub fn parent(&self) -> Option<ScopePath> {
        if self.0.is_empty() {
            return None;
        }
        let mut segments = self.0.clone();
        segments.pop_back();
        Some(Self(segments))
    }

    /// True when `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &ScopePath) -> bool {
        self.0.len() < other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(mine, theirs)| mine == theirs)
    }

    /// True when `other` lies inside the subtree rooted at `self` (inclusive).
    pub fn contains(&self, other: &ScopePath) -> bool {
        self == other || self.is_ancestor_of(other)
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "{}", joined)
    }
}
