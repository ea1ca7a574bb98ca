//! Hierarchical, `/`-separated paths scoped to one mount identity.
//!
//! A [`VirtualPath`] is an immutable value: every transformation returns a
//! new path. Parsing is total, so any string produces a valid path; characters
//! a backend cannot store are that backend's business to reject.

use std::cmp::Ordering;
use std::fmt;

use crate::error::{Result, UnifsError};
use crate::types::MountIdentity;

/// The single separator shared by every backend.
pub const SEPARATOR: &str = "/";

const SEPARATOR_CHAR: char = '/';
const CURRENT_DIR: &str = ".";
const PARENT_DIR: &str = "..";

/// A location within the hierarchy of one filesystem.
///
/// Two paths are equal iff they share a mount identity, absoluteness and
/// segment sequence. Ordering is lexicographic over segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    identity: MountIdentity,
    absolute: bool,
    segments: Vec<String>,
}

impl VirtualPath {
    /// Parses `text` into a path belonging to `identity`.
    ///
    /// A leading separator marks the path absolute. Empty segments, including
    /// those produced by repeated or trailing separators, are discarded.
    pub fn parse(identity: &MountIdentity, text: &str) -> Self {
        Self {
            identity: identity.clone(),
            absolute: text.starts_with(SEPARATOR_CHAR),
            segments: text
                .split(SEPARATOR_CHAR)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Joins `first` and `more` with a single separator between each fragment,
    /// then parses the result.
    pub fn join(identity: &MountIdentity, first: &str, more: &[&str]) -> Self {
        Self::parse(identity, &join_fragments(first, more))
    }

    /// Returns the root path of the filesystem named by `identity`.
    pub fn root_of(identity: &MountIdentity) -> Self {
        Self {
            identity: identity.clone(),
            absolute: true,
            segments: Vec::new(),
        }
    }

    fn with_segments(&self, absolute: bool, segments: Vec<String>) -> Self {
        Self {
            identity: self.identity.clone(),
            absolute,
            segments,
        }
    }

    fn check_same_filesystem(&self, other: &VirtualPath) -> Result<()> {
        if self.identity != other.identity {
            return Err(UnifsError::ProviderMismatch {
                expected: self.identity.clone(),
                found: other.identity.clone(),
            });
        }
        Ok(())
    }

    /// Identity of the filesystem this path belongs to.
    pub fn identity(&self) -> &MountIdentity {
        &self.identity
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.absolute && self.segments.is_empty()
    }

    /// True for the empty relative path.
    pub fn is_empty(&self) -> bool {
        !self.absolute && self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn name_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns segment `index` as a single-segment relative path.
    pub fn name(&self, index: usize) -> Option<VirtualPath> {
        self.segments
            .get(index)
            .map(|s| self.with_segments(false, vec![s.clone()]))
    }

    /// Iterates over the segments as single-segment relative paths.
    pub fn iter(&self) -> impl Iterator<Item = VirtualPath> + '_ {
        self.segments
            .iter()
            .map(move |s| self.with_segments(false, vec![s.clone()]))
    }

    /// The root of this path's filesystem, if the path is absolute.
    pub fn root(&self) -> Option<VirtualPath> {
        self.absolute.then(|| Self::root_of(&self.identity))
    }

    /// The last segment as a relative path.
    pub fn file_name(&self) -> Option<VirtualPath> {
        self.segments
            .last()
            .map(|s| self.with_segments(false, vec![s.clone()]))
    }

    /// Drops the last segment. The parent of `/a` is `/`; the root, the empty
    /// path and single-segment relative paths have no parent.
    pub fn parent(&self) -> Option<VirtualPath> {
        match self.segments.len() {
            0 => None,
            1 if !self.absolute => None,
            n => Some(self.with_segments(self.absolute, self.segments[..n - 1].to_vec())),
        }
    }

    /// Relative path made of segments `begin..end`.
    pub fn subpath(&self, begin: usize, end: usize) -> Result<VirtualPath> {
        if begin >= end || end > self.segments.len() {
            return Err(UnifsError::InvalidArgument(format!(
                "subpath range {}..{} out of bounds for {} segments",
                begin,
                end,
                self.segments.len()
            )));
        }
        Ok(self.with_segments(false, self.segments[begin..end].to_vec()))
    }

    pub fn starts_with(&self, other: &VirtualPath) -> bool {
        self.identity == other.identity
            && self.absolute == other.absolute
            && self.segments.starts_with(&other.segments)
    }

    /// An absolute `other` must equal this path; a relative one must match the
    /// trailing segments. Only an empty path ends with the empty path.
    pub fn ends_with(&self, other: &VirtualPath) -> bool {
        if self.identity != other.identity {
            return false;
        }
        if other.absolute {
            return self.absolute && self.segments == other.segments;
        }
        if other.segments.is_empty() {
            return self.segments.is_empty();
        }
        self.segments.ends_with(&other.segments)
    }

    fn resolve_unchecked(&self, other: &VirtualPath) -> VirtualPath {
        if other.absolute {
            return other.clone();
        }
        if other.segments.is_empty() {
            return self.clone();
        }
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        self.with_segments(self.absolute, segments)
    }

    /// Resolves `other` against this path.
    ///
    /// An absolute `other` is returned as is, an empty one yields this path.
    pub fn resolve(&self, other: &VirtualPath) -> Result<VirtualPath> {
        self.check_same_filesystem(other)?;
        Ok(self.resolve_unchecked(other))
    }

    /// Parses `text` in this path's filesystem and resolves it.
    pub fn resolve_str(&self, text: &str) -> VirtualPath {
        self.resolve_unchecked(&Self::parse(&self.identity, text))
    }

    /// Resolves `other` against this path's parent.
    pub fn resolve_sibling(&self, other: &VirtualPath) -> Result<VirtualPath> {
        self.check_same_filesystem(other)?;
        Ok(match self.parent() {
            Some(parent) => parent.resolve_unchecked(other),
            None => other.clone(),
        })
    }

    /// Removes `.` segments and folds `..` into the preceding segment.
    ///
    /// `..` directly under the root is dropped; leading `..` segments of a
    /// relative path are kept.
    pub fn normalize(&self) -> VirtualPath {
        let mut out: Vec<String> = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment.as_str() {
                CURRENT_DIR => {}
                PARENT_DIR => match out.last() {
                    Some(last) if last != PARENT_DIR => {
                        out.pop();
                    }
                    _ if self.absolute => {}
                    _ => out.push(segment.clone()),
                },
                _ => out.push(segment.clone()),
            }
        }
        self.with_segments(self.absolute, out)
    }

    /// Builds a relative path `r` such that `self.resolve(r)` names `other`.
    ///
    /// Both paths must belong to the same filesystem and agree on absoluteness.
    pub fn relativize(&self, other: &VirtualPath) -> Result<VirtualPath> {
        self.check_same_filesystem(other)?;
        if self.absolute != other.absolute {
            return Err(UnifsError::InvalidArgument(format!(
                "cannot relativize '{}' against '{}': only one of them is absolute",
                other, self
            )));
        }

        let common = self
            .segments
            .iter()
            .zip(&other.segments)
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<String> = std::iter::repeat(PARENT_DIR.to_string())
            .take(self.segments.len() - common)
            .collect();
        segments.extend(other.segments[common..].iter().cloned());
        Ok(self.with_segments(false, segments))
    }

    /// Resolves a relative path against the root.
    pub fn to_absolute(&self) -> VirtualPath {
        if self.absolute {
            self.clone()
        } else {
            self.with_segments(true, self.segments.clone())
        }
    }

    /// Renders the path as a URI rooted at its mount identity.
    pub fn to_uri(&self) -> String {
        format!("{}{}", self.identity, self.to_absolute())
    }
}

/// Concatenates path fragments with a single separator between each.
///
/// Fragments are not trimmed, so `("", ["a"])` yields `/a`.
pub fn join_fragments(first: &str, more: &[&str]) -> String {
    let mut text = String::from(first);
    for part in more {
        text.push_str(SEPARATOR);
        text.push_str(part);
    }
    text
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str(SEPARATOR)?;
        }
        f.write_str(&self.segments.join(SEPARATOR))
    }
}

impl Ord for VirtualPath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.segments
            .cmp(&other.segments)
            .then(self.absolute.cmp(&other.absolute))
            .then_with(|| self.identity.cmp(&other.identity))
    }
}

impl PartialOrd for VirtualPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
