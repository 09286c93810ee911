//! Error types for pckinject-pbx.

use std::fmt;

use thiserror::Error;

use crate::id::ObjectId;

/// A structural anchor the injection relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// `rootObject` does not name a `PBXProject`.
    ProjectObject,
    /// `PBXProject.mainGroup` is absent or not a group.
    MainGroup,
    /// `PBXProject.targets` is empty or its first entry is not a target.
    Target,
    /// The target has no `PBXResourcesBuildPhase`.
    ResourcesBuildPhase { target: ObjectId },
    /// A group id passed by the caller is not a live group.
    Group(ObjectId),
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::ProjectObject => write!(f, "project object (rootObject)"),
            Anchor::MainGroup => write!(f, "main group (PBXProject.mainGroup)"),
            Anchor::Target => write!(f, "primary build target (PBXProject.targets)"),
            Anchor::ResourcesBuildPhase { target } => {
                write!(f, "Resources build phase of target {target}")
            }
            Anchor::Group(id) => write!(f, "group {id}"),
        }
    }
}

/// One broken link found by [`crate::ProjectGraph::check_integrity`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityViolation {
    /// Object holding the link.
    pub owner: ObjectId,
    /// Key the link lives under (`fileRef`, `files`, `children`…).
    pub field: &'static str,
    /// The id that failed to resolve.
    pub target: ObjectId,
    /// What kind of record the link should point at.
    pub expected: &'static str,
}

impl fmt::Display for IntegrityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {} is not a live {}",
            self.owner, self.field, self.target, self.expected
        )
    }
}

/// All errors that can arise from parsing, querying or mutating a descriptor.
#[derive(Debug, Error)]
pub enum PbxError {
    /// The text is not a well-formed OpenStep plist.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// The plist parsed but its top level is not a project document.
    #[error("malformed descriptor: {0}")]
    Document(String),

    /// An object has a known `isa` but the wrong shape.
    #[error("object {id} ({isa}): {message}")]
    Schema {
        id: ObjectId,
        isa: String,
        message: String,
    },

    /// A structural anchor the edit depends on is absent.
    #[error("project structure missing: {0}")]
    MissingProjectStructure(Anchor),

    /// A caller-supplied id does not resolve to the expected record kind.
    #[error("{id} is not a live {expected}")]
    DanglingReference {
        id: ObjectId,
        expected: &'static str,
    },

    /// The graph contains broken links.
    #[error("descriptor failed integrity check: {}", join_violations(.0))]
    Integrity(Vec<IntegrityViolation>),
}

fn join_violations(violations: &[IntegrityViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

pub(crate) fn schema_err(id: &ObjectId, isa: &str, message: impl Into<String>) -> PbxError {
    PbxError::Schema {
        id: id.clone(),
        isa: isa.to_string(),
        message: message.into(),
    }
}
