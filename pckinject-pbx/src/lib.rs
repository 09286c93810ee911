//! # pckinject-pbx
//!
//! In-memory model of an Xcode project descriptor (`project.pbxproj`).
//!
//! [`ProjectGraph::parse`] turns the OpenStep plist text into a graph of
//! typed records, the query and mutation operations edit it without breaking
//! its links, and [`ProjectGraph::serialize`] writes it back in the layout
//! Xcode itself produces.
//!
//! Only the edit needed to register one resource file is supported; records
//! the model does not understand are carried through untouched.

pub mod error;
pub mod graph;
pub mod id;
pub mod parser;
pub mod record;
pub mod value;
mod writer;

pub use error::{Anchor, IntegrityViolation, PbxError};
pub use graph::{BuildFileMetadata, FileAttributes, ProjectGraph};
pub use id::ObjectId;
pub use record::{
    BuildFile, BuildFileSource, BuildPhase, BuildPhaseKind, FileReference, Group, GroupKind,
    OpaqueRecord, Project, Record, Target, TargetKind,
};
pub use value::{Dict, Fields, Value};
