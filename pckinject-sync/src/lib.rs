//! # pckinject-sync
//!
//! Installs an exported game bundle into native mobile projects.
//!
//! Call [`pipeline::run`] to run the Android and/or iOS pipelines against a
//! project root, or [`status::inspect`] for a read-only view of what is
//! installed. [`mirror::mirror`] is the directory synchronizer the Android
//! pipeline is built on.

pub mod android;
pub mod error;
pub mod events;
pub mod ios;
pub mod mirror;
pub mod pipeline;
pub mod status;
pub mod writer;

pub use error::SyncError;
pub use events::{RunReport, Stage, StageEvent, StageOutcome};
pub use ios::Injection;
pub use mirror::{mirror, MirrorOutcome};
pub use pipeline::{run, PlatformScope};
pub use status::{inspect, StatusReport};
pub use writer::WriteResult;
