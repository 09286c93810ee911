//! Structured stage events and the per-run report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use pckinject_core::Platform;
use pckinject_pbx::ObjectId;

/// A unit of work inside a platform pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    AndroidMirror,
    IosCopy,
    IosRegister,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::AndroidMirror => "android_mirror",
            Stage::IosCopy => "ios_copy",
            Stage::IosRegister => "ios_register",
        }
    }
}

/// What a stage did. None of these are failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome {
    SourceMissing {
        path: PathBuf,
    },
    Mirrored {
        destination: PathBuf,
        files: usize,
        directories: usize,
    },
    Copied {
        destination: PathBuf,
        bytes: u64,
    },
    AlreadyRegistered {
        descriptor: PathBuf,
        file_ref: ObjectId,
    },
    Registered {
        descriptor: PathBuf,
        file_ref: ObjectId,
        build_file: ObjectId,
        phase: ObjectId,
    },
}

/// One stage's outcome, tagged with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub platform: Platform,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

impl StageEvent {
    pub fn new(stage: Stage, platform: Platform, outcome: StageOutcome) -> Self {
        Self {
            stage,
            platform,
            outcome,
        }
    }

    /// Log the event and hand it back.
    pub fn emit(self) -> Self {
        let stage = self.stage.as_str();
        match &self.outcome {
            StageOutcome::SourceMissing { path } => {
                tracing::warn!(stage, path = %path.display(), "bundle source missing; skipping");
            }
            StageOutcome::Mirrored {
                destination,
                files,
                directories,
            } => {
                tracing::info!(stage, path = %destination.display(), files, directories, "bundle mirrored");
            }
            StageOutcome::Copied { destination, bytes } => {
                tracing::info!(stage, path = %destination.display(), bytes, "bundle copied");
            }
            StageOutcome::AlreadyRegistered {
                descriptor,
                file_ref,
            } => {
                tracing::info!(stage, path = %descriptor.display(), id = %file_ref, "bundle already registered");
            }
            StageOutcome::Registered {
                descriptor,
                file_ref,
                build_file,
                phase,
            } => {
                tracing::info!(
                    stage,
                    path = %descriptor.display(),
                    id = %file_ref,
                    build_file = %build_file,
                    phase = %phase,
                    "bundle registered"
                );
            }
        }
        self
    }
}

/// Everything one hook invocation did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub project_root: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub events: Vec<StageEvent>,
}

impl RunReport {
    /// Events for one platform.
    pub fn for_platform(&self, platform: Platform) -> impl Iterator<Item = &StageEvent> {
        self.events.iter().filter(move |e| e.platform == platform)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
