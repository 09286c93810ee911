//! Shared pipeline entrypoint used by the hook binary.

use std::path::Path;

use chrono::Utc;
use pckinject_core::Platform;

use crate::{android, ios, RunReport, SyncError};

/// Which platform pipelines a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformScope {
    /// Android then iOS.
    All,
    /// A single platform.
    Only(Platform),
}

impl PlatformScope {
    pub fn platforms(self) -> Vec<Platform> {
        match self {
            PlatformScope::All => Platform::all().to_vec(),
            PlatformScope::Only(p) => vec![p],
        }
    }
}

/// Run the selected pipelines against `project_root`, in order.
///
/// The first error aborts the run; events from pipelines that already
/// finished are logged but not returned.
pub fn run(project_root: &Path, scope: PlatformScope) -> Result<RunReport, SyncError> {
    let started_at = Utc::now();
    let mut events = Vec::new();

    for platform in scope.platforms() {
        let span = tracing::info_span!("pipeline", platform = %platform);
        let _enter = span.enter();
        let stage_events = match platform {
            Platform::Android => android::run(project_root)?,
            Platform::Ios => ios::run(project_root)?,
        };
        events.extend(stage_events);
    }

    Ok(RunReport {
        project_root: project_root.to_path_buf(),
        started_at,
        finished_at: Utc::now(),
        events,
    })
}
