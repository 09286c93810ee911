//! iOS pipeline: copy the packed bundle next to the Xcode project and
//! register it as a bundle resource of the app target.

use std::path::{Path, PathBuf};

use pckinject_core::{layout, AssetBundle, Platform};
use pckinject_pbx::{BuildFileMetadata, FileAttributes, ObjectId, PbxError, ProjectGraph};

use crate::error::{descriptor_err, io_err, SyncError};
use crate::events::{Stage, StageEvent, StageOutcome};
use crate::mirror::source_metadata;
use crate::writer::{atomic_write, copy_file};

/// Result of [`inject_resource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// A file reference with the basename already exists; nothing changed.
    AlreadyPresent { file_ref: ObjectId },
    /// Three links were added: file reference, build file, phase entry.
    Added {
        file_ref: ObjectId,
        build_file: ObjectId,
        phase: ObjectId,
    },
}

/// Register `basename` as a resource of the project's primary target.
///
/// Every structural anchor (main group, primary target, its resources phase)
/// is resolved before the first mutation, so an `Err` leaves `graph` as it
/// was.
pub fn inject_resource(graph: &mut ProjectGraph, basename: &str) -> Result<Injection, PbxError> {
    if let Some(existing) = graph.find_file(basename) {
        return Ok(Injection::AlreadyPresent {
            file_ref: existing.clone(),
        });
    }

    let main_group = graph.find_main_group()?;
    let target = graph.primary_target()?;
    graph.resources_build_phase(&target)?;

    let file_ref =
        graph.add_file_reference(basename, &main_group, FileAttributes::opaque_resource())?;
    let build_file = graph.add_build_file(&file_ref, BuildFileMetadata::default())?;
    let phase = graph.add_to_resources_build_phase(&build_file, &target)?;

    Ok(Injection::Added {
        file_ref,
        build_file,
        phase,
    })
}

/// Copy `<root>/assets/godot/main.pck` to `<root>/ios/main.pck` and register
/// it in the app's `project.pbxproj`.
///
/// The descriptor is only rewritten after a successful injection whose new
/// links pass [`ProjectGraph::check_links`].
pub fn run(project_root: &Path) -> Result<Vec<StageEvent>, SyncError> {
    let bundle = AssetBundle::resolve(project_root, Platform::Ios);
    let source = bundle.source().path();

    if source_metadata(source)?.is_none() {
        let event = StageEvent::new(
            Stage::IosCopy,
            Platform::Ios,
            StageOutcome::SourceMissing {
                path: source.to_path_buf(),
            },
        );
        return Ok(vec![event.emit()]);
    }

    let bytes = copy_file(source, bundle.destination())?;
    let copied = StageEvent::new(
        Stage::IosCopy,
        Platform::Ios,
        StageOutcome::Copied {
            destination: bundle.destination().to_path_buf(),
            bytes,
        },
    )
    .emit();

    let descriptor = layout::find_descriptor(project_root)?.ok_or_else(|| {
        SyncError::DescriptorNotFound {
            ios_root: layout::ios_root(project_root),
        }
    })?;
    let registered = register(&descriptor, layout::BUNDLE_FILE)?;

    Ok(vec![copied, registered.emit()])
}

fn register(descriptor: &Path, basename: &str) -> Result<StageEvent, SyncError> {
    let mut graph = load(descriptor)?;

    let outcome = match inject_resource(&mut graph, basename)
        .map_err(|e| descriptor_err(descriptor, e))?
    {
        Injection::AlreadyPresent { file_ref } => StageOutcome::AlreadyRegistered {
            descriptor: descriptor.to_path_buf(),
            file_ref,
        },
        Injection::Added {
            file_ref,
            build_file,
            phase,
        } => {
            graph
                .check_links(&[&file_ref, &build_file, &phase])
                .map_err(|e| descriptor_err(descriptor, e))?;
            atomic_write(descriptor, graph.serialize().as_bytes())?;
            StageOutcome::Registered {
                descriptor: descriptor.to_path_buf(),
                file_ref,
                build_file,
                phase,
            }
        }
    };

    Ok(StageEvent::new(Stage::IosRegister, Platform::Ios, outcome))
}

/// Read and parse a descriptor.
pub fn load(descriptor: &Path) -> Result<ProjectGraph, SyncError> {
    let text = std::fs::read_to_string(descriptor).map_err(|e| io_err(descriptor, e))?;
    ProjectGraph::parse(&text).map_err(|e| descriptor_err(descriptor, e))
}

/// Path the descriptor would be written to for an app named `app`.
pub fn descriptor_path(project_root: &Path, app: &str) -> PathBuf {
    layout::ios_root(project_root)
        .join(format!("{app}.{}", layout::XCODEPROJ_EXT))
        .join(layout::DESCRIPTOR_FILE)
}
