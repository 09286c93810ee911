//! [`ProjectGraph`]: the loaded descriptor and every operation on it.
//!
//! Mutations keep two invariants at all times:
//!
//! 1. every `PBXBuildFile.fileRef` names a live `PBXFileReference`;
//! 2. every id in a build phase's `files` names a live `PBXBuildFile`.
//!
//! [`ProjectGraph::has_file`] is the idempotency gate: callers check it
//! before adding a file, the add operations themselves never deduplicate.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use rand::RngCore;

use crate::error::{Anchor, IntegrityViolation, PbxError};
use crate::id::ObjectId;
use crate::parser;
use crate::record::{
    BuildFile, BuildFileSource, BuildPhase, BuildPhaseKind, FileReference, Group, GroupKind,
    Project, Record, Target, TargetKind, BUILD_FILE_ISA, FILE_REFERENCE_ISA,
};
use crate::value::{Dict, Fields, Value};
use crate::writer;

const DEFAULT_ARCHIVE_VERSION: &str = "1";
const DEFAULT_OBJECT_VERSION: &str = "54";
const GROUP_SOURCE_TREE: &str = "<group>";

/// Opaque isas a build file may reference.
const BUILDABLE_OPAQUE_ISAS: &[&str] = &["XCVersionGroup", "PBXReferenceProxy"];

// ---------------------------------------------------------------------------
// Mutation parameters
// ---------------------------------------------------------------------------

/// Attributes of a new file reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileAttributes {
    pub last_known_file_type: Option<String>,
    pub file_encoding: Option<u32>,
    /// Defaults to `<group>` (path relative to the parent group).
    pub source_tree: Option<String>,
}

impl FileAttributes {
    /// An opaque resource blob: `lastKnownFileType = file`, `fileEncoding = 4`.
    pub fn opaque_resource() -> Self {
        Self {
            last_known_file_type: Some("file".to_string()),
            file_encoding: Some(4),
            source_tree: None,
        }
    }
}

/// Extra keys of a new build file (`settings`, mostly).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildFileMetadata {
    pub settings: Option<Dict>,
}

// ---------------------------------------------------------------------------
// ProjectGraph
// ---------------------------------------------------------------------------

/// A parsed `project.pbxproj`.
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    pub(crate) archive_version: String,
    pub(crate) classes: Dict,
    pub(crate) object_version: String,
    pub(crate) objects: IndexMap<ObjectId, Record>,
    pub(crate) root_object: ObjectId,
    /// Every id this instance has handed out, live or not.
    issued: HashSet<ObjectId>,
}

/// Structural equality: header values, root object, every record with its
/// links, and the order of objects within each `isa` section. The set of ids
/// issued by the generator is not part of it.
impl PartialEq for ProjectGraph {
    fn eq(&self, other: &Self) -> bool {
        self.archive_version == other.archive_version
            && self.classes == other.classes
            && self.object_version == other.object_version
            && self.root_object == other.root_object
            && self.objects == other.objects
            && self.section_order() == other.section_order()
    }
}

impl Eq for ProjectGraph {}

impl ProjectGraph {
    // -- loading ------------------------------------------------------------

    /// Parse descriptor text and validate every object.
    pub fn parse(text: &str) -> Result<Self, PbxError> {
        let root = parser::parse(text)?;
        Self::from_value(root)
    }

    fn from_value(root: Value) -> Result<Self, PbxError> {
        let root = match root {
            Value::Dict(root) => root,
            other => {
                return Err(PbxError::Document(format!(
                    "top level must be a dictionary, found {}",
                    other.kind()
                )))
            }
        };

        let mut archive_version = None;
        let mut classes = None;
        let mut object_version = None;
        let mut objects = None;
        let mut root_object = None;

        for (key, value) in root {
            match (key.as_str(), value) {
                ("archiveVersion", Value::String(s)) => archive_version = Some(s),
                ("classes", Value::Dict(d)) => classes = Some(d),
                ("objectVersion", Value::String(s)) => object_version = Some(s),
                ("objects", Value::Dict(d)) => objects = Some(d),
                ("rootObject", Value::String(s)) => root_object = Some(ObjectId(s)),
                (
                    "archiveVersion" | "classes" | "objectVersion" | "objects" | "rootObject",
                    other,
                ) => {
                    return Err(PbxError::Document(format!(
                        "{key} has the wrong type ({})",
                        other.kind()
                    )))
                }
                _ => return Err(PbxError::Document(format!("unexpected top-level key '{key}'"))),
            }
        }

        let objects = objects.ok_or_else(|| PbxError::Document("missing objects".into()))?;
        let root_object =
            root_object.ok_or_else(|| PbxError::Document("missing rootObject".into()))?;

        let mut table = IndexMap::with_capacity(objects.len());
        for (id, value) in objects {
            let id = ObjectId(id);
            let dict = match value {
                Value::Dict(dict) => dict,
                other => {
                    return Err(PbxError::Document(format!(
                        "object {id} must be a dictionary, found {}",
                        other.kind()
                    )))
                }
            };
            let record = Record::from_dict(&id, dict)?;
            table.insert(id, record);
        }

        tracing::debug!(objects = table.len(), root = %root_object, "descriptor loaded");

        Ok(Self {
            archive_version: archive_version.unwrap_or_else(|| DEFAULT_ARCHIVE_VERSION.into()),
            classes: classes.unwrap_or_default(),
            object_version: object_version.unwrap_or_else(|| DEFAULT_OBJECT_VERSION.into()),
            objects: table,
            root_object,
            issued: HashSet::new(),
        })
    }

    /// Build a minimal single-target application project: a main group, a
    /// native target named `target_name` with sources and resources phases,
    /// and the project object tying them together.
    pub fn scaffold(target_name: &str) -> Self {
        let mut graph = Self {
            archive_version: DEFAULT_ARCHIVE_VERSION.into(),
            classes: Dict::new(),
            object_version: DEFAULT_OBJECT_VERSION.into(),
            objects: IndexMap::new(),
            root_object: ObjectId(String::new()),
            issued: HashSet::new(),
        };

        let main_group = graph.generate_unique_id();
        let sources = graph.generate_unique_id();
        let resources = graph.generate_unique_id();
        let target = graph.generate_unique_id();
        let project = graph.generate_unique_id();

        graph.objects.insert(
            main_group.clone(),
            Record::Group(Group {
                kind: GroupKind::Group,
                children: Vec::new(),
                name: None,
                path: None,
                source_tree: GROUP_SOURCE_TREE.into(),
                extra: Fields::new(),
            }),
        );
        for (id, kind) in [
            (&sources, BuildPhaseKind::Sources),
            (&resources, BuildPhaseKind::Resources),
        ] {
            let mut extra = Fields::new();
            extra.insert("buildActionMask".into(), Value::from("2147483647"));
            extra.insert(
                "runOnlyForDeploymentPostprocessing".into(),
                Value::from("0"),
            );
            graph.objects.insert(
                id.clone(),
                Record::BuildPhase(BuildPhase {
                    kind,
                    files: Vec::new(),
                    extra,
                }),
            );
        }
        let mut target_extra = Fields::new();
        target_extra.insert("productName".into(), Value::from(target_name));
        graph.objects.insert(
            target.clone(),
            Record::Target(Target {
                kind: TargetKind::Native,
                name: target_name.to_string(),
                build_phases: vec![sources, resources],
                extra: target_extra,
            }),
        );
        graph.objects.insert(
            project.clone(),
            Record::Project(Project {
                main_group: Some(main_group),
                targets: vec![target],
                extra: Fields::new(),
            }),
        );
        graph.root_object = project;
        graph
    }

    /// Render the graph back to descriptor text.
    pub fn serialize(&self) -> String {
        writer::write_document(self)
    }

    // -- read access ----------------------------------------------------------

    /// Object ids grouped by `isa`, each group in table order.
    pub(crate) fn section_order(&self) -> BTreeMap<&str, Vec<&ObjectId>> {
        let mut sections: BTreeMap<&str, Vec<&ObjectId>> = BTreeMap::new();
        for (id, record) in &self.objects {
            sections.entry(record.isa()).or_default().push(id);
        }
        sections
    }

    pub fn root_object(&self) -> &ObjectId {
        &self.root_object
    }

    pub fn object_version(&self) -> &str {
        &self.object_version
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Record> {
        self.objects.get(id)
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects in table order.
    pub fn objects(&self) -> impl Iterator<Item = (&ObjectId, &Record)> {
        self.objects.iter()
    }

    pub fn file_references(&self) -> impl Iterator<Item = (&ObjectId, &FileReference)> {
        self.objects.iter().filter_map(|(id, r)| match r {
            Record::FileReference(f) => Some((id, f)),
            _ => None,
        })
    }

    pub fn build_files(&self) -> impl Iterator<Item = (&ObjectId, &BuildFile)> {
        self.objects.iter().filter_map(|(id, r)| match r {
            Record::BuildFile(b) => Some((id, b)),
            _ => None,
        })
    }

    pub fn build_phase(&self, id: &ObjectId) -> Option<&BuildPhase> {
        match self.objects.get(id) {
            Some(Record::BuildPhase(p)) => Some(p),
            _ => None,
        }
    }

    pub fn group(&self, id: &ObjectId) -> Option<&Group> {
        match self.objects.get(id) {
            Some(Record::Group(g)) => Some(g),
            _ => None,
        }
    }

    // -- queries --------------------------------------------------------------

    /// Id of the first file reference whose basename is `basename`.
    pub fn find_file(&self, basename: &str) -> Option<&ObjectId> {
        self.file_references()
            .find(|(_, f)| f.basename() == basename)
            .map(|(id, _)| id)
    }

    /// `true` iff a file reference with this basename exists.
    pub fn has_file(&self, basename: &str) -> bool {
        self.find_file(basename).is_some()
    }

    /// The `PBXProject` that `rootObject` points at.
    pub fn project(&self) -> Result<(&ObjectId, &Project), PbxError> {
        match self.objects.get_key_value(&self.root_object) {
            Some((id, Record::Project(p))) => Ok((id, p)),
            _ => Err(PbxError::MissingProjectStructure(Anchor::ProjectObject)),
        }
    }

    /// Root of the file tree, via `PBXProject.mainGroup`.
    pub fn find_main_group(&self) -> Result<ObjectId, PbxError> {
        let (_, project) = self.project()?;
        let main = project
            .main_group
            .as_ref()
            .ok_or(PbxError::MissingProjectStructure(Anchor::MainGroup))?;
        if self.group(main).is_none() {
            return Err(PbxError::MissingProjectStructure(Anchor::MainGroup));
        }
        Ok(main.clone())
    }

    /// The first target listed by the project.
    pub fn primary_target(&self) -> Result<ObjectId, PbxError> {
        let (_, project) = self.project()?;
        match project.targets.first() {
            Some(id) if matches!(self.objects.get(id), Some(Record::Target(_))) => Ok(id.clone()),
            _ => Err(PbxError::MissingProjectStructure(Anchor::Target)),
        }
    }

    /// The `PBXResourcesBuildPhase` of `target`.
    pub fn resources_build_phase(&self, target: &ObjectId) -> Result<ObjectId, PbxError> {
        let Some(Record::Target(t)) = self.objects.get(target) else {
            return Err(PbxError::DanglingReference {
                id: target.clone(),
                expected: "build target",
            });
        };
        t.build_phases
            .iter()
            .find(|id| {
                self.build_phase(id)
                    .is_some_and(|p| p.kind == BuildPhaseKind::Resources)
            })
            .cloned()
            .ok_or_else(|| {
                PbxError::MissingProjectStructure(Anchor::ResourcesBuildPhase {
                    target: target.clone(),
                })
            })
    }

    // -- id generation ----------------------------------------------------------

    /// A fresh id, distinct from every live id and every id issued before.
    pub fn generate_unique_id(&mut self) -> ObjectId {
        self.generate_unique_id_with(&mut rand::thread_rng())
    }

    /// [`Self::generate_unique_id`] drawing candidates from `rng`.
    ///
    /// Candidates are random, not sequential, so ids stay unique next to
    /// whatever ids the descriptor was loaded with. A colliding candidate is
    /// discarded and another drawn.
    pub fn generate_unique_id_with<R: RngCore + ?Sized>(&mut self, rng: &mut R) -> ObjectId {
        loop {
            let candidate = ObjectId::random(rng);
            if self.objects.contains_key(&candidate) {
                tracing::trace!(id = %candidate, "id collides with live object; retrying");
                continue;
            }
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
            tracing::trace!(id = %candidate, "id already issued; retrying");
        }
    }

    // -- mutations --------------------------------------------------------------

    /// Add a `PBXFileReference` for `basename` as the last child of
    /// `parent_group`.
    ///
    /// Does not check [`Self::has_file`]. Touches no build file or phase, so
    /// both invariants are unaffected.
    pub fn add_file_reference(
        &mut self,
        basename: &str,
        parent_group: &ObjectId,
        attributes: FileAttributes,
    ) -> Result<ObjectId, PbxError> {
        if self.group(parent_group).is_none() {
            return Err(PbxError::MissingProjectStructure(Anchor::Group(
                parent_group.clone(),
            )));
        }

        let id = self.generate_unique_id();
        let file = FileReference {
            path: basename.to_string(),
            name: Some(basename.to_string()),
            source_tree: attributes
                .source_tree
                .unwrap_or_else(|| GROUP_SOURCE_TREE.to_string()),
            file_encoding: attributes.file_encoding,
            last_known_file_type: attributes.last_known_file_type,
            explicit_file_type: None,
            extra: Fields::new(),
        };
        self.objects.insert(id.clone(), Record::FileReference(file));

        if let Some(Record::Group(group)) = self.objects.get_mut(parent_group) {
            group.children.push(id.clone());
        }

        tracing::debug!(id = %id, basename, group = %parent_group, "added file reference");
        Ok(id)
    }

    /// Add a `PBXBuildFile` linking `file_ref` into the build.
    ///
    /// Keeps invariant 1: `file_ref` must be a live file reference.
    pub fn add_build_file(
        &mut self,
        file_ref: &ObjectId,
        metadata: BuildFileMetadata,
    ) -> Result<ObjectId, PbxError> {
        if !matches!(self.objects.get(file_ref), Some(Record::FileReference(_))) {
            return Err(PbxError::DanglingReference {
                id: file_ref.clone(),
                expected: FILE_REFERENCE_ISA,
            });
        }

        let id = self.generate_unique_id();
        let mut extra = Fields::new();
        if let Some(settings) = metadata.settings {
            extra.insert("settings".into(), Value::Dict(settings));
        }
        self.objects.insert(
            id.clone(),
            Record::BuildFile(BuildFile {
                source: BuildFileSource::FileRef(file_ref.clone()),
                extra,
            }),
        );

        tracing::debug!(id = %id, file_ref = %file_ref, "added build file");
        Ok(id)
    }

    /// Append `build_file` to the resources phase of `target`; returns the
    /// phase id.
    ///
    /// Keeps invariant 2: `build_file` must be a live build file.
    pub fn add_to_resources_build_phase(
        &mut self,
        build_file: &ObjectId,
        target: &ObjectId,
    ) -> Result<ObjectId, PbxError> {
        if !matches!(self.objects.get(build_file), Some(Record::BuildFile(_))) {
            return Err(PbxError::DanglingReference {
                id: build_file.clone(),
                expected: BUILD_FILE_ISA,
            });
        }
        let phase_id = self.resources_build_phase(target)?;
        if let Some(Record::BuildPhase(phase)) = self.objects.get_mut(&phase_id) {
            phase.files.push(build_file.clone());
        }

        tracing::debug!(build_file = %build_file, phase = %phase_id, "added to resources phase");
        Ok(phase_id)
    }

    // -- integrity --------------------------------------------------------------

    /// Check every link in the graph.
    ///
    /// Covers both mutation invariants plus group children, target phases,
    /// and the project's own links.
    pub fn check_integrity(&self) -> Result<(), PbxError> {
        let mut violations = Vec::new();
        for (id, record) in &self.objects {
            self.collect_violations(id, record, &mut violations);
        }

        if !matches!(self.objects.get(&self.root_object), Some(Record::Project(_))) {
            violations.push(IntegrityViolation {
                owner: ObjectId::from("<root>"),
                field: "rootObject",
                target: self.root_object.clone(),
                expected: "PBXProject",
            });
        }

        into_result(violations)
    }

    /// Check only the outgoing links of `owners`.
    ///
    /// Used after an edit to verify the links it created without judging the
    /// rest of the file. An owner that is not live is itself a violation.
    pub fn check_links(&self, owners: &[&ObjectId]) -> Result<(), PbxError> {
        let mut violations = Vec::new();
        for owner in owners {
            match self.objects.get(*owner) {
                Some(record) => self.collect_violations(owner, record, &mut violations),
                None => violations.push(IntegrityViolation {
                    owner: (*owner).clone(),
                    field: "<self>",
                    target: (*owner).clone(),
                    expected: "object",
                }),
            }
        }
        into_result(violations)
    }

    /// `true` if a `PBXBuildFile.fileRef` may point at `id`.
    ///
    /// Besides file references and (variant) groups, Xcode links Core Data
    /// model bundles (`XCVersionGroup`) and sub-project products
    /// (`PBXReferenceProxy`) into build phases.
    fn is_buildable(&self, id: &ObjectId) -> bool {
        match self.objects.get(id) {
            Some(Record::FileReference(_)) | Some(Record::Group(_)) => true,
            Some(Record::Opaque(o)) => BUILDABLE_OPAQUE_ISAS.contains(&o.isa.as_str()),
            _ => false,
        }
    }

    fn collect_violations(
        &self,
        id: &ObjectId,
        record: &Record,
        violations: &mut Vec<IntegrityViolation>,
    ) {
        let mut check = |field: &'static str, target: &ObjectId, expected: &'static str, ok: bool| {
            if !ok {
                violations.push(IntegrityViolation {
                    owner: id.clone(),
                    field,
                    target: target.clone(),
                    expected,
                });
            }
        };

        match record {
            Record::BuildFile(b) => match &b.source {
                BuildFileSource::FileRef(r) => {
                    check("fileRef", r, FILE_REFERENCE_ISA, self.is_buildable(r))
                }
                BuildFileSource::ProductRef(r) => {
                    check("productRef", r, "object", self.objects.contains_key(r))
                }
            },
            Record::BuildPhase(p) => {
                for f in &p.files {
                    check(
                        "files",
                        f,
                        BUILD_FILE_ISA,
                        matches!(self.objects.get(f), Some(Record::BuildFile(_))),
                    );
                }
            }
            Record::Group(g) => {
                for c in &g.children {
                    check("children", c, "object", self.objects.contains_key(c));
                }
            }
            Record::Target(t) => {
                for p in &t.build_phases {
                    check("buildPhases", p, "build phase", self.build_phase(p).is_some());
                }
            }
            Record::Project(p) => {
                if let Some(main) = &p.main_group {
                    check("mainGroup", main, "group", self.group(main).is_some());
                }
                for t in &p.targets {
                    check(
                        "targets",
                        t,
                        "build target",
                        matches!(self.objects.get(t), Some(Record::Target(_))),
                    );
                }
            }
            Record::FileReference(_) | Record::Opaque(_) => {}
        }
    }
}

fn into_result(violations: Vec<IntegrityViolation>) -> Result<(), PbxError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(PbxError::Integrity(violations))
    }
}
