//! Typed project records.
//!
//! Each object in the descriptor is validated into one of a closed set of
//! variants keyed by its `isa`. Known kinds must have the expected shape or
//! loading fails; keys the model does not use are kept in `extra` so they
//! survive a rewrite. Kinds the model has no use for (build configurations,
//! container proxies, package references…) become [`OpaqueRecord`]s.

use crate::error::{schema_err, PbxError};
use crate::id::ObjectId;
use crate::value::{Dict, Fields, Value};

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

macro_rules! isa_kind {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $isa:literal, $label:literal;)+ }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
        }

        impl $name {
            pub fn isa(self) -> &'static str {
                match self {
                    $(Self::$variant => $isa,)+
                }
            }

            pub fn from_isa(isa: &str) -> Option<Self> {
                match isa {
                    $($isa => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Name Xcode uses when annotating references to this kind.
            pub fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }
    };
}

isa_kind! {
    /// The flavour of a group node.
    GroupKind {
        Group => "PBXGroup", "Group";
        VariantGroup => "PBXVariantGroup", "VariantGroup";
    }
}

isa_kind! {
    /// The step a build phase performs.
    BuildPhaseKind {
        Resources => "PBXResourcesBuildPhase", "Resources";
        Sources => "PBXSourcesBuildPhase", "Sources";
        Frameworks => "PBXFrameworksBuildPhase", "Frameworks";
        Headers => "PBXHeadersBuildPhase", "Headers";
        CopyFiles => "PBXCopyFilesBuildPhase", "CopyFiles";
        ShellScript => "PBXShellScriptBuildPhase", "ShellScript";
        Rez => "PBXRezBuildPhase", "Rez";
    }
}

isa_kind! {
    /// The flavour of a build target.
    TargetKind {
        Native => "PBXNativeTarget", "NativeTarget";
        Aggregate => "PBXAggregateTarget", "AggregateTarget";
        Legacy => "PBXLegacyTarget", "LegacyTarget";
    }
}

pub const FILE_REFERENCE_ISA: &str = "PBXFileReference";
pub const BUILD_FILE_ISA: &str = "PBXBuildFile";
pub const PROJECT_ISA: &str = "PBXProject";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// `PBXFileReference`: one physical file known to the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub path: String,
    pub name: Option<String>,
    pub source_tree: String,
    pub file_encoding: Option<u32>,
    pub last_known_file_type: Option<String>,
    pub explicit_file_type: Option<String>,
    pub extra: Fields,
}

impl FileReference {
    /// `name` when present, otherwise the last component of `path`.
    pub fn basename(&self) -> &str {
        match &self.name {
            Some(name) => name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// What a build file links into the build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildFileSource {
    /// `fileRef`: a file reference (or variant group).
    FileRef(ObjectId),
    /// `productRef`: a Swift package product.
    ProductRef(ObjectId),
}

/// `PBXBuildFile`: links a file reference into a build phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildFile {
    pub source: BuildFileSource,
    pub extra: Fields,
}

impl BuildFile {
    pub fn file_ref(&self) -> Option<&ObjectId> {
        match &self.source {
            BuildFileSource::FileRef(id) => Some(id),
            BuildFileSource::ProductRef(_) => None,
        }
    }
}

/// `PBXGroup` / `PBXVariantGroup`: a node of the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub kind: GroupKind,
    pub children: Vec<ObjectId>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub source_tree: String,
    pub extra: Fields,
}

/// One build phase of a target; `files` are build file ids in build order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildPhase {
    pub kind: BuildPhaseKind,
    pub files: Vec<ObjectId>,
    pub extra: Fields,
}

impl BuildPhase {
    /// The explicit `name` of copy-files and script phases, else the kind label.
    pub fn display_name(&self) -> &str {
        self.extra
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or(self.kind.label())
    }
}

/// A build target and its ordered build phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    pub build_phases: Vec<ObjectId>,
    pub extra: Fields,
}

/// `PBXProject`: the object `rootObject` points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Optional so a descriptor without one still loads; the absence is
    /// reported by [`crate::ProjectGraph::find_main_group`].
    pub main_group: Option<ObjectId>,
    pub targets: Vec<ObjectId>,
    pub extra: Fields,
}

/// Any object kind the model does not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueRecord {
    pub isa: String,
    pub fields: Fields,
}

/// One object of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    FileReference(FileReference),
    BuildFile(BuildFile),
    Group(Group),
    BuildPhase(BuildPhase),
    Target(Target),
    Project(Project),
    Opaque(OpaqueRecord),
}

impl Record {
    pub fn isa(&self) -> &str {
        match self {
            Record::FileReference(_) => FILE_REFERENCE_ISA,
            Record::BuildFile(_) => BUILD_FILE_ISA,
            Record::Group(g) => g.kind.isa(),
            Record::BuildPhase(p) => p.kind.isa(),
            Record::Target(t) => t.kind.isa(),
            Record::Project(_) => PROJECT_ISA,
            Record::Opaque(o) => &o.isa,
        }
    }

    /// Validate a raw object dictionary into a typed record.
    pub fn from_dict(id: &ObjectId, dict: Dict) -> Result<Record, PbxError> {
        let mut fields: Fields = dict.into_iter().collect();
        let isa = match fields.remove("isa") {
            Some(Value::String(isa)) => isa,
            Some(other) => {
                return Err(schema_err(
                    id,
                    "?",
                    format!("isa must be a string, found {}", other.kind()),
                ))
            }
            None => return Err(schema_err(id, "?", "missing isa")),
        };
        let mut r = FieldReader {
            id,
            isa: &isa,
            fields,
        };

        let record = if isa == FILE_REFERENCE_ISA {
            Record::FileReference(FileReference {
                path: r.required_string("path")?,
                name: r.optional_string("name")?,
                source_tree: r.required_string("sourceTree")?,
                file_encoding: r.optional_u32("fileEncoding")?,
                last_known_file_type: r.optional_string("lastKnownFileType")?,
                explicit_file_type: r.optional_string("explicitFileType")?,
                extra: Fields::new(),
            })
        } else if isa == BUILD_FILE_ISA {
            let file_ref = r.optional_string("fileRef")?;
            let product_ref = r.optional_string("productRef")?;
            let source = match (file_ref, product_ref) {
                (Some(f), None) => BuildFileSource::FileRef(ObjectId(f)),
                (None, Some(p)) => BuildFileSource::ProductRef(ObjectId(p)),
                (Some(_), Some(_)) => {
                    return Err(r.error("has both fileRef and productRef"));
                }
                (None, None) => return Err(r.error("has neither fileRef nor productRef")),
            };
            Record::BuildFile(BuildFile {
                source,
                extra: Fields::new(),
            })
        } else if isa == PROJECT_ISA {
            Record::Project(Project {
                main_group: r.optional_string("mainGroup")?.map(ObjectId),
                targets: r.required_ids("targets")?,
                extra: Fields::new(),
            })
        } else if let Some(kind) = GroupKind::from_isa(&isa) {
            Record::Group(Group {
                kind,
                children: r.required_ids("children")?,
                name: r.optional_string("name")?,
                path: r.optional_string("path")?,
                source_tree: r.required_string("sourceTree")?,
                extra: Fields::new(),
            })
        } else if let Some(kind) = BuildPhaseKind::from_isa(&isa) {
            Record::BuildPhase(BuildPhase {
                kind,
                files: r.required_ids("files")?,
                extra: Fields::new(),
            })
        } else if let Some(kind) = TargetKind::from_isa(&isa) {
            Record::Target(Target {
                kind,
                name: r.required_string("name")?,
                build_phases: r.required_ids("buildPhases")?,
                extra: Fields::new(),
            })
        } else {
            let fields = r.fields;
            return Ok(Record::Opaque(OpaqueRecord { isa, fields }));
        };

        Ok(record.with_extra(r.fields))
    }

    fn with_extra(mut self, rest: Fields) -> Record {
        match &mut self {
            Record::FileReference(x) => x.extra = rest,
            Record::BuildFile(x) => x.extra = rest,
            Record::Group(x) => x.extra = rest,
            Record::BuildPhase(x) => x.extra = rest,
            Record::Target(x) => x.extra = rest,
            Record::Project(x) => x.extra = rest,
            Record::Opaque(x) => x.fields = rest,
        }
        self
    }

    /// All keys except `isa`, sorted.
    pub fn to_fields(&self) -> Fields {
        match self {
            Record::FileReference(f) => {
                let mut out = f.extra.clone();
                out.insert("path".into(), Value::from(f.path.as_str()));
                put_opt(&mut out, "name", f.name.as_deref());
                out.insert("sourceTree".into(), Value::from(f.source_tree.as_str()));
                if let Some(enc) = f.file_encoding {
                    out.insert("fileEncoding".into(), Value::from(enc.to_string()));
                }
                put_opt(&mut out, "lastKnownFileType", f.last_known_file_type.as_deref());
                put_opt(&mut out, "explicitFileType", f.explicit_file_type.as_deref());
                out
            }
            Record::BuildFile(b) => {
                let mut out = b.extra.clone();
                let (key, id) = match &b.source {
                    BuildFileSource::FileRef(id) => ("fileRef", id),
                    BuildFileSource::ProductRef(id) => ("productRef", id),
                };
                out.insert(key.into(), Value::from(id.as_str()));
                out
            }
            Record::Group(g) => {
                let mut out = g.extra.clone();
                out.insert("children".into(), id_array(&g.children));
                put_opt(&mut out, "name", g.name.as_deref());
                put_opt(&mut out, "path", g.path.as_deref());
                out.insert("sourceTree".into(), Value::from(g.source_tree.as_str()));
                out
            }
            Record::BuildPhase(p) => {
                let mut out = p.extra.clone();
                out.insert("files".into(), id_array(&p.files));
                out
            }
            Record::Target(t) => {
                let mut out = t.extra.clone();
                out.insert("name".into(), Value::from(t.name.as_str()));
                out.insert("buildPhases".into(), id_array(&t.build_phases));
                out
            }
            Record::Project(p) => {
                let mut out = p.extra.clone();
                if let Some(main) = &p.main_group {
                    out.insert("mainGroup".into(), Value::from(main.as_str()));
                }
                out.insert("targets".into(), id_array(&p.targets));
                out
            }
            Record::Opaque(o) => o.fields.clone(),
        }
    }
}

fn put_opt(out: &mut Fields, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        out.insert(key.to_string(), Value::from(v));
    }
}

fn id_array(ids: &[ObjectId]) -> Value {
    Value::Array(ids.iter().map(|id| Value::from(id.as_str())).collect())
}

// ---------------------------------------------------------------------------
// Field extraction
// ---------------------------------------------------------------------------

/// Pulls typed fields out of an object; whatever is left becomes `extra`.
struct FieldReader<'a> {
    id: &'a ObjectId,
    isa: &'a str,
    fields: Fields,
}

impl FieldReader<'_> {
    fn error(&self, message: impl Into<String>) -> PbxError {
        schema_err(self.id, self.isa, message)
    }

    fn optional_string(&mut self, key: &str) -> Result<Option<String>, PbxError> {
        match self.fields.remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(self.error(format!(
                "{key} must be a string, found {}",
                other.kind()
            ))),
        }
    }

    fn required_string(&mut self, key: &str) -> Result<String, PbxError> {
        self.optional_string(key)?
            .ok_or_else(|| self.error(format!("missing {key}")))
    }

    fn optional_u32(&mut self, key: &str) -> Result<Option<u32>, PbxError> {
        match self.optional_string(key)? {
            None => Ok(None),
            Some(s) => s
                .parse()
                .map(Some)
                .map_err(|_| self.error(format!("{key} must be an integer, found '{s}'"))),
        }
    }

    fn required_ids(&mut self, key: &str) -> Result<Vec<ObjectId>, PbxError> {
        match self.fields.remove(key) {
            None => Err(self.error(format!("missing {key}"))),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(ObjectId(s)),
                    other => Err(self.error(format!(
                        "{key} entries must be ids, found {}",
                        other.kind()
                    ))),
                })
                .collect(),
            Some(other) => Err(self.error(format!(
                "{key} must be an array, found {}",
                other.kind()
            ))),
        }
    }
}
