//! Xcode-style descriptor writer.
//!
//! Output follows the layout Xcode itself writes so a rewrite produces a
//! small, reviewable diff:
//!
//! - objects are grouped into `/* Begin <isa> section */` blocks, sections in
//!   order of first appearance, objects in table order;
//! - `isa` comes first, the remaining keys are sorted;
//! - `PBXBuildFile` and `PBXFileReference` objects sit on one line;
//! - references to live objects carry a `/* name */` annotation.

use std::collections::HashMap;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::graph::ProjectGraph;
use crate::id::ObjectId;
use crate::record::{BuildFileSource, Record, BUILD_FILE_ISA, FILE_REFERENCE_ISA};
use crate::value::{quote, Fields, Value};

const HEADER: &str = "// !$*UTF8*$!";

/// Keys whose values are ids in another project; never annotated.
const UNANNOTATED_KEYS: &[&str] = &["remoteGlobalIDString"];

pub(crate) fn write_document(graph: &ProjectGraph) -> String {
    let comments = Comments::build(graph);
    let mut out = String::new();

    out.push_str(HEADER);
    out.push_str("\n{\n");
    let _ = writeln!(out, "\tarchiveVersion = {};", quote(&graph.archive_version));
    out.push_str("\tclasses = ");
    let classes = Value::Dict(graph.classes.clone());
    write_value(&mut out, &classes, 1, false, "classes", &comments);
    out.push_str(";\n");
    let _ = writeln!(out, "\tobjectVersion = {};", quote(&graph.object_version));
    out.push_str("\tobjects = {\n");

    let mut sections: IndexMap<&str, Vec<(&ObjectId, &Record)>> = IndexMap::new();
    for (id, record) in &graph.objects {
        sections.entry(record.isa()).or_default().push((id, record));
    }
    for (isa, objects) in &sections {
        let _ = write!(out, "\n/* Begin {isa} section */\n");
        let inline = *isa == BUILD_FILE_ISA || *isa == FILE_REFERENCE_ISA;
        for (id, record) in objects {
            write_object(&mut out, id, record, inline, &comments);
        }
        let _ = writeln!(out, "/* End {isa} section */");
    }

    out.push_str("\t};\n");
    let _ = write!(out, "\trootObject = {}", quote(graph.root_object.as_str()));
    comments.annotate(&mut out, graph.root_object.as_str());
    out.push_str(";\n}\n");
    out
}

fn write_object(out: &mut String, id: &ObjectId, record: &Record, inline: bool, comments: &Comments) {
    out.push_str("\t\t");
    out.push_str(&quote(id.as_str()));
    comments.annotate(out, id.as_str());
    out.push_str(" = ");

    let fields: Fields = record.to_fields();
    if inline {
        let _ = write!(out, "{{isa = {}; ", quote(record.isa()));
        for (key, value) in &fields {
            let _ = write!(out, "{} = ", quote(key));
            write_value(out, value, 2, true, key, comments);
            out.push_str("; ");
        }
        out.push_str("};\n");
    } else {
        let _ = write!(out, "{{\n\t\t\tisa = {};\n", quote(record.isa()));
        for (key, value) in &fields {
            let _ = write!(out, "\t\t\t{} = ", quote(key));
            write_value(out, value, 3, false, key, comments);
            out.push_str(";\n");
        }
        out.push_str("\t\t};\n");
    }
}

fn write_value(
    out: &mut String,
    value: &Value,
    indent: usize,
    inline: bool,
    key: &str,
    comments: &Comments,
) {
    match value {
        Value::String(s) => {
            out.push_str(&quote(s));
            if !UNANNOTATED_KEYS.contains(&key) {
                comments.annotate(out, s);
            }
        }
        Value::Array(items) if inline => {
            out.push('(');
            for item in items {
                write_value(out, item, indent, true, key, comments);
                out.push_str(", ");
            }
            out.push(')');
        }
        Value::Array(items) => {
            out.push_str("(\n");
            for item in items {
                tabs(out, indent + 1);
                write_value(out, item, indent + 1, false, key, comments);
                out.push_str(",\n");
            }
            tabs(out, indent);
            out.push(')');
        }
        Value::Dict(dict) if inline => {
            out.push('{');
            for (k, v) in dict {
                let _ = write!(out, "{} = ", quote(k));
                write_value(out, v, indent, true, k, comments);
                out.push_str("; ");
            }
            out.push('}');
        }
        Value::Dict(dict) => {
            out.push_str("{\n");
            for (k, v) in dict {
                tabs(out, indent + 1);
                let _ = write!(out, "{} = ", quote(k));
                write_value(out, v, indent + 1, false, k, comments);
                out.push_str(";\n");
            }
            tabs(out, indent);
            out.push('}');
        }
    }
}

fn tabs(out: &mut String, n: usize) {
    for _ in 0..n {
        out.push('\t');
    }
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// `/* … */` text for every object that has a readable name.
struct Comments(HashMap<ObjectId, String>);

impl Comments {
    fn build(graph: &ProjectGraph) -> Self {
        let mut phase_of: HashMap<&ObjectId, &str> = HashMap::new();
        for record in graph.objects.values() {
            if let Record::BuildPhase(phase) = record {
                for file in &phase.files {
                    phase_of.insert(file, phase.display_name());
                }
            }
        }

        let name_of = |id: &ObjectId| -> Option<String> {
            match graph.objects.get(id)? {
                Record::FileReference(f) => Some(f.basename().to_string()),
                Record::Group(g) => g.name.clone().or_else(|| g.path.clone()),
                Record::Target(t) => Some(t.name.clone()),
                Record::Opaque(o) => o
                    .fields
                    .get("productName")
                    .or_else(|| o.fields.get("name"))
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            }
        };

        let mut map = HashMap::new();
        for (id, record) in &graph.objects {
            let comment = match record {
                Record::BuildFile(b) => {
                    let target = match &b.source {
                        BuildFileSource::FileRef(r) | BuildFileSource::ProductRef(r) => r,
                    };
                    name_of(target).map(|name| match phase_of.get(id) {
                        Some(phase) => format!("{name} in {phase}"),
                        None => name,
                    })
                }
                Record::BuildPhase(p) => Some(p.display_name().to_string()),
                Record::Project(_) => Some("Project object".to_string()),
                _ => name_of(id),
            };
            if let Some(comment) = comment {
                // `*/` inside a name would end the annotation early.
                map.insert(id.clone(), comment.replace("*/", "*_/"));
            }
        }
        Self(map)
    }

    fn annotate(&self, out: &mut String, token: &str) {
        if let Some(comment) = self.0.get(&ObjectId::from(token)) {
            let _ = write!(out, " /* {comment} */");
        }
    }
}
