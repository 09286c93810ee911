//! Query and mutation behaviour of `ProjectGraph` against a realistic
//! descriptor.

use std::collections::HashSet;

use pckinject_pbx::{
    Anchor, BuildFileMetadata, BuildFileSource, FileAttributes, ObjectId, PbxError, ProjectGraph,
    Record,
};
use rstest::rstest;

const EXPO_APP: &str = include_str!("fixtures/expo_app.pbxproj");

fn fixture() -> ProjectGraph {
    ProjectGraph::parse(EXPO_APP).expect("parse fixture")
}

fn id(s: &str) -> ObjectId {
    ObjectId::from(s)
}

/// Invariants 1 and 2, checked by walking the graph directly.
fn assert_links_resolve(graph: &ProjectGraph) {
    for (owner, bf) in graph.build_files() {
        if let BuildFileSource::FileRef(r) = &bf.source {
            assert!(
                matches!(graph.get(r), Some(Record::FileReference(_)) | Some(Record::Group(_))),
                "{owner}.fileRef -> {r} dangles"
            );
        }
    }
    for (owner, record) in graph.objects() {
        if let Record::BuildPhase(phase) = record {
            for f in &phase.files {
                assert!(
                    matches!(graph.get(f), Some(Record::BuildFile(_))),
                    "{owner}.files -> {f} dangles"
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[rstest]
#[case("Info.plist", true)]
#[case("Expo.plist", true)]
#[case("libPods-GodotApp.a", true)]
#[case("main.pck", false)]
#[case("GodotApp", false)]
fn has_file_matches_basenames(#[case] name: &str, #[case] expected: bool) {
    assert_eq!(fixture().has_file(name), expected);
}

#[test]
fn anchors_resolve_on_fixture() {
    let graph = fixture();
    assert_eq!(graph.find_main_group().unwrap(), id("83CBB9F61A601CBA00E9B192"));
    let target = graph.primary_target().unwrap();
    assert_eq!(target, id("13B07F861A680F5B00A75B9A"));
    assert_eq!(
        graph.resources_build_phase(&target).unwrap(),
        id("13B07F8E1A680F5B00A75B9A")
    );
    graph.check_integrity().unwrap();
}

#[test]
fn unknown_records_are_kept_opaque() {
    let graph = fixture();
    let Some(Record::Opaque(cfg)) = graph.get(&id("13B07F941A680F5B00A75B9A")) else {
        panic!("expected opaque build configuration");
    };
    assert_eq!(cfg.isa, "XCBuildConfiguration");
    assert_eq!(cfg.fields["name"].as_str(), Some("Debug"));
}

// ---------------------------------------------------------------------------
// Id generation
// ---------------------------------------------------------------------------

#[test]
fn ten_thousand_ids_are_unique_next_to_existing_ones() {
    let mut graph = fixture();
    let existing: HashSet<ObjectId> = graph.objects().map(|(id, _)| id.clone()).collect();

    let mut seen = HashSet::new();
    for _ in 0..10_000 {
        let fresh = graph.generate_unique_id();
        assert!(!existing.contains(&fresh), "collided with live id {fresh}");
        assert!(seen.insert(fresh.clone()), "duplicate id {fresh}");
    }
    assert_eq!(seen.len(), 10_000);
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

#[test]
fn fresh_injection_wires_three_distinct_records() {
    let mut graph = fixture();
    let before: HashSet<ObjectId> = graph.objects().map(|(id, _)| id.clone()).collect();

    let main = graph.find_main_group().unwrap();
    let file = graph
        .add_file_reference("main.pck", &main, FileAttributes::opaque_resource())
        .unwrap();
    assert_links_resolve(&graph);
    let build_file = graph
        .add_build_file(&file, BuildFileMetadata::default())
        .unwrap();
    assert_links_resolve(&graph);
    let target = graph.primary_target().unwrap();
    let phase = graph
        .add_to_resources_build_phase(&build_file, &target)
        .unwrap();
    assert_links_resolve(&graph);
    graph.check_integrity().unwrap();

    assert_ne!(file, build_file);
    assert!(!before.contains(&file));
    assert!(!before.contains(&build_file));
    assert_eq!(graph.len(), before.len() + 2);

    assert!(graph.has_file("main.pck"));
    assert_eq!(graph.file_references().filter(|(_, f)| f.basename() == "main.pck").count(), 1);
    assert_eq!(graph.group(&main).unwrap().children.last(), Some(&file));
    assert_eq!(graph.build_phase(&phase).unwrap().files.last(), Some(&build_file));
    let Some(Record::BuildFile(bf)) = graph.get(&build_file) else { panic!() };
    assert_eq!(bf.file_ref(), Some(&file));
}

#[test]
fn has_file_gate_makes_injection_idempotent() {
    let mut graph = fixture();
    let inject = |graph: &mut ProjectGraph| {
        if graph.has_file("main.pck") {
            return;
        }
        let main = graph.find_main_group().unwrap();
        let file = graph
            .add_file_reference("main.pck", &main, FileAttributes::opaque_resource())
            .unwrap();
        let bf = graph.add_build_file(&file, BuildFileMetadata::default()).unwrap();
        let target = graph.primary_target().unwrap();
        graph.add_to_resources_build_phase(&bf, &target).unwrap();
    };

    let before = graph.len();
    inject(&mut graph);
    let after_first = graph.clone();
    inject(&mut graph);

    assert_eq!(graph, after_first);
    assert_eq!(graph.len(), before + 2);
    let phase = graph
        .resources_build_phase(&graph.primary_target().unwrap())
        .unwrap();
    assert_eq!(graph.build_phase(&phase).unwrap().files.len(), 4);
}

// ---------------------------------------------------------------------------
// Missing structure
// ---------------------------------------------------------------------------

#[test]
fn missing_main_group_is_reported() {
    let text = EXPO_APP.replace("\t\t\tmainGroup = 83CBB9F61A601CBA00E9B192;\n", "");
    let graph = ProjectGraph::parse(&text).unwrap();
    let err = graph.find_main_group().unwrap_err();
    assert!(matches!(err, PbxError::MissingProjectStructure(Anchor::MainGroup)));
}

#[test]
fn main_group_pointing_at_non_group_is_reported() {
    let text = EXPO_APP.replace(
        "mainGroup = 83CBB9F61A601CBA00E9B192;",
        "mainGroup = 13B07FB61A68108700A75B9A;",
    );
    let graph = ProjectGraph::parse(&text).unwrap();
    assert!(matches!(
        graph.find_main_group(),
        Err(PbxError::MissingProjectStructure(Anchor::MainGroup))
    ));
}

#[test]
fn missing_project_object_is_reported() {
    let text = EXPO_APP.replace(
        "rootObject = 83CBB9F71A601CBA00E9B192",
        "rootObject = 000000000000000000000000",
    );
    let graph = ProjectGraph::parse(&text).unwrap();
    assert!(matches!(
        graph.find_main_group(),
        Err(PbxError::MissingProjectStructure(Anchor::ProjectObject))
    ));
    assert!(graph.check_integrity().is_err());
}

#[test]
fn missing_resources_phase_is_reported_and_graph_untouched() {
    let text = EXPO_APP.replace(
        "\t\t\t\t13B07F8E1A680F5B00A75B9A /* Resources */,\n",
        "",
    );
    let mut graph = ProjectGraph::parse(&text).unwrap();
    let main = graph.find_main_group().unwrap();
    let file = graph
        .add_file_reference("main.pck", &main, FileAttributes::opaque_resource())
        .unwrap();
    let bf = graph.add_build_file(&file, BuildFileMetadata::default()).unwrap();
    let target = graph.primary_target().unwrap();

    let err = graph.add_to_resources_build_phase(&bf, &target).unwrap_err();
    assert!(matches!(
        err,
        PbxError::MissingProjectStructure(Anchor::ResourcesBuildPhase { target: ref t }) if *t == target
    ));
    // The orphaned phase is still well formed: only the target lost its link.
    assert_links_resolve(&graph);
}

#[test]
fn project_without_targets_has_no_primary_target() {
    let text = EXPO_APP.replace(
        "\t\t\ttargets = (\n\t\t\t\t13B07F861A680F5B00A75B9A /* GodotApp */,\n\t\t\t);",
        "\t\t\ttargets = (\n\t\t\t);",
    );
    let graph = ProjectGraph::parse(&text).unwrap();
    assert!(matches!(
        graph.primary_target(),
        Err(PbxError::MissingProjectStructure(Anchor::Target))
    ));
}

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

#[rstest]
#[case("{ objects = {}; }", "missing rootObject")]
#[case("{ rootObject = A; }", "missing objects")]
#[case("{ objects = {}; rootObject = A; extra = 1; }", "unexpected top-level key 'extra'")]
#[case("{ objects = (); rootObject = A; }", "objects has the wrong type")]
#[case("{ objects = { A = B; }; rootObject = A; }", "object A must be a dictionary")]
#[case("( a, b )", "top level must be a dictionary")]
fn malformed_documents_are_rejected(#[case] text: &str, #[case] needle: &str) {
    let err = ProjectGraph::parse(text).unwrap_err();
    assert!(matches!(err, PbxError::Document(_)), "{err}");
    assert!(err.to_string().contains(needle), "{err}");
}

#[test]
fn malformed_known_record_is_rejected() {
    let text = EXPO_APP.replace(
        "isa = PBXBuildFile; fileRef = 13B07FB51A68108700A75B9A /* Images.xcassets */;",
        "isa = PBXBuildFile;",
    );
    let err = ProjectGraph::parse(&text).unwrap_err();
    match err {
        PbxError::Schema { id, isa, .. } => {
            assert_eq!(id, ObjectId::from("13B07FBF1A68108700A75B9A"));
            assert_eq!(isa, "PBXBuildFile");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn syntax_error_carries_position() {
    let text = EXPO_APP.replacen("archiveVersion = 1;", "archiveVersion = 1", 1);
    let err = ProjectGraph::parse(&text).unwrap_err();
    assert!(matches!(err, PbxError::Syntax { line: 4, .. }), "{err}");
}

// ---------------------------------------------------------------------------
// Build files pointing at non-file objects
// ---------------------------------------------------------------------------

const LINKED_OBJECT: &str = "C0DE0000000000000000DA7A";
const LINKED_BUILD_FILE: &str = "C0DE0000000000000000B11D";

const CORE_DATA_MODEL: &str = "\t\t\tisa = XCVersionGroup;\n\t\t\tchildren = (\n\t\t\t);\n\t\t\tpath = Model.xcdatamodeld;\n\t\t\tsourceTree = \"<group>\";\n\t\t\tversionGroupType = wrapper.xcdatamodel;\n";
const REFERENCE_PROXY: &str = "\t\t\tisa = PBXReferenceProxy;\n\t\t\tfileType = archive.ar;\n\t\t\tpath = libReact.a;\n\t\t\tremoteRef = C0DE0000000000000000FEED;\n\t\t\tsourceTree = BUILT_PRODUCTS_DIR;\n";

/// The fixture plus one object with `body` that a new build file in the
/// Sources phase links to.
fn with_linked_object(body: &str) -> String {
    EXPO_APP
        .replace(
            "/* Begin PBXFileReference section */",
            &format!(
                "/* Begin Linked section */\n\t\t{LINKED_OBJECT} = {{\n{body}\t\t}};\n/* End Linked section */\n\n/* Begin PBXFileReference section */"
            ),
        )
        .replace(
            "/* End PBXBuildFile section */",
            &format!(
                "\t\t{LINKED_BUILD_FILE} = {{isa = PBXBuildFile; fileRef = {LINKED_OBJECT}; }};\n/* End PBXBuildFile section */"
            ),
        )
        .replacen(
            "\t\t\t\tF11748422D0307B40044C1D9 /* AppDelegate.swift in Sources */,\n",
            &format!(
                "\t\t\t\tF11748422D0307B40044C1D9 /* AppDelegate.swift in Sources */,\n\t\t\t\t{LINKED_BUILD_FILE},\n"
            ),
            1,
        )
}

#[rstest]
#[case::core_data_model(CORE_DATA_MODEL)]
#[case::reference_proxy(REFERENCE_PROXY)]
fn build_file_may_link_non_file_objects(#[case] body: &str) {
    let mut graph = ProjectGraph::parse(&with_linked_object(body)).unwrap();
    assert!(matches!(graph.get(&id(LINKED_OBJECT)), Some(Record::Opaque(_))));
    graph.check_integrity().unwrap();

    let main = graph.find_main_group().unwrap();
    let file = graph
        .add_file_reference("main.pck", &main, FileAttributes::opaque_resource())
        .unwrap();
    let bf = graph.add_build_file(&file, BuildFileMetadata::default()).unwrap();
    let target = graph.primary_target().unwrap();
    let phase = graph.add_to_resources_build_phase(&bf, &target).unwrap();

    graph.check_links(&[&file, &bf, &phase]).unwrap();
    graph.check_integrity().unwrap();
}

#[test]
fn build_file_linking_an_unrelated_opaque_object_is_a_violation() {
    let body = "\t\t\tisa = XCConfigurationList;\n\t\t\tbuildConfigurations = (\n\t\t\t);\n";
    let graph = ProjectGraph::parse(&with_linked_object(body)).unwrap();
    match graph.check_integrity() {
        Err(PbxError::Integrity(violations)) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].owner, id(LINKED_BUILD_FILE));
        }
        other => panic!("expected an integrity failure, got {other:?}"),
    }
}

#[test]
fn check_links_ignores_unrelated_damage() {
    let text = EXPO_APP.replace(
        "\t\t\t\tF11748422D0307B40044C1D9 /* AppDelegate.swift in Sources */,\n",
        "\t\t\t\tF11748422D0307B40044C1D9 /* AppDelegate.swift in Sources */,\n\t\t\t\tC0DE00000000000000000BAD,\n",
    );
    let mut graph = ProjectGraph::parse(&text).unwrap();
    assert!(graph.check_integrity().is_err());

    let main = graph.find_main_group().unwrap();
    let file = graph
        .add_file_reference("main.pck", &main, FileAttributes::opaque_resource())
        .unwrap();
    let bf = graph.add_build_file(&file, BuildFileMetadata::default()).unwrap();
    let target = graph.primary_target().unwrap();
    let phase = graph.add_to_resources_build_phase(&bf, &target).unwrap();

    graph.check_links(&[&file, &bf, &phase]).unwrap();
    assert!(graph.check_links(&[&id("C0DE0000000000000000FFFF")]).is_err());
}
