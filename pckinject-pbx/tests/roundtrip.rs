//! Round-trip fidelity of the descriptor writer.
//!
//! `parse(serialize(g))` must equal `g` for graphs loaded from a real
//! descriptor and for graphs built through the mutation API.

use pckinject_pbx::{
    BuildFileMetadata, FileAttributes, ObjectId, ProjectGraph, Record, Value,
};
use proptest::prelude::*;
use rstest::rstest;

const EXPO_APP: &str = include_str!("fixtures/expo_app.pbxproj");

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn register(graph: &mut ProjectGraph, basename: &str) -> (ObjectId, ObjectId) {
    let main = graph.find_main_group().expect("main group");
    let file = graph
        .add_file_reference(basename, &main, FileAttributes::opaque_resource())
        .expect("file ref");
    let build_file = graph
        .add_build_file(&file, BuildFileMetadata::default())
        .expect("build file");
    let target = graph.primary_target().expect("target");
    graph
        .add_to_resources_build_phase(&build_file, &target)
        .expect("phase");
    (file, build_file)
}

fn section_lines<'a>(text: &'a str, isa: &str) -> Vec<&'a str> {
    let begin = format!("/* Begin {isa} section */");
    let end = format!("/* End {isa} section */");
    text.lines()
        .skip_while(|l| *l != begin)
        .skip(1)
        .take_while(|l| *l != end)
        .collect()
}

// ---------------------------------------------------------------------------
// Loaded descriptors
// ---------------------------------------------------------------------------

#[test]
fn fixture_roundtrips_structurally() {
    let graph = ProjectGraph::parse(EXPO_APP).expect("parse fixture");
    let again = ProjectGraph::parse(&graph.serialize()).expect("reparse");
    assert_eq!(again, graph);
}

#[test]
fn serialization_is_a_fixed_point() {
    let graph = ProjectGraph::parse(EXPO_APP).unwrap();
    let first = graph.serialize();
    let second = ProjectGraph::parse(&first).unwrap().serialize();
    assert_eq!(first, second);
}

#[rstest]
#[case("PBXBuildFile")]
#[case("PBXFileReference")]
fn one_line_sections_are_reproduced_verbatim(#[case] isa: &str) {
    let graph = ProjectGraph::parse(EXPO_APP).unwrap();
    let out = graph.serialize();
    assert_eq!(section_lines(&out, isa), section_lines(EXPO_APP, isa));
}

#[test]
fn unrelated_sections_survive_an_injection() {
    let mut graph = ProjectGraph::parse(EXPO_APP).unwrap();
    register(&mut graph, "main.pck");
    let out = graph.serialize();

    for isa in [
        "XCBuildConfiguration",
        "XCConfigurationList",
        "PBXShellScriptBuildPhase",
        "PBXSourcesBuildPhase",
    ] {
        assert_eq!(
            section_lines(&out, isa),
            section_lines(&ProjectGraph::parse(EXPO_APP).unwrap().serialize(), isa),
            "{isa} section changed"
        );
    }

    let reloaded = ProjectGraph::parse(&out).unwrap();
    let script = reloaded
        .get(&ObjectId::from("08A4A3CD28434E44B6B9DE2E"))
        .expect("script phase");
    let Record::BuildPhase(phase) = script else { panic!("not a phase") };
    let body = phase.extra["shellScript"].as_str().unwrap();
    assert!(body.starts_with("diff \"${PODS_PODFILE_DIR_PATH}/Podfile.lock\""));
    assert!(body.ends_with("fi\n"));
}

#[test]
fn new_entries_are_appended_to_their_sections() {
    let mut graph = ProjectGraph::parse(EXPO_APP).unwrap();
    let (file, build_file) = register(&mut graph, "main.pck");
    let out = graph.serialize();

    let files = section_lines(&out, "PBXFileReference");
    assert!(files.last().unwrap().contains(file.as_str()));
    let build_files = section_lines(&out, "PBXBuildFile");
    assert!(build_files.last().unwrap().contains(build_file.as_str()));

    let resources = section_lines(&out, "PBXResourcesBuildPhase");
    let entry = resources
        .iter()
        .position(|l| l.contains(build_file.as_str()))
        .expect("phase entry");
    let storyboard = resources
        .iter()
        .position(|l| l.contains("SplashScreen.storyboard in Resources"))
        .unwrap();
    assert!(entry > storyboard, "new entry must follow existing ones");
}

// ---------------------------------------------------------------------------
// API-built graphs
// ---------------------------------------------------------------------------

#[test]
fn scaffold_roundtrips() {
    let mut graph = ProjectGraph::scaffold("Game");
    register(&mut graph, "main.pck");
    register(&mut graph, "extra.pck");
    let again = ProjectGraph::parse(&graph.serialize()).unwrap();
    assert_eq!(again, graph);
    again.check_integrity().unwrap();
}

#[test]
fn nested_values_roundtrip() {
    let mut graph = ProjectGraph::scaffold("My Game");
    let main = graph.find_main_group().unwrap();
    let file = graph
        .add_file_reference("weird name \"quoted\".pck", &main, FileAttributes::default())
        .unwrap();
    let mut settings = pckinject_pbx::Dict::new();
    settings.insert(
        "ATTRIBUTES".into(),
        Value::Array(vec![Value::from("CodeSignOnCopy"), Value::from("-Weak")]),
    );
    graph
        .add_build_file(&file, BuildFileMetadata { settings: Some(settings) })
        .unwrap();

    let again = ProjectGraph::parse(&graph.serialize()).unwrap();
    assert_eq!(again, graph);
    assert!(again.has_file("weird name \"quoted\".pck"));
}

proptest! {
    #[test]
    fn api_built_graphs_roundtrip(names in prop::collection::vec("[a-z][a-z0-9_-]{0,10}\\.(pck|bin)", 1..6)) {
        let mut graph = ProjectGraph::scaffold("Game");
        for name in &names {
            if !graph.has_file(name) {
                register(&mut graph, name);
            }
        }
        graph.check_integrity().unwrap();
        let again = ProjectGraph::parse(&graph.serialize()).unwrap();
        prop_assert_eq!(again, graph);
    }
}
