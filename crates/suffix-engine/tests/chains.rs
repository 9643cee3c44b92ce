use std::path::Path;
use std::sync::Arc;
use suffix_engine::{
    BuildGraph, DiskLookup, LocalVar, Plan, Severity, SuffixError, SuffixSession,
};
use tempfile::TempDir;

fn touch(root: &Path, name: &str) {
    std::fs::write(root.join(name), "").expect("file write should succeed");
}

fn load(temp: &TempDir, plan: &str) -> (SuffixSession, BuildGraph) {
    let plan = Plan::from_json(plan).expect("plan should parse");
    let mut session = SuffixSession::new(plan.config.clone())
        .with_lookup(Arc::new(DiskLookup::new(temp.path())));
    let mut graph = BuildGraph::new();
    plan.apply(&mut session, &mut graph)
        .expect("plan should apply");
    (session, graph)
}

const YACC_CHAIN: &str = r#"{
    "directives": [
        {"directive": "suffixes", "names": [".o", ".c", ".y", ".l"]},
        {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
        {"directive": "transform", "name": ".y.c", "commands": ["yacc $<"]},
        {"directive": "transform", "name": ".l.o", "commands": ["lex-cc $<"]}
    ]
}"#;

#[test]
fn find_deps_two_step_chain_expected_intermediate_bound_and_resolved() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "parse.y");
    let (mut session, mut graph) = load(&temp, YACC_CHAIN);
    let object = graph.get_or_create("parse.o");

    session
        .find_deps(&mut graph, object)
        .expect("resolution should succeed");

    let generated = graph.find("parse.c").expect("intermediate should be created");
    let grammar = graph.find("parse.y").expect("source should be created");
    assert_eq!(graph.implicit_source(object), Some(generated));
    assert_eq!(graph.implicit_source(generated), Some(grammar));
    assert_eq!(graph[object].commands, vec!["cc -c $<".to_string()]);
    assert_eq!(graph[generated].commands, vec!["yacc $<".to_string()]);

    assert!(graph[generated].is_resolved());
    assert_eq!(graph[generated].vars.local(LocalVar::Prefix), Some("parse"));
    assert_eq!(graph[generated].vars.local(LocalVar::Target), Some("parse.c"));
    assert!(!graph[grammar].is_resolved());

    // Already resolved as part of the chain.
    let before = graph.clone();
    session
        .find_deps(&mut graph, generated)
        .expect("resolution should succeed");
    assert_eq!(graph, before);
}

#[test]
fn find_deps_shorter_chain_available_expected_one_step() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "scan.y");
    touch(temp.path(), "scan.l");
    let (mut session, mut graph) = load(&temp, YACC_CHAIN);
    let object = graph.get_or_create("scan.o");

    session
        .find_deps(&mut graph, object)
        .expect("resolution should succeed");

    let lexer = graph.find("scan.l").expect("one-step source should be bound");
    assert_eq!(graph.implicit_source(object), Some(lexer));
    assert_eq!(graph[object].commands, vec!["lex-cc $<".to_string()]);
    assert_eq!(graph.find("scan.c"), None);
}

#[test]
fn find_deps_explicit_source_expected_to_beat_searched_source() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "main.s");
    touch(temp.path(), "main.c");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".o", ".s", ".c"]},
                {"directive": "transform", "name": ".s.o", "commands": ["as $<"]},
                {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
                {"directive": "target", "name": "main.o", "sources": ["main.c"]}
            ]
        }"#,
    );
    let object = graph.find("main.o").expect("target should exist");

    session
        .find_deps(&mut graph, object)
        .expect("resolution should succeed");

    let source = graph.find("main.c").expect("explicit source should exist");
    assert_eq!(graph.implicit_source(object), Some(source));
    assert_eq!(graph[object].children, vec![source]);
    assert_eq!(graph[object].commands, vec!["cc -c $<".to_string()]);
    assert_eq!(graph.find("main.s"), None);
}

#[test]
fn find_deps_single_suffix_rule_expected_bare_target_built_from_source() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "install.sh");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".sh"]},
                {"directive": "transform", "name": ".sh", "commands": ["cp $< $@"]}
            ]
        }"#,
    );
    let script = graph.get_or_create("install");

    session
        .find_deps(&mut graph, script)
        .expect("resolution should succeed");

    let source = graph.find("install.sh").expect("source should be bound");
    assert_eq!(graph.implicit_source(script), Some(source));
    assert_eq!(graph[script].commands, vec!["cp $< $@".to_string()]);
    assert_eq!(graph[script].vars.local(LocalVar::Prefix), Some("install"));
}

#[test]
fn find_deps_target_with_commands_and_no_suffix_expected_no_search() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "install.sh");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".sh"]},
                {"directive": "transform", "name": ".sh", "commands": ["cp $< $@"]},
                {"directive": "target", "name": "install", "commands": ["./install.sh"]}
            ]
        }"#,
    );
    let script = graph.find("install").expect("target should exist");

    session
        .find_deps(&mut graph, script)
        .expect("resolution should succeed");

    assert!(graph[script].children.is_empty());
    assert_eq!(graph.find("install.sh"), None);
}

#[test]
fn find_deps_phony_target_expected_no_implicit_source() {
    let temp = TempDir::new().expect("temp dir should be created");
    touch(temp.path(), "all.c");
    touch(temp.path(), "all.o");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".c", ".o"]},
                {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
                {"directive": "target", "name": "all.o", "phony": true}
            ]
        }"#,
    );
    let phony = graph.find("all.o").expect("target should exist");

    session
        .find_deps(&mut graph, phony)
        .expect("resolution should succeed");

    assert!(graph[phony].is_resolved());
    assert!(graph[phony].children.is_empty());
    assert!(graph[phony].commands.is_empty());
    assert_eq!(graph[phony].path, None);
}

#[test]
fn find_deps_suffix_cycle_expected_fatal_diagnostic_and_error() {
    let temp = TempDir::new().expect("temp dir should be created");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".c", ".o"]},
                {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
                {"directive": "transform", "name": ".o.c", "commands": ["decompile $<"]}
            ]
        }"#,
    );
    let object = graph.get_or_create("main.o");

    let error = session
        .find_deps(&mut graph, object)
        .expect_err("cycle should be fatal");

    match error {
        SuffixError::SuffixCycle { target, chain } => {
            assert_eq!(target, "main.o");
            assert_eq!(chain, vec!["main.o", "main.c", "main.o"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(session.has_fatal());
    let fatal = session
        .diagnostics()
        .iter()
        .find(|d| d.code == "suffix_cycle")
        .expect("cycle should be reported");
    assert_eq!(fatal.severity, Severity::Fatal);
    assert!(graph[object].is_resolved());
}

#[test]
fn find_deps_cycle_reached_from_both_ends_expected_fatal_diagnostic_and_error() {
    let temp = TempDir::new().expect("temp dir should be created");
    let (mut session, mut graph) = load(
        &temp,
        r#"{
            "directives": [
                {"directive": "suffixes", "names": [".x", ".c", ".o"]},
                {"directive": "transform", "name": ".c.x", "commands": ["link $<"]},
                {"directive": "transform", "name": ".o.x", "commands": ["link $<"]},
                {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
                {"directive": "transform", "name": ".o.c", "commands": ["decompile $<"]}
            ]
        }"#,
    );
    let program = graph.get_or_create("main.x");

    let error = session
        .find_deps(&mut graph, program)
        .expect_err("cycle should be fatal");

    match error {
        SuffixError::SuffixCycle { target, chain } => {
            assert_eq!(target, "main.x");
            assert_eq!(chain, vec!["main.x", "main.c", "main.o"]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(session.has_fatal());
}
