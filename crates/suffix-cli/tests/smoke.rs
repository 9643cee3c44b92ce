use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const PLAN: &str = r#"{
    "directives": [
        {"directive": "suffixes", "names": [".o", ".c", ".y"]},
        {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
        {"directive": "transform", "name": ".y.c", "commands": ["yacc $<"]},
        {"directive": "path", "suffix": ".y", "dirs": ["grammar"]},
        {"directive": "target", "name": "parse.o"}
    ]
}"#;

const CYCLE_PLAN: &str = r#"{
    "directives": [
        {"directive": "suffixes", "names": [".c", ".o"]},
        {"directive": "transform", "name": ".c.o", "commands": ["cc -c $<"]},
        {"directive": "transform", "name": ".o.c", "commands": ["decompile $<"]}
    ]
}"#;

fn write_plan(root: &Path, source: &str) -> std::path::PathBuf {
    let path = root.join("plan.json");
    std::fs::write(&path, source).expect("plan file write should succeed");
    path
}

fn run_cli(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_suffix-cli"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("cli process should start")
}

#[test]
fn resolve_command_main_target_json_expected_bound_chain() {
    let temp = TempDir::new().expect("tempdir should create");
    std::fs::create_dir(temp.path().join("grammar")).expect("grammar dir should create");
    std::fs::write(temp.path().join("grammar").join("parse.y"), "")
        .expect("grammar file write should succeed");
    let plan = write_plan(temp.path(), PLAN);

    let output = run_cli(
        &[
            "resolve",
            "--plan",
            plan.to_str().expect("plan path should be utf8"),
            "--json",
        ],
        temp.path(),
    );

    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf8");
    let value: Value = serde_json::from_str(&stdout).expect("json output should parse");
    let report = &value[0];
    assert_eq!(report["name"], "parse.o");
    assert_eq!(report["suffix"], ".o");
    assert_eq!(report["prefix"], "parse");
    assert_eq!(report["implicit_source"], "parse.c");
    assert_eq!(report["commands"][0], "cc -c $<");
}

#[test]
fn resolve_command_text_output_expected_variables_listed() {
    let temp = TempDir::new().expect("tempdir should create");
    std::fs::write(temp.path().join("lexer.c"), "").expect("source write should succeed");
    let plan = write_plan(temp.path(), PLAN);

    let output = run_cli(
        &[
            "resolve",
            "--plan",
            plan.to_str().expect("plan path should be utf8"),
            "--target",
            "lexer.o",
            "--dir",
            temp.path().to_str().expect("temp path should be utf8"),
        ],
        temp.path(),
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf8");
    assert!(stdout.contains("target: lexer.o"));
    assert!(stdout.contains("PREFIX: lexer"));
    assert!(stdout.contains("implicit source: lexer.c"));
}

#[test]
fn resolve_command_suffix_cycle_expected_exit_code_two() {
    let temp = TempDir::new().expect("tempdir should create");
    let plan = write_plan(temp.path(), CYCLE_PLAN);

    let output = run_cli(
        &[
            "resolve",
            "--plan",
            plan.to_str().expect("plan path should be utf8"),
            "--target",
            "main.o",
        ],
        temp.path(),
    );

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf8");
    assert!(stderr.contains("fatal[suffix_cycle]"));
}

#[test]
fn resolve_command_missing_plan_expected_exit_code_one() {
    let temp = TempDir::new().expect("tempdir should create");

    let output = run_cli(&["resolve", "--plan", "missing.json"], temp.path());

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr should be utf8");
    assert!(stderr.contains("error: invalid plan"));
}

#[test]
fn dump_command_expected_suffixes_and_transformations() {
    let temp = TempDir::new().expect("tempdir should create");
    let plan = write_plan(temp.path(), PLAN);

    let output = run_cli(
        &[
            "dump",
            "--plan",
            plan.to_str().expect("plan path should be utf8"),
        ],
        temp.path(),
    );

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf8");
    assert!(stdout.starts_with("#*** Suffixes:\n"));
    assert!(stdout.contains("# \".c\" (num 2, ref 2)"));
    assert!(stdout.contains("#\tSearch Path: grammar \n"));
    assert!(stdout.contains("#*** Transformations:\n"));
    assert!(stdout.contains("\tyacc $<\n"));
}

#[test]
fn is_transform_command_expected_true_and_false() {
    let temp = TempDir::new().expect("tempdir should create");
    let plan = write_plan(temp.path(), PLAN);
    let plan = plan.to_str().expect("plan path should be utf8");

    let known = run_cli(&["is-transform", "--plan", plan, ".y.o"], temp.path());
    let unknown = run_cli(&["is-transform", "--plan", plan, ".y.h"], temp.path());

    assert_eq!(String::from_utf8_lossy(&known.stdout).trim(), "true");
    assert_eq!(String::from_utf8_lossy(&unknown.stdout).trim(), "false");
}
