//! Integration tests for the get-dependencies binary


use assert_cmd::cargo::cargo_bin_cmd;
use harness::TestProject;
use predicates::prelude::*;

fn get_dependencies(project: &TestProject) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("get-dependencies");
    cmd.env_remove("RUST_LOG").args(["--dir", &project.dir_arg()]);
    cmd
}

#[test]
fn test_lists_declared_dependencies() {
    let project = TestProject::sample();

    get_dependencies(&project)
        .assert()
        .success()
        .stdout("mkdirp\nglob\n");

    get_dependencies(&project)
        .arg("--dev")
        .assert()
        .success()
        .stdout("mkdirp\nglob\ntape\n");
}

#[test]
fn test_match_any() {
    let project = TestProject::sample();

    get_dependencies(&project)
        .args(["--match", "glob", "left-pad"])
        .assert()
        .success()
        .stdout("glob\n");

    get_dependencies(&project)
        .args(["-f", "left-pad"])
        .assert()
        .code(1)
        .stdout("");
}

#[test]
fn test_match_all() {
    let project = TestProject::sample();

    get_dependencies(&project)
        .args(["--match-all", "glob", "mkdirp"])
        .assert()
        .success()
        .stdout("mkdirp\nglob\n");

    get_dependencies(&project)
        .args(["-a", "glob", "tape"])
        .assert()
        .code(1);

    get_dependencies(&project)
        .args(["-a", "--dev", "glob", "tape"])
        .assert()
        .success();
}

#[test]
fn test_silent() {
    let project = TestProject::sample();

    get_dependencies(&project)
        .args(["-s", "--match", "glob"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_missing_manifest() {
    let project = TestProject::empty();

    get_dependencies(&project)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No package.json at"));
}
