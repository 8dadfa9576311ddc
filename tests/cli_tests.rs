//! CLI integration tests using the REAL bigip-explode binary

mod common;

use predicates::prelude::*;

use common::{APP_CONF, TarBuilder, TestWorkspace, bigip_cmd};

#[test]
fn test_help_output() {
    let workspace = TestWorkspace::new();
    bigip_cmd(&workspace)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("explode"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_summary_output() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);

    bigip_cmd(&workspace)
        .args(["explode", "--quiet"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("plain config"))
        .stdout(predicate::str::contains("15.1.8"))
        .stdout(predicate::str::contains("/Common/vs_app"))
        .stdout(predicate::str::contains("(5 objects)"));
}

#[test]
fn test_verbose_summary_lists_members() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);

    bigip_cmd(&workspace)
        .args(["explode", "-q", "-v"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("    /Common/mon_http"));
}

#[test]
fn test_archive_summary_lists_files() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_bytes(
        "backup.ucs",
        &TarBuilder::new()
            .file("config/bigip.conf", APP_CONF)
            .file("config/bigip_base.conf", "net vlan /Common/ext { }\n")
            .tar_gz(),
    );

    bigip_cmd(&workspace)
        .args(["explode", "-q"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("system archive"))
        .stdout(predicate::str::contains("config/bigip_base.conf, config/bigip.conf"));
}

#[test]
fn test_json_output() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_bytes(
        "backup.ucs",
        &TarBuilder::new().file("config/bigip.conf", APP_CONF).tar_gz(),
    );

    let output = bigip_cmd(&workspace)
        .args(["explode", "--json"])
        .arg(&bundle)
        .output()
        .expect("runs");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["bundle_kind"], "system_archive");
    assert_eq!(json["status"]["state"], "complete");
    assert_eq!(json["applications"][0]["entry_point"], "/Common/vs_app");
    assert_eq!(json["applications"][0]["members"].as_array().map(Vec::len), Some(5));
    assert_eq!(json["stats"]["files_processed"], 1);
}

#[test]
fn test_output_and_export_files() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);

    bigip_cmd(&workspace)
        .args(["explode", "-q", "-o"])
        .arg(workspace.path.join("result.json"))
        .arg("--export-objects")
        .arg(workspace.path.join("objects.json"))
        .arg(&bundle)
        .assert()
        .success();

    let result: serde_json::Value =
        serde_json::from_str(&workspace.read_file("result.json")).expect("valid result");
    assert_eq!(result["applications"][0]["entry_point"], "/Common/vs_app");

    bigip_cmd(&workspace)
        .args(["explode", "-q", "--json"])
        .arg(workspace.path.join("objects.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pre_parsed_bundle\""))
        .stdout(predicate::str::contains("/Common/vs_app"));
}

#[test]
fn test_config_file_from_env() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);
    let config = workspace.write_file("explode.yaml", "entry_points:\n  - ltm pool\n");

    bigip_cmd(&workspace)
        .env("BIGIP_EXPLODE_CONFIG", &config)
        .args(["explode", "-q", "--json"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entry_point\": \"/Common/p1\""))
        .stdout(predicate::str::contains("\"entry_point\": \"/Common/vs_app\"").not());
}

#[test]
fn test_global_config_dir() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);
    workspace.write_file("global/config.yaml", "entry_points: [ltm node]\n");

    bigip_cmd(&workspace)
        .env("BIGIP_EXPLODE_CONFIG_DIR", workspace.path.join("global"))
        .args(["explode", "-q", "--json"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"entry_point\": \"/Common/n1\""))
        .stdout(predicate::str::contains("\"entry_point\": \"/Common/n2\""));
}

#[test]
fn test_invalid_config_fails() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file("bigip.conf", APP_CONF);
    let config = workspace.write_file("bad.yaml", "entry_pionts: [ltm virtual]\n");

    bigip_cmd(&workspace)
        .args(["explode", "-q", "--config"])
        .arg(&config)
        .arg(&bundle)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to parse configuration file"));
}

#[test]
fn test_missing_bundle_fails() {
    let workspace = TestWorkspace::new();
    bigip_cmd(&workspace)
        .args(["explode", "-q"])
        .arg(workspace.path.join("nope.ucs"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error: Failed to read bundle"));
}

#[test]
fn test_parse_errors_do_not_fail_the_run() {
    let workspace = TestWorkspace::new();
    let bundle = workspace.write_file(
        "bigip.conf",
        &format!("}}\n{APP_CONF}ltm virtual /Common/cut {{\n    pool /Common/p1\n"),
    );

    bigip_cmd(&workspace)
        .args(["explode", "-q"])
        .arg(&bundle)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 parse errors"));
}

#[test]
fn test_completions() {
    let workspace = TestWorkspace::new();
    bigip_cmd(&workspace)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bigip-explode"));

    bigip_cmd(&workspace)
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown shell: tcsh"));
}
