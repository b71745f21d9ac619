use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MODEL: &str = r#"
[[group]]
name = "base"
resources = ["css/reset.css"]

[[group]]
name = "main"
group_refs = ["base"]
resources = ["css/main.css", "js/app.js"]
"#;

fn write_site(dir: &Path) {
    fs::create_dir_all(dir.join("css")).expect("css dir");
    fs::create_dir_all(dir.join("js")).expect("js dir");
    fs::write(dir.join("css/reset.css"), "* { margin: 0 }").expect("write reset");
    fs::write(
        dir.join("css/main.css"),
        "@import url(\"theme.css\");\nbody { }",
    )
    .expect("write main");
    fs::write(dir.join("css/theme.css"), "a { color: red }").expect("write theme");
    fs::write(dir.join("js/app.js"), "var app;").expect("write app");
    fs::write(dir.join("wro.toml"), MODEL).expect("write model");
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("nested/asset-watch.toml");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("model_path"));
    assert!(content.contains("poll_interval_secs"));
}

#[test]
fn config_init_refuses_to_overwrite() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("asset-watch.toml");
    fs::write(&config_path, "# mine").expect("write config");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_init_with_model_writes_usable_starter_model() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("site/asset-watch.toml");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["config", "init", "--with-model", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let model_path = dir.path().join("site/wro.toml");
    let model = fs::read_to_string(&model_path).expect("read model");
    assert!(model.contains("[[group]]"));

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.current_dir(dir.path())
        .args(["groups", "list", "--model"])
        .arg(&model_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Groups (2 found)"));
}

#[test]
fn config_init_keeps_existing_model() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("asset-watch.toml");
    let model_path = dir.path().join("wro.toml");
    fs::write(&model_path, "# my groups").expect("write model");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["config", "init", "--with-model", "--path"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Kept existing"));

    assert_eq!(fs::read_to_string(&model_path).expect("read model"), "# my groups");
    assert!(config_path.exists());
}

#[test]
fn config_show_prints_effective_settings() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("asset-watch.toml");
    fs::write(&config_path, "[watch]\nmax_concurrent = 7\n").expect("write config");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    let output = cmd
        .env("ASSET_WATCH__LOCATOR__HTTP_TIMEOUT_SECS", "5")
        .arg("--config")
        .arg(&config_path)
        .args(["config", "show"])
        .output()
        .expect("run config show");

    assert!(output.status.success());
    let shown: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(shown["watch"]["max_concurrent"], 7);
    assert_eq!(shown["watch"]["poll_interval_secs"], 10);
    assert_eq!(shown["locator"]["http_timeout_secs"], 5);
}

#[test]
fn groups_list_outputs_expanded_groups_as_json() {
    let dir = TempDir::new().expect("temp dir");
    write_site(dir.path());

    let mut cmd = cargo_bin_cmd!("asset-watch");
    let output = cmd
        .current_dir(dir.path())
        .args(["groups", "list", "--json", "--model"])
        .arg(dir.path().join("wro.toml"))
        .output()
        .expect("run groups list");

    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["count"], 2);

    let main = &value["groups"][1];
    assert_eq!(main["name"], "main");
    assert_eq!(main["resources"][0]["uri"], "css/reset.css");
    assert_eq!(main["resources"][2]["type"], "js");
    assert_eq!(main["cache_keys"].as_array().map(Vec::len), Some(4));
}

#[test]
fn groups_validate_fails_on_circular_reference() {
    let dir = TempDir::new().expect("temp dir");
    let model = dir.path().join("wro.toml");
    fs::write(
        &model,
        "[[group]]\nname = \"a\"\ngroup_refs = [\"b\"]\n\n[[group]]\nname = \"b\"\ngroup_refs = [\"a\"]\n",
    )
    .expect("write model");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.current_dir(dir.path())
        .args(["groups", "validate", "--model"])
        .arg(&model)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn groups_validate_reports_unreachable_resources() {
    let dir = TempDir::new().expect("temp dir");
    write_site(dir.path());
    fs::remove_file(dir.path().join("js/app.js")).expect("remove app");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.current_dir(dir.path())
        .args(["groups", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("js/app.js"))
        .stdout(predicate::str::contains("1 unreachable"));
}

#[test]
fn process_strips_multiline_comments() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("main.css");
    fs::write(&file, "a { }\n/* gone\n   entirely */\nb { }\n").expect("write css");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["process", "--processor", "multilineStripper", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("a { }\nb { }"))
        .stdout(predicate::str::contains("gone").not());
}

#[test]
fn process_malformed_import_respects_ignore_failures() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("main.css");
    fs::write(&file, "@import url(\"\");\nbody { }\n").expect("write css");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["process", "--processor", "cssImport", "--file"])
        .arg(&file)
        .assert()
        .failure();

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["process", "--processor", "cssImport", "--ignore-failures", "--file"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("@import url(\"\");"));
}

#[test]
fn process_rejects_unknown_processor() {
    let dir = TempDir::new().expect("temp dir");
    let file = dir.path().join("main.css");
    fs::write(&file, "a { }").expect("write css");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.args(["process", "--processor", "cssMin", "--file"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("multilineStripper"));
}

#[test]
fn watch_once_records_baselines() {
    let dir = TempDir::new().expect("temp dir");
    write_site(dir.path());
    let journal = dir.path().join("state/invalidations.jsonl");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.current_dir(dir.path())
        .env("ASSET_WATCH__WATCH__JOURNAL_PATH", &journal)
        .args(["watch", "--once", "--group", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("main: unchanged"))
        .stdout(predicate::str::contains("base:").not());

    let content = fs::read_to_string(&journal).expect("journal created");
    assert!(content.is_empty());
}

#[test]
fn watch_fails_without_model_file() {
    let dir = TempDir::new().expect("temp dir");

    let mut cmd = cargo_bin_cmd!("asset-watch");
    cmd.current_dir(dir.path())
        .args(["watch", "--once"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model"));
}
