use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const MANIFEST: &str = r#"
plugins = ["com.android.application", "kotlin-android", "dev.flutter.flutter-gradle-plugin"]

[settings]
applicationId = "com.example.app"
minSdk = 21
targetSdk = 33
compileSdk = 33

[signing]
debug = "debug"

[[dependencies]]
coordinate = "org.jetbrains.kotlin:kotlin-stdlib-jdk7"
version = "1.8.22"

[[dependencies]]
coordinate = "com.google.android.material:material"
version = "1.12.0"
configuration = "api"
"#;

const FLUTTER_CREATE_SCRIPT: &str = r#"
plugins {
    id("com.android.application")
    id("kotlin-android")
    id("dev.flutter.flutter-gradle-plugin")
}

android {
    namespace = "com.example.app"
    compileSdk = flutter.compileSdkVersion

    defaultConfig {
        applicationId = "com.example.app"
        minSdk = flutter.minSdkVersion
        targetSdk = flutter.targetSdkVersion
    }
}
"#;

fn app_script() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../crates/android/fixtures/app.build.gradle.kts")
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("droidplan.toml"), MANIFEST).unwrap();
    dir
}

fn droidplan(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("droidplan").unwrap();
    cmd.current_dir(dir.path()).arg("--no-color").env_remove("RUST_LOG");
    cmd
}

#[test]
fn validate_gradle_script_warns_about_debug_signing() {
    let dir = workspace();
    droidplan(&dir)
        .arg("--manifest")
        .arg(app_script())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("com.azmonrahnamayi.fazli is valid"))
        .stderr(predicate::str::contains(
            "Variant 'release' is signed with the debug identity",
        ));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let dir = workspace();
    droidplan(&dir)
        .arg("--manifest")
        .arg(app_script())
        .args(["validate", "--strict"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn plan_json_uses_default_manifest() {
    let dir = workspace();
    let output = droidplan(&dir)
        .args(["plan", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["applicationId"], "com.example.app");
    assert_eq!(plan["sdk"]["minimum"], 21);
    assert_eq!(plan["dependencies"][1]["configuration"], "api");
    assert_eq!(plan["signing"][1]["identityName"], "debug");
}

#[test]
fn plan_text_lists_dependencies_in_order() {
    let dir = workspace();
    droidplan(&dir)
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)kotlin-stdlib-jdk7:1\.8\.22.*material:1\.12\.0").unwrap());
}

#[test]
fn signing_reports_debug_fallback() {
    let dir = workspace();
    droidplan(&dir)
        .args(["signing", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release → debug (debug fallback)"));
}

#[test]
fn deps_filters_by_configuration() {
    let dir = workspace();
    droidplan(&dir)
        .args(["deps", "--configuration", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api com.google.android.material:material:1.12.0"))
        .stdout(predicate::str::contains("kotlin-stdlib").not());
}

#[test]
fn check_sdk_rejects_inverted_levels() {
    let dir = workspace();
    droidplan(&dir)
        .args(["check-sdk", "--min", "30", "--target", "21", "--compile", "33"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("E6003"));
}

#[test]
fn check_sdk_accepts_ordered_levels() {
    let dir = workspace();
    droidplan(&dir)
        .args(["check-sdk", "--min", "21", "--target", "33", "--compile", "34"])
        .assert()
        .success();
}

#[test]
fn import_writes_manifest_that_loads_back() {
    let dir = workspace();
    let output = dir.path().join("imported.toml");

    droidplan(&dir)
        .arg("import")
        .arg(app_script())
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("applicationId = \"com.azmonrahnamayi.fazli\""));

    droidplan(&dir)
        .arg("--manifest")
        .arg(&output)
        .args(["signing", "release"])
        .assert()
        .success()
        .stdout(predicate::str::contains("release → debug"))
        .stdout(predicate::str::contains("fallback").not());
}

#[test]
fn missing_manifest_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("droidplan").unwrap();
    cmd.current_dir(dir.path())
        .args(["--no-color", "validate"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

#[test]
fn explicit_missing_config_is_config_error() {
    let dir = workspace();
    droidplan(&dir)
        .args(["--config", "nope.toml", "validate"])
        .assert()
        .code(3);
}

#[test]
fn validate_prints_each_warning_once() {
    let dir = workspace();
    let output = droidplan(&dir)
        .arg("--manifest")
        .arg(app_script())
        .arg("validate")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert_eq!(stderr.matches("is signed with the debug identity").count(), 1);
}

#[test]
fn no_color_output_has_no_escape_codes() {
    let dir = workspace();
    droidplan(&dir)
        .arg("-v")
        .arg("--manifest")
        .arg(app_script())
        .arg("validate")
        .assert()
        .success()
        .stderr(predicate::str::contains("Build plan composed"))
        .stderr(predicate::str::contains("\x1b[").not())
        .stdout(predicate::str::contains("\x1b[").not());
}

#[test]
fn framework_sdk_levels_fail_with_pin_hint() {
    let dir = workspace();
    let script = dir.path().join("build.gradle.kts");
    std::fs::write(&script, FLUTTER_CREATE_SCRIPT).unwrap();

    droidplan(&dir)
        .arg("--manifest")
        .arg(&script)
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("deferred to the framework"))
        .stderr(predicate::str::contains("pin them to integers"));
}

#[test]
fn plan_toml_is_valid_toml() {
    let dir = workspace();
    let output = droidplan(&dir)
        .args(["plan", "--format", "toml"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: toml::Table = toml::from_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(plan["applicationId"].as_str(), Some("com.example.app"));
    assert_eq!(plan["sdk"]["compileAgainst"].as_integer(), Some(33));
    assert_eq!(plan["dependencies"].as_array().unwrap().len(), 2);
}

#[test]
fn plan_json_failure_is_json_report() {
    let dir = workspace();
    std::fs::write(
        dir.path().join("droidplan.toml"),
        "[settings]\nminSdk = 21\ntargetSdk = 33\ncompileSdk = 33\n",
    )
    .unwrap();

    let output = droidplan(&dir)
        .args(["plan", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["code_str"], "E8007");
    assert!(report["message"].as_str().unwrap().contains("applicationId"));
}

#[test]
fn tool_config_strict_fails_on_warnings() {
    let dir = workspace();
    std::fs::write(dir.path().join(".droidplan.toml"), "[tool]\nstrict = true\n").unwrap();

    droidplan(&dir)
        .arg("validate")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("strict mode"));
}

#[test]
fn tool_config_variants_are_signed() {
    let dir = workspace();
    std::fs::write(
        dir.path().join(".droidplan.toml"),
        "[tool]\nvariants = [\"debug\", \"release\", \"profile\"]\n",
    )
    .unwrap();

    let output = droidplan(&dir)
        .args(["plan", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let signing = plan["signing"].as_array().unwrap();
    assert_eq!(signing.len(), 3);
    assert_eq!(signing[2]["variantName"], "profile");
    assert_eq!(signing[2]["identityName"], "debug");
}

#[test]
fn import_without_output_prints_manifest() {
    let dir = workspace();
    let output = droidplan(&dir)
        .arg("import")
        .arg(app_script())
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifest: toml::Table = toml::from_str(&String::from_utf8(output.stdout).unwrap()).unwrap();
    assert_eq!(
        manifest["settings"]["applicationId"].as_str(),
        Some("com.azmonrahnamayi.fazli")
    );
    assert_eq!(manifest["plugins"].as_array().unwrap().len(), 3);
}
