//! Integration tests for the habitable binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const STEPS: &str = r#"
habitable.add_step("^a cart with (\\d+) items$", |count| {
    habitable.set_var("CART", count.to_string());
});
habitable.add_step("^the cart holds (\\d+) items$", |count| {
    let held = habitable.get_var("CART");
    if held != count.to_string() {
        return habitable.fail("cart holds " + held);
    }
});
"#;

const CART_FEATURE: &str = r#"
Feature: Cart
  Scenario: Filling the cart
    Given a cart with 3 items
    Then the cart holds 3 items
"#;

fn setup_project(script: &str, feature: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("_scripts")).unwrap();
    fs::create_dir_all(temp.path().join("features")).unwrap();
    fs::write(temp.path().join("_scripts").join("cart.rhai"), script).unwrap();
    fs::write(temp.path().join("features").join("cart.feature"), feature).unwrap();
    temp
}

fn habitable() -> Command {
    Command::new(cargo_bin("habitable"))
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    habitable()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--loglevel"))
        .stdout(predicate::str::contains("--extensions"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    habitable()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn cli_rejects_unknown_format() -> Result<(), Box<dyn std::error::Error>> {
    habitable().args(["-f", "yaml"]).assert().failure();
    Ok(())
}

#[test]
fn cli_passing_suite_prints_junit_by_default() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(STEPS, CART_FEATURE);

    habitable()
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("<testsuites"))
        .stdout(predicate::str::contains("Filling the cart"));

    assert!(temp.path().join(".habitable/scripts").is_dir());
    assert!(temp.path().join(".habitable/build/hashes.json").is_file());
    Ok(())
}

#[test]
fn cli_project_flag_and_pretty_format() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(STEPS, CART_FEATURE);

    habitable()
        .arg("--project")
        .arg(temp.path())
        .args(["-f", "pretty", "-n", "carts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 scenarios (1 passed, 0 failed)"));
    Ok(())
}

#[test]
fn cli_json_report_names_the_suite() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(STEPS, CART_FEATURE);

    let output = habitable()
        .current_dir(temp.path())
        .args(["-f", "json", "-n", "carts"])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["name"], "carts");
    assert_eq!(report["features"][0]["scenarios"][0]["steps"][1]["status"], "passed");
    Ok(())
}

#[test]
fn cli_failing_step_exits_with_one() -> Result<(), Box<dyn std::error::Error>> {
    let feature = r#"
Feature: Cart
  Scenario: Miscounted
    Given a cart with 3 items
    Then the cart holds 4 items
"#;
    let temp = setup_project(STEPS, feature);

    habitable()
        .current_dir(temp.path())
        .args(["-f", "pretty"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cart holds 3"));
    Ok(())
}

#[test]
fn cli_broken_script_exits_with_two() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project("habitable.add_step(", CART_FEATURE);

    habitable()
        .current_dir(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cart.rhai"));
    Ok(())
}

#[test]
fn cli_missing_plugin_exits_with_two() -> Result<(), Box<dyn std::error::Error>> {
    let script = r#"habitable.use_plugin("ghost", "0.1.0", "./no/such/ghost.so");"#;
    let temp = setup_project(script, CART_FEATURE);

    habitable()
        .current_dir(temp.path())
        .assert()
        .code(2)
        .stderr(predicate::str::contains("ghost"));
    Ok(())
}

#[test]
fn cli_clean_rebuilds_working_directory() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(STEPS, CART_FEATURE);
    let stale = temp.path().join(".habitable/plugins/stale.so");
    fs::create_dir_all(stale.parent().unwrap())?;
    fs::write(&stale, "old")?;

    habitable().current_dir(temp.path()).arg("-c").assert().success();

    assert!(!stale.exists());
    Ok(())
}

#[test]
fn cli_config_file_selects_tests_and_format() -> Result<(), Box<dyn std::error::Error>> {
    let temp = setup_project(STEPS, CART_FEATURE);
    fs::rename(temp.path().join("features"), temp.path().join("specs"))?;
    fs::write(
        temp.path().join("habitable.yml"),
        "name: from-config\nformat: json\ntests:\n  - specs\n",
    )?;

    habitable()
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"from-config\""))
        .stdout(predicate::str::contains("Filling the cart"));
    Ok(())
}
