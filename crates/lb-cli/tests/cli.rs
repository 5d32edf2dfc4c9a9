//! CLI command integration tests.
//! Each test uses a temp directory via LB_DATA_DIR for full isolation.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lb_cmd(data_dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("lb").unwrap();
    cmd.env("LB_DATA_DIR", data_dir.path());
    cmd
}

fn setup_office(dir: &TempDir) {
    lb_cmd(dir)
        .args(["place", "add", "37.0,-122.0", "--name", "Office", "--radius", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added Office"));
    lb_cmd(dir).args(["item", "add", "Keys"]).assert().success();
    lb_cmd(dir).args(["item", "add", "Umbrella"]).assert().success();
    lb_cmd(dir)
        .args(["item", "toggle", "Umbrella"])
        .assert()
        .success()
        .stdout(predicate::str::contains("optional"));
}

#[test]
fn fresh_profile_is_empty() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir)
        .args(["place", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no places)"));
    lb_cmd(&dir)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no items)"));
    lb_cmd(&dir)
        .args(["history", "count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn place_and_item_lists_persist() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);

    lb_cmd(&dir)
        .args(["place", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0: Office"))
        .stdout(predicate::str::contains("r=50m"));
    lb_cmd(&dir)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[x] Keys"))
        .stdout(predicate::str::contains("[ ] Umbrella"));
}

#[test]
fn place_defaults_and_removal() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir)
        .args(["place", "add", "-33.86,151.21"])
        .assert()
        .success()
        .stdout(predicate::str::contains("added Place"))
        .stdout(predicate::str::contains("r=60m"));

    lb_cmd(&dir)
        .args(["place", "remove", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed Place"));
    lb_cmd(&dir).args(["place", "remove", "0"]).assert().failure();
}

#[test]
fn clear_places_and_items() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);

    lb_cmd(&dir)
        .args(["place", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 places"));
    lb_cmd(&dir)
        .args(["item", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 2 items"));
    lb_cmd(&dir)
        .args(["place", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no places)"));
    lb_cmd(&dir)
        .args(["item", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(no items)"));
}

#[test]
fn item_commands_ignore_surrounding_whitespace() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);
    lb_cmd(&dir)
        .args(["item", "toggle", " Keys "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Keys is optional"));
    lb_cmd(&dir)
        .args(["item", "remove", "Umbrella  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed Umbrella"));
}

#[test]
fn history_heat_lists_event_locations() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);
    lb_cmd(&dir)
        .arg("track")
        .write_stdin("37.0,-122.0,1000000\n")
        .assert()
        .success();

    lb_cmd(&dir)
        .args(["history", "heat"])
        .assert()
        .success()
        .stdout(predicate::str::diff(
            "37.000000,-122.000000,1\n37.000000,-122.000000,1\n",
        ));
}

#[test]
fn invalid_radius_rejected() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir)
        .args(["place", "add", "37.0,-122.0", "--radius", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("radius"));
}

#[test]
fn duplicate_and_blank_items_rejected() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir).args(["item", "add", "Keys"]).assert().success();
    lb_cmd(&dir).args(["item", "add", "Keys"]).assert().failure();
    lb_cmd(&dir).args(["item", "add", "   "]).assert().failure();
}

#[test]
fn track_visit_prints_reminder() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);

    lb_cmd(&dir)
        .arg("track")
        .write_stdin("# arrive\n37.0,-122.0,1000000\n37.01,-122.0,1040000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("entered Office (2 items logged)"))
        .stdout(predicate::str::contains("left Office after 40s"))
        .stdout(predicate::str::contains("Reminder: Leaving Office"))
        .stdout(predicate::str::contains("Take with you:\n• Keys"))
        .stdout(predicate::str::contains("Umbrella").not());

    lb_cmd(&dir)
        .args(["history", "count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("2\n"));
}

#[test]
fn short_visit_is_silent() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);

    lb_cmd(&dir)
        .arg("track")
        .write_stdin("37.0,-122.0,1000000\n37.01,-122.0,1010000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("left Office after 10s"))
        .stdout(predicate::str::contains("Reminder").not());
}

#[test]
fn track_skips_bad_lines() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);

    lb_cmd(&dir)
        .arg("track")
        .write_stdin("garbage\n95.0,0.0,1\n37.0,-122.0,1000000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("entered Office"))
        .stdout(predicate::str::contains("stopped inside Office"));
}

#[test]
fn simulate_leave_uses_first_place() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir).arg("simulate-leave").assert().failure();

    setup_office(&dir);
    lb_cmd(&dir)
        .arg("simulate-leave")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reminder: Leaving Office"));
}

#[test]
fn recover_and_last_seen() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir)
        .args(["recover", "Keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No history found for this item."));
    lb_cmd(&dir)
        .arg("last-seen")
        .assert()
        .success()
        .stdout(predicate::str::contains("No data"));

    setup_office(&dir);
    lb_cmd(&dir)
        .arg("track")
        .write_stdin("37.0,-122.0\n")
        .assert()
        .success();

    lb_cmd(&dir)
        .args(["recover", "Keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Office (last seen 0 mins ago)"));
    lb_cmd(&dir)
        .arg("last-seen")
        .assert()
        .success()
        .stdout(predicate::str::contains("Keys: Office"));
}

#[test]
fn history_export_import_roundtrip() {
    let dir = TempDir::new().unwrap();
    setup_office(&dir);
    lb_cmd(&dir)
        .arg("track")
        .write_stdin("37.0,-122.0,1000000\n")
        .assert()
        .success();

    let file = dir.path().join("history.json");
    lb_cmd(&dir)
        .args(["history", "export"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("exported 2 events"));

    let other = TempDir::new().unwrap();
    lb_cmd(&other)
        .args(["history", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 2 events"));
    lb_cmd(&other)
        .args(["history", "clear"])
        .assert()
        .success();
    lb_cmd(&other)
        .args(["history", "count"])
        .assert()
        .success()
        .stdout(predicate::str::diff("0\n"));
}

#[test]
fn import_legacy_array() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("legacy.json");
    std::fs::write(
        &file,
        r#"[{"name":"Keys","place":"Gym","lat":37.1,"lng":-122.1,"timestamp":1700000000000}]"#,
    )
    .unwrap();

    lb_cmd(&dir)
        .args(["history", "import"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("imported 1 events"));
    lb_cmd(&dir)
        .args(["recover", "Keys"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. Gym"));
}

#[test]
fn config_update_changes_threshold() {
    let dir = TempDir::new().unwrap();
    lb_cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("min_session_secs:      30"));

    lb_cmd(&dir)
        .args(["config", "--min-session-secs", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("min_session_secs:      5"));

    setup_office(&dir);
    lb_cmd(&dir)
        .arg("track")
        .write_stdin("37.0,-122.0,1000000\n37.01,-122.0,1006000\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Reminder: Leaving Office"));

    lb_cmd(&dir)
        .args(["config", "--default-radius", "0"])
        .assert()
        .failure();
}
