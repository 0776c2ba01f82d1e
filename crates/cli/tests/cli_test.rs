use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn astreinte(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_astreinte"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("failed to run astreinte")
}

fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("astreinte.toml");
    fs::write(
        &config,
        "[storage]\ndb_path = \"data/plannings.db\"\n\n[roster]\npath = \"users.yaml\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("users.yaml"), "a1: alice\nb2: Bob\n").unwrap();
    (dir, config)
}

fn write_week(dir: &Path, name: &str, slot_label: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(
        &path,
        format!(r#"[{{"Date": "2024-03-04", "Utilisateur": "", "07h-09h": "{slot_label}"}}]"#),
    )
    .unwrap();
    path
}

#[test]
fn saved_weeks_feed_the_final_schedule() {
    let (dir, config) = setup();
    let alice_week = write_week(dir.path(), "alice.json", "N1");
    let bob_week = write_week(dir.path(), "bob.json", "N1");

    for (code, file) in [("a1", &alice_week), ("b2", &bob_week)] {
        let out = astreinte(&config, &["week", "save", "--code", code, "--file", file.to_str().unwrap()]);
        assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    }

    let out = astreinte(&config, &["schedule", "--month", "2024-03", "--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let schedule: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let days = schedule["days"].as_array().unwrap();
    assert_eq!(days.len(), 31);
    assert_eq!(days[3]["date"], "2024-03-04");
    assert_eq!(days[3]["cells"][0]["dual"]["n1"], "Alice");

    let out = astreinte(&config, &["conflicts", "--month", "2024-03", "--json"]);
    let conflicts: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(conflicts[0]["people"], serde_json::json!(["Alice", "Bob"]));
    assert_eq!(conflicts[0]["tier"], "N1");
}

#[test]
fn unknown_code_cannot_save() {
    let (dir, config) = setup();
    let week = write_week(dir.path(), "week.json", "N2");
    let out = astreinte(&config, &["week", "save", "--code", "zz", "--file", week.to_str().unwrap()]);
    assert!(!out.status.success());

    let out = astreinte(&config, &["hours", "--json"]);
    assert!(out.status.success());
    let hours: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(hours, serde_json::json!([]));
}

#[test]
fn standard_template_prefills_an_unplanned_week() {
    let (dir, config) = setup();
    let template = dir.path().join("template.json");
    fs::write(&template, r#"{"19h-00h": "Backup1"}"#).unwrap();
    let out = astreinte(&config, &["standard", "save", "--code", "b2", "--file", template.to_str().unwrap()]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let out = astreinte(&config, &["week", "show", "--person", "bob", "--week", "2024-03-06", "--json"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let rows: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    assert!(rows.iter().all(|row| row["19h-00h"] == "Backup1" && row["Utilisateur"] == "Bob"));
}
