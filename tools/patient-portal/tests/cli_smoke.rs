use assert_cmd::cargo::cargo_bin_cmd;

#[test]
fn help_lists_portal_flags() {
    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--help");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");

    assert!(stdout.contains("--data-dir"));
    assert!(stdout.contains("--seed-demo"));
    assert!(stdout.contains("--random-patients"));
}

#[test]
fn seed_demo_writes_both_stores_and_exits_zero() {
    let temp = tempfile::tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--seed-demo")
        .arg("--random-patients")
        .arg("4")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(temp.path().join("run.jsonl"));
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("Demo data generation complete!"));
    assert!(stdout.contains("default patient's NHI is now 200001"));

    let users: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(data_dir.join("users.json")).expect("users"))
            .expect("users json");
    let patients: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(data_dir.join("patients.json")).expect("patients"),
    )
    .expect("patients json");
    assert_eq!(users.as_array().map(Vec::len), Some(7));
    assert_eq!(patients.as_array().map(Vec::len), Some(5));

    let log = std::fs::read_to_string(temp.path().join("run.jsonl")).expect("run log");
    assert!(log.contains("demo.generated"));
}

#[test]
fn closed_stdin_bootstraps_empty_stores_and_exits_zero() {
    let temp = tempfile::tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(temp.path().join("run.jsonl"))
        .write_stdin("");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("Welcome! Please log in or create an account."));

    assert_eq!(
        std::fs::read_to_string(data_dir.join("users.json")).expect("users"),
        "[]"
    );
    assert_eq!(
        std::fs::read_to_string(data_dir.join("patients.json")).expect("patients"),
        "[]"
    );
}

#[test]
fn scripted_login_reaches_patient_menu() {
    let temp = tempfile::tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let mut seed = cargo_bin_cmd!("patient-portal");
    seed.arg("--seed-demo")
        .arg("--random-patients")
        .arg("0")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(temp.path().join("run.jsonl"));
    seed.assert().success();

    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(temp.path().join("run.jsonl"))
        .write_stdin("1\npatient@email.com\npatient123\n\n1\n\n");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("[Login successful! Welcome, Daniel LaRusso!]"));
    assert!(stdout.contains("Hello, Daniel LaRusso!"));
    assert!(stdout.contains("Medical Record: Daniel LaRusso"));

    let log = std::fs::read_to_string(temp.path().join("run.jsonl")).expect("run log");
    assert!(log.contains("session.login"));
    assert!(!log.contains("patient123"));
}

#[test]
fn missing_config_file_exits_nonzero() {
    let temp = tempfile::tempdir().expect("tempdir");
    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--config")
        .arg(temp.path().join("missing.toml"))
        .write_stdin("");
    cmd.assert().failure();
}

#[test]
fn text_typed_at_a_menu_is_not_written_to_the_run_log() {
    let temp = tempfile::tempdir().expect("tempdir");
    let data_dir = temp.path().join("data");
    let log_path = temp.path().join("run.jsonl");
    let mut seed = cargo_bin_cmd!("patient-portal");
    seed.arg("--seed-demo")
        .arg("--random-patients")
        .arg("0")
        .arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(&log_path);
    seed.assert().success();

    let mut cmd = cargo_bin_cmd!("patient-portal");
    cmd.arg("--data-dir")
        .arg(&data_dir)
        .arg("--log-file")
        .arg(&log_path)
        .write_stdin("1\npatient@email.com\nwrongpass\n\nhunter2secret\n\n");
    let out = cmd.assert().success();
    let stdout = String::from_utf8(out.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains("[Invalid Selection!]"));

    let log = std::fs::read_to_string(&log_path).expect("run log");
    assert!(log.contains("flow.menu.invalid_selection"));
    assert!(log.contains("\"input_len\":13"));
    assert!(!log.contains("hunter2secret"));
    assert!(!log.contains("wrongpass"));
}
