#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use tempfile::TempDir;

const API: &str = "/plugins/playbooks/api/v0/actions/channels";

const RULES: &str = "\
- channel_id: C1
  enabled: true
  action_type: send_welcome_message
  trigger_type: new_member_joins
  payload:
    message: Welcome aboard
- channel_id: C1
  enabled: true
  action_type: prompt_run_playbook
  trigger_type: keywords
  payload:
    keywords: [sev1, outage]
    playbook_id: P1
- channel_id: C2
  enabled: false
  action_type: send_welcome_message
  trigger_type: new_member_joins
  payload:
    message: Disabled greeting
";

const WELCOME_C1: &str = r#"[{"id":"a1","channel_id":"C1","enabled":true,
    "action_type":"send_welcome_message","trigger_type":"new_member_joins",
    "payload":{"message":"old greeting"}}]"#;

fn playbooks(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("playbooks").unwrap();
    cmd.current_dir(dir.path())
        .env("PLAYBOOKS_ROOT", dir.path())
        .env_remove("PLAYBOOKS_SERVER_URL")
        .env_remove("PLAYBOOKS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn init_project(dir: &TempDir) {
    playbooks(dir).arg("init").assert().success();
}

fn write_rules(dir: &TempDir) -> String {
    let path = dir.path().join("rules.yaml");
    std::fs::write(&path, RULES).unwrap();
    path.to_string_lossy().into_owned()
}

// ---------------------------------------------------------------------------
// playbooks init / config
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_and_viewed_db() {
    let dir = TempDir::new().unwrap();
    playbooks(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .playbooks/config.yaml"));

    assert!(dir.path().join(".playbooks").is_dir());
    assert!(dir.path().join(".playbooks/config.yaml").exists());
    assert!(dir.path().join(".playbooks/viewed.db").exists());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    playbooks(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .playbooks/config.yaml"));
}

#[test]
fn config_validate_default_is_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    playbooks(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_reports_bad_url() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".playbooks/config.yaml"),
        "server:\n  url: ftp://chat.example.com\n",
    )
    .unwrap();

    playbooks(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_validate_requires_init() {
    let dir = TempDir::new().unwrap();
    playbooks(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}

#[test]
fn config_show_applies_overrides_and_redacts_token() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    playbooks(&dir)
        .args([
            "config",
            "show",
            "--server",
            "https://chat.example.com",
            "--token",
            "s3cret",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://chat.example.com"))
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("s3cret").not());
}

// ---------------------------------------------------------------------------
// playbooks match / equal (offline)
// ---------------------------------------------------------------------------

#[test]
fn match_join_selects_enabled_welcome_messages() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["match", "--file", &rules, "--join"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome aboard"))
        .stdout(predicate::str::contains("Disabled greeting").not());
}

#[test]
fn match_text_is_case_insensitive_and_prompts() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["match", "--file", &rules, "--text", "we have an OUTAGE"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "prompt: run playbook P1 in C1 (matched: outage)",
        ));
}

#[test]
fn match_json_reports_file_indices() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    let output = playbooks(&dir)
        .args(["--json", "match", "--file", &rules, "--text", "sev1 now"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["event"]["kind"], "keywords_posted");
    assert_eq!(report["matched"].as_array().unwrap().len(), 1);
    assert_eq!(report["matched"][0]["index"], 1);
    assert_eq!(report["prompts"][0]["keywords"][0], "sev1");
}

#[test]
fn match_without_hits_says_so() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["match", "--file", &rules, "--text", "all quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No rules match."));
}

#[test]
fn match_requires_an_event() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["match", "--file", &rules])
        .assert()
        .failure();
}

#[test]
fn match_rejects_keyword_trigger_on_welcome_message() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(
        &path,
        "- channel_id: C1\n  action_type: send_welcome_message\n  trigger_type: keywords\n  payload:\n    message: hi\n",
    )
    .unwrap();
    playbooks(&dir)
        .args(["match", "--file", path.to_str().unwrap(), "--join"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid rules"));
}

#[test]
fn equal_compares_trigger_slots() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["equal", "--file", &rules, "0", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("same trigger slot"));
    playbooks(&dir)
        .args(["equal", "--file", &rules, "0", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("different"));
}

#[test]
fn equal_index_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    let rules = write_rules(&dir);
    playbooks(&dir)
        .args(["equal", "--file", &rules, "0", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

// ---------------------------------------------------------------------------
// playbooks actions (server)
// ---------------------------------------------------------------------------

#[test]
fn actions_list_fetches_both_triggers() {
    let dir = TempDir::new().unwrap();
    let mut server = mockito::Server::new();
    let joins = server
        .mock("GET", format!("{API}/C1").as_str())
        .match_query(Matcher::UrlEncoded(
            "trigger_type".into(),
            "new_member_joins".into(),
        ))
        .with_body(WELCOME_C1)
        .create();
    let keywords = server
        .mock("GET", format!("{API}/C1").as_str())
        .match_query(Matcher::UrlEncoded("trigger_type".into(), "keywords".into()))
        .with_body("[]")
        .create();

    playbooks(&dir)
        .args(["actions", "list", "C1", "--server", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("a1"))
        .stdout(predicate::str::contains("send_welcome_message"));

    joins.assert();
    keywords.assert();
}

#[test]
fn actions_list_rejects_unknown_trigger() {
    let dir = TempDir::new().unwrap();
    playbooks(&dir)
        .args(["actions", "list", "C1", "--trigger", "reactions"])
        .assert()
        .failure();
}

#[test]
fn actions_apply_updates_existing_and_creates_new() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("apply.yaml");
    std::fs::write(
        &path,
        "\
- channel_id: C1
  enabled: true
  action_type: send_welcome_message
  trigger_type: new_member_joins
  payload:
    message: Welcome aboard
- channel_id: C1
  enabled: true
  action_type: prompt_run_playbook
  trigger_type: keywords
  payload:
    keywords: [sev1]
    playbook_id: P1
",
    )
    .unwrap();

    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("{API}/C1").as_str())
        .match_query(Matcher::UrlEncoded(
            "trigger_type".into(),
            "new_member_joins".into(),
        ))
        .with_body(WELCOME_C1)
        .create();
    server
        .mock("GET", format!("{API}/C1").as_str())
        .match_query(Matcher::UrlEncoded("trigger_type".into(), "keywords".into()))
        .with_body("[]")
        .create();
    let update = server
        .mock("PUT", format!("{API}/C1/a1").as_str())
        .match_body(Matcher::PartialJson(serde_json::json!({
            "id": "a1",
            "payload": { "message": "Welcome aboard" }
        })))
        .with_status(200)
        .expect(1)
        .create();
    let create = server
        .mock("POST", format!("{API}/C1").as_str())
        .match_body(Matcher::PartialJson(serde_json::json!({
            "action_type": "prompt_run_playbook",
            "payload": { "keywords": ["sev1"], "playbook_id": "P1" }
        })))
        .with_status(201)
        .with_body(r#"{"id":"a2"}"#)
        .expect(1)
        .create();

    playbooks(&dir)
        .args([
            "actions",
            "apply",
            "C1",
            "--file",
            path.to_str().unwrap(),
            "--server",
            &server.url(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("updated"))
        .stdout(predicate::str::contains("created"))
        .stdout(predicate::str::contains("a2"));

    update.assert();
    create.assert();
}

// ---------------------------------------------------------------------------
// playbooks visit / watch / viewed
// ---------------------------------------------------------------------------

fn mock_welcome(server: &mut mockito::ServerGuard, channel: &str) -> (mockito::Mock, mockito::Mock) {
    let fetch = server
        .mock("GET", format!("{API}/{channel}").as_str())
        .match_query(Matcher::UrlEncoded(
            "trigger_type".into(),
            "new_member_joins".into(),
        ))
        .with_body(WELCOME_C1.replace("C1", channel))
        .expect(1)
        .create();
    let send = server
        .mock(
            "GET",
            format!("{API}/{channel}/check-and-send-message-on-join").as_str(),
        )
        .with_body(r#"{"viewed":true}"#)
        .expect(1)
        .create();
    (fetch, send)
}

#[test]
fn visit_sends_welcome_once_across_runs() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let mut server = mockito::Server::new();
    let (fetch, send) = mock_welcome(&mut server, "C1");

    playbooks(&dir)
        .args(["visit", "--team", "ops", "C1", "C1", "--server", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("sent"))
        .stdout(predicate::str::contains("same_channel"));

    playbooks(&dir)
        .args(["viewed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("C1"));

    // A new session finds the channel in the viewed database.
    playbooks(&dir)
        .args(["visit", "--team", "ops", "C1", "--server", &server.url()])
        .assert()
        .success()
        .stdout(predicate::str::contains("already_viewed"));

    fetch.assert();
    send.assert();
}

#[test]
fn visit_reports_server_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let mut server = mockito::Server::new();
    server
        .mock("GET", format!("{API}/C1").as_str())
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create();

    playbooks(&dir)
        .args(["visit", "C1", "--server", &server.url()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("returned 500"))
        .stderr(predicate::str::contains("1 navigation(s) failed"));
}

#[test]
fn watch_runs_until_stdin_closes() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let mut server = mockito::Server::new();
    let (fetch, send) = mock_welcome(&mut server, "C7");

    playbooks(&dir)
        .args(["watch", "--server", &server.url()])
        .write_stdin("# navigations\n/ops/channels/town C7\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("sent: 1"));

    fetch.assert();
    send.assert();
}

#[test]
fn watch_delivers_every_channel_in_a_burst() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let mut server = mockito::Server::new();
    let mocks: Vec<_> = ["C7", "C8", "C9"]
        .into_iter()
        .map(|ch| mock_welcome(&mut server, ch))
        .collect();

    playbooks(&dir)
        .args(["watch", "--server", &server.url()])
        .write_stdin(
            "/ops/channels/town C7\n/ops/channels/dev C8\n/ops/channels/qa C9\n/playbooks/runs\n",
        )
        .assert()
        .success()
        .stdout(predicate::str::contains("sent: 3"))
        .stdout(predicate::str::contains("channels evaluated: 3"));

    for (fetch, send) in &mocks {
        fetch.assert();
        send.assert();
    }
}

#[test]
fn visit_json_reports_parsed_route() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let mut server = mockito::Server::new();
    let (fetch, send) = mock_welcome(&mut server, "C2");

    let output = playbooks(&dir)
        .args(["--json", "visit", "--team", "ops", "C2", "--server", &server.url()])
        .output()
        .unwrap();
    assert!(output.status.success());

    let visits: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(visits[0]["route"]["team"], "ops");
    assert_eq!(visits[0]["route"]["kind"], "channels");
    assert_eq!(visits[0]["route"]["identifier"], "C2");
    assert_eq!(visits[0]["outcome"]["outcome"], "sent");

    fetch.assert();
    send.assert();
}

#[test]
fn viewed_list_empty() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    playbooks(&dir)
        .args(["viewed", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No channels viewed yet."));
}
