//! upsert-block integration tests

mod common;

use common::{TestHost, count_entries, hostprov_cmd};
use predicates::prelude::*;

const START: &str = "^# BEGIN hostprov$";
const END: &str = "^# END hostprov$";

fn setup(body: &str) -> TestHost {
    let host = TestHost::new();
    host.write_file("app.conf", "listen = 80\n# BEGIN hostprov\nstale = 1\n# END hostprov\ntail = yes\n");
    host.write_file("block.conf", body);
    host
}

fn upsert(host: &TestHost, extra: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = hostprov_cmd();
    cmd.arg("upsert-block")
        .arg(host.path.join("app.conf"))
        .args(["--start", START, "--end", END, "--body-file"])
        .arg(host.path.join("block.conf"))
        .arg("--backup-dir")
        .arg(host.path.join("backups"))
        .args(extra);
    cmd.assert()
}

#[test]
fn test_replaces_block_in_place() {
    let host = setup("# BEGIN hostprov\nfresh = 2\n# END hostprov\n");

    upsert(&host, &[]).success().stdout(predicate::str::contains("Updated"));

    assert_eq!(
        host.read_file("app.conf"),
        "listen = 80\n# BEGIN hostprov\nfresh = 2\n# END hostprov\ntail = yes\n"
    );
    assert_eq!(count_entries(&host.path.join("backups")), 1);
}

#[test]
fn test_second_run_is_unchanged() {
    let host = setup("# BEGIN hostprov\nfresh = 2\n# END hostprov\n");

    upsert(&host, &[]).success();
    let after_first = host.read_file("app.conf");
    upsert(&host, &[]).success().stdout(predicate::str::contains("up to date"));

    assert_eq!(host.read_file("app.conf"), after_first);
    assert_eq!(count_entries(&host.path.join("backups")), 1);
}

#[test]
fn test_check_reports_drift_without_writing() {
    let host = setup("# BEGIN hostprov\nfresh = 2\n# END hostprov\n");
    let before = host.read_file("app.conf");

    upsert(&host, &["--check"])
        .failure()
        .code(1)
        .stderr(predicate::str::contains("is out of date"));
    assert_eq!(host.read_file("app.conf"), before);

    upsert(&host, &[]).success();
    upsert(&host, &["--check"])
        .success()
        .stdout(predicate::str::contains("up to date"));
}

#[test]
fn test_invalid_start_pattern() {
    let host = setup("# BEGIN hostprov\n");

    hostprov_cmd()
        .arg("upsert-block")
        .arg(host.path.join("app.conf"))
        .args(["--start", "^(unclosed", "--end", END, "--body-file"])
        .arg(host.path.join("block.conf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid block pattern"));
}

#[test]
fn test_body_must_start_with_marker() {
    let host = setup("fresh = 2\n");

    upsert(&host, &[])
        .failure()
        .stderr(predicate::str::contains("Invalid block"));
    assert_eq!(count_entries(&host.path.join("backups")), 0);
}

#[test]
fn test_missing_target_file() {
    let host = TestHost::new();
    host.write_file("block.conf", "# BEGIN hostprov\n");

    upsert(&host, &[])
        .failure()
        .stderr(predicate::str::contains("app.conf"));
}
