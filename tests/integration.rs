//! Integration tests for the gremlins binary.
//!
//! Nothing here touches the network: commands that aggregate run with both
//! sources disabled, or fail before any download.

use std::path::PathBuf;
use std::process::Command;

/// Helper to get the path to the compiled binary
fn get_binary_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test binary name
    path.pop(); // Remove deps directory
    path.push("gremlins");
    path
}

/// Run gremlins with a config path that does not exist, so defaults apply
fn run_gremlins(args: &[&str]) -> std::process::Output {
    let binary = get_binary_path();
    Command::new(&binary)
        .args(["--config", "/nonexistent/gremlins/config.yaml"])
        .args(args)
        .output()
        .expect("Failed to execute gremlins")
}

#[test]
fn test_version_command() {
    let output = run_gremlins(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("gremlins {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn test_help_command() {
    let output = run_gremlins(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["list", "push", "convert", "config"] {
        assert!(stdout.contains(command), "help misses {}", command);
    }
}

#[test]
fn test_invalid_command() {
    let output = run_gremlins(&["frobnicate"]);
    assert!(!output.status.success());
}

#[test]
fn test_config_command_prints_valid_yaml() {
    let output = run_gremlins(&["config"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: gremlins::Config = serde_yaml::from_str(&stdout).unwrap();
    assert!(parsed.validate().is_ok());
    assert!(parsed.keywords.contains(&"hadopi".to_string()));
}

#[test]
fn test_config_command_writes_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("etc").join("config.yaml");

    let output = run_gremlins(&["config", "--write", path.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let written = gremlins::Config::load(&path).unwrap();
    assert_eq!(written.iptables.chain, "GREMLINS");
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        gremlins::Config::generate_default_yaml().unwrap()
    );
}

#[test]
fn test_convert_aligned_range() {
    let output = run_gremlins(&["convert", "192.0.2.0-192.0.2.7"]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "192.0.2.0/29\n");
}

#[test]
fn test_convert_unaligned_range() {
    let output = run_gremlins(&["convert", "192.0.2.1 - 192.0.2.6"]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "192.0.2.1/32\n192.0.2.2/31\n192.0.2.4/31\n192.0.2.6/32\n"
    );
}

#[test]
fn test_convert_invalid_range_fails_but_converts_others() {
    let output = run_gremlins(&["convert", "192.0.2.7-192.0.2.0", "10.0.0.0-10.0.0.255"]);
    assert!(!output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "10.0.0.0/24\n");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Reversed range"));
}

#[test]
fn test_list_with_all_sources_disabled() {
    let output = run_gremlins(&["list", "--disable-iblocklist", "--disable-ripe", "--no-color"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[SKIP] iBlockList"));
    assert!(stderr.contains("[SKIP] RIPE"));
}

#[test]
fn test_list_json_empty() {
    let output = run_gremlins(&[
        "list",
        "--json",
        "--disable-iblocklist",
        "--disable-ripe",
        "--quiet",
    ]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "[]");
    assert!(output.stderr.is_empty());
}

#[test]
fn test_push_unavailable_target() {
    for target in ["utm9", "fbxos", "pfsense", "opnsense"] {
        let output = run_gremlins(&["push", target]);
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("Sink not available"), "{}: {}", target, stderr);
    }
}

#[test]
fn test_push_iptables_empty_ruleset() {
    let output = run_gremlins(&[
        "push",
        "iptables",
        "--disable-iblocklist",
        "--disable-ripe",
    ]);
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "# load with: iptables-restore --noflush\n\
         *filter\n\
         :GREMLINS - [0:0]\n\
         -I INPUT -j GREMLINS\n\
         -I FORWARD -j GREMLINS\n\
         COMMIT\n"
    );
}

#[test]
fn test_invalid_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "keywords: []\n").unwrap();

    let output = Command::new(get_binary_path())
        .args(["--config", path.to_str().unwrap(), "list"])
        .output()
        .expect("Failed to execute gremlins");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to load config"));
}
