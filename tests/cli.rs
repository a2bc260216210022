use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// An `esplus` command isolated from the user's real configuration.
fn esplus(config_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("esplus").unwrap();
    cmd.env("ESPLUS_CONFIG", config_dir.join("config.toml"))
        .env("NO_COLOR", "1")
        .env_remove("CLICOLOR_FORCE");
    cmd
}

#[test]
fn no_arguments_prints_help() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("clipboard-bridge"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn version_flag_prints_version() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(format!("esplus {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_command_fails_naming_the_token() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .arg("frobnicate")
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Error: "))
        .stdout(predicate::str::contains("frobnicate"));
}

#[test]
fn inline_template_with_one_argument() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["template", "Hello [[.|upper]]", "World"])
        .assert()
        .success()
        .stdout("Hello WORLD");
}

#[test]
fn inline_template_ranges_over_several_arguments() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["template", "[[range .]][[.]][[end]]", "a", "b", "c"])
        .assert()
        .success()
        .stdout("abc");
}

#[test]
fn file_template_uses_braces() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("greeting.txt");
    fs::write(&file, "Hello {{ . }}!").unwrap();

    esplus(dir.path())
        .arg("template")
        .arg(&file)
        .arg("World")
        .assert()
        .success()
        .stdout("Hello World!");
}

#[test]
fn template_without_data_fails_when_it_reads_the_dot() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["template", "Hello [[.]]"])
        .assert()
        .code(1)
        .stdout(predicate::str::starts_with("Error: "))
        .stdout(predicate::str::contains("Hello").not());
}

#[test]
fn unknown_template_function_is_a_syntax_error() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["template", "[[. | shout]]", "x"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("shout"));
}

#[test]
fn malformed_config_is_fatal() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[aliases\n").unwrap();

    esplus(dir.path())
        .args(["template", "plain"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn malformed_config_does_not_hide_help() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("config.toml"), "[aliases\n").unwrap();

    esplus(dir.path()).arg("help").assert().success();
}

#[test]
fn wait_rejects_a_non_numeric_delay() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["wait", "abc", "true"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("abc"));
}

#[cfg(unix)]
#[test]
fn run_uses_aliases_from_the_config() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("ran");
    fs::write(dir.path().join("config.toml"), "[aliases]\nmk = \"touch\"\n").unwrap();

    esplus(dir.path())
        .arg("run")
        .arg("mk")
        .arg(&marker)
        .assert()
        .success();

    // The child is detached; give it a moment to finish.
    for _ in 0..50 {
        if marker.exists() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    }
    assert!(marker.exists());
}

#[test]
fn deeply_nested_template_is_rejected_cleanly() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("deep.txt");
    fs::write(&file, format!("{{{{ {}1{} }}}}", "(".repeat(100_000), ")".repeat(100_000))).unwrap();

    esplus(dir.path())
        .arg("template")
        .arg(&file)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("max expression depth exceeded"));
}

#[test]
fn oversized_printf_precision_does_not_crash() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .args(["template", "[[ printf \"%.100000000000f\" 1.0 ]]"])
        .assert()
        .success()
        .stdout("%!(NOVERB)%!(EXTRA float64=1)");
}

#[test]
fn directory_as_template_is_a_read_error() {
    let dir = tempdir().unwrap();
    esplus(dir.path())
        .arg("template")
        .arg(dir.path())
        .arg("x")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("could not read template file"));
}
