use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;

fn polyshell() -> Command {
    let mut cmd = Command::cargo_bin("polyshell").unwrap();
    cmd.env_remove("POLYSHELL_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd.timeout(Duration::from_secs(20));
    cmd
}

fn has_sh() -> bool {
    which_ok("sh")
}

fn which_ok(name: &str) -> bool {
    polyshell()
        .arg("which")
        .arg(name)
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn list_prints_builtins_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let output = polyshell()
        .current_dir(dir.path())
        .arg("list")
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let names: Vec<&str> = stdout.lines().collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    for builtin in ["bash", "cmd", "node", "pwsh", "sh"] {
        assert!(names.contains(&builtin), "missing {}", builtin);
    }
}

#[test]
fn unregistered_interpreter_exits_1() {
    polyshell()
        .args(["exec", "polyshell-nope", "echo hi"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("polyshell-nope").and(predicate::str::contains("not registered")));
}

#[test]
fn unfindable_interpreter_exits_127() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("polyshell.toml");
    std::fs::write(
        &config,
        r#"
[interpreters.ghost]
extension = ".ghost"
windows = ['C:\nowhere\ghost.exe']
linux = ["/nowhere/polyshell-ghost"]
darwin = ["/nowhere/polyshell-ghost"]
freebsd = ["/nowhere/polyshell-ghost"]
"#,
    )
    .unwrap();

    polyshell()
        .arg("--config")
        .arg(&config)
        .args(["run", "ghost", "x.ghost"])
        .assert()
        .code(127)
        .stderr(predicate::str::contains("not found"));
}

#[cfg(not(windows))]
#[test]
fn cmd_exits_126_off_windows() {
    polyshell()
        .args(["exec", "cmd", "echo hi"])
        .assert()
        .code(126);
}

#[test]
fn missing_explicit_config_fails() {
    polyshell()
        .args(["--config", "/no/such/polyshell.toml", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("/no/such/polyshell.toml"));
}

#[test]
fn config_from_working_directory_is_applied() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("polyshell.toml"),
        "[interpreters.zsh-custom]\nextension = \".zsh\"\nargs = [\"-f\"]\n",
    )
    .unwrap();

    polyshell()
        .current_dir(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("zsh-custom"));
}

#[test]
fn show_prints_assembled_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let output = polyshell()
        .current_dir(dir.path())
        .args(["show", "sh", "job.sh", "--", "one", "two"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let tokens: Vec<&str> = stdout.lines().collect();
    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens[0], "-e");
    assert!(tokens[1].ends_with("job.sh"));
    assert_eq!(&tokens[2..], ["one", "two"]);
}

#[test]
fn exec_propagates_exit_code_and_output() {
    if !has_sh() {
        return;
    }
    polyshell()
        .args(["exec", "sh", "echo out; echo err >&2; exit 3", "--capture"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("out"))
        .stderr(predicate::str::contains("err"));
}

#[test]
fn exec_passes_env_and_args() {
    if !has_sh() {
        return;
    }
    polyshell()
        .args([
            "exec",
            "sh",
            r#"echo "$MSG:$1""#,
            "--env",
            "MSG=hello world",
            "--capture",
            "--",
            "first",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world:first"));
}

#[test]
fn exec_reads_script_from_stdin() {
    if !has_sh() {
        return;
    }
    polyshell()
        .args(["exec", "sh", "-"])
        .write_stdin("echo from-stdin\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-stdin"));
}

#[test]
fn exec_timeout_fails() {
    if !has_sh() {
        return;
    }
    polyshell()
        .args(["exec", "sh", "exec sleep 10", "--timeout", "1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("timed out"));
}
