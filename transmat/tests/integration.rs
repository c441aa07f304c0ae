use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn transmat(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_transmat"));
    cmd.current_dir(dir)
        .env_remove("TRANSMAT_CONFIG")
        .env_remove("TRANSMAT_COMPAT")
        .env_remove("TRANSMAT_FORMAT")
        .env_remove("TRANSMAT_PRETTY")
        .env_remove("TRANSMAT_DEBUG")
        .env_remove("TRANSMAT_LOG_LEVEL")
        .env_remove("RUST_LOG");
    cmd
}

fn run(dir: &Path, args: &[&str]) -> Output {
    transmat(dir)
        .args(args)
        .output()
        .expect("Failed to execute transmat binary")
}

fn write_script(dir: &TempDir, name: &str, source: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, source).unwrap();
    path.to_str().unwrap().to_string()
}

#[test]
fn parse_prints_json_tree() {
    let dir = TempDir::new().unwrap();
    let script = write_script(
        &dir,
        "script.m",
        r#"
% running sum
total = 0;
for k = 1:10
    total = total + k;
end
[m, i] = max([3 1 2]);
"#,
    );

    let output = run(dir.path(), &["parse", &script]);
    assert!(
        output.status.success(),
        "parse failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let tree: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let body = tree["body"].as_array().unwrap();
    assert_eq!(body.len(), 3);
    assert!(body[1].get("For").is_some());
    assert!(body[2].get("Call").is_some());
}

#[test]
fn syntax_error_exits_with_failure() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "broken.m", "x = 1;\nif a, b;\n");

    let output = run(dir.path(), &["parse", &script]);
    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("broken.m:2: Syntax error"), "{stderr}");
    assert!(stderr.contains("end of input"), "{stderr}");
    assert!(output.stdout.is_empty());
}

#[test]
fn missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["parse", "does_not_exist.m"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does_not_exist.m"));
}

#[test]
fn parse_reads_standard_input() {
    let dir = TempDir::new().unwrap();
    let mut child = transmat(dir.path())
        .args(["parse", "-", "--compact"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"x = 1;\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim().lines().count(), 1);
    assert!(stdout.contains("\"Let\""));
}

#[test]
fn yaml_output_format() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "s.m", "y = x';\n");
    let output = run(dir.path(), &["parse", &script, "--format", "yaml"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("body:"), "{stdout}");
}

#[test]
fn strict_flag_rejects_command_syntax() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "cmd.m", "hold on\n");

    assert!(run(dir.path(), &["parse", &script]).status.success());
    assert!(!run(dir.path(), &["parse", &script, "--strict"])
        .status
        .success());
}

#[test]
fn config_file_in_working_directory_is_used() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".transmat.yaml"), "parser:\n  compat: strict\n").unwrap();
    let script = write_script(&dir, "cmd.m", "hold on\n");

    assert!(!run(dir.path(), &["parse", &script]).status.success());
}

#[test]
fn tokens_command_lists_tokens() {
    let dir = TempDir::new().unwrap();
    let script = write_script(&dir, "t.m", "a = b';\n");
    let output = run(dir.path(), &["tokens", &script]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("1:0\tIdent"));
    assert!(lines[3].contains("Transpose"));
}

#[test]
fn config_generate_and_show() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["config", "generate"]);
    assert!(output.status.success());
    let sample = String::from_utf8_lossy(&output.stdout);
    assert!(sample.contains("parser:"));
    assert!(sample.contains("compat: matlab"));

    let target = dir.path().join("out.json");
    let output = run(
        dir.path(),
        &["config", "generate", "--output", target.to_str().unwrap()],
    );
    assert!(output.status.success());
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&target).unwrap()).unwrap();
    assert_eq!(written["output"]["format"], "json");

    let output = run(
        dir.path(),
        &["--config", target.to_str().unwrap(), "config", "show"],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("format: json"));
}

#[test]
fn version_command() {
    let dir = TempDir::new().unwrap();
    let output = run(dir.path(), &["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("transmat v"));
}
