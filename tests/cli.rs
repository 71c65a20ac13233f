use std::io::Write;
use std::process::{Command, Output, Stdio};

fn fflt() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fflt"))
}

fn source_file(code: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".fflt").tempfile().expect("temp file");
    file.write_all(code.as_bytes()).expect("write source");
    file
}

fn run_with_stdin(cmd: &mut Command, stdin: &str) -> Output {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to run fflt");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(stdin.as_bytes())
        .expect("write stdin");
    child.wait_with_output().expect("wait for fflt")
}

// push 3; push 4; add; putn; end
const ADD: &str = "FFFLLT FFFLFFT LFFF LTFL TTT";

// --- Running programs ---

#[test]
fn runs_program_to_completion() {
    let src = source_file(ADD);
    let out = fflt().arg(src.path()).output().expect("failed to run fflt");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "7");
}

#[test]
fn comments_and_lowercase_are_accepted() {
    let src = source_file("push 3: ffflLT\npush 4: FFFLFFT\nadd: LFFF\nshow: ltfl\nend: TTT\n");
    let out = fflt().arg(src.path()).output().expect("failed to run fflt");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "7");
}

#[test]
fn reads_program_input_from_stdin() {
    // push 0; getn; push 0; retrieve; putn
    let src = source_file("FFFFT LTLL FFFFT LLL LTFL");
    let out = run_with_stdin(fflt().arg(src.path()), "41\n");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "41");
}

#[test]
fn runtime_error_exits_nonzero_with_position() {
    // push 5; push 0; div
    let src = source_file("FFFLFLT FFFFT LFLF TTT");
    let out = fflt().args(["--no-color"]).arg(src.path()).output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("error[FFL-R003]: integer divide by zero"), "stderr: {stderr}");
    assert!(stderr.contains(":1:15"), "stderr: {stderr}");
}

#[test]
fn output_before_runtime_error_is_kept() {
    // push 1; putn; discard
    let src = source_file("FFFLT LTFL FTT");
    let out = fflt().arg(src.path()).output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "1");
}

#[test]
fn syntax_error_as_json() {
    let src = source_file("FF FLL");
    let out = fflt().arg("--json").arg(src.path()).output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    let v: serde_json::Value = serde_json::from_str(stderr.trim()).expect("valid JSON");
    assert_eq!(v["severity"], "error");
    assert_eq!(v["code"], "FFL-P003");
    assert_eq!(v["line"], 1);
}

#[test]
fn missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = fflt().arg(dir.path().join("absent.fflt")).output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("can not read"));
}

#[test]
fn verifier_warning_does_not_stop_run() {
    // push 1; putn; jz FF (untaken, never marked); end
    let src = source_file("FFFLT FTF LTFL TLFFFT TTT");
    let out = fflt().args(["--no-color"]).arg(src.path()).output().expect("failed to run fflt");
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "1");
    assert!(String::from_utf8_lossy(&out.stderr).contains("warning[FFL-W001]"));
}

// --- Dump ---

#[test]
fn dump_lists_instructions() {
    let src = source_file(ADD);
    let out = fflt().arg("--dump").arg(src.path()).output().expect("failed to run fflt");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "0000 PUSH           3",
            "0001 PUSH           4",
            "0002 ADD",
            "0003 PUTN",
            "0004 END",
        ]
    );
}

#[test]
fn dump_as_json() {
    let src = source_file(ADD);
    let out = fflt().args(["--dump", "--json"]).arg(src.path()).output().expect("failed to run fflt");
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(v.as_array().map(Vec::len), Some(5));
    assert_eq!(v[0]["mnemonic"], "PUSH");
    assert_eq!(v[0]["operand"], "3");
    assert_eq!(v[2]["line"], 1);
}

// --- Explain ---

#[test]
fn explain_known_code() {
    let out = fflt().args(["--explain", "FFL-R004"]).output().expect("failed to run fflt");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("invalid heap access"));
}

#[test]
fn explain_unknown_code() {
    let out = fflt().args(["--explain", "FFL-Z000"]).output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn usage_errors_exit_with_one() {
    let out = fflt().output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
    assert!(!out.stderr.is_empty());
    let out = fflt().arg("--bogus").output().expect("failed to run fflt");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn version_exits_successfully() {
    let out = fflt().arg("--version").output().expect("failed to run fflt");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("fflt"));
}

// --- Debugger ---

#[test]
fn debugger_continue_runs_program_and_saves_history() {
    let src = source_file(ADD);
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("history");
    let out = run_with_stdin(
        fflt().arg("--debug").arg("--history").arg(&history).arg(src.path()),
        "ii\nc\n",
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Program counter: 0"), "stdout: {stdout}");
    assert!(stdout.contains("-> 0000 PUSH           3"), "stdout: {stdout}");
    assert!(stdout.contains('7'), "stdout: {stdout}");
    let saved = std::fs::read_to_string(&history).expect("history written");
    assert!(saved.lines().any(|l| l == "c"), "history: {saved}");
}
