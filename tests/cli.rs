//! Integration tests for the cellgen binary (offline, --stub backend)

use std::fs;
use std::path::Path;
use std::process::Command;

fn run_cellgen(args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_cellgen"))
        .args(args)
        // Keep the user's RUST_LOG out of stderr assertions.
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute cellgen");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

const FIELDS: &str = r#"
[[field]]
name = "French"
type = "translation"
source = "English"
source_language = "en"
target_language = "fr"

[[field]]
name = "Summary"
type = "prompt"
prompt = "Summarise {English} for {Audience}"
"#;

#[test]
fn test_fills_computed_columns_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.csv", "English,Audience\nHello,kids\nBye,\n");
    let fields = write(dir.path(), "fields.toml", FIELDS);
    let config = write(dir.path(), "config.toml", "");

    let (stdout, stderr, code) =
        run_cellgen(&["--stub", "-c", &config, "-F", &fields, &input]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert_eq!(
        stdout,
        "English,Audience,French,Summary\n\
         Hello,kids,translation (en to fr): Hello,chatgpt: Summarise Hello for kids\n\
         Bye,,translation (en to fr): Bye,chatgpt: Summarise Bye for \n"
    );
}

#[test]
fn test_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.csv", "English\nHello\n");
    let fields = write(
        dir.path(),
        "fields.toml",
        "[[field]]\nname = \"French\"\ntype = \"translation\"\nsource = \"English\"\n\
         source_language = \"en\"\ntarget_language = \"fr\"\n",
    );
    let config = write(dir.path(), "config.toml", "[compute]\nbatch_size = 1\n");
    let output = dir.path().join("out.csv");
    let output_str = output.to_string_lossy().to_string();

    let (stdout, stderr, code) = run_cellgen(&[
        "--stub", "-c", &config, "-F", &fields, "-o", &output_str, &input,
    ]);

    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stdout.is_empty());
    assert!(stderr.contains("Wrote 1 rows"));
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "English,French\nHello,translation (en to fr): Hello\n"
    );
}

#[test]
fn test_without_fields_file_echoes_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.csv", "a,b\n1,=cmd\n");
    let config = write(dir.path(), "config.toml", "");

    let (stdout, _, code) = run_cellgen(&["--stub", "-c", &config, &input]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "a,b\n1,'=cmd\n");
}

#[test]
fn test_unknown_placeholder_fails() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.csv", "English\nHello\n");
    let fields = write(
        dir.path(),
        "fields.toml",
        "[[field]]\nname = \"S\"\ntype = \"prompt\"\nprompt = \"{Missing}\"\n",
    );
    let config = write(dir.path(), "config.toml", "");

    let (_, stderr, code) = run_cellgen(&["--stub", "-c", &config, "-F", &fields, &input]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown field: Missing"), "stderr: {stderr}");
}

#[test]
fn test_remote_backend_without_key_cannot_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let input = write(dir.path(), "in.csv", "English\nHello\n");
    let fields = write(
        dir.path(),
        "fields.toml",
        "[[field]]\nname = \"S\"\ntype = \"prompt\"\nprompt = \"Say {English}\"\n",
    );
    let config = write(
        dir.path(),
        "config.toml",
        "[compute]\nbackend = \"remote\"\n[llm]\napi_key_env = \"CELLGEN_TEST_UNSET_KEY\"\n",
    );

    let (_, stderr, code) = run_cellgen(&["-c", &config, "-F", &fields, &input]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Backend unavailable"), "stderr: {stderr}");
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "config.toml", "");

    let (_, stderr, code) = run_cellgen(&["--stub", "-c", &config, "/nonexistent/in.csv"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Failed to load /nonexistent/in.csv"), "stderr: {stderr}");
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_cellgen(&["--frobnicate"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option: --frobnicate"));
}
