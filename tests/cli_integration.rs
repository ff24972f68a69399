use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// A command isolated from the user's config files, running in `dir`.
fn texttransform(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("texttransform").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"))
        .env_remove("TEXTTRANSFORM_CONFIG")
        .env_remove("TEXTTRANSFORM_LOG");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    name.to_string()
}

#[test]
fn test_default_output_file() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "greeting.tt", "Hello <#= 1 + 1 #>!");

    texttransform(dir.path())
        .arg(&template)
        .assert()
        .success()
        .stdout("");

    let output = fs::read_to_string(dir.path().join("greeting.txt")).unwrap();
    assert_eq!(output, "Hello 2!");
}

#[test]
fn test_default_output_without_extension() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "greeting", "plain");

    texttransform(dir.path()).arg(&template).assert().success();
    assert!(dir.path().join("greeting.txt").exists());
}

#[test]
fn test_explicit_output_file() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "t.tt", "x");

    texttransform(dir.path())
        .args(["-o", "result.out", template.as_str()])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(dir.path().join("result.out")).unwrap(),
        "x"
    );
    assert!(!dir.path().join("t.txt").exists());
}

#[test]
fn test_dash_writes_to_stdout() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "t.tt", "Hello <#= 1 + 1 #>!");

    texttransform(dir.path())
        .args(["-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("Hello 2!\n");

    assert!(!dir.path().join("t.txt").exists());
}

#[test]
fn test_stdin_to_stdout() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .write_stdin("a<#= 2 * 3 #>b")
        .assert()
        .success()
        .stdout("a6b\n");
}

#[test]
fn test_typed_parameter() {
    let dir = TempDir::new().unwrap();
    let template = write(
        &dir,
        "count.tt",
        "<#@ parameter name=\"count\" type=\"System.Int32\" #>\n<#= count + 1 #>",
    );

    texttransform(dir.path())
        .args(["-p", "count=5", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("6\n");
}

#[test]
fn test_float_parameter_renders_as_given() {
    let dir = TempDir::new().unwrap();
    let template = write(
        &dir,
        "ratio.tt",
        "<#@ parameter name=\"x\" type=\"float\" #>\n<#= x #>",
    );

    texttransform(dir.path())
        .args(["-p", "x=0.1", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("0.1\n");
}

#[test]
fn test_parameter_name_and_value_as_separate_arguments() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "t.tt", "<#= count #>");

    texttransform(dir.path())
        .args(["-p", "count", "5", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn test_parameter_value_may_contain_equals() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "t.tt", "<#= expr #>");

    texttransform(dir.path())
        .args(["--parameter=expr=a=b", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("a=b\n");
}

#[test]
fn test_conversion_error_fails_without_output() {
    let dir = TempDir::new().unwrap();
    let template = write(
        &dir,
        "count.tt",
        "<#@ parameter name=\"count\" type=\"System.Int32\" #>\n<#= count #>",
    );

    texttransform(dir.path())
        .args(["-p", "count=abc", template.as_str()])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Processing 'count.tt' failed."))
        .stderr(predicate::str::contains(
            "ERROR: Could not convert property 'count'='abc' to parameter type 'System.Int32'",
        ));

    assert!(!dir.path().join("count.txt").exists());
}

#[test]
fn test_template_error_is_reported_with_location() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "broken.tt", "text\n<#= 1");

    texttransform(dir.path())
        .arg(&template)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("broken.tt(2,1): ERROR: Unclosed block"));

    assert!(!dir.path().join("broken.txt").exists());
}

#[test]
fn test_warnings_do_not_fail() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "t.tt", "<#@ template language=\"C#\" #>ok");

    texttransform(dir.path())
        .args(["-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("ok\n")
        .stderr(predicate::str::contains("WARNING:"));
}

#[test]
fn test_output_directive_sets_extension() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "page.tt", "<#@ output extension=\".html\" #><p>hi</p>");

    texttransform(dir.path()).arg(&template).assert().success();
    assert_eq!(
        fs::read_to_string(dir.path().join("page.html")).unwrap(),
        "<p>hi</p>"
    );
}

#[test]
fn test_include_search_path() {
    let dir = TempDir::new().unwrap();
    write(&dir, "shared/header.t4", "HEADER ");
    let template = write(&dir, "t.tt", "<#@ include file=\"header.t4\" #>body");

    texttransform(dir.path())
        .args(["-I", "shared", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("HEADER body\n");
}

#[test]
fn test_include_paths_from_config_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "shared/header.t4", "HEADER ");
    write(&dir, "texttransform.json", r#"{ "include_paths": ["shared"] }"#);
    let template = write(&dir, "t.tt", "<#@ include file=\"header.t4\" #>body");

    texttransform(dir.path())
        .args(["-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("HEADER body\n");
}

#[test]
fn test_malformed_config_file() {
    let dir = TempDir::new().unwrap();
    write(&dir, "texttransform.json", "{ nope");
    let template = write(&dir, "t.tt", "x");

    texttransform(dir.path())
        .arg(&template)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not load configuration"));
}

#[test]
fn test_host_parameter() {
    let dir = TempDir::new().unwrap();
    let template = write(
        &dir,
        "host.tt",
        "<#@ template hostspecific=\"true\" #><#= host_parameter(\"greeting\") #>",
    );

    texttransform(dir.path())
        .args(["-a", "greeting=hello", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("hello\n");
}

#[test]
fn test_preprocess_generates_rust_module() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "greeting.tt", "Hello <#= name #>");

    texttransform(dir.path())
        .args(["-c", "My.Templates.Greeting", template.as_str()])
        .assert()
        .success();

    let code = fs::read_to_string(dir.path().join("greeting.rs")).unwrap();
    assert!(code.contains("pub mod My {"));
    assert!(code.contains("pub mod Templates {"));
    assert!(code.contains("pub struct Greeting {"));
    assert!(code.contains("fn transform_text(&self)"));
    assert!(!dir.path().join("greeting.txt").exists());
}

#[test]
fn test_unknown_option() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .args(["--bogus", "t.tt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unknown option '--bogus'"));
}

#[test]
fn test_missing_option_value() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .arg("-o")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Missing value for option '-o'"));
}

#[test]
fn test_missing_input_file() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .arg("nope.tt")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input file 'nope.tt' does not exist."));
}

#[test]
fn test_empty_input() {
    let dir = TempDir::new().unwrap();
    let template = write(&dir, "empty.tt", "");

    texttransform(dir.path())
        .arg(&template)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input is empty"));

    assert!(!dir.path().join("empty.txt").exists());
}

#[test]
fn test_empty_stdin() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .write_stdin("")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Input is empty"));
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("T4 text template processor version"))
        .stdout(predicate::str::contains(
            "Usage: texttransform [options] [template-file]",
        ))
        .stdout(predicate::str::contains("Options:"))
        .stdout(predicate::str::contains("-o, --out=<file>"));
}

#[test]
fn test_help_ignores_broken_config() {
    let dir = TempDir::new().unwrap();
    write(&dir, "texttransform.json", "{ nope");

    texttransform(dir.path())
        .arg("--help")
        .env("TEXTTRANSFORM_CONFIG", dir.path().join("missing.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Options:"));

    texttransform(dir.path())
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn test_config_defaults_precede_cli_values() {
    let dir = TempDir::new().unwrap();
    write(&dir, "first/header.t4", "FIRST ");
    write(&dir, "second/header.t4", "SECOND ");
    write(&dir, "texttransform.json", r#"{ "include_paths": ["first"] }"#);
    let template = write(&dir, "t.tt", "<#@ include file=\"header.t4\" #>body");

    texttransform(dir.path())
        .args(["-I", "second", "-o", "-", template.as_str()])
        .assert()
        .success()
        .stdout("FIRST body\n");
}

#[test]
fn test_help_stops_parsing() {
    let dir = TempDir::new().unwrap();

    texttransform(dir.path())
        .args(["-?", "--bogus"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Options:"));
}
