use std::fs;
use std::path::Path;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_clinical-pipeline"))
        .args(args)
        .env_remove("CLINICAL_PIPELINE_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_missing_arguments_prints_usage() {
    let output = run(&[]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: clinical-pipeline"));

    let output = run(&["only-input.txt"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.txt");
    let out = dir.path().join("out.xmi");

    let output = run(&[path_str(&missing), path_str(&out)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains(&format!("Error: {} is not a file or cannot be read!", missing.display())));
    assert!(!out.exists());

    // diretório também é rejeitado
    let output = run(&[path_str(dir.path()), path_str(&out)]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_negated_finding_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    let out = dir.path().join("note.xmi");
    fs::write(&input, "Patient denies chest pain.\n").unwrap();

    let output = run(&[path_str(&input), path_str(&out)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Entity: chest pain "))
        .unwrap_or_else(|| panic!("saída sem entidade: {stdout}"));
    assert!(line.contains("=== Polarity: -1 ==="));
    assert!(line.contains("=== Subject: patient ==="));
    assert!(!stdout.contains("C0008031"));

    let xmi = fs::read_to_string(&out).unwrap();
    assert!(xmi.contains("Patient denies chest pain."));
    assert!(xmi.contains("C0008031"));

    let descriptor = fs::read_to_string(&input).unwrap();
    assert!(descriptor.contains("analysisEngineDescription"));
    assert!(descriptor.contains("DefaultPipeline"));
}

#[test]
fn test_non_utf8_note_still_runs() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    let out = dir.path().join("note.xmi");
    fs::write(&input, b"Patient denies chest pain caf\xe9.\n").unwrap();

    let output = run(&[path_str(&input), path_str(&out)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Entity: chest pain "))
        .unwrap_or_else(|| panic!("saída sem entidade: {stdout}"));
    assert!(line.contains("=== Polarity: -1 ==="));
    assert!(fs::read_to_string(&out).unwrap().contains("caf\u{FFFD}"));
}

#[test]
fn test_chained_contractions_do_not_abort() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    let out = dir.path().join("note.xmi");
    fs::write(&input, "I’d’ve denied chest pain.\n").unwrap();

    let output = run(&["--pipeline", "fast", path_str(&input), path_str(&out)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Entity: chest pain === Polarity: -1"));
}

#[test]
fn test_cuis_prints_codes() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    let out = dir.path().join("note.xmi");
    fs::write(&input, "Patient denies chest pain.\n").unwrap();

    let output = run(&["--pipeline", "fast", path_str(&input), path_str(&out), "cuis"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    let pos = lines
        .iter()
        .position(|l| l.starts_with("Entity: chest pain "))
        .unwrap();
    assert_eq!(lines[pos + 1], "C0008031_T184 ");
    assert!(fs::read_to_string(&input).unwrap().contains("FastPipeline"));
}

#[test]
fn test_config_dictionary() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    let out = dir.path().join("note.xmi");
    let config = dir.path().join("pipeline.toml");
    fs::write(&input, "No evidence of widget syndrome.\n").unwrap();
    fs::write(dir.path().join("terms.bsv"), "C9999999|T047|widget syndrome\n").unwrap();
    fs::write(&config, "[dictionary]\npath = \"terms.bsv\"\n").unwrap();

    let output = run(&["--pipeline", "fast", "--config", path_str(&config), path_str(&input), path_str(&out), "cuis"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Entity: widget syndrome === Polarity: -1"));
    assert!(stdout.contains("C9999999_T047 "));
}

#[test]
fn test_unknown_pipeline_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("note.txt");
    fs::write(&input, "Fever.\n").unwrap();

    let output = run(&["--pipeline", "rapido", path_str(&input), "out.xmi"]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read_to_string(&input).unwrap(), "Fever.\n");
}
