use liteshell::Interpreter;
use liteshell::alias::AliasTable;
use liteshell::env::Environment;
use liteshell::history::HistoryLog;
use liteshell::parser::SyntaxError;
use std::fs;
use std::path::Path;

fn interpreter_with_files(dir: &Path) -> Interpreter {
    let history = HistoryLog::load(dir.join("history"), 1000).unwrap();
    let aliases = AliasTable::load(dir.join("aliases")).unwrap();
    Interpreter::with_environment(Environment::with_state(history, aliases))
}

#[test]
fn redirected_pipeline_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("fruit.txt");
    let output = dir.path().join("sorted.txt");
    fs::write(&input, "pear\napple\nfig\n").unwrap();

    let mut sh = Interpreter::default();
    let line = format!(
        "cat < {} | sort | head -n 2 > {}",
        input.display(),
        output.display()
    );
    let status = sh.execute_line(&line).unwrap();
    assert_eq!(status.code, 0);
    assert_eq!(fs::read_to_string(&output).unwrap(), "apple\nfig\n");
}

#[test]
fn three_stage_pipeline_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let mut sh = Interpreter::default();
    sh.execute_line(&format!("printf 'b\\na\\n' | sort | head > {}", output.display()))
        .unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "a\nb\n");
}

#[test]
fn quoted_argument_reaches_program_intact() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let mut sh = Interpreter::default();
    sh.execute_line(&format!("printf '%s\\n' \"a  b\" c\\ d > {}", output.display()))
        .unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "a  b\nc d\n");
}

#[test]
fn dangling_redirect_forks_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker");

    let mut sh = Interpreter::default();
    // The first stage would create the marker file if anything were launched.
    let line = format!("touch {} | cat >", marker.display());
    let err = sh.execute_line(&line).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SyntaxError>(),
        Some(&SyntaxError::DanglingRedirect {
            operator: ">".to_string()
        })
    );
    assert!(!marker.exists());
}

#[test]
fn unmatched_wildcard_stays_literal() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");
    let pattern = dir.path().join("nomatch*");

    let mut sh = Interpreter::default();
    sh.execute_line(&format!("printf '%s\\n' {} > {}", pattern.display(), output.display()))
        .unwrap();
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("{}\n", pattern.display())
    );
}

#[test]
fn wildcard_expands_against_directory() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), "").unwrap();
    fs::write(data.join("b.txt"), "").unwrap();
    fs::write(data.join(".hidden.txt"), "").unwrap();
    fs::write(data.join("c.log"), "").unwrap();
    let output = dir.path().join("out.txt");

    let mut sh = Interpreter::default();
    sh.execute_line(&format!(
        "printf '%s\\n' {}/*.txt | sort > {}",
        data.display(),
        output.display()
    ))
    .unwrap();
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("{0}/a.txt\n{0}/b.txt\n", data.display())
    );
}

#[test]
fn alias_round_trip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut sh = interpreter_with_files(dir.path());
        assert_eq!(sh.execute_line("alias ll=ls -l").unwrap().code, 0);
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("aliases")).unwrap(),
        "ll=ls -l\n"
    );

    let sh = interpreter_with_files(dir.path());
    assert_eq!(sh.env().aliases.get("ll"), Some("ls -l"));
}

#[test]
fn malformed_alias_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut sh = interpreter_with_files(dir.path());
    assert_eq!(sh.execute_line("alias ll").unwrap().code, 1);
    assert!(sh.env().aliases.is_empty());
    assert!(!dir.path().join("aliases").exists());
}

#[test]
fn alias_expands_first_word_only() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let mut sh = Interpreter::default();
    sh.env_mut().aliases.insert("say", "printf '%s\\n'");
    sh.execute_line(&format!("say say > {}", output.display()))
        .unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), "say\n");
}

#[test]
fn history_dedups_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut sh = interpreter_with_files(dir.path());
        sh.submit("true");
        sh.submit("true");
        sh.submit("false");
        sh.submit("true");
        sh.submit("");
        sh.shutdown().unwrap();
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("history")).unwrap(),
        "true\nfalse\ntrue\n"
    );

    let sh = interpreter_with_files(dir.path());
    let entries: Vec<&str> = sh.env().history.iter().collect();
    assert_eq!(entries, vec!["true", "false", "true"]);
}

#[test]
fn history_builtin_output_can_be_redirected() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.txt");

    let mut sh = Interpreter::default();
    sh.submit("true");
    sh.submit("false");
    sh.submit(&format!("history 2 > {}", output.display()));
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        format!("    2  false\n    3  history 2 > {}\n", output.display())
    );
}

#[test]
fn statuses_follow_last_stage() {
    let mut sh = Interpreter::default();
    assert_eq!(sh.run_line("false").code, 1);
    assert_eq!(sh.run_line("false | true").code, 0);
    assert_eq!(sh.run_line("true | false").code, 1);
    assert_eq!(sh.run_line("no-such-program-liteshell").code, 127);
    assert_eq!(sh.last_status(), 127);
}
