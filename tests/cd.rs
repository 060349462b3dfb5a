// Changes the process working directory, so it lives in its own test binary.

use liteshell::Interpreter;
use std::env;
use std::fs;

#[test]
fn cd_dir_home_and_back() {
    let dir = tempfile::tempdir().unwrap();
    let target = fs::canonicalize(dir.path()).unwrap();
    let start = env::current_dir().unwrap();
    let output = target.join("pwd.txt");

    let mut sh = Interpreter::default();
    assert_eq!(sh.execute_line(&format!("cd {}", target.display())).unwrap().code, 0);
    assert_eq!(env::current_dir().unwrap(), target);
    assert_eq!(sh.env().previous_dir.as_deref(), Some(start.as_path()));

    // Relative paths now resolve against the new directory.
    sh.execute_line("pwd > pwd.txt").unwrap();
    assert_eq!(fs::read_to_string(&output).unwrap(), format!("{}\n", target.display()));

    assert_eq!(sh.execute_line("cd a b").unwrap().code, 1);
    assert_eq!(env::current_dir().unwrap(), target);

    sh.execute_line(&format!("cd - > {}", output.display())).unwrap();
    assert_eq!(env::current_dir().unwrap(), start);
    assert_eq!(fs::read_to_string(&output).unwrap(), format!("{}\n", start.display()));

    // No argument: go home, remembering where we came from.
    let home = tempfile::tempdir().unwrap();
    let home_dir = fs::canonicalize(home.path()).unwrap();
    sh.env_mut().home = Some(home_dir.clone());
    assert_eq!(sh.execute_line("cd").unwrap().code, 0);
    assert_eq!(env::current_dir().unwrap(), home_dir);
    assert_eq!(sh.env().previous_dir.as_deref(), Some(start.as_path()));

    sh.execute_line(&format!("cd {}", start.display())).unwrap();
    assert_eq!(env::current_dir().unwrap(), start);
}
