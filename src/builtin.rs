use crate::alias;
use crate::command::Status;
use crate::env::Environment;
use anyhow::{Context, Result, anyhow};
use argh::{EarlyExit, FromArgs};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Built-in commands known to the shell at compile time.
///
/// Arguments are parsed through [`argh::FromArgs`]: derived where argh's
/// grammar fits, implemented by hand for commands that take `-` or `-N`
/// forms. Built-ins run in the interpreter's own process.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "history" or "cd".
    fn name() -> &'static str;

    /// Executes the command. Errors are reported by the dispatcher and turn
    /// into a failing status.
    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Status>;
}

/// The closed set of built-in commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Help,
    Exit,
    History,
    Pwd,
    Ls,
    Alias,
}

impl Builtin {
    pub const ALL: [Builtin; 7] = [
        Builtin::Cd,
        Builtin::Help,
        Builtin::Exit,
        Builtin::History,
        Builtin::Pwd,
        Builtin::Ls,
        Builtin::Alias,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "cd" => Some(Builtin::Cd),
            "help" => Some(Builtin::Help),
            "exit" => Some(Builtin::Exit),
            "history" => Some(Builtin::History),
            "pwd" => Some(Builtin::Pwd),
            "ls" => Some(Builtin::Ls),
            "alias" => Some(Builtin::Alias),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Cd => Cd::name(),
            Builtin::Help => Help::name(),
            Builtin::Exit => Exit::name(),
            Builtin::History => History::name(),
            Builtin::Pwd => Pwd::name(),
            Builtin::Ls => Ls::name(),
            Builtin::Alias => AliasCmd::name(),
        }
    }

    fn synopsis(self) -> &'static str {
        match self {
            Builtin::Cd => "cd [dir | -]       change the working directory",
            Builtin::Help => "help               show this help message",
            Builtin::Exit => "exit               leave the shell",
            Builtin::History => "history [n]        list the last n entered lines",
            Builtin::Pwd => "pwd                print the working directory",
            Builtin::Ls => "ls [-a] [-l] [dir] list directory contents",
            Builtin::Alias => "alias [name=value] list or define aliases",
        }
    }

    /// Runs the built-in with `args` (without the command name).
    pub fn run(
        self,
        args: &[&str],
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Status {
        match self {
            Builtin::Cd => invoke::<Cd>(args, stdout, stderr, env),
            Builtin::Help => invoke::<Help>(args, stdout, stderr, env),
            Builtin::Exit => invoke::<Exit>(args, stdout, stderr, env),
            Builtin::History => invoke::<History>(args, stdout, stderr, env),
            Builtin::Pwd => invoke::<Pwd>(args, stdout, stderr, env),
            Builtin::Ls => invoke::<Ls>(args, stdout, stderr, env),
            Builtin::Alias => invoke::<AliasCmd>(args, stdout, stderr, env),
        }
    }
}

fn invoke<T: BuiltinCommand>(
    args: &[&str],
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
    env: &mut Environment,
) -> Status {
    let cmd = match T::from_args(&[T::name()], args) {
        Ok(cmd) => cmd,
        Err(EarlyExit { output, status }) => {
            return match status {
                Ok(()) => {
                    let _ = writeln!(stdout, "{}", output.trim_end());
                    Status::success()
                }
                Err(()) => {
                    let _ = writeln!(stderr, "liteshell: {}", output.trim_end());
                    Status::failure()
                }
            };
        }
    };
    let status = match cmd.execute(stdout, stderr, env) {
        Ok(status) => status,
        Err(e) => {
            let _ = writeln!(stderr, "liteshell: {e:#}");
            Status::failure()
        }
    };
    let _ = stdout.flush();
    status
}

fn usage_error(message: String) -> EarlyExit {
    EarlyExit {
        output: message,
        status: Err(()),
    }
}

fn usage(text: &str) -> EarlyExit {
    EarlyExit {
        output: text.to_string(),
        status: Ok(()),
    }
}

enum CdTarget {
    Home,
    Previous,
    Dir(PathBuf),
}

/// Change the current working directory.
pub struct Cd {
    target: CdTarget,
}

impl FromArgs for Cd {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let target = match args {
            [] => CdTarget::Home,
            ["--help"] => return Err(usage("Usage: cd [dir | -]")),
            ["-"] => CdTarget::Previous,
            [dir] => CdTarget::Dir(PathBuf::from(dir)),
            _ => {
                return Err(usage_error(format!(
                    "{}: too many arguments",
                    command_name.join(" ")
                )));
            }
        };
        Ok(Cd { target })
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Status> {
        match self.target {
            CdTarget::Home => {
                let home = env.home.clone().ok_or_else(|| anyhow!("cd: HOME not set"))?;
                env.change_dir(&home)?;
            }
            CdTarget::Previous => {
                let previous = env
                    .previous_dir
                    .clone()
                    .ok_or_else(|| anyhow!("cd: OLDPWD not set"))?;
                let now = env.change_dir(&previous)?;
                writeln!(stdout, "{}", now.display())?;
            }
            CdTarget::Dir(dir) => {
                env.change_dir(&dir)?;
            }
        }
        Ok(Status::success())
    }
}

#[derive(FromArgs)]
/// Show the list of built-in commands.
pub struct Help {}

impl BuiltinCommand for Help {
    fn name() -> &'static str {
        "help"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Status> {
        writeln!(stdout, "liteshell: a small interactive command interpreter")?;
        writeln!(stdout, "Built-in commands:")?;
        for builtin in Builtin::ALL {
            writeln!(stdout, "  {}", builtin.synopsis())?;
        }
        writeln!(stdout, "Other commands are executed as external programs.")?;
        Ok(Status::success())
    }
}

#[derive(FromArgs)]
/// Leave the shell.
pub struct Exit {
    #[argh(positional, greedy)]
    /// ignored.
    pub args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Status> {
        writeln!(stdout, "Goodbye!")?;
        Ok(Status::terminate())
    }
}

/// List previously entered lines.
pub struct History {
    count: Option<usize>,
}

impl FromArgs for History {
    fn from_args(command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let name = command_name.join(" ");
        match args {
            [] => Ok(History { count: None }),
            ["--help"] => Err(usage("Usage: history [n]")),
            [n] => n.parse::<usize>().map(|n| History { count: Some(n) }).map_err(|_| {
                usage_error(format!("{name}: {n}: non-negative numeric argument required"))
            }),
            _ => Err(usage_error(format!("{name}: too many arguments"))),
        }
    }
}

impl BuiltinCommand for History {
    fn name() -> &'static str {
        "history"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Status> {
        let count = self.count.unwrap_or(env.history.len());
        for (idx, line) in env.history.recent(count) {
            writeln!(stdout, "{idx:>5}  {line}")?;
        }
        Ok(Status::success())
    }
}

#[derive(FromArgs)]
/// Print the current working directory to standard output.
pub struct Pwd {}

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Status> {
        let cwd = std::env::current_dir().context("pwd")?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(Status::success())
    }
}

#[derive(FromArgs)]
/// List directory contents in name order.
pub struct Ls {
    #[argh(switch, short = 'a')]
    /// include entries whose names begin with a dot.
    pub all: bool,

    #[argh(switch, short = 'l')]
    /// show type, permissions and size before each name.
    pub long: bool,

    #[argh(positional, greedy)]
    /// directories or files to list; defaults to the current directory.
    pub paths: Vec<String>,
}

impl Ls {
    fn list_dir(&self, dir: &Path, stdout: &mut dyn Write) -> Result<()> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .with_context(|| format!("ls: {}", dir.display()))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| self.all || !name.starts_with('.'))
            .collect();
        names.sort();
        for name in names {
            self.print_entry(&dir.join(&name), &name, stdout)?;
        }
        Ok(())
    }

    fn print_entry(&self, path: &Path, name: &str, stdout: &mut dyn Write) -> Result<()> {
        if !self.long {
            writeln!(stdout, "{name}")?;
            return Ok(());
        }
        let meta = fs::symlink_metadata(path).with_context(|| format!("ls: {}", path.display()))?;
        writeln!(stdout, "{} {:>8} {name}", mode_string(&meta), meta.len())?;
        Ok(())
    }
}

/// `drwxr-xr-x`-style rendering of an entry's type and permission bits.
fn mode_string(meta: &fs::Metadata) -> String {
    let kind = if meta.is_dir() {
        'd'
    } else if meta.file_type().is_symlink() {
        'l'
    } else {
        '-'
    };
    let mode = meta.permissions().mode();
    let mut out = String::with_capacity(10);
    out.push(kind);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

impl BuiltinCommand for Ls {
    fn name() -> &'static str {
        "ls"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        _env: &mut Environment,
    ) -> Result<Status> {
        let paths = if self.paths.is_empty() {
            vec![".".to_string()]
        } else {
            self.paths.clone()
        };
        let with_headers = paths.len() > 1;
        let mut status = Status::success();

        for (idx, path) in paths.iter().enumerate() {
            let path = Path::new(path);
            let listed = match fs::metadata(path) {
                Ok(meta) if meta.is_dir() => {
                    if with_headers {
                        if idx > 0 {
                            writeln!(stdout)?;
                        }
                        writeln!(stdout, "{}:", path.display())?;
                    }
                    self.list_dir(path, stdout)
                }
                Ok(_) => self.print_entry(path, &path.display().to_string(), stdout),
                Err(e) => Err(anyhow!("ls: {}: {}", path.display(), e)),
            };
            if let Err(e) = listed {
                writeln!(stderr, "liteshell: {e:#}")?;
                status = Status::failure();
            }
        }
        Ok(status)
    }
}

enum AliasAction {
    List,
    Define { name: String, value: String },
}

/// List or define aliases.
pub struct AliasCmd {
    action: AliasAction,
}

impl FromArgs for AliasCmd {
    fn from_args(_command_name: &[&str], args: &[&str]) -> Result<Self, EarlyExit> {
        let action = match args {
            [] => AliasAction::List,
            ["--help"] => return Err(usage("Usage: alias [name=value]")),
            // `alias ll=ls -l` arrives as several words.
            words => {
                let (name, value) = alias::parse_definition(&words.join(" "))
                    .map_err(|e| usage_error(e.to_string()))?;
                AliasAction::Define { name, value }
            }
        };
        Ok(AliasCmd { action })
    }
}

impl BuiltinCommand for AliasCmd {
    fn name() -> &'static str {
        "alias"
    }

    fn execute(
        self,
        stdout: &mut dyn Write,
        _stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> Result<Status> {
        match self.action {
            AliasAction::List => {
                for (name, value) in env.aliases.iter() {
                    writeln!(stdout, "alias {name}='{value}'")?;
                }
            }
            AliasAction::Define { name, value } => env.aliases.define(&name, &value)?,
        }
        Ok(Status::success())
    }
}
