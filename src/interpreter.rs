use crate::alias::AliasTable;
use crate::builtin::Builtin;
use crate::command::{ExitCode, Status};
use crate::config::Config;
use crate::env::Environment;
use crate::exec::fd::Handle;
use crate::exec::{self, Launched};
use crate::history::HistoryLog;
use crate::parser::{self, Command};
use crate::signals::Supervisor;
use crate::{lexer, prompt};
use anyhow::{Context, Result};
use log::{debug, warn};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::{self, Write};

/// An interactive command interpreter.
///
/// Owns the session state ([`Environment`]) and the terminal supervisor, and
/// drives every submitted line through alias expansion, tokenizing,
/// compilation and then either a built-in or the process orchestrator.
///
/// Example
/// ```no_run
/// use liteshell::Interpreter;
/// let mut sh = Interpreter::default();
/// let status = sh.execute_line("printf 'hello\\n' | cat").unwrap();
/// assert_eq!(status.code, 0);
/// ```
pub struct Interpreter {
    env: Environment,
    supervisor: Supervisor,
    last_status: ExitCode,
}

impl Interpreter {
    /// Loads persisted history and aliases and installs signal handling.
    ///
    /// Unreadable state files are logged and replaced by empty in-memory
    /// state; they are never overwritten at shutdown.
    pub fn new(config: &Config) -> Self {
        let history = HistoryLog::load(&config.history_file, config.history_size)
            .unwrap_or_else(|e| {
                warn!("{e:#}");
                HistoryLog::in_memory(config.history_size)
            });
        let aliases = AliasTable::load(&config.alias_file).unwrap_or_else(|e| {
            warn!("{e:#}");
            AliasTable::in_memory()
        });
        Self {
            env: Environment::with_state(history, aliases),
            supervisor: Supervisor::install(),
            last_status: 0,
        }
    }

    /// An interpreter over `env` that leaves signal dispositions and the
    /// terminal untouched.
    pub fn with_environment(env: Environment) -> Self {
        Self {
            env,
            supervisor: Supervisor::detached(),
            last_status: 0,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Exit code of the most recently executed line.
    pub fn last_status(&self) -> ExitCode {
        self.last_status
    }

    /// Executes one raw line without recording it in the history.
    ///
    /// Syntax errors and launch failures are returned; failures inside a
    /// child (missing file, unknown program) only show up in its status.
    pub fn execute_line(&mut self, line: &str) -> Result<Status> {
        let expanded = self.env.aliases.expand(line).into_owned();
        let tokens = lexer::tokenize(&expanded);
        let Some(pipeline) = parser::compile(tokens)? else {
            return Ok(Status::success());
        };

        if let [stage] = pipeline.commands.as_slice() {
            if !pipeline.is_background {
                if let Some(builtin) = Builtin::from_name(stage.program()) {
                    return self.run_builtin(builtin, stage);
                }
            }
        }

        let env = &mut self.env;
        let launched = exec::launch(&pipeline, |stage| run_builtin_in_child(env, stage));
        // Stages forked before a failed launch have been reaped by now.
        if !pipeline.is_background {
            self.supervisor.restore_terminal();
        }
        match launched? {
            Launched::Foreground(report) => {
                debug!("job finished: {:?}", report.exit_codes());
                Ok(Status::with_code(report.exit_code()))
            }
            Launched::Background(pid) => {
                println!("[{pid}]");
                Ok(Status::success())
            }
        }
    }

    /// Executes one line, reporting errors on stderr instead of returning them.
    pub fn run_line(&mut self, line: &str) -> Status {
        let status = match self.execute_line(line) {
            Ok(status) => status,
            Err(e) => {
                eprintln!("liteshell: {e:#}");
                Status::failure()
            }
        };
        self.last_status = status.code;
        status
    }

    /// Records `line` in the history and runs it. Blank lines are ignored.
    pub fn submit(&mut self, line: &str) -> Status {
        if line.trim().is_empty() {
            return Status::success();
        }
        self.env.history.push(line);
        self.run_line(line)
    }

    /// Reads and runs lines until `exit` or end of input, then flushes the
    /// history.
    pub fn repl(&mut self) -> Result<()> {
        let mut editor = DefaultEditor::new().context("cannot start the line editor")?;
        for entry in self.env.history.iter() {
            let _ = editor.add_history_entry(entry);
        }
        let result = self.read_loop(&mut editor);
        self.shutdown()?;
        result
    }

    fn read_loop(&mut self, editor: &mut DefaultEditor) -> Result<()> {
        loop {
            match editor.readline(&prompt::render()) {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let _ = editor.add_history_entry(line.as_str());
                    if self.submit(&line).is_terminate() {
                        return Ok(());
                    }
                }
                // Ctrl-C at the prompt: drop the line, draw a fresh prompt.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => return Ok(()),
                Err(e) => return Err(e).context("cannot read input"),
            }
        }
    }

    /// Writes the history back to its file.
    pub fn shutdown(&mut self) -> Result<()> {
        self.env.history.flush()
    }

    /// A built-in as the only stage: runs in this process, with output
    /// redirection honoured. Input redirection has nothing to feed.
    fn run_builtin(&mut self, builtin: Builtin, stage: &Command) -> Result<Status> {
        let args: Vec<&str> = stage.args().iter().map(String::as_str).collect();
        let mut stderr = io::stderr();
        let status = match &stage.output {
            Some(path) => {
                let mut file = Handle::open_output(path, stage.append)
                    .with_context(|| path.display().to_string())?
                    .into_file();
                builtin.run(&args, &mut file, &mut stderr, &mut self.env)
            }
            None => builtin.run(&args, &mut io::stdout(), &mut stderr, &mut self.env),
        };
        Ok(status)
    }
}

impl Default for Interpreter {
    /// In-memory history and aliases, no signal handling.
    fn default() -> Self {
        Self::with_environment(Environment::new())
    }
}

/// Runs a built-in inside a forked pipeline stage; `None` for programs.
fn run_builtin_in_child(env: &mut Environment, stage: &Command) -> Option<ExitCode> {
    let builtin = Builtin::from_name(stage.program())?;
    let args: Vec<&str> = stage.args().iter().map(String::as_str).collect();
    let mut stdout = io::stdout();
    let status = builtin.run(&args, &mut stdout, &mut io::stderr(), env);
    let _ = stdout.flush();
    Some(status.code)
}
