//! Command-line compiler: turns a word sequence into a [`Pipeline`].

use crate::lexer::Token;
use log::debug;
use std::path::PathBuf;
use thiserror::Error;

const PIPE: &str = "|";
const BACKGROUND: &str = "&";

/// Kind of redirection
///
/// Defines the specific operation mode for an I/O redirection (`<`, `>`, `>>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// Input redirection (`<`): Reads standard input from a specified file.
    Input,
    /// Output redirection (`>`): Writes standard output to a file, **overwriting** the file if it exists.
    Output,
    /// Output redirection with append (`>>`): Writes standard output to a file, **appending** to the file if it exists.
    Append,
}

impl RedirectKind {
    fn from_operator(token: &str) -> Option<Self> {
        match token {
            "<" => Some(RedirectKind::Input),
            ">" => Some(RedirectKind::Output),
            ">>" => Some(RedirectKind::Append),
            _ => None,
        }
    }
}

fn is_operator(token: &str) -> bool {
    token == PIPE || token == BACKGROUND || RedirectKind::from_operator(token).is_some()
}

/// One stage of a pipeline: an argument vector plus its own redirections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    /// `argv[0]` is the program or built-in name.
    pub argv: Vec<String>,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    /// Open `output` for appending instead of truncating it.
    pub append: bool,
}

impl Command {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or_default()
    }

    pub fn has_redirects(&self) -> bool {
        self.input.is_some() || self.output.is_some()
    }

    /// A repeated operator overwrites the earlier target.
    fn redirect(&mut self, kind: RedirectKind, target: Token) {
        match kind {
            RedirectKind::Input => self.input = Some(PathBuf::from(target)),
            RedirectKind::Output | RedirectKind::Append => {
                self.output = Some(PathBuf::from(target));
                self.append = kind == RedirectKind::Append;
            }
        }
    }
}

/// An ordered, non-empty chain of stages connected by pipes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
    pub is_background: bool,
}

impl Pipeline {
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Errors that abort compilation of a whole line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("syntax error: expected a file name after `{operator}`")]
    DanglingRedirect { operator: String },
}

/// Compiles `tokens` into a pipeline.
///
/// Returns `Ok(None)` when nothing runnable remains, e.g. a line made only of
/// pipe operators. Empty stages are dropped. A redirection binds to the stage
/// that is open at its position in the token order.
pub fn compile(tokens: Vec<Token>) -> Result<Option<Pipeline>, SyntaxError> {
    let mut tokens = tokens;
    let is_background = tokens.last().is_some_and(|t| t == BACKGROUND);
    if is_background {
        tokens.pop();
    }

    let mut stages: Vec<Command> = Vec::new();
    let mut current = Command::default();
    let mut iter = tokens.into_iter();

    while let Some(token) = iter.next() {
        if let Some(kind) = RedirectKind::from_operator(&token) {
            match iter.next() {
                Some(target) if !is_operator(&target) => current.redirect(kind, target),
                _ => return Err(SyntaxError::DanglingRedirect { operator: token }),
            }
        } else if token == PIPE {
            stages.push(std::mem::take(&mut current));
        } else {
            current.argv.push(token);
        }
    }
    stages.push(current);

    let commands: Vec<Command> = stages
        .into_iter()
        .filter(|stage| !stage.argv.is_empty())
        .collect();
    if commands.is_empty() {
        return Ok(None);
    }

    let pipeline = Pipeline {
        commands,
        is_background,
    };
    debug!("compiled: {:?}", pipeline);
    Ok(Some(pipeline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_tokens;
    use std::path::Path;

    fn compile_line(line: &str) -> Result<Option<Pipeline>, SyntaxError> {
        compile(split_into_tokens(line))
    }

    fn pipeline(line: &str) -> Pipeline {
        compile_line(line).unwrap().expect("non-empty pipeline")
    }

    #[test]
    fn simple_command() {
        let p = pipeline("ls -l /tmp");
        assert_eq!(p.len(), 1);
        assert!(!p.is_background);
        assert_eq!(p.commands[0].argv, vec!["ls", "-l", "/tmp"]);
        assert_eq!(p.commands[0].program(), "ls");
        assert_eq!(p.commands[0].args(), &["-l".to_string(), "/tmp".to_string()]);
    }

    #[test]
    fn redirections_leave_argv() {
        let p = pipeline("sort < in.txt > out.txt");
        let cmd = &p.commands[0];
        assert_eq!(cmd.argv, vec!["sort"]);
        assert_eq!(cmd.input.as_deref(), Some(Path::new("in.txt")));
        assert_eq!(cmd.output.as_deref(), Some(Path::new("out.txt")));
        assert!(!cmd.append);
    }

    #[test]
    fn append_redirection() {
        let p = pipeline("echo hi >> log.txt");
        assert_eq!(p.commands[0].output.as_deref(), Some(Path::new("log.txt")));
        assert!(p.commands[0].append);
    }

    #[test]
    fn repeated_redirection_overwrites() {
        let p = pipeline("cat > a >> b < x < y");
        let cmd = &p.commands[0];
        assert_eq!(cmd.output.as_deref(), Some(Path::new("b")));
        assert!(cmd.append);
        assert_eq!(cmd.input.as_deref(), Some(Path::new("y")));
    }

    #[test]
    fn three_stage_pipeline() {
        let p = pipeline("a x | b | c y z");
        assert_eq!(p.len(), 3);
        assert_eq!(p.commands[0].argv, vec!["a", "x"]);
        assert_eq!(p.commands[1].argv, vec!["b"]);
        assert_eq!(p.commands[2].argv, vec!["c", "y", "z"]);
    }

    #[test]
    fn redirection_binds_to_stage_before_pipe() {
        let p = pipeline("grep x < in | sort > out");
        assert_eq!(p.commands[0].input.as_deref(), Some(Path::new("in")));
        assert_eq!(p.commands[0].output, None);
        assert_eq!(p.commands[1].input, None);
        assert_eq!(p.commands[1].output.as_deref(), Some(Path::new("out")));
    }

    #[test]
    fn trailing_ampersand_sets_background() {
        let p = pipeline("sleep 10 &");
        assert!(p.is_background);
        assert_eq!(p.commands[0].argv, vec!["sleep", "10"]);
    }

    #[test]
    fn interior_ampersand_is_an_argument() {
        let p = pipeline("echo & x");
        assert!(!p.is_background);
        assert_eq!(p.commands[0].argv, vec!["echo", "&", "x"]);
    }

    #[test]
    fn empty_stages_are_dropped() {
        let p = pipeline("| a || b |");
        assert_eq!(p.len(), 2);
        assert_eq!(p.commands[0].argv, vec!["a"]);
        assert_eq!(p.commands[1].argv, vec!["b"]);
    }

    #[test]
    fn nothing_runnable() {
        assert_eq!(compile_line("|").unwrap(), None);
        assert_eq!(compile_line("&").unwrap(), None);
        assert_eq!(compile(Vec::new()).unwrap(), None);
    }

    #[test]
    fn dangling_redirection_is_error() {
        let err = compile_line("cat >").unwrap_err();
        assert_eq!(
            err,
            SyntaxError::DanglingRedirect {
                operator: ">".to_string()
            }
        );
        assert!(compile_line("cat < | wc").is_err());
        assert!(compile_line("cat > &").is_err());
        assert!(compile_line("cat >> > x").is_err());
    }

    #[test]
    fn quoted_operator_target() {
        let p = pipeline("echo hi > 'my file'");
        assert_eq!(p.commands[0].output.as_deref(), Some(Path::new("my file")));
    }
}
