//! A small interactive command interpreter.
//!
//! A submitted line goes through alias expansion ([`alias`]), tokenizing with
//! quoting, escaping and wildcard expansion ([`lexer`], [`wildcard`]), and
//! compilation into a [`parser::Pipeline`]. A lone built-in ([`builtin`]) runs
//! in-process; everything else is handed to the process orchestrator
//! ([`exec`]), which forks one child per stage, wires pipes and file
//! redirections, and waits for the foreground job.
//!
//! The main entry point is [`Interpreter`]. Session state lives in
//! [`env::Environment`] and is loaded from and flushed to the files named by
//! [`Config`].

pub mod alias;
pub mod builtin;
pub mod command;
pub mod config;
pub mod env;
pub mod exec;
pub mod history;
mod interpreter;
pub mod lexer;
pub mod parser;
mod prompt;
pub mod signals;
pub mod wildcard;

pub use config::Config;
pub use interpreter::Interpreter;
