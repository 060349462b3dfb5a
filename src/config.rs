//! Startup configuration: defaults, then environment, then command line.

use crate::env;
use crate::history;
use argh::FromArgs;
use std::path::PathBuf;

const HISTORY_FILE: &str = ".liteshell_history";
const ALIAS_FILE: &str = ".liteshell_aliases";
const HISTORY_ENV: &str = "LITESHELL_HISTORY";
const ALIASES_ENV: &str = "LITESHELL_ALIASES";

#[derive(FromArgs, Debug, Default)]
/// A small interactive command interpreter with pipelines, redirection and aliases.
pub struct Args {
    #[argh(option)]
    /// file the command history is read from and written back to.
    pub history_file: Option<PathBuf>,

    #[argh(option)]
    /// file alias definitions are read from and appended to.
    pub alias_file: Option<PathBuf>,

    #[argh(option)]
    /// maximum number of history entries to keep (default 1000).
    pub history_size: Option<usize>,

    #[argh(switch)]
    /// print the prompt without colors.
    pub no_color: bool,

    #[argh(option, short = 'c')]
    /// run one command line and exit with its status.
    pub command: Option<String>,
}

/// Resolved settings for one interpreter session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub history_file: PathBuf,
    pub alias_file: PathBuf,
    pub history_size: usize,
    pub color: bool,
    pub command: Option<String>,
}

impl Config {
    /// Applies command-line flags over environment variables over defaults.
    pub fn resolve(args: Args) -> Self {
        Self::resolve_with(args, env::get_var)
    }

    fn resolve_with(args: Args, var: impl Fn(&str) -> Option<String>) -> Self {
        let home = var("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        let history_file = args
            .history_file
            .or_else(|| var(HISTORY_ENV).map(PathBuf::from))
            .unwrap_or_else(|| home.join(HISTORY_FILE));
        let alias_file = args
            .alias_file
            .or_else(|| var(ALIASES_ENV).map(PathBuf::from))
            .unwrap_or_else(|| home.join(ALIAS_FILE));

        Config {
            history_file,
            alias_file,
            history_size: args.history_size.unwrap_or(history::DEFAULT_CAPACITY),
            color: !args.no_color,
            command: args.command,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_live_in_home() {
        let config = Config::resolve_with(Args::default(), vars(&[("HOME", "/home/u")]));
        assert_eq!(config.history_file, PathBuf::from("/home/u/.liteshell_history"));
        assert_eq!(config.alias_file, PathBuf::from("/home/u/.liteshell_aliases"));
        assert_eq!(config.history_size, 1000);
        assert!(config.color);
        assert_eq!(config.command, None);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = Config::resolve_with(
            Args::default(),
            vars(&[
                ("HOME", "/home/u"),
                ("LITESHELL_HISTORY", "/tmp/h"),
                ("LITESHELL_ALIASES", "/tmp/a"),
            ]),
        );
        assert_eq!(config.history_file, PathBuf::from("/tmp/h"));
        assert_eq!(config.alias_file, PathBuf::from("/tmp/a"));
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::from_args(
            &["liteshell"],
            &["--history-file", "/x/h", "--history-size", "5", "--no-color", "-c", "ls"],
        )
        .unwrap();
        let config = Config::resolve_with(args, vars(&[("LITESHELL_HISTORY", "/tmp/h")]));
        assert_eq!(config.history_file, PathBuf::from("/x/h"));
        assert_eq!(config.history_size, 5);
        assert!(!config.color);
        assert_eq!(config.command.as_deref(), Some("ls"));
    }
}
