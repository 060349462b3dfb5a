use colored::Colorize;
use std::env;

const SHELL_NAME: &str = "liteshell";

/// `liteshell:<cwd> $ `, or `liteshell $ ` when the cwd cannot be read.
pub fn render() -> String {
    match env::current_dir() {
        Ok(cwd) => format!(
            "{}:{} {} ",
            SHELL_NAME.green().bold(),
            cwd.display().to_string().blue(),
            "$".red()
        ),
        Err(_) => format!("{} {} ", SHELL_NAME.green().bold(), "$".red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_names_shell_and_cwd() {
        colored::control::set_override(false);
        let cwd = env::current_dir().unwrap();
        assert_eq!(render(), format!("liteshell:{} $ ", cwd.display()));
    }
}
