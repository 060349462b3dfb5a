use anyhow::Result;
use liteshell::config::Args;
use liteshell::{Config, Interpreter};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("LITESHELL_LOG", "warn"))
        .init();

    let args: Args = argh::from_env();
    let config = Config::resolve(args);
    if !config.color {
        colored::control::set_override(false);
    }

    let mut interpreter = Interpreter::new(&config);
    if let Some(line) = &config.command {
        let status = interpreter.run_line(line);
        std::process::exit(status.code);
    }
    interpreter.repl()
}
