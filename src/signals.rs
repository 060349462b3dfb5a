//! Signal dispositions and terminal restoration.
//!
//! The interpreter ignores interrupt, quit and stop requests so that only the
//! foreground job reacts to them. An interrupt typed while a line is being
//! edited reaches the line reader as a key press instead, which abandons the
//! line. After every foreground job the terminal is put back into the mode
//! captured at startup.

use log::{debug, warn};
use nix::sys::signal::{SigHandler, Signal, signal};
use nix::sys::termios::{self, SetArg, Termios};
use std::io::{self, IsTerminal, Write};
use std::os::fd::AsFd;

/// SGR reset: clears colours and attributes a child may have left behind.
const RESET_ATTRIBUTES: &str = "\x1b[0m";

/// Owns the terminal snapshot taken at startup.
#[derive(Debug, Default)]
pub struct Supervisor {
    saved_mode: Option<Termios>,
}

impl Supervisor {
    /// Installs the interpreter's dispositions and snapshots the terminal mode.
    pub fn install() -> Self {
        for sig in [Signal::SIGINT, Signal::SIGQUIT, Signal::SIGTSTP] {
            set_disposition(sig, SigHandler::SigIgn);
        }
        let stdin = io::stdin();
        let saved_mode = if stdin.is_terminal() {
            match termios::tcgetattr(stdin.as_fd()) {
                Ok(mode) => Some(mode),
                Err(e) => {
                    warn!("cannot read terminal attributes: {}", e);
                    None
                }
            }
        } else {
            None
        };
        Supervisor { saved_mode }
    }

    /// A supervisor that leaves dispositions and the terminal alone.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Puts the terminal back into its startup mode after a foreground job.
    pub fn restore_terminal(&self) {
        if let Some(mode) = &self.saved_mode {
            if let Err(e) = termios::tcsetattr(io::stdin().as_fd(), SetArg::TCSADRAIN, mode) {
                debug!("cannot restore terminal attributes: {}", e);
            }
        }
        let mut stdout = io::stdout();
        if stdout.is_terminal() {
            let _ = stdout.write_all(RESET_ATTRIBUTES.as_bytes());
            let _ = stdout.flush();
        }
    }
}

/// Dispositions for a freshly forked child, applied before `exec`.
///
/// Foreground children get default interrupt and quit handling back.
/// Background children keep them ignored, so an interrupt typed at the
/// prompt does not reach them. Stop requests stay ignored in both. Broken
/// pipes kill every child by default: the Rust runtime ignores `SIGPIPE`
/// and an ignored disposition survives `exec`.
pub fn reset_for_child(background: bool) {
    let handler = if background {
        SigHandler::SigIgn
    } else {
        SigHandler::SigDfl
    };
    set_disposition(Signal::SIGINT, handler);
    set_disposition(Signal::SIGQUIT, handler);
    set_disposition(Signal::SIGTSTP, SigHandler::SigIgn);
    set_disposition(Signal::SIGPIPE, SigHandler::SigDfl);
}

fn set_disposition(sig: Signal, handler: SigHandler) {
    // SAFETY: only SigIgn/SigDfl are installed, no Rust handler runs.
    if let Err(e) = unsafe { signal(sig, handler) } {
        warn!("cannot set disposition for {}: {}", sig, e);
    }
}
