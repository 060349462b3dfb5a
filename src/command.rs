/// Conventional process exit code type used by this crate.
///
/// A value of 0 indicates success; any non-zero value indicates failure.
/// This mirrors the convention used by POSIX shells and many command-line tools.
pub type ExitCode = i32;

/// Exit code reported when a program image could not be executed.
pub const EXIT_NOT_FOUND: ExitCode = 127;

/// Whether the interpreter loop should keep reading lines after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Terminate,
}

/// Result of running one submitted line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub code: ExitCode,
    pub flow: Flow,
}

impl Status {
    pub fn success() -> Self {
        Self::with_code(0)
    }

    pub fn failure() -> Self {
        Self::with_code(1)
    }

    pub fn with_code(code: ExitCode) -> Self {
        Self {
            code,
            flow: Flow::Continue,
        }
    }

    /// Status returned by `exit`: the loop stops after this line.
    pub fn terminate() -> Self {
        Self {
            code: 0,
            flow: Flow::Terminate,
        }
    }

    pub fn is_terminate(&self) -> bool {
        self.flow == Flow::Terminate
    }
}
