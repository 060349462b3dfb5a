//! Owned descriptors for redirections and pipes.
//!
//! Every descriptor the orchestrator creates lives in a [`Handle`] and is
//! closed when the handle is dropped, on every path out of a launch.

use nix::fcntl::{FcntlArg, FdFlag, OFlag, fcntl};
use nix::{libc, unistd};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, IntoRawFd, OwnedFd, RawFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// Permission bits for files created by output redirection: rw-r--r--.
const OUTPUT_MODE: u32 = 0o644;

/// A descriptor that can be duplicated onto a standard stream.
#[derive(Debug)]
pub struct Handle(OwnedFd);

impl Handle {
    /// Opens an existing file read-only.
    pub fn open_input(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Handle(file.into()))
    }

    /// Opens `path` for writing, creating it if absent.
    pub fn open_output(path: &Path, append: bool) -> io::Result<Self> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).mode(OUTPUT_MODE);
        if append {
            options.append(true);
        } else {
            options.truncate(true);
        }
        let file = options.open(path)?;
        Ok(Handle(file.into()))
    }

    /// Makes this descriptor available as `target` (e.g. `STDIN_FILENO`)
    /// across `exec`, consuming the handle.
    ///
    /// If the descriptor already has that number (the stream was closed when
    /// we started), it is kept open with close-on-exec cleared instead.
    pub fn install_as(self, target: RawFd) -> io::Result<()> {
        if self.0.as_raw_fd() == target {
            fcntl(target, FcntlArg::F_SETFD(FdFlag::empty()))?;
            let _ = self.0.into_raw_fd();
            return Ok(());
        }
        unistd::dup2(self.0.as_raw_fd(), target)?;
        Ok(())
    }

    /// Gives up the descriptor as a writable `File`, for built-ins that run
    /// in the interpreter's own process.
    pub fn into_file(self) -> File {
        File::from(self.0)
    }
}

impl AsRawFd for Handle {
    fn as_raw_fd(&self) -> RawFd {
        self.0.as_raw_fd()
    }
}

impl From<OwnedFd> for Handle {
    fn from(fd: OwnedFd) -> Self {
        Handle(fd)
    }
}

/// Read and write ends of one anonymous pipe.
#[derive(Debug)]
struct Pipe {
    read: Handle,
    write: Handle,
}

/// The N-1 pipes joining N pipeline stages.
///
/// Pipe `i` carries stage `i`'s output to stage `i + 1`. Dropping the set
/// closes both ends of every pipe.
#[derive(Debug, Default)]
pub struct PipeSet {
    pipes: Vec<Pipe>,
}

impl PipeSet {
    /// Allocates `count` close-on-exec pipes. If an allocation fails, the
    /// pipes already created are closed before the error is returned.
    pub fn new(count: usize) -> nix::Result<Self> {
        let mut set = PipeSet {
            pipes: Vec::with_capacity(count),
        };
        for _ in 0..count {
            let (read, write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
            set.pipes.push(Pipe {
                read: read.into(),
                write: write.into(),
            });
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.pipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipes.is_empty()
    }

    /// Read end of pipe `idx`, feeding stage `idx + 1`.
    pub fn reader(&self, idx: usize) -> Option<&Handle> {
        self.pipes.get(idx).map(|p| &p.read)
    }

    /// Write end of pipe `idx`, fed by stage `idx`.
    pub fn writer(&self, idx: usize) -> Option<&Handle> {
        self.pipes.get(idx).map(|p| &p.write)
    }

    /// Wires pipeline stage `stage` onto stdin/stdout, consuming the set.
    ///
    /// Ends this stage does not use are closed first; the two it does use
    /// survive only as stdin/stdout.
    pub fn wire_stage(self, stage: usize) -> io::Result<()> {
        let mut input = None;
        let mut output = None;
        for (idx, Pipe { read, write }) in self.pipes.into_iter().enumerate() {
            if idx + 1 == stage {
                input = Some(read);
            }
            if idx == stage {
                output = Some(write);
            }
        }
        if let Some(read) = input {
            read.install_as(libc::STDIN_FILENO)?;
        }
        if let Some(write) = output {
            write.install_as(libc::STDOUT_FILENO)?;
        }
        Ok(())
    }
}
