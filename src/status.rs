use std::fmt;

use libc::c_int;
use nix::sys::signal::Signal;

/// The exit status of a mapping-tool process
///
/// Returned by `run_mapping_tool` once the tool has terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// Process exited normally with some exit code
    Exited(i8),
    /// Process was killed by a signal (bool flag is true when core is dumped)
    Signaled(Signal, bool),
}

impl ExitStatus {
    /// Returns `true` if this exit status means successful exit
    pub fn success(&self) -> bool {
        self == &ExitStatus::Exited(0)
    }

    /// Returns exit code if the process has exited normally
    pub fn code(&self) -> Option<i32> {
        match *self {
            ExitStatus::Exited(e) => Some(e as i32),
            ExitStatus::Signaled(_, _) => None,
        }
    }

    /// Returns signal number if the process was killed by signal
    pub fn signal(&self) -> Option<i32> {
        match *self {
            ExitStatus::Exited(_) => None,
            ExitStatus::Signaled(sig, _) => Some(sig as i32),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        use self::ExitStatus::*;
        match *self {
            Exited(c) => write!(fmt, "exited with code {}", c),
            Signaled(sig, false) => {
                write!(fmt, "killed by signal {}[{}]", sig.as_str(), sig as c_int)
            }
            Signaled(sig, true) => {
                write!(fmt, "killed by signal {}[{}] (core dumped)", sig.as_str(), sig as c_int)
            }
        }
    }
}
