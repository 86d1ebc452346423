use std::io;
use std::path::PathBuf;

use nix::errno::Errno;

use crate::status::ExitStatus;

/// Everything that can go wrong while collecting ranges, spawning the
/// mapping tool or entering the namespace
///
/// All variants are final: nothing here is retried, and the caller (not
/// this library) decides whether a failure terminates the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A range list contains a token that does not scan as `start:length`
    #[error("invalid ID range '{0}'")]
    InvalidRange(String),

    /// No path to the mapping tool was configured
    #[error("mapping tool not present")]
    ToolMissing,

    /// Can't create the pipe used to report exec failures
    #[error("can't create pipe: {0}")]
    CreatePipe(Errno),

    /// Error when forking the mapping-tool child
    #[error("error when forking: {0}")]
    Fork(Errno),

    /// Reading the child's exec report failed
    #[error("can't read status from child: {0}")]
    Pipe(#[source] io::Error),

    /// The child could not replace its image with the mapping tool
    #[error("failed to exec {}: {errno}", tool.display())]
    Exec { tool: PathBuf, errno: Errno },

    /// Waiting for the mapping-tool child failed
    #[error("failed to wait for child: {0}")]
    Wait(Errno),

    /// The mapping tool ran but did not report success
    #[error("mapping tool {} {status}", tool.display())]
    ToolStatus { tool: PathBuf, status: ExitStatus },

    /// Unsharing the mount and user namespaces failed
    #[error("failed to unshare namespaces: {0}")]
    Unshare(Errno),

    /// Remounting `/` with the requested propagation failed
    #[error("cannot change root filesystem propagation: {0}")]
    Propagation(Errno),

    /// Writing the setgroups control file failed
    #[error("cannot write /proc/self/setgroups: {0}")]
    SetGroups(#[source] io::Error),
}

impl Error {
    /// Similarly to `io::Error` returns bare error code
    pub fn raw_os_error(&self) -> Option<i32> {
        use self::Error::*;
        match self {
            InvalidRange(_) | ToolMissing | ToolStatus { .. } => None,
            CreatePipe(e) | Fork(e) | Wait(e) | Unshare(e) | Propagation(e) => Some(*e as i32),
            Exec { errno, .. } => Some(*errno as i32),
            Pipe(e) | SetGroups(e) => e.raw_os_error(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_os_error_exposes_errno() {
        assert_eq!(Error::Unshare(Errno::EPERM).raw_os_error(), Some(libc::EPERM));
        assert_eq!(Error::ToolMissing.raw_os_error(), None);
    }

    #[test]
    fn messages_name_the_failing_operation() {
        let err = Error::Exec {
            tool: PathBuf::from("/usr/bin/newuidmap"),
            errno: Errno::ENOENT,
        };
        let text = err.to_string();
        assert!(text.contains("/usr/bin/newuidmap"), "{text}");

        let err = Error::InvalidRange("oops".into());
        assert_eq!(err.to_string(), "invalid ID range 'oops'");
    }
}
