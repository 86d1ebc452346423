//! Entering a rootless mount+user namespace
//!
//! The sequence is strictly linear: capture the caller's effective IDs,
//! collect subordinate ranges, unshare, adjust `/` propagation, then run
//! the mapping tool once per ID class. Every failure is final; nothing
//! is retried and no already-established namespace state is unwound.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use nix::mount::{mount, MsFlags};
use nix::sched::unshare;
use nix::unistd::getpid;
use tracing::debug;

use crate::error::{Error, Result};
use crate::idmap::IdClass;
use crate::io_util;
use crate::namespace::Namespace;
use crate::subid::read_ranges;
use crate::tool::run_mapping_tool;

const SETGROUPS_PATH: &str = "/proc/self/setgroups";

/// Default propagation applied to `/` after unsharing: recursively
/// private, so mount events no longer leak into the parent namespace.
pub const PROPAGATION_DEFAULT: MsFlags = MsFlags::MS_REC.union(MsFlags::MS_PRIVATE);

/// Whether the new namespace may call `setgroups(2)`
///
/// Denying is required before a gid map can be written directly by an
/// unprivileged process; when the maps go through `newgidmap` the kernel
/// does not insist on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetGroups {
    /// Permit `setgroups` inside the new namespace
    Allow,
    /// Deny `setgroups` inside the new namespace
    Deny,
}

impl SetGroups {
    fn as_bytes(&self) -> &'static [u8] {
        match *self {
            SetGroups::Allow => b"allow",
            SetGroups::Deny => b"deny",
        }
    }
}

/// Builder for entering a rootless user namespace
///
/// Unshares the mount and user namespaces of the calling process and
/// delegates the uid/gid map writes to the privileged mapping tools,
/// feeding them the subordinate ranges the caller owns.
///
/// ```no_run
/// use rootless::UserNs;
///
/// UserNs::new().enter().expect("failed to enter user namespace");
/// ```
pub struct UserNs {
    propagation: MsFlags,
    uid_tool: PathBuf,
    gid_tool: PathBuf,
    setgroups: Option<SetGroups>,
}

impl UserNs {
    /// New builder with the stock configuration: recursively-private `/`
    /// propagation, mapping tools at their distribution paths and the
    /// setgroups control file left untouched.
    pub fn new() -> UserNs {
        UserNs {
            propagation: PROPAGATION_DEFAULT,
            uid_tool: IdClass::Uid.tool_path().to_path_buf(),
            gid_tool: IdClass::Gid.tool_path().to_path_buf(),
            setgroups: None,
        }
    }

    /// Set the mount propagation flags applied to `/` after unsharing
    ///
    /// An empty flag set skips the remount entirely.
    pub fn propagation(&mut self, flags: MsFlags) -> &mut UserNs {
        self.propagation = flags;
        self
    }

    /// Set paths to the command-line utilities for writing uid/gid maps
    ///
    /// The utilities must obey the same interface as `newuidmap` and
    /// `newgidmap` from `shadow`. To get them working you usually need
    /// to set up `/etc/subuid` and `/etc/subgid` for the calling user.
    ///
    /// See `man 1 newuidmap`, `man 1 newgidmap` for details
    pub fn map_tools<A: AsRef<Path>, B: AsRef<Path>>(
        &mut self,
        newuidmap: A,
        newgidmap: B,
    ) -> &mut UserNs {
        self.uid_tool = newuidmap.as_ref().to_path_buf();
        self.gid_tool = newgidmap.as_ref().to_path_buf();
        self
    }

    /// Control `setgroups(2)` availability inside the new namespace
    pub fn setgroups(&mut self, ctl: SetGroups) -> &mut UserNs {
        self.setgroups = Some(ctl);
        self
    }

    /// Enter the namespace
    ///
    /// On success the process runs inside a fresh mount+user namespace
    /// with both ID maps in place. On failure the process may already
    /// have unshared; there is no rollback.
    pub fn enter(&self) -> Result<()> {
        // Effective IDs and subordinate ranges must be captured before
        // unshare; afterwards the process only sees the overflow IDs.
        let euid = IdClass::Uid.effective_id();
        let egid = IdClass::Gid.effective_id();
        let uid_ranges = read_ranges(IdClass::Uid);
        let gid_ranges = read_ranges(IdClass::Gid);

        let flags = Namespace::Mount.to_clone_flag() | Namespace::User.to_clone_flag();
        unshare(flags).map_err(Error::Unshare)?;
        debug!("unshared mount and user namespaces");

        self.set_propagation()?;

        if let Some(ctl) = self.setgroups {
            setgroups_control(ctl)?;
        }

        let pid = getpid();
        let status = run_mapping_tool(&self.uid_tool, pid, &uid_ranges, euid)?;
        if !status.success() {
            return Err(Error::ToolStatus { tool: self.uid_tool.clone(), status });
        }
        let status = run_mapping_tool(&self.gid_tool, pid, &gid_ranges, egid)?;
        if !status.success() {
            return Err(Error::ToolStatus { tool: self.gid_tool.clone(), status });
        }
        Ok(())
    }

    fn set_propagation(&self) -> Result<()> {
        if self.propagation.is_empty() {
            return Ok(());
        }
        mount(Some("none"), "/", None::<&str>, self.propagation, None::<&str>)
            .map_err(Error::Propagation)?;
        debug!(flags = ?self.propagation, "changed root filesystem propagation");
        Ok(())
    }
}

impl Default for UserNs {
    fn default() -> UserNs {
        UserNs::new()
    }
}

impl fmt::Debug for UserNs {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "<UserNs uidmap={:?} gidmap={:?}", self.uid_tool, self.gid_tool)?;
        if !self.propagation.is_empty() {
            write!(fmt, "; propagation={:?}", self.propagation)?;
        }
        if let Some(ctl) = self.setgroups {
            write!(fmt, "; setgroups={:?}", ctl)?;
        }
        write!(fmt, ">")
    }
}

/// Write the setgroups control file; a kernel without it is fine
fn setgroups_control(ctl: SetGroups) -> Result<()> {
    let mut file = match OpenOptions::new().write(true).open(SETGROUPS_PATH) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(Error::SetGroups(e)),
    };
    io_util::write_all(&mut file, ctl.as_bytes()).map_err(Error::SetGroups)
}
