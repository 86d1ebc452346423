//! Enter a rootless Linux user namespace
//!
//! An unprivileged process cannot write its own `/proc/<pid>/uid_map`
//! for ID ranges it does not already own. This crate unshares the mount
//! and user namespaces of the calling process, collects the
//! subordinate-ID ranges the caller is allowed to map (`/etc/subuid`,
//! `/etc/subgid`) and delegates the actual map writes to the setuid
//! helpers `newuidmap` and `newgidmap`.
//!
//! # Example
//!
//! ```no_run
//! use rootless::UserNs;
//!
//! UserNs::new().enter().expect("failed to enter user namespace");
//! // The process now runs in a fresh mount+user namespace with its
//! // uid/gid maps in place; typically it execs something next.
//! ```
//!
//! The lower-level pieces are exported too: `read_ranges` collects a
//! caller's subordinate ranges for one ID class, and `run_mapping_tool`
//! drives a single mapping-tool invocation.
//!
//! See `man 7 user_namespaces`, `man 5 subuid` and `man 1 newuidmap`
//! for the system pieces this builds on.

mod enter;
mod error;
mod ffi_util;
mod idmap;
mod io_util;
mod namespace;
mod range;
mod status;
mod subid;
mod tool;

pub use enter::{SetGroups, UserNs, PROPAGATION_DEFAULT};
pub use error::{Error, Result};
pub use idmap::{IdClass, IdRange};
pub use namespace::Namespace;
pub use range::{RangeIter, RangeSet};
pub use status::ExitStatus;
pub use subid::read_ranges;
pub use tool::run_mapping_tool;

// Re-exported so callers can build propagation flag sets for `UserNs`
// without depending on nix themselves.
pub use nix::mount::MsFlags;
