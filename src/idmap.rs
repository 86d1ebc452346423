use std::fmt;
use std::path::Path;

use nix::unistd::{getegid, geteuid, getgid, getuid};

/// Kernel ID space an operation acts on
///
/// Each class bundles the four things that differ between user and group
/// IDs: the current-id accessors, the subordinate-ID registry file, the
/// kernel map file and the privileged mapping tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdClass {
    /// User IDs
    Uid,
    /// Group IDs
    Gid,
}

impl IdClass {
    /// Real ID of the calling process in this class
    pub fn real_id(&self) -> u32 {
        match *self {
            IdClass::Uid => getuid().as_raw(),
            IdClass::Gid => getgid().as_raw(),
        }
    }

    /// Effective ID of the calling process in this class
    ///
    /// This is the outside ID that ends up mapped to 0 inside the new
    /// namespace.
    pub fn effective_id(&self) -> u32 {
        match *self {
            IdClass::Uid => geteuid().as_raw(),
            IdClass::Gid => getegid().as_raw(),
        }
    }

    /// Subordinate-ID registry consulted by `read_ranges`
    ///
    /// See `man 5 subuid` and `man 5 subgid`
    pub fn subid_path(&self) -> &'static Path {
        Path::new(match *self {
            IdClass::Uid => "/etc/subuid",
            IdClass::Gid => "/etc/subgid",
        })
    }

    /// Kernel map file the mapping tool writes on our behalf
    pub fn map_path(&self) -> &'static Path {
        Path::new(match *self {
            IdClass::Uid => "/proc/self/uid_map",
            IdClass::Gid => "/proc/self/gid_map",
        })
    }

    /// Default path of the privileged mapping tool for this class
    pub fn tool_path(&self) -> &'static Path {
        Path::new(match *self {
            IdClass::Uid => "/usr/bin/newuidmap",
            IdClass::Gid => "/usr/bin/newgidmap",
        })
    }
}

/// A contiguous block of IDs the caller may map
///
/// The parser never yields a block without a length field; a malformed
/// block is a hard error, not a zero-length range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    /// First ID of the block
    pub start: u32,
    /// Number of IDs in the block
    pub length: u32,
}

impl fmt::Display for IdRange {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}:{}", self.start, self.length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_constants_differ_per_class() {
        assert_eq!(IdClass::Uid.subid_path(), Path::new("/etc/subuid"));
        assert_eq!(IdClass::Gid.subid_path(), Path::new("/etc/subgid"));
        assert_eq!(IdClass::Uid.map_path(), Path::new("/proc/self/uid_map"));
        assert_eq!(IdClass::Gid.map_path(), Path::new("/proc/self/gid_map"));
        assert_eq!(IdClass::Uid.tool_path(), Path::new("/usr/bin/newuidmap"));
        assert_eq!(IdClass::Gid.tool_path(), Path::new("/usr/bin/newgidmap"));
    }

    #[test]
    fn range_displays_as_start_colon_length() {
        let range = IdRange { start: 100000, length: 65536 };
        assert_eq!(range.to_string(), "100000:65536");
    }
}
