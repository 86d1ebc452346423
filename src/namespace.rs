use nix::sched::CloneFlags;

/// Namespace unshared when entering the rootless environment
///
/// See `man 7 namespaces` for more information
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Namespace {
    /// The mount namespace. It basically means that you can now mount
    /// and unmount folders without touching parent mount points.
    ///
    /// But note that you also have to make all your mountpoints
    /// non-shareable or changes will be propagated to the parent
    /// namespace anyway.
    Mount,
    /// The user namespace. This allows an unprivileged user to be root
    /// inside the new namespace and to change mappings between real
    /// (outer) IDs and the inner ones.
    ///
    /// This one is required to unshare any other namespace without root
    /// privileges.
    ///
    /// See `man 7 user_namespaces` for more information.
    User,
}

impl Namespace {
    /// Convert namespace to a clone flag passed to syscalls
    pub fn to_clone_flag(&self) -> CloneFlags {
        match *self {
            Namespace::Mount => CloneFlags::CLONE_NEWNS,
            Namespace::User => CloneFlags::CLONE_NEWUSER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_flags_match_the_kernel_constants() {
        assert_eq!(Namespace::Mount.to_clone_flag(), CloneFlags::CLONE_NEWNS);
        assert_eq!(Namespace::User.to_clone_flag(), CloneFlags::CLONE_NEWUSER);
    }
}
