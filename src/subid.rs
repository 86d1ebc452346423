//! Reading the subordinate-ID registry
//!
//! `/etc/subuid` and `/etc/subgid` hold one entry per line,
//! `(<uid>|<username>):<start>:<length>`, naming blocks of IDs a user may
//! delegate into namespaces it creates. See `man 5 subuid`.

use std::env;
use std::ffi::CStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nix::unistd::getuid;
use tracing::debug;

use crate::idmap::{IdClass, IdRange};
use crate::range::{scan_u32, RangeSet};

/// Collect the ranges of IDs the caller may map for `class`
///
/// The result always begins with the self-range `<real-id>:1`; every
/// registry entry owned by the caller (matched by real UID or by login
/// name) appends its `start:length` block. A missing or unreadable
/// registry is a normal configuration and leaves just the self-range.
pub fn read_ranges(class: IdClass) -> RangeSet {
    let ranges = read_ranges_at(
        class.subid_path(),
        class.real_id(),
        getuid().as_raw(),
        login_name().as_deref(),
    );
    debug!(class = ?class, ranges = %ranges, "collected subordinate ranges");
    ranges
}

fn read_ranges_at(path: &Path, self_id: u32, uid: u32, user: Option<&str>) -> RangeSet {
    let mut ranges = RangeSet::self_range(self_id);
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return ranges,
    };

    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { break };
        let Some(tail) = match_caller(&line, uid, user) else {
            continue;
        };
        // A matching line with a malformed tail contributes nothing.
        if let Some(range) = parse_entry_tail(tail) {
            ranges.push(range);
        }
    }
    ranges
}

/// Part of the line after the identity prefix, when the line belongs to
/// the caller
///
/// Numeric equality with the real UID wins; a line without a matching
/// numeric prefix falls through to an exact leading-field comparison
/// against the login name.
fn match_caller<'a>(line: &'a str, uid: u32, user: Option<&str>) -> Option<&'a str> {
    if let Some((value, tail)) = scan_u32(line) {
        if value == uid {
            return Some(tail);
        }
    }
    let user = user?;
    let field = line.split(':').next().unwrap_or("");
    if !user.is_empty() && field == user {
        Some(&line[user.len()..])
    } else {
        None
    }
}

/// Parse `:<start>:<length>`, requiring a separator (`:` or end of line)
/// right after the length
fn parse_entry_tail(tail: &str) -> Option<IdRange> {
    let rest = tail.strip_prefix(':')?;
    let (start, rest) = scan_u32(rest)?;
    let rest = rest.strip_prefix(':')?;
    let (length, rest) = scan_u32(rest)?;
    if length > 0 && (rest.is_empty() || rest.starts_with(':')) {
        Some(IdRange { start, length })
    } else {
        None
    }
}

/// Login name used for username matching: `$USER`, falling back to the
/// session login name
fn login_name() -> Option<String> {
    if let Ok(user) = env::var("USER") {
        if !user.is_empty() {
            return Some(user);
        }
    }
    extern "C" {
        fn getlogin_r(buf: *mut libc::c_char, bufsize: libc::size_t) -> libc::c_int;
    }
    let mut buf = [0 as libc::c_char; 256];
    let rc = unsafe { getlogin_r(buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return None;
    }
    let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
    name.to_str().ok().map(str::to_owned)
}
