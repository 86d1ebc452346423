//! Invocation of the privileged mapping tool
//!
//! An unprivileged process cannot write its own ID maps for ranges it
//! does not already own; `newuidmap`/`newgidmap` do it on our behalf.
//! The tool is forked and exec'd with a fixed argument protocol and an
//! empty environment, and its exit status is reported back verbatim.

use std::ffi::CString;
use std::fs::File;
use std::os::fd::{AsRawFd, OwnedFd};
use std::path::Path;

use libc::{c_char, c_void};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, pipe2, ForkResult, Pid};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ffi_util::{raw_with_null, ToCString};
use crate::io_util;
use crate::range::RangeSet;
use crate::status::ExitStatus;

/// Run the mapping tool at `tool` against the ID maps of `pid`
///
/// The tool is invoked as
/// `tool <pid> 0 <outside_id> 1 1 [<start> <length>]` with an empty
/// environment: one identity entry mapping inside ID 0 to `outside_id`,
/// plus the last range of `ranges`, if any. The returned status is the
/// tool's own verdict; this function only fails on its own plumbing or
/// on a malformed range list.
pub fn run_mapping_tool(
    tool: &Path,
    pid: Pid,
    ranges: &RangeSet,
    outside_id: u32,
) -> Result<ExitStatus> {
    // A missing tool is a configuration error; bail before fork.
    if tool.as_os_str().is_empty() {
        return Err(Error::ToolMissing);
    }

    let argv = build_argv(tool, pid, ranges, outside_id)?;
    debug!(tool = %tool.display(), %pid, args = ?argv, "running mapping tool");

    // Everything the child touches is laid out before fork; after it the
    // child may only execve or report failure over the pipe.
    let c_argv = raw_with_null(&argv);
    let c_envp = raw_with_null(&[]);
    let (err_rd, err_wr) = pipe2(OFlag::O_CLOEXEC).map_err(Error::CreatePipe)?;

    match unsafe { fork() }.map_err(Error::Fork)? {
        ForkResult::Child => unsafe { child_exec(argv[0].as_ptr(), &c_argv, &c_envp, &err_rd, &err_wr) },
        ForkResult::Parent { child } => {
            drop(err_wr);
            check_exec_report(err_rd, child, tool)?;
            let status = wait_child(child)?;
            debug!(tool = %tool.display(), %status, "mapping tool finished");
            Ok(status)
        }
    }
}

/// Fixed argument vector of the mapping tool
///
/// The identity entry comes first; the single trailing slot pair is
/// overwritten by each range in the list, so the tool only ever receives
/// the last one.
fn build_argv(tool: &Path, pid: Pid, ranges: &RangeSet, outside_id: u32) -> Result<Vec<CString>> {
    let mut argv = vec![
        tool.to_cstring(),
        pid.to_string().to_cstring(),
        "0".to_cstring(),
        outside_id.to_string().to_cstring(),
        "1".to_cstring(),
        "1".to_cstring(),
    ];
    let mut last = None;
    for item in ranges.iter() {
        last = Some(item?);
    }
    if let Some(range) = last {
        argv.push(range.start.to_string().to_cstring());
        argv.push(range.length.to_string().to_cstring());
    }
    Ok(argv)
}

/// Runs in the forked child and never returns. Exec failure is reported
/// as a raw errno on the error pipe; allocating here is not allowed.
unsafe fn child_exec(
    filename: *const c_char,
    argv: &[*const c_char],
    envp: &[*const c_char],
    err_rd: &OwnedFd,
    err_wr: &OwnedFd,
) -> ! {
    libc::close(err_rd.as_raw_fd());
    libc::execve(filename, argv.as_ptr(), envp.as_ptr());
    let report = Errno::last_raw().to_be_bytes();
    libc::write(
        err_wr.as_raw_fd(),
        report.as_ptr() as *const c_void,
        report.len(),
    );
    libc::_exit(127)
}

/// Distinguish a successful exec from a failed one
///
/// The error pipe is CLOEXEC, so zero bytes mean the tool image replaced
/// the child; four bytes carry the child's errno, in which case the
/// child is reaped before reporting.
fn check_exec_report(err_rd: OwnedFd, child: Pid, tool: &Path) -> Result<()> {
    let mut report = [0u8; 4];
    let mut pipe = File::from(err_rd);
    let n = io_util::read_all(&mut pipe, &mut report).map_err(Error::Pipe)?;
    if n == 0 {
        return Ok(());
    }
    let _ = wait_child(child);
    let errno = if n == report.len() {
        Errno::from_raw(i32::from_be_bytes(report))
    } else {
        Errno::UnknownErrno
    };
    Err(Error::Exec { tool: tool.to_path_buf(), errno })
}

/// Wait for `child`, retrying interrupted waits
///
/// Only termination states are possible here: the child is never traced
/// or stopped.
fn wait_child(child: Pid) -> Result<ExitStatus> {
    loop {
        match waitpid(child, None) {
            Ok(WaitStatus::Exited(_, code)) => return Ok(ExitStatus::Exited(code as i8)),
            Ok(WaitStatus::Signaled(_, sig, core)) => return Ok(ExitStatus::Signaled(sig, core)),
            Ok(_) => unreachable!(),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(Error::Wait(e)),
        }
    }
}
