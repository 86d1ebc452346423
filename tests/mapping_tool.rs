//! Drives the public mapping-tool surface end to end against stub tools.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use nix::unistd::getpid;
use rootless::{run_mapping_tool, IdRange, RangeSet};

/// Shell stub that records its argument vector to `out`.
fn recording_stub(dir: &tempfile::TempDir, out: &std::path::Path) -> PathBuf {
    let tool = dir.path().join("stub-newuidmap");
    fs::write(
        &tool,
        format!("#!/bin/sh\necho \"$@\" > {}\n", out.display()),
    )
    .unwrap();
    fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();
    tool
}

#[test]
fn the_tool_receives_the_fixed_argument_protocol() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("argv");
    let tool = recording_stub(&dir, &out);

    let mut ranges = RangeSet::self_range(1000);
    ranges.push(IdRange { start: 100000, length: 65536 });
    ranges.push(IdRange { start: 300000, length: 10 });

    let status = run_mapping_tool(&tool, getpid(), &ranges, 4242).unwrap();
    assert!(status.success());

    // Identity entry first, then only the last range of the list.
    let argv = fs::read_to_string(&out).unwrap();
    assert_eq!(argv.trim_end(), format!("{} 0 4242 1 1 300000 10", getpid()));
}

#[test]
fn a_bare_self_range_is_passed_through() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("argv");
    let tool = recording_stub(&dir, &out);

    let ranges = RangeSet::self_range(1000);
    let status = run_mapping_tool(&tool, getpid(), &ranges, 1000).unwrap();
    assert!(status.success());

    let argv = fs::read_to_string(&out).unwrap();
    assert_eq!(argv.trim_end(), format!("{} 0 1000 1 1 1000 1", getpid()));
}
