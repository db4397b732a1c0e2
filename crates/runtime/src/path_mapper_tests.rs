// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn identity_returns_input_unchanged() {
    let mapper = PathMapper::Identity;
    assert_eq!(mapper.to_execution("/home/user/worktree"), "/home/user/worktree");
}

#[test]
fn volume_prefix_replaces_matching_prefix() {
    let mapper = PathMapper::VolumePrefix {
        host_root: "/home/user/worktree".to_string(),
        exec_root: "/workspace".to_string(),
    };
    assert_eq!(mapper.to_execution("/home/user/worktree/src/lib.rs"), "/workspace/src/lib.rs");
}

#[test]
fn volume_prefix_trims_trailing_slash_on_host_root_before_matching() {
    let mapper = PathMapper::VolumePrefix {
        host_root: "/home/user/worktree/".to_string(),
        exec_root: "/workspace".to_string(),
    };
    assert_eq!(mapper.to_execution("/home/user/worktree/src"), "/workspace/src");
}

#[test]
fn volume_prefix_leaves_non_matching_paths_unchanged() {
    let mapper = PathMapper::VolumePrefix {
        host_root: "/home/user/worktree".to_string(),
        exec_root: "/workspace".to_string(),
    };
    assert_eq!(mapper.to_execution("/etc/passwd"), "/etc/passwd");
}

#[test]
fn volume_prefix_exact_match_yields_bare_exec_root() {
    let mapper = PathMapper::VolumePrefix {
        host_root: "/home/user/worktree".to_string(),
        exec_root: "/workspace".to_string(),
    };
    assert_eq!(mapper.to_execution("/home/user/worktree"), "/workspace");
}
