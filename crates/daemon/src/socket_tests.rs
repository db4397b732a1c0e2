// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use super::*;

#[test]
fn hash_is_sixteen_hex_chars() {
    let hash = hash_identity(1000, Path::new("/home/u/project"));
    assert_eq!(hash.len(), 16);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn hash_is_deterministic_for_same_identity() {
    let a = hash_identity(1000, Path::new("/home/u/project"));
    let b = hash_identity(1000, Path::new("/home/u/project"));
    assert_eq!(a, b);
}

#[test]
fn hash_differs_across_worktrees() {
    let a = hash_identity(1000, Path::new("/home/u/project-a"));
    let b = hash_identity(1000, Path::new("/home/u/project-b"));
    assert_ne!(a, b);
}

#[test]
fn hash_differs_across_uids() {
    let a = hash_identity(1000, Path::new("/home/u/project"));
    let b = hash_identity(1001, Path::new("/home/u/project"));
    assert_ne!(a, b);
}

#[test]
fn lock_path_is_socket_path_with_lock_suffix() {
    let socket = Path::new("/tmp/tk-1000/abc.sock");
    assert_eq!(with_suffix(socket, ".lock"), Path::new("/tmp/tk-1000/abc.sock.lock"));
}
