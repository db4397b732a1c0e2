// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Containerized runtime variant: prepends a container-exec invocation,
//! injects env as per-variable flags, and optionally maps the caller's
//! uid/gid so bind-mounted artifacts aren't root-owned (spec.md §4.3).

use std::collections::HashMap;
use std::process::Command;

use crate::exec::Runtime;
use crate::path_mapper::PathMapper;

pub struct ContainerizedRuntime {
    container_id: String,
    path_mapper: PathMapper,
    map_uid: bool,
}

impl ContainerizedRuntime {
    pub fn new(container_id: impl Into<String>, path_mapper: PathMapper, map_uid: bool) -> Self {
        Self { container_id: container_id.into(), path_mapper, map_uid }
    }
}

impl Runtime for ContainerizedRuntime {
    fn build_command(&self, args: &[String], cwd: &str, env: Option<&HashMap<String, String>>) -> Command {
        let mut command = Command::new("docker");
        command.arg("exec");
        command.arg("-w").arg(cwd);
        if self.map_uid {
            let uid = nix::unistd::getuid();
            let gid = nix::unistd::getgid();
            command.arg("-u").arg(format!("{uid}:{gid}"));
        }
        if let Some(env) = env {
            for (key, value) in env {
                command.arg("-e").arg(format!("{key}={value}"));
            }
        }
        command.arg(&self.container_id);
        command.args(args);
        command
    }

    fn path_mapper(&self) -> &PathMapper {
        &self.path_mapper
    }
}

#[cfg(test)]
#[path = "containerized_tests.rs"]
mod tests;
