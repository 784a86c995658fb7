// src/mount.rs

//! Client side of the daemon's mount namespace handoff.
//!
//! The daemon keeps descriptors for the namespaces it manages open in its own
//! process. On request it replies with its pid and the descriptor number, which
//! the caller reaches through `/proc/<pid>/fd/<fd>` while the daemon holds it.

use anyhow::{Context, Result};
use log::trace;
use rustix::thread as rustix_thread;
use std::fs;
use std::os::fd::AsFd;
use std::path::{Path, PathBuf};

/// The mount namespace a process asks the daemon for.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
#[repr(u8)]
pub enum MountNamespace {
    /// A "clean" namespace with all root-related mounts removed.
    Clean,
    /// The root namespace of the system, as seen by Zygote.
    Root,
}

impl From<MountNamespace> for u8 {
    fn from(value: MountNamespace) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for MountNamespace {
    type Error = anyhow::Error;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MountNamespace::Clean),
            1 => Ok(MountNamespace::Root),
            _ => anyhow::bail!("Invalid MountNamespace value: {}", value),
        }
    }
}

/// Builds the `/proc` path of a namespace descriptor held by the daemon.
///
/// A pid or fd of zero is how the daemon signals that it has no such namespace,
/// so either one yields `None`.
pub fn namespace_fd_path(pid: u32, fd: u32) -> Option<PathBuf> {
    if pid == 0 || fd == 0 {
        return None;
    }
    Some(PathBuf::from(format!("/proc/{}/fd/{}", pid, fd)))
}

/// Moves the current thread into the mount namespace referenced by `ns_path`.
///
/// `ns_path` is usually the result of an `UpdateMountNamespace` request.
pub fn enter_mount_namespace(ns_path: &Path) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mnt_ns_file = fs::File::open(ns_path)
        .with_context(|| format!("Failed to open namespace {}", ns_path.display()))?;
    rustix_thread::move_into_link_name_space(
        mnt_ns_file.as_fd(),
        Some(rustix_thread::LinkNameSpaceType::Mount),
    )
    .with_context(|| format!("setns({}) failed", ns_path.display()))?;
    // `setns` can change the current working directory, so we restore it.
    std::env::set_current_dir(cwd)?;
    trace!("Entered mount namespace {}", ns_path.display());
    Ok(())
}
