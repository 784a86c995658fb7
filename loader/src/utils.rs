// src/utils.rs

//! Low-level helpers for talking to the daemon.
//!
//! This module provides:
//! - Platform selection macros shared with the daemon build.
//! - A trait (`UnixStreamExt`) implementing the daemon's wire format.

use anyhow::{Result, bail};
use passfd::FdPassingExt;
use std::io::{Read, Write};
use std::os::fd::{FromRawFd, OwnedFd};
use std::os::unix::net::UnixStream;

// --- Platform-specific Macros ---

/// Selects an expression based on the target pointer width (32-bit vs 64-bit).
#[cfg(target_pointer_width = "64")]
#[macro_export]
macro_rules! lp_select {
    ($lp32:expr, $lp64:expr) => {
        $lp64
    };
}
#[cfg(target_pointer_width = "32")]
#[macro_export]
macro_rules! lp_select {
    ($lp32:expr, $lp64:expr) => {
        $lp32
    };
}

// --- Unix Socket and IPC Extensions ---

/// An extension trait for `UnixStream` to simplify reading and writing common data types.
///
/// Integers use native byte order and `usize` is the native pointer width,
/// matching the daemon built for the same ABI. Any short read or write is an error.
pub trait UnixStreamExt {
    fn read_u8(&mut self) -> Result<u8>;
    fn read_u32(&mut self) -> Result<u32>;
    fn read_usize(&mut self) -> Result<usize>;
    fn read_string(&mut self) -> Result<String>;
    fn write_u8(&mut self, value: u8) -> Result<()>;
    fn write_u32(&mut self, value: u32) -> Result<()>;
    fn write_usize(&mut self, value: usize) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    /// Receives one file descriptor attached to the next message as `SCM_RIGHTS`.
    fn recv_fd(&mut self) -> Result<OwnedFd>;
}

impl UnixStreamExt for UnixStream {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_ne_bytes(buf))
    }

    fn read_usize(&mut self) -> Result<usize> {
        let mut buf = [0u8; std::mem::size_of::<usize>()];
        self.read_exact(&mut buf)?;
        Ok(usize::from_ne_bytes(buf))
    }

    fn read_string(&mut self) -> Result<String> {
        let len = self.read_usize()?;
        // The length comes from the peer; refuse it rather than abort on OOM.
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)?;
        buf.resize(len, 0);
        self.read_exact(&mut buf)?;
        Ok(String::from_utf8(buf)?)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])?;
        Ok(())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_ne_bytes())?;
        Ok(())
    }

    fn write_usize(&mut self, value: usize) -> Result<()> {
        self.write_all(&value.to_ne_bytes())?;
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_usize(value.len())?;
        self.write_all(value.as_bytes())?;
        Ok(())
    }

    fn recv_fd(&mut self) -> Result<OwnedFd> {
        let fd = FdPassingExt::recv_fd(&*self)?;
        if fd < 0 {
            bail!("peer did not attach a file descriptor");
        }
        // SAFETY: the descriptor was just installed into our table by the kernel
        // and nothing else refers to it.
        Ok(unsafe { OwnedFd::from_raw_fd(fd) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs::File;
    use std::os::fd::AsRawFd;

    fn pair() -> (UnixStream, UnixStream) {
        UnixStream::pair().unwrap()
    }

    #[test]
    fn strings_survive_the_wire() {
        let (mut tx, mut rx) = pair();
        for s in ["", "a", "zygisk_module/lib/arm64-v8a.so"] {
            tx.write_string(s).unwrap();
            assert_eq!(rx.read_string().unwrap(), s);
        }
    }

    #[test]
    fn integers_survive_the_wire() {
        let (mut tx, mut rx) = pair();
        for v in [0u32, 1, u32::MAX] {
            tx.write_u32(v).unwrap();
            assert_eq!(rx.read_u32().unwrap(), v);
        }
        for v in [0usize, 1, usize::MAX] {
            tx.write_usize(v).unwrap();
            assert_eq!(rx.read_usize().unwrap(), v);
        }
        tx.write_u8(0xAB).unwrap();
        assert_eq!(rx.read_u8().unwrap(), 0xAB);
    }

    #[test]
    fn string_is_length_prefixed_without_terminator() {
        let (mut tx, mut rx) = pair();
        tx.write_string("abc").unwrap();
        drop(tx);
        let mut raw = Vec::new();
        rx.read_to_end(&mut raw).unwrap();
        let mut expected = 3usize.to_ne_bytes().to_vec();
        expected.extend_from_slice(b"abc");
        assert_eq!(raw, expected);
    }

    #[test]
    fn short_read_is_an_error() {
        let (mut tx, mut rx) = pair();
        tx.write_all(&[1, 2]).unwrap();
        drop(tx);
        assert!(rx.read_u32().is_err());
    }

    #[test]
    fn truncated_string_is_an_error() {
        let (mut tx, mut rx) = pair();
        tx.write_usize(10).unwrap();
        tx.write_all(b"abc").unwrap();
        drop(tx);
        assert!(rx.read_string().is_err());
    }

    #[test]
    fn absurd_string_length_is_an_error() {
        let (mut tx, mut rx) = pair();
        tx.write_usize(usize::MAX).unwrap();
        drop(tx);
        assert!(rx.read_string().is_err());
    }

    #[test]
    fn receives_passed_descriptor() {
        let (tx, mut rx) = pair();
        let file = tempfile::tempfile().unwrap();
        tx.send_fd(file.as_raw_fd()).unwrap();

        let fd = UnixStreamExt::recv_fd(&mut rx).unwrap();
        assert_ne!(fd.as_raw_fd(), file.as_raw_fd());
        let received = File::from(fd);
        assert!(received.metadata().unwrap().is_file());
    }

    #[test]
    fn recv_fd_fails_when_peer_closes() {
        let (tx, mut rx) = pair();
        drop(tx);
        assert!(UnixStreamExt::recv_fd(&mut rx).is_err());
    }
}
