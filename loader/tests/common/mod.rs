//! Shared test infrastructure: a scripted stand-in for `zygiskd`.
//!
//! Each [`StubDaemon`] listens on the real socket name inside its own
//! `tempfile` directory and serves exactly one connection with the handler
//! supplied by the test.

#![allow(dead_code)]

use std::os::unix::net::{UnixListener, UnixStream};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::TempDir;
use zygisk_loader::{DaemonClient, SocketAction, UnixStreamExt};

/// Retry pause used by test clients, so failing tests don't crawl.
pub const TEST_RETRY_INTERVAL: Duration = Duration::from_millis(10);

pub struct StubDaemon {
    dir: TempDir,
    handle: Option<JoinHandle<()>>,
}

impl StubDaemon {
    /// Binds the daemon socket and serves one connection with `handler` on a thread.
    pub fn serve<F>(handler: F) -> Self
    where
        F: FnOnce(UnixStream) + Send + 'static,
    {
        let dir = TempDir::new().unwrap();
        let listener = UnixListener::bind(DaemonClient::new(dir.path()).socket_path()).unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            handler(stream);
        });
        Self {
            dir,
            handle: Some(handle),
        }
    }

    /// Like [`StubDaemon::serve`], but first checks the action byte.
    pub fn expect<F>(action: SocketAction, handler: F) -> Self
    where
        F: FnOnce(UnixStream) + Send + 'static,
    {
        Self::serve(move |mut stream| {
            assert_eq!(stream.read_u8().unwrap(), u8::from(action));
            handler(stream);
        })
    }

    pub fn client(&self) -> DaemonClient {
        DaemonClient::new(self.dir.path()).with_retry_interval(TEST_RETRY_INTERVAL)
    }

    /// Waits for the handler, re-raising any assertion it failed.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("stub daemon panicked");
        }
    }
}

/// A client pointed at an empty directory: nobody is listening.
pub fn unreachable_client() -> (TempDir, DaemonClient) {
    let dir = TempDir::new().unwrap();
    let client = DaemonClient::new(dir.path()).with_retry_interval(TEST_RETRY_INTERVAL);
    (dir, client)
}

/// Encodes a string the way the daemon does, for replies built by hand.
pub fn string_field(value: &str) -> Vec<u8> {
    let mut buf = value.len().to_ne_bytes().to_vec();
    buf.extend_from_slice(value.as_bytes());
    buf
}
