//! Platform-specific implementations.

use crate::error::{Error, Result};
use log::debug;
use std::thread::{self, JoinHandle};

#[cfg(target_os = "windows")]
mod win32;
#[cfg(target_os = "windows")]
pub use win32::*;

/// Wait for a hook thread that was told to quit.
///
/// Subscribers run on the hook thread, so a subscriber stopping capture ends
/// up here on the very thread it would wait for. In that case the thread is
/// left to finish on its own once the current callback returns.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn join_hook_thread(thread: JoinHandle<Result<()>>) -> Result<()> {
    if thread.thread().id() == thread::current().id() {
        debug!("capture stopped from the hook thread, not waiting for it");
        return Ok(());
    }

    thread
        .join()
        .map_err(|_| Error::ThreadError("failed to join hook thread".into()))?
}
