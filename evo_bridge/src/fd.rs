//! Inherited file descriptors.
//!
//! The control process hands the bridge two pipe ends by number: its stdout
//! (usually fd 0 of the bridge) and the write end of the command pipe. Both
//! are checked with `fcntl(F_GETFD)` before being wrapped in a [`File`], so
//! a wrong number fails at startup instead of on first use.

use crate::error::{BridgeError, BridgeResult};
use std::fs::File;
use std::io;
use std::os::fd::{AsRawFd, FromRawFd, RawFd};
use tracing::debug;

/// Check that `fd` refers to an open descriptor.
pub fn validate_fd(fd: RawFd) -> BridgeResult<()> {
    // SAFETY: F_GETFD only queries descriptor flags.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFD) };
    if flags < 0 {
        return Err(BridgeError::InvalidDescriptor {
            fd,
            source: io::Error::last_os_error(),
        });
    }
    Ok(())
}

/// Take ownership of an inherited descriptor.
///
/// The caller must not use `fd` afterwards; it is closed when the returned
/// [`File`] drops.
pub fn adopt_fd(fd: RawFd) -> BridgeResult<File> {
    validate_fd(fd)?;
    debug!(fd, "Adopting inherited descriptor");
    // SAFETY: fd is open and ownership is transferred to the File.
    Ok(unsafe { File::from_raw_fd(fd) })
}

/// Clear `O_NONBLOCK` so reads park the thread instead of failing with
/// `EAGAIN`.
pub fn set_blocking(file: &File) -> BridgeResult<()> {
    let fd = file.as_raw_fd();
    // SAFETY: fd is owned by `file` and stays open for the duration.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error().into());
    }
    if flags & libc::O_NONBLOCK != 0 {
        // SAFETY: as above; only the status flags are modified.
        let rc = unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) };
        if rc < 0 {
            return Err(io::Error::last_os_error().into());
        }
        debug!(fd, "Cleared O_NONBLOCK");
    }
    Ok(())
}
