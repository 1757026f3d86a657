//! Operator interrupt handling.
//!
//! SIGINT and SIGTERM only flip an atomic flag; the accept loop notices it
//! on its next wakeup and winds down.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

extern "C" fn on_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Route SIGINT and SIGTERM to the shutdown flag instead of killing the
/// process.
pub fn install_interrupt_handler() -> io::Result<()> {
    let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
    action.sa_sigaction = on_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
    // No SA_RESTART: a blocked pselect returns EINTR right away.
    action.sa_flags = 0;
    unsafe { libc::sigemptyset(&mut action.sa_mask) };

    for signal in [libc::SIGINT, libc::SIGTERM] {
        let ret = unsafe { libc::sigaction(signal, &action, std::ptr::null_mut()) };
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Stops a running server from another thread.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    requested: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// True once `shutdown` was called or the process was interrupted.
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst) || interrupted()
    }
}
