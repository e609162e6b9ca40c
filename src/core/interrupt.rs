//! Ctrl-C handling
//!
//! The first interrupt only raises a flag; the batch driver notices it between
//! steps and stops cleanly. A second interrupt kills the process outright.

use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Flag raised by the interrupt handler
pub fn flag() -> &'static AtomicBool {
    &INTERRUPTED
}

#[cfg(unix)]
extern "C" fn on_sigint(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
    // Back to the default action so a second Ctrl-C terminates
    unsafe {
        libc::signal(libc::SIGINT, libc::SIG_DFL);
    }
}

/// Route SIGINT to the interrupt flag
#[cfg(unix)]
pub fn install_handler() {
    let handler = on_sigint as extern "C" fn(libc::c_int);
    let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        log::warn!("Could not install interrupt handler; Ctrl-C will abort immediately");
    }
}

#[cfg(not(unix))]
pub fn install_handler() {
    log::debug!("No interrupt handler on this platform; Ctrl-C will abort immediately");
}
