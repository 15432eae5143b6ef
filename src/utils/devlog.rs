//! `dev6!` bench lines. Each line goes to the `mangolite::dev6` log target and, while a
//! capture is active on the current thread, into a per-thread buffer tests can read.

use std::cell::{Cell, RefCell};

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Active capture on one thread; dropping it stops capturing and discards leftovers.
#[must_use = "capture stops when the guard is dropped"]
pub struct DevSinkGuard(());

impl Drop for DevSinkGuard {
    fn drop(&mut self) {
        CAPTURING.with(|on| on.set(false));
        CAPTURED.with(|buf| buf.borrow_mut().clear());
    }
}

/// Starts capturing `dev6!` lines emitted on this thread.
pub fn enable_thread_sink() -> DevSinkGuard {
    CAPTURED.with(|buf| buf.borrow_mut().clear());
    CAPTURING.with(|on| on.set(true));
    DevSinkGuard(())
}

pub fn write_str(line: &str) {
    if CAPTURING.with(Cell::get) {
        CAPTURED.with(|buf| buf.borrow_mut().push(line.to_owned()));
    }
}

/// Takes every line captured so far on this thread.
#[must_use]
pub fn drain() -> Vec<String> {
    CAPTURED.with(|buf| std::mem::take(&mut *buf.borrow_mut()))
}

#[macro_export]
macro_rules! dev6 {
    ($($arg:tt)*) => {{
        let line = format!($($arg)*);
        $crate::utils::devlog::write_str(&line);
        log::trace!(target: "mangolite::dev6", "{line}");
    }};
}
