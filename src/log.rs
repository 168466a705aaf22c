//! A minimal console facade, in the spirit of the teacher's `uart.rs`.
//!
//! This core has no UART of its own; instead of hardcoding an MMIO address,
//! log output is routed through a caller-installed [`Sink`]. Diagnostics
//! that Fiwix would `printk()` (most notably the out-of-memory message in
//! `get_free_page`) go through [`warn!`]/[`error!`] here.

use core::fmt;
use spin::Mutex;

/// A destination for log output. The hosting kernel installs a real one
/// (e.g. backed by its own UART/VGA driver); tests install a buffer.
pub trait Sink: Send {
    fn write_str(&mut self, s: &str);
}

static SINK: Mutex<Option<&'static mut dyn Sink>> = Mutex::new(None);

/// Installs the console sink. Not reentrant-safe to call from an interrupt
/// handler; call once during boot before any other thread logs.
pub fn set_sink(sink: &'static mut dyn Sink) {
    *SINK.lock() = Some(sink);
}

pub fn _print(args: fmt::Arguments) {
    use fmt::Write;
    struct Adapter<'a>(&'a mut dyn Sink);
    impl fmt::Write for Adapter<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            self.0.write_str(s);
            Ok(())
        }
    }
    let mut guard = SINK.lock();
    if let Some(sink) = guard.as_deref_mut() {
        let _ = Adapter(sink).write_fmt(args);
    }
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::log::_print(core::format_args!($($arg)*)));
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", core::format_args!($($arg)*)));
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => ($crate::println!("[warn] {}", core::format_args!($($arg)*)));
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => ($crate::println!("[error] {}", core::format_args!($($arg)*)));
}
