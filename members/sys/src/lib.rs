//! System-call wrappers used by the mish pipeline executor.
//!
//! None of these functions allocate, so a forked child can use them on its
//! way to `exec`.

#[cfg(unix)]
#[path = "sys/unix/mod.rs"]
mod sys;

pub use self::sys::*;
