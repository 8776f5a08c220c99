// crates/fsoe-rs/src/log.rs
use crate::types::MapRole;
use alloc::format;
use alloc::string::String;

/// Trait for values that provide a context prefix for log messages.
pub trait LogMetadata {
    fn meta(&self) -> String;
}

impl LogMetadata for MapRole {
    fn meta(&self) -> String {
        format!("map={}", self)
    }
}

// =============================================
// Logging Macros (namespaced under crate::log)
// =============================================

// ===== my_warn! =====
macro_rules! my_warn {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::warn!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== my_error! =====
macro_rules! my_error {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::error!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== my_debug! =====
macro_rules! my_debug {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::debug!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// ===== my_trace! =====
macro_rules! my_trace {
    ($ctx:expr, $fmt:literal $(, $($arg:tt)+)?) => {{
        let meta = $crate::log::LogMetadata::meta(&$ctx);
        ::log::trace!(concat!("[{}] ", $fmt), meta $(, $($arg)+)?);
    }};
}

// Re-export macros for use in other files
pub(crate) use my_debug;
pub(crate) use my_error;
pub(crate) use my_trace;
pub(crate) use my_warn;
