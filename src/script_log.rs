//! Script logging for Rhai sketches.
//!
//! Scripts log through the engine's `print`/`debug` statements and the
//! `log_info`/`log_warn`/`log_error` functions. Output goes to stdout/stderr
//! with level prefixes, capped per frame so a runaway draw loop cannot flood
//! the console.

use std::sync::atomic::{AtomicU32, Ordering};

/// Maximum number of log messages allowed per frame to prevent spam.
const MAX_LOGS_PER_FRAME: u32 = 100;

/// Global counter for log messages in the current frame.
static LOG_COUNT: AtomicU32 = AtomicU32::new(0);

/// Whether we've already warned about exceeding the log limit this frame.
static WARNED_LIMIT: AtomicU32 = AtomicU32::new(0);

/// Log level for script messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Warn => "[WARN]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

/// Reset the per-frame log counter. Runs at the start of every lifecycle
/// invocation.
pub fn reset_frame_log_count() {
    LOG_COUNT.store(0, Ordering::Relaxed);
    WARNED_LIMIT.store(0, Ordering::Relaxed);
}

/// Check if we can log another message this frame.
fn can_log() -> bool {
    let count = LOG_COUNT.fetch_add(1, Ordering::Relaxed);
    if count >= MAX_LOGS_PER_FRAME {
        // Only warn once per frame about exceeding limit
        if WARNED_LIMIT.swap(1, Ordering::Relaxed) == 0 {
            emit_log(
                LogLevel::Warn,
                &format!(
                    "Script log limit exceeded ({} messages/frame). Further logs dropped.",
                    MAX_LOGS_PER_FRAME
                ),
            );
        }
        false
    } else {
        true
    }
}

/// Emit a log message at the given level.
pub fn emit_log(level: LogLevel, message: &str) {
    match level {
        LogLevel::Info => {
            println!("{} {}", level.prefix(), message);
        }
        LogLevel::Warn | LogLevel::Error => {
            eprintln!("{} {}", level.prefix(), message);
        }
    }
}

/// Log a message from a script, respecting the per-frame limit.
pub fn script_log(level: LogLevel, message: &str) {
    if can_log() {
        emit_log(level, message);
    }
}

/// Convert a Rhai Dynamic value to a string safely.
/// Never panics, handles all types gracefully.
pub fn stringify_dynamic(value: &rhai::Dynamic) -> String {
    // Try to get string directly first
    if let Ok(s) = value.clone().into_string() {
        return s;
    }

    // For arrays, stringify each element
    if value.is_array() {
        if let Some(arr) = value.clone().try_cast::<rhai::Array>() {
            let parts: Vec<String> = arr.iter().map(stringify_dynamic).collect();
            return parts.join(" ");
        }
    }

    // For maps, format as key-value pairs
    if value.is_map() {
        if let Some(map) = value.clone().try_cast::<rhai::Map>() {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, stringify_dynamic(v)))
                .collect();
            return format!("{{{}}}", parts.join(", "));
        }
    }

    if value.is_int() {
        if let Ok(i) = value.as_int() {
            return i.to_string();
        }
    }

    if value.is_float() {
        if let Ok(f) = value.as_float() {
            return format!("{}", f);
        }
    }

    if value.is_bool() {
        if let Ok(b) = value.as_bool() {
            return b.to_string();
        }
    }

    if value.is_unit() {
        return "()".to_string();
    }

    // Fallback: debug format
    format!("{:?}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stringify_string() {
        let value = rhai::Dynamic::from("hello");
        assert_eq!(stringify_dynamic(&value), "hello");
    }

    #[test]
    fn test_stringify_int() {
        let value = rhai::Dynamic::from(42_i64);
        assert_eq!(stringify_dynamic(&value), "42");
    }

    #[test]
    fn test_stringify_bool() {
        let value = rhai::Dynamic::from(true);
        assert_eq!(stringify_dynamic(&value), "true");
    }

    #[test]
    fn test_stringify_array() {
        let mut arr = rhai::Array::new();
        arr.push(rhai::Dynamic::from("energy"));
        arr.push(rhai::Dynamic::from(42_i64));
        let value = rhai::Dynamic::from(arr);
        assert_eq!(stringify_dynamic(&value), "energy 42");
    }

    #[test]
    fn test_log_level_prefix() {
        assert_eq!(LogLevel::Info.prefix(), "[INFO]");
        assert_eq!(LogLevel::Warn.prefix(), "[WARN]");
        assert_eq!(LogLevel::Error.prefix(), "[ERROR]");
    }

    #[test]
    fn test_frame_log_limit() {
        reset_frame_log_count();

        // Should be able to log up to the limit
        for _ in 0..MAX_LOGS_PER_FRAME {
            assert!(can_log());
        }

        // Next one should fail
        assert!(!can_log());

        // Reset and should work again
        reset_frame_log_count();
        assert!(can_log());
    }
}
