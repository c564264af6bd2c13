#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Debug,
}

impl LogLevel {
    pub fn from_header(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    /// Header value wins when present; otherwise the configured default applies.
    pub fn resolve(header: Option<&str>, configured: LogLevel) -> Self {
        match header {
            Some(value) if !value.trim().is_empty() => LogLevel::from_header(value),
            _ => configured,
        }
    }

    pub fn as_header(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    pub fn should_log_debug(&self) -> bool {
        matches!(self, LogLevel::Debug)
    }
}

/// Writes one log line. Goes to the worker console on wasm and to stderr elsewhere.
pub fn emit(tag: &str, message: &str) {
    #[cfg(target_arch = "wasm32")]
    worker::console_log!("[{}] {}", tag, message);

    #[cfg(not(target_arch = "wasm32"))]
    eprintln!("[{}] {}", tag, message);
}

/// Stable fingerprint for a phone number so request logs never carry the number itself.
pub fn phone_fingerprint(phone: &str) -> String {
    format!("{:016x}", seahash::hash(phone.as_bytes()))
}

/// Log at INFO level (always displayed)
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit("INFO", &format!($($arg)*))
    };
}

/// Log at DEBUG level (only when debug mode enabled)
#[macro_export]
macro_rules! log_debug {
    ($level:expr, $($arg:tt)*) => {
        if $level.should_log_debug() {
            $crate::logger::emit("DEBUG", &format!($($arg)*))
        }
    };
}

/// Log errors (always displayed)
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit("ERROR", &format!($($arg)*))
    };
}
