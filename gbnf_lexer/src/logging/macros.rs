//! Type-safe logging macros using Code types with Display support
//!
//! Context values are `"key" => value` pairs where `value` is any `Display` type.

/// Render `"key" => value` pairs for the `*_with_context` helpers
#[doc(hidden)]
#[macro_export]
macro_rules! __log_context {
    ($($key:expr => $value:expr),*) => {
        {
            let context: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),*];
            context
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            Some($span),
            &$crate::__log_context!($($key => $value),*),
        )
    };

    ($code:expr, $message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::log_error_with_context(
            $code,
            $message,
            None,
            &$crate::__log_context!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::log_success_with_context(
            $code,
            $message,
            &$crate::__log_context!($($key => $value),*),
        )
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)*) => {
        $crate::logging::log_info_with_context($message, &$crate::__log_context!($($key => $value),*))
    };
}

// ============================================================================
// WARNING LOGGING
// ============================================================================

/// Log warning message; the first form takes an explicit code
#[macro_export]
macro_rules! log_warning {
    (code = $code:expr, $message:expr, $($key:expr => $value:expr),+) => {
        {
            let mut event = $crate::logging::LogEvent::warning_with_code($code, $message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            if let Some(logger) = $crate::logging::try_get_global_logger() {
                logger.log_event(event);
            }
        }
    };

    ($message:expr) => {
        {
            let event = $crate::logging::LogEvent::warning($message);
            if let Some(logger) = $crate::logging::try_get_global_logger() {
                logger.log_event(event);
            }
        }
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        {
            let mut event = $crate::logging::LogEvent::warning($message);
            $(
                event = event.with_context($key, &format!("{}", $value));
            )+
            if let Some(logger) = $crate::logging::try_get_global_logger() {
                logger.log_event(event);
            }
        }
    };
}

// ============================================================================
// DEBUG LOGGING
// ============================================================================

/// Log debug message; context is only formatted when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        {
            if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
                let event = $crate::logging::LogEvent::debug($message);
                if let Some(logger) = $crate::logging::try_get_global_logger() {
                    logger.log_event(event);
                }
            }
        }
    };

    ($message:expr, $($key:expr => $value:expr),+) => {
        {
            if $crate::logging::config::get_min_log_level() >= $crate::logging::LogLevel::Debug {
                let mut event = $crate::logging::LogEvent::debug($message);
                $(
                    event = event.with_context($key, &format!("{}", $value));
                )+
                if let Some(logger) = $crate::logging::try_get_global_logger() {
                    logger.log_event(event);
                }
            }
        }
    };
}
