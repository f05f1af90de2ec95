//! Convenience macros for structured logging.
//!
//! This module provides macros for building argument lists and for logging
//! through a [`Chain`](crate::Chain) with inline fields.

/// Build a `[Value; N]` from heterogeneous expressions
///
/// # Example
///
/// ```ignore
/// chain.info("%s took %dms", &kv!["query", 12]);
/// logger.infow("ready", &kv!["port", 8080, "tls", true]);
/// ```
#[macro_export]
macro_rules! kv {
    () => {{
        let empty: [$crate::Value; 0] = [];
        empty
    }};
    ($($item:expr),+ $(,)?) => {
        [$($crate::Value::from($item)),+]
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __chain_log {
    ($method:ident, $chain:expr, $msg:expr) => {
        $chain.$method($msg, &[])
    };
    ($method:ident, $chain:expr, $msg:expr => { $($key:expr => $value:expr),* $(,)? }) => {
        $chain
            .with_all([$($crate::Field::any($key, $value)),*])
            .$method($msg, &[])
    };
    ($method:ident, $chain:expr, $msg:expr, $($arg:expr),+ $(,)?) => {
        $chain.$method($msg, &$crate::kv![$($arg),+])
    };
}

/// Log at Info through a chain, with inline fields or printf arguments
///
/// # Example
///
/// ```ignore
/// log_info!(chain, "Processing file" => {
///     "path" => "/path/to/file",
///     "size" => 1024,
/// });
/// log_info!(chain, "processed %d files", 3);
/// ```
#[macro_export]
macro_rules! log_info {
    ($chain:expr, $($rest:tt)+) => {
        $crate::__chain_log!(info, $chain, $($rest)+)
    };
}

/// Log at Debug through a chain
#[macro_export]
macro_rules! log_debug {
    ($chain:expr, $($rest:tt)+) => {
        $crate::__chain_log!(debug, $chain, $($rest)+)
    };
}

/// Log at Warn through a chain
#[macro_export]
macro_rules! log_warn {
    ($chain:expr, $($rest:tt)+) => {
        $crate::__chain_log!(warn, $chain, $($rest)+)
    };
}

/// Log at Error through a chain
#[macro_export]
macro_rules! log_error {
    ($chain:expr, $($rest:tt)+) => {
        $crate::__chain_log!(error, $chain, $($rest)+)
    };
}
