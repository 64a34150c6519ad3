//! Custom macros for reducing code repetition in the wallpaper engine

/// Log an error and continue execution (non-fatal error handling)
///
/// # Example
/// ```ignore
/// log_and_continue!(canvas.save(&path), "save snapshot");
/// ```
#[macro_export]
macro_rules! log_and_continue {
    ($expr:expr, $context:expr) => {
        if let Err(e) = $expr {
            log::error!("Failed to {}: {}", $context, e);
        }
    };
}

/// Emit a diagnostic line to both the log and a host text sink
///
/// The first argument is anything with a `write(&str)` method, usually an
/// `Rc<dyn TextSink>` or `&dyn TextSink`.
///
/// # Example
/// ```ignore
/// report!(sink, info, "Loading {} frames...", files.len());
/// report!(self.sink, warn, "Skipping frame: {}", e);
/// ```
#[macro_export]
macro_rules! report {
    ($sink:expr, $level:ident, $($arg:tt)+) => {{
        let line = format!($($arg)+);
        log::$level!("{}", line);
        $sink.write(&line);
    }};
}

/// Validate an enum-like string value
///
/// # Example
/// ```ignore
/// validate_enum!(level, "trace", "debug", "info", "warn", "error");
/// validate_enum!(source, "modules", "manual");
/// ```
#[macro_export]
macro_rules! validate_enum {
    ($value:expr, $($variant:expr),+) => {
        match $value {
            $($variant)|+ => Ok(()),
            _ => anyhow::bail!("Invalid value: {} (expected one of: {})", $value, [$($variant),+].join(", ")),
        }
    };
}
