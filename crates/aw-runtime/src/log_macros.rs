/// Domain-aware logging macros.
///
/// Every macro injects a `domain` field so call sites only name the area of
/// the run they belong to: `sys` (run lifecycle), `conf` (settings and
/// plugin construction), `fetch` (report downloads), `rule` (rule engine),
/// `action` (action engine).
///
/// ```ignore
/// aw_info!(sys, alerts = 2, accounts = 40, "alert run starting");
/// aw_warn!(fetch, account = %id, error = %e, "report download failed");
/// ```
///
/// The domain is a bare identifier, turned into a string literal by the
/// macro.

// ---------------------------------------------------------------------------
// Core macro
// ---------------------------------------------------------------------------

#[doc(hidden)]
macro_rules! aw_log {
    ($level:ident, $domain:ident, $($field:tt)*) => {
        tracing::$level!(domain = stringify!($domain), $($field)*)
    };
}

// ---------------------------------------------------------------------------
// Per-level macros
// ---------------------------------------------------------------------------

macro_rules! aw_error {
    ($domain:ident, $($rest:tt)*) => {
        aw_log!(error, $domain, $($rest)*)
    };
}

macro_rules! aw_warn {
    ($domain:ident, $($rest:tt)*) => {
        aw_log!(warn, $domain, $($rest)*)
    };
}

macro_rules! aw_info {
    ($domain:ident, $($rest:tt)*) => {
        aw_log!(info, $domain, $($rest)*)
    };
}

macro_rules! aw_debug {
    ($domain:ident, $($rest:tt)*) => {
        aw_log!(debug, $domain, $($rest)*)
    };
}

#[allow(unused_macros)]
macro_rules! aw_trace {
    ($domain:ident, $($rest:tt)*) => {
        aw_log!(trace, $domain, $($rest)*)
    };
}
