//! Logging integration for django-auxilium-rs.
//!
//! Provides helpers for configuring [`tracing`]-based logging from
//! [`Settings`](crate::settings::Settings) and for creating per-decoration spans.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::settings::Settings;

/// Event targets emitted by this workspace.
const TARGETS: [&str; 3] = ["auxilium", "auxilium_core", "auxilium_functools"];

/// Level applied to every other target when `log_level` is a bare level.
const OTHER_TARGETS_LEVEL: &str = "warn";

/// Returns the filter directives for `settings.log_level`.
///
/// A bare level such as `"debug"` applies to this workspace's targets only,
/// leaving other crates at `warn`. Anything containing `=` or `,` is taken as
/// a complete directive string.
///
/// ```
/// use auxilium_core::logging::log_directives;
/// use auxilium_core::Settings;
///
/// let settings = Settings { log_level: "debug".into(), ..Settings::default() };
/// assert_eq!(
///     log_directives(&settings),
///     "warn,auxilium=debug,auxilium_core=debug,auxilium_functools=debug"
/// );
/// ```
pub fn log_directives(settings: &Settings) -> String {
    let level = settings.log_level.trim();
    if level.contains('=') || level.contains(',') {
        return level.to_string();
    }
    let level = if level.is_empty() { "info" } else { level };
    TARGETS.iter().fold(OTHER_TARGETS_LEVEL.to_string(), |mut out, target| {
        out.push(',');
        out.push_str(target);
        out.push('=');
        out.push_str(level);
        out
    })
}

/// Sets up the global tracing subscriber based on the given settings.
///
/// `RUST_LOG` wins when set; otherwise [`log_directives`] decides. In debug
/// mode a pretty format is used and each `decorate` span reports when it
/// closes; otherwise events are JSON carrying the current span. Installing
/// twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_directives(settings)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_span_events(FmtSpan::CLOSE)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .try_init()
    };
    if installed.is_err() {
        tracing::debug!("a global subscriber is already installed");
    }
}

/// Creates a tracing span covering the decoration of a single target.
///
/// All events emitted while a decorator validates its parameters and wraps
/// the target carry the target's name.
///
/// # Examples
///
/// ```
/// use auxilium_core::logging::decoration_span;
///
/// let span = decoration_span("compute");
/// let _guard = span.enter();
/// tracing::debug!("wrapping");
/// ```
pub fn decoration_span(target: &str) -> tracing::Span {
    tracing::debug_span!("decorate", target = target)
}
