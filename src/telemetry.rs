//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL controls the filter (e.g. "debug" or directives such as
//!   "info,passage=debug,questions=debug,lector_backend=debug").
//! - LOG_FORMAT selects "pretty" (default) or "json" structured logs.
//!
//! Targets used by the service: `lector_backend` (startup, catalog, CORS),
//! `passage` (calibration attempts) and `questions` (question generation).
//! The tower-http TraceLayer adds per-request spans on top of these.

use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: &str = "info,passage=debug,questions=debug,lector_backend=debug,tower_http=info,axum=info";

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two formats produce different subscriber types, so init in each arm.
    if wants_json(std::env::var("LOG_FORMAT").ok().as_deref()) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn wants_json(format: Option<&str>) -> bool {
    matches!(format.map(str::trim), Some(f) if f.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_directives_parse() {
        assert!(DEFAULT_DIRECTIVES.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn log_format_selection() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some(" JSON ")));
        assert!(!wants_json(Some("pretty")));
        assert!(!wants_json(None));
    }
}
