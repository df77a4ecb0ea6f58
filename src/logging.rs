use flexi_logger::{DeferredNow, FlexiLoggerError, Logger, LoggerHandle};
use log::Record;
use std::io::Write;

/// Start logging to stderr.
/// `level` takes a flexi_logger spec such as `"info"` or `"prodtrack=debug"`.
///
/// Keep the returned handle alive for as long as logging is needed.
pub fn init_logging(level: Option<&str>) -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_str(level.unwrap_or("info"))?
        .format(compact_format)
        .start()
}

// "YYYY-MM-DD HH:MM:SS.mmm INF message"
fn compact_format(
    w: &mut dyn Write,
    now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_abbreviations() {
        assert_eq!(level_abbr(log::Level::Warn), "WRN");
        assert_eq!(level_abbr(log::Level::Error), "ERR");
        assert_eq!(level_abbr(log::Level::Trace), "TRC");
    }

    #[test]
    fn invalid_spec_is_rejected() {
        assert!(init_logging(Some("prodtrack=loud")).is_err());
    }
}
