//! Logger setup.

use std::sync::Once;

use log::LevelFilter;

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

static INIT: Once = Once::new();

/// Formats records as `[time LEVEL target] message`.
fn dispatch(level: LevelFilter) -> fern::Dispatch {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format(TIMESTAMP),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
}

/// Installs the stdout logger once. Later calls do nothing and return `Ok`.
///
/// Fails if a different logger was installed first.
pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut result = Ok(());
    INIT.call_once(|| {
        result = dispatch(level).chain(std::io::stdout()).apply();
        if result.is_ok() {
            log::debug!("logging initialized at {level}");
        }
    });
    result
}
