use ansi_term::Colour;
use env_logger::{Builder, Env};
use std::io::Write;

/// Format a record the way the server prints it: local timestamp, coloured
/// level, module path, message.
fn format_line(record: &log::Record, colour: bool) -> String {
    let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%:z");

    let level = if colour {
        match record.level() {
            log::Level::Error => Colour::Red.paint(record.level().to_string()),
            log::Level::Warn => Colour::Yellow.paint(record.level().to_string()),
            log::Level::Info => Colour::Green.paint(record.level().to_string()),
            log::Level::Debug => Colour::Blue.paint(record.level().to_string()),
            log::Level::Trace => Colour::Purple.paint(record.level().to_string()),
        }
        .to_string()
    } else {
        record.level().to_string()
    };

    format!(
        "[{} {} {}] {}",
        timestamp,
        level,
        record.module_path().unwrap_or_default(),
        record.args()
    )
}

/// Install the stderr logger. `RUST_LOG` overrides the default `info` filter;
/// `RUST_LOG=debug` also shows swallowed client disconnects.
pub fn init() {
    let colour = std::env::var_os("NO_COLOR").is_none();

    Builder::from_env(Env::default().default_filter_or("info"))
        .format(move |buf, record| writeln!(buf, "{}", format_line(record, colour)))
        .init();
}
