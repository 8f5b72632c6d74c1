use console::{style, StyledObject, Term};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes log records to stderr with a colored level tag.
struct TermLogger {
    term: Term,
    level: LevelFilter,
}

fn tag(level: Level) -> StyledObject<&'static str> {
    match level {
        Level::Error => style("ERROR").red().bold(),
        Level::Warn => style(" WARN").yellow(),
        Level::Info => style(" INFO").green(),
        Level::Debug => style("DEBUG").blue(),
        Level::Trace => style("TRACE").dim(),
    }
}

impl Log for TermLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Nowhere left to report a failed write to stderr.
        let _ = self.term.write_line(&format!(
            "{} {}: {}",
            tag(record.level()),
            style(record.target()).dim(),
            record.args()
        ));
    }

    fn flush(&self) {
        let _ = self.term.flush();
    }
}

pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let logger = TermLogger {
        term: Term::stderr(),
        level,
    };
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(level);
    }
}
