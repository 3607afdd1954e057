//! Global Logger
//!
//! Library code never writes directly to stdio (spec.md §7): every
//! human-visible failure or progress message goes through the process-wide
//! [`log`] facade, backed by [`IgnisLogger`] here. The level check is a single
//! atomic load on the fast path; listeners (console, file, ...) sit behind a
//! [`Mutex`] and are only touched once a message has already passed the level
//! filter.
//!
//! Grounded on the original `Logger`/`ConsoleLogListener`/`FileLogListener`
//! trio: a global singleton with pluggable listeners, console output colored
//! by level, file output as plain lines.

use std::fs::File;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU8, Ordering};

use parking_lot::Mutex;

/// A listener receives every record that passes the level filter.
pub trait LogListener: Send + Sync {
    fn log(&self, record: &log::Record<'_>);
    fn flush(&self) {}
}

/// Writes ANSI-colored lines to stderr.
pub struct ConsoleListener {
    color: bool,
}

impl ConsoleListener {
    #[must_use]
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    fn level_color(level: log::Level) -> &'static str {
        match level {
            log::Level::Error => "\x1b[1;31m",
            log::Level::Warn => "\x1b[1;33m",
            log::Level::Info => "\x1b[1;32m",
            log::Level::Debug => "\x1b[1;36m",
            log::Level::Trace => "\x1b[0;37m",
        }
    }
}

impl LogListener for ConsoleListener {
    fn log(&self, record: &log::Record<'_>) {
        if self.color {
            eprintln!(
                "{}[{:<5}]\x1b[0m {}",
                Self::level_color(record.level()),
                record.level(),
                record.args()
            );
        } else {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }
}

/// Appends plain `[LEVEL] message` lines to a file.
pub struct FileListener {
    file: Mutex<File>,
}

impl FileListener {
    /// # Errors
    /// Propagates the `File::create` failure.
    pub fn new(path: impl AsRef<std::path::Path>) -> std::io::Result<Self> {
        Ok(Self {
            file: Mutex::new(File::create(path)?),
        })
    }
}

impl LogListener for FileListener {
    fn log(&self, record: &log::Record<'_>) {
        let mut file = self.file.lock();
        let _ = writeln!(file, "[{}] {}", record.level(), record.args());
    }

    fn flush(&self) {
        let _ = self.file.lock().flush();
    }
}

/// The process-wide logger. Construct once via [`install`].
pub struct IgnisLogger {
    level: AtomicU8,
    listeners: Mutex<Vec<Box<dyn LogListener>>>,
}

impl IgnisLogger {
    fn new(level: log::LevelFilter) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn set_level(&self, level: log::LevelFilter) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    pub fn add_listener(&self, listener: Box<dyn LogListener>) {
        self.listeners.lock().push(listener);
    }
}

impl log::Log for IgnisLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        (metadata.level() as u8) <= self.level.load(Ordering::Relaxed)
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        for listener in self.listeners.lock().iter() {
            listener.log(record);
        }
    }

    fn flush(&self) {
        for listener in self.listeners.lock().iter() {
            listener.flush();
        }
    }
}

static LOGGER: OnceLock<IgnisLogger> = OnceLock::new();

/// Installs the global logger with a console listener and the given level.
/// Idempotent: a second call only adjusts the level of the existing logger.
pub fn install(level: log::LevelFilter) {
    let logger = LOGGER.get_or_init(|| {
        let logger = IgnisLogger::new(level);
        logger.add_listener(Box::new(ConsoleListener::new(true)));
        logger
    });
    logger.set_level(level);
    // Ignore "already set" — tests may call install() more than once.
    let _ = log::set_logger(logger).map(|()| log::set_max_level(level));
}

/// Registers an additional listener (e.g. a [`FileListener`]) on the
/// already-installed logger. No-op if [`install`] has not run yet.
pub fn add_listener(listener: Box<dyn LogListener>) {
    if let Some(logger) = LOGGER.get() {
        logger.add_listener(listener);
    }
}
