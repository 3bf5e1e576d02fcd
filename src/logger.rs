//! Terminal output for builds.
//!
//! - `log!` prints one line tagged with a colored `[module]` prefix
//! - `debug!` macro, only printed with `--verbose`
//! - `ProgressLine` for the single-line render counter
//!
//! ```ignore
//! log!("build"; "rendering {} pages", count);
//!
//! let progress = ProgressLine::new(&[("render", 69)]);
//! progress.inc("render");
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Nonzero while a progress line owns the current terminal line
static BAR_COUNT: AtomicUsize = AtomicUsize::new(0);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Print a formatted message under a module tag.
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Like `log!`, but silent unless `--verbose` was given.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Print `[module] message`, first clearing any progress line in the way.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    if BAR_COUNT.load(Ordering::SeqCst) > 0 {
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    }

    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// `[module]` colored by role: build steps blue, success green, errors red.
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "build" => prefix.bright_blue().bold().to_string(),
        "done" | "manifest" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

/// In-place counters on a single terminal line
///
/// Displays: `[build] render(42/69)`
///
/// Counters update in place. Uses `try_lock` so worker threads never block
/// on the terminal; if the display is busy the refresh is skipped. Nothing
/// is drawn when stdout is not a terminal.
pub struct ProgressLine {
    counters: Vec<Counter>,
    lock: Mutex<()>,
    interactive: bool,
}

struct Counter {
    name: &'static str,
    total: usize,
    current: AtomicUsize,
}

impl ProgressLine {
    /// Create a new progress display. Only counters with total > 0 are shown.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|(name, total)| Counter {
                name,
                total: *total,
                current: AtomicUsize::new(0),
            })
            .collect();

        let interactive = stdout().is_terminal();
        if interactive {
            BAR_COUNT.store(1, Ordering::SeqCst);
        }

        let progress = Self {
            counters,
            lock: Mutex::new(()),
            interactive,
        };
        progress.display(false);
        progress
    }

    /// Bump `name`'s counter. Unknown names are ignored.
    pub fn inc(&self, name: &str) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.current.fetch_add(1, Ordering::Relaxed);
        if let Some(_guard) = self.lock.try_lock() {
            self.display(false);
        }
    }

    fn line(&self) -> String {
        self.counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.current.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn display(&self, newline: bool) {
        if !self.interactive || self.counters.is_empty() {
            return;
        }
        let prefix = colorize_prefix("build");
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        if newline {
            writeln!(stdout, "{prefix} {}", self.line()).ok();
        } else {
            write!(stdout, "{prefix} {}", self.line()).ok();
        }
        stdout.flush().ok();
    }

    /// Finish progress display, keeping the final line.
    pub fn finish(self) {
        {
            let _guard = self.lock.lock();
            self.display(true);
        }
        BAR_COUNT.store(0, Ordering::SeqCst);
        // Keep the final line on screen
        std::mem::forget(self);
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        BAR_COUNT.store(0, Ordering::SeqCst);
        if self.interactive {
            let mut stdout = stdout().lock();
            execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
            stdout.flush().ok();
        }
    }
}
