//! Terminal logging with colored module prefixes and a per-stage progress line.
//!
//! ```ignore
//! log!("css"; "{} files -> {}", count, dist.display());
//! debug!("rewrite"; "{}: {} reference(s)", rel, n);
//!
//! let progress = ProgressLine::new("js", 12);
//! progress.inc();
//! progress.finish();
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream};
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

/// Set by `--verbose`.
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Whether a progress line currently occupies the last terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Macros
// ============================================================================

/// Log a message with a colored module prefix.
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message only when `--verbose` is enabled.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Output
// ============================================================================

/// Print one line, keeping an active progress line below it.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();

    execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        // The next progress refresh redraws the counter on this fresh line
        writeln!(stdout).ok();
        execute!(stdout, cursor::MoveUp(1)).ok();
    }
    stdout.flush().ok();
}

/// Colored `[module]`, honoring `--color`.
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    let style = module.to_ascii_lowercase();
    prefix
        .if_supports_color(Stream::Stdout, |p| match style.as_str() {
            "error" => p.bright_red().bold().to_string(),
            "done" => p.bright_green().bold().to_string(),
            "clean" | "config" => p.bright_blue().bold().to_string(),
            _ => p.bright_yellow().bold().to_string(),
        })
        .to_string()
}

// ============================================================================
// Progress Line
// ============================================================================

/// Single-line file counter for one stage: `[css] files(3/12)`.
///
/// Worker threads call [`inc`](Self::inc); redraws use `try_lock` so a busy
/// display never blocks a worker.
pub struct ProgressLine {
    stage: &'static str,
    total: usize,
    current: AtomicUsize,
    lock: Mutex<()>,
}

impl ProgressLine {
    pub fn new(stage: &'static str, total: usize) -> Self {
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        let progress = Self {
            stage,
            total,
            current: AtomicUsize::new(0),
            lock: Mutex::new(()),
        };
        progress.display();
        progress
    }

    #[inline]
    pub fn inc(&self) {
        self.current.fetch_add(1, Ordering::Relaxed);
        if self.lock.try_lock().is_some() {
            self.display();
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }

    fn line(&self) -> String {
        format!(
            "{} files({}/{})",
            colorize_prefix(self.stage),
            self.current(),
            self.total
        )
    }

    fn display(&self) {
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{}", self.line()).ok();
        stdout.flush().ok();
    }

    /// Clear the counter line; the stage prints its own summary.
    pub fn finish(self) {
        let _guard = self.lock.lock();
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        stdout.flush().ok();
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
    }
}
