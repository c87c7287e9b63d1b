//! Progress spinner around long calls
//!
//! [`ProgressReporter::run`] holds a [`ProgressTask`] guard for the duration
//! of the wrapped future. The guard owns a background tokio task drawing the
//! spinner; dropping the guard (normal return, error or unwinding panic)
//! cancels the task and clears the line.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::console::Console;

const FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// Draws spinners on a console
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    console: Console,
    active: Arc<AtomicUsize>,
}

impl ProgressReporter {
    pub fn new(console: Console) -> Self {
        Self { console, active: Arc::new(AtomicUsize::new(0)) }
    }

    /// Await `operation` with a spinner showing `label`
    ///
    /// The output is passed through untouched.
    pub async fn run<F>(&self, label: &str, operation: F) -> F::Output
    where
        F: Future,
    {
        let _task = self.start(label);
        operation.await
    }

    /// Start a spinner; it stops when the returned guard is dropped
    ///
    /// Inert when the console is not a terminal or no tokio runtime is
    /// running.
    pub fn start(&self, label: &str) -> ProgressTask {
        let spinner = match Handle::try_current() {
            Ok(handle) if self.console.is_terminal() => {
                let cancel = CancellationToken::new();
                let join = handle.spawn(spin(self.console.clone(), label.to_string(), cancel.clone()));
                self.active.fetch_add(1, Ordering::SeqCst);
                Some(Spinner { cancel, join, console: self.console.clone(), active: self.active.clone() })
            }
            _ => None,
        };

        ProgressTask { label: label.to_string(), started_at: Instant::now(), spinner }
    }

    /// Spinners currently drawing
    pub fn active_tasks(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

/// Scope guard for one spinner
#[derive(Debug)]
pub struct ProgressTask {
    label: String,
    started_at: Instant,
    spinner: Option<Spinner>,
}

#[derive(Debug)]
struct Spinner {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    console: Console,
    active: Arc<AtomicUsize>,
}

impl ProgressTask {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_drawing(&self) -> bool {
        self.spinner.is_some()
    }
}

impl Drop for ProgressTask {
    fn drop(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.cancel.cancel();
            spinner.join.abort();
            spinner.console.clear_line();
            spinner.active.fetch_sub(1, Ordering::SeqCst);
        }
        debug!(label = %self.label, elapsed_ms = self.started_at.elapsed().as_millis(), "Progress task finished");
    }
}

async fn spin(console: Console, label: String, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(FRAME_INTERVAL);
    for frame in FRAMES.iter().cycle() {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => console.inline(&format!("{frame} {label}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::panic::AssertUnwindSafe;

    use futures::FutureExt;

    use super::*;

    #[tokio::test]
    async fn test_output_passes_through() {
        let (console, _buffer) = Console::buffered_terminal();
        let reporter = ProgressReporter::new(console);
        let value = reporter.run("Working", async { 42 }).await;
        assert_eq!(value, 42);
        assert_eq!(reporter.active_tasks(), 0);
    }

    #[tokio::test]
    async fn test_spinner_draws_while_running() {
        let (console, buffer) = Console::buffered_terminal();
        let reporter = ProgressReporter::new(console);

        let probe = reporter.clone();
        reporter
            .run("Fetching projects", async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                assert_eq!(probe.active_tasks(), 1);
            })
            .await;

        assert_eq!(reporter.active_tasks(), 0);
        let output = buffer.contents();
        assert!(output.contains("Fetching projects"));
        assert!(output.ends_with("\r\x1b[2K"));
    }

    #[tokio::test]
    async fn test_spinner_stops_on_error() {
        let (console, buffer) = Console::buffered_terminal();
        let reporter = ProgressReporter::new(console);

        let result: Result<(), &str> = reporter
            .run("Failing", async {
                tokio::task::yield_now().await;
                Err("boom")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(reporter.active_tasks(), 0);
        assert!(buffer.contents().ends_with("\r\x1b[2K"));
    }

    #[tokio::test]
    async fn test_spinner_stops_on_panic() {
        let (console, buffer) = Console::buffered_terminal();
        let reporter = ProgressReporter::new(console);

        let outcome = AssertUnwindSafe(reporter.run("Panicking", async {
            tokio::task::yield_now().await;
            let explode = true;
            if explode {
                panic!("boom");
            }
        }))
        .catch_unwind()
        .await;

        assert!(outcome.is_err());
        assert_eq!(reporter.active_tasks(), 0);
        assert!(buffer.contents().ends_with("\r\x1b[2K"));
    }

    #[tokio::test]
    async fn test_no_spinner_without_terminal() {
        let (console, buffer) = Console::buffered();
        let reporter = ProgressReporter::new(console);

        let task = reporter.start("Quiet");
        assert!(!task.is_drawing());
        assert_eq!(reporter.active_tasks(), 0);
        drop(task);

        assert_eq!(buffer.contents(), "");
    }

    #[test]
    fn test_no_spinner_outside_runtime() {
        let (console, _buffer) = Console::buffered_terminal();
        let reporter = ProgressReporter::new(console);
        let task = reporter.start("No runtime");
        assert!(!task.is_drawing());
        assert_eq!(task.label(), "No runtime");
    }
}
