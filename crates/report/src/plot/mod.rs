//! Live voltage / current / power chart on its own thread.
//!
//! The tick loop never touches the terminal: it hands each record to the
//! thread as an owned [`TickEvent`]. Quitting the chart cancels the run.

pub mod history;
pub mod ui;

use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use history::ChartHistory;
use ratatui::prelude::*;
use std::io;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use ups_core::{DerivedRecord, ReportSink, Result, TickEvent, UpsError, TIMESTAMP_FORMAT};

const REDRAW: Duration = Duration::from_millis(100);

pub struct PlotSink {
    tx: Sender<TickEvent>,
    handle: Option<JoinHandle<()>>,
}

impl PlotSink {
    /// Take over the terminal and start drawing.
    pub fn spawn(cancel: CancellationToken) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("ups-plot".into())
            .spawn(move || {
                if let Err(e) = run(&rx, &cancel) {
                    tracing::error!("Live chart stopped: {e}");
                }
            })?;
        Ok(Self {
            tx,
            handle: Some(handle),
        })
    }

    fn send(&self, event: TickEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| UpsError::Report("plot thread has exited".into()))
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        // The thread may already be gone; joining is what matters.
        let _ = self.tx.send(TickEvent::Shutdown);
        handle
            .join()
            .map_err(|_| UpsError::Report("plot thread panicked".into()))
    }
}

impl ReportSink for PlotSink {
    fn name(&self) -> &str {
        "plot"
    }

    fn report(&mut self, record: &DerivedRecord) -> Result<()> {
        self.send(TickEvent::Reading(record.clone()))
    }

    fn no_reading(&mut self, at: DateTime<Local>, error: &UpsError) -> Result<()> {
        self.send(TickEvent::NoReading {
            at,
            reason: error.to_string(),
        })
    }

    fn close(&mut self) -> Result<()> {
        self.shutdown()
    }
}

impl Drop for PlotSink {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn run(rx: &Receiver<TickEvent>, cancel: &CancellationToken) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    // Restore the terminal before a panic message is printed.
    let hook = PanicHookGuard::install(|| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    });

    let result = run_loop(&mut terminal, rx, cancel);

    drop(hook);
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        crossterm::cursor::Show
    )?;
    result
}

/// Runs `restore` ahead of the current panic hook until dropped, then puts
/// the previous hook back.
struct PanicHookGuard {
    previous: Option<Arc<PanicHook>>,
}

type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Sync + Send + 'static>;

impl PanicHookGuard {
    fn install(restore: impl Fn() + Sync + Send + 'static) -> Self {
        let previous: Arc<PanicHook> = Arc::new(std::panic::take_hook());
        let chained = Arc::clone(&previous);
        std::panic::set_hook(Box::new(move |info| {
            restore();
            (**chained)(info);
        }));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for PanicHookGuard {
    fn drop(&mut self) {
        // `take_hook` panics on a panicking thread.
        if std::thread::panicking() {
            return;
        }
        let Some(previous) = self.previous.take() else {
            return;
        };
        // Dropping our hook releases its clone of `previous`.
        drop(std::panic::take_hook());
        if let Ok(previous) = Arc::try_unwrap(previous) {
            std::panic::set_hook(previous);
        }
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    rx: &Receiver<TickEvent>,
    cancel: &CancellationToken,
) -> io::Result<()> {
    let mut history = ChartHistory::new();

    loop {
        loop {
            match rx.try_recv() {
                Ok(event) => {
                    if !apply(&mut history, event) {
                        return Ok(());
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        terminal.draw(|f| ui::draw(f, &history))?;

        if event::poll(REDRAW)? {
            if let Event::Key(key) = event::read()? {
                // Raw mode swallows SIGINT, so Ctrl-C arrives as a key.
                let ctrl_c = key.code == KeyCode::Char('c')
                    && key.modifiers.contains(KeyModifiers::CONTROL);
                let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc);
                if key.kind == KeyEventKind::Press && (quit || ctrl_c) {
                    cancel.cancel();
                }
            }
        }
    }
}

/// Fold one event into the chart. Returns `false` on shutdown.
fn apply(history: &mut ChartHistory, event: TickEvent) -> bool {
    match event {
        TickEvent::Reading(record) => history.push(&record),
        TickEvent::NoReading { at, reason } => history.mark_missed(format!(
            "{}  no reading: {reason}",
            at.format(TIMESTAMP_FORMAT)
        )),
        TickEvent::Shutdown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn guard_runs_restore_then_reinstates_previous_hook() {
        let previous_calls = Arc::new(AtomicUsize::new(0));
        let restores = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&previous_calls);
        let saved = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let counter = Arc::clone(&restores);
        let guard = PanicHookGuard::install(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let _ = std::panic::catch_unwind(|| panic!("while drawing"));
        assert_eq!(restores.load(Ordering::SeqCst), 1);
        assert_eq!(previous_calls.load(Ordering::SeqCst), 1);

        drop(guard);
        let _ = std::panic::catch_unwind(|| panic!("after teardown"));
        assert_eq!(restores.load(Ordering::SeqCst), 1);
        assert_eq!(previous_calls.load(Ordering::SeqCst), 2);

        std::panic::set_hook(saved);
    }

    #[test]
    fn shutdown_event_stops_the_thread() {
        let mut h = ChartHistory::new();
        assert!(apply(
            &mut h,
            TickEvent::NoReading {
                at: Local::now(),
                reason: "nack".into()
            }
        ));
        assert!(h.status().contains("no reading: nack"));
        assert!(!apply(&mut h, TickEvent::Shutdown));
    }
}
