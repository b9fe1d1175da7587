//! Busy indicator shown while an export runs.
//!
//! `start` is idempotent and installs at most one steady-tick handler until the matching
//! `stop`. [`ProgressGuard`] ties `stop` to scope exit so the indicator is cleared on every
//! path out of an export, including unwinding.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

const TITLE: &str = "vertrack is working";
const INFO: &str = "please wait...";
const TICK: Duration = Duration::from_millis(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Stderr,
    Hidden,
}

#[derive(Debug)]
pub struct ProgressIndicator {
    bar: Mutex<Option<ProgressBar>>,
    target: Target,
    registrations: AtomicUsize,
}

impl ProgressIndicator {
    /// Spinner drawn on stderr.
    pub fn stderr() -> Self {
        Self::with_target(Target::Stderr)
    }

    /// Indicator that tracks state but never draws.
    pub fn hidden() -> Self {
        Self::with_target(Target::Hidden)
    }

    fn with_target(target: Target) -> Self {
        Self {
            bar: Mutex::new(None),
            target,
            registrations: AtomicUsize::new(0),
        }
    }

    pub fn start(&self) {
        let mut slot = self.lock();
        if slot.is_some() {
            return;
        }

        let draw_target = match self.target {
            Target::Stderr => ProgressDrawTarget::stderr(),
            Target::Hidden => ProgressDrawTarget::hidden(),
        };
        let bar = ProgressBar::with_draw_target(None, draw_target);
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("{TITLE}: {INFO}"));
        bar.enable_steady_tick(TICK);

        self.registrations.fetch_add(1, Ordering::SeqCst);
        debug!("progress indicator started");
        *slot = Some(bar);
    }

    pub fn stop(&self) {
        if let Some(bar) = self.lock().take() {
            bar.finish_and_clear();
            debug!("progress indicator cleared");
        }
    }

    /// Clear the indicator regardless of who started it.
    pub fn force_clear(&self) {
        self.stop();
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of tick handlers installed over this indicator's lifetime.
    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    /// Start the indicator and return a guard that stops it when dropped.
    pub fn scope(&self) -> ProgressGuard<'_> {
        self.start();
        ProgressGuard { indicator: self }
    }

    fn lock(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.bar.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ProgressIndicator {
    fn default() -> Self {
        Self::stderr()
    }
}

#[must_use = "the indicator stops as soon as the guard is dropped"]
pub struct ProgressGuard<'a> {
    indicator: &'a ProgressIndicator,
}

impl Drop for ProgressGuard<'_> {
    fn drop(&mut self) {
        self.indicator.stop();
    }
}
