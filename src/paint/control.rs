use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Lifecycle of a paint job.
///
/// `Idle -> Running -> {Paused <-> Running} -> {Completed | Stopped | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintState {
    Idle,
    Running,
    Paused,
    Completed,
    Stopped,
    Failed,
}

impl PaintState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PaintState::Completed | PaintState::Stopped | PaintState::Failed
        )
    }

    pub fn is_active(self) -> bool {
        matches!(self, PaintState::Running | PaintState::Paused)
    }
}

impl std::fmt::Display for PaintState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PaintState::Idle => "idle",
            PaintState::Running => "running",
            PaintState::Paused => "paused",
            PaintState::Completed => "completed",
            PaintState::Stopped => "stopped",
            PaintState::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct Flags {
    state: PaintState,
    paused: bool,
    stopped: bool,
    started: bool,
}

/// How a job proceeds once its handle has been claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Start {
    Run,
    /// `stop` arrived before the job began.
    Cancelled,
}

#[derive(Debug)]
struct Shared {
    flags: Mutex<Flags>,
    wake: Condvar,
    pixels_done: AtomicUsize,
    pixels_total: AtomicUsize,
}

/// Cloneable remote control for one paint job.
///
/// Safe to use from any thread while the worker runs; pause waits are
/// woken through a condition variable, so `resume` and `stop` take effect
/// without waiting out a poll interval.
#[derive(Debug, Clone)]
pub struct PaintHandle {
    shared: Arc<Shared>,
}

impl Default for PaintHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl PaintHandle {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                flags: Mutex::new(Flags {
                    state: PaintState::Idle,
                    paused: false,
                    stopped: false,
                    started: false,
                }),
                wake: Condvar::new(),
                pixels_done: AtomicUsize::new(0),
                pixels_total: AtomicUsize::new(0),
            }),
        }
    }

    fn flags(&self) -> MutexGuard<'_, Flags> {
        // Flags stay consistent even if a holder panicked.
        self.shared
            .flags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> PaintState {
        self.flags().state
    }

    pub fn is_paused(&self) -> bool {
        self.flags().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.flags().stopped
    }

    /// `(pixels_done, pixels_total)` as last published by the worker.
    pub fn progress(&self) -> (usize, usize) {
        (
            self.shared.pixels_done.load(Ordering::Acquire),
            self.shared.pixels_total.load(Ordering::Acquire),
        )
    }

    /// Pause a running job. Returns whether the state changed.
    pub fn pause(&self) -> bool {
        let mut flags = self.flags();
        if flags.state != PaintState::Running {
            return false;
        }
        flags.paused = true;
        flags.state = PaintState::Paused;
        true
    }

    /// Resume a paused job. Returns whether the state changed.
    pub fn resume(&self) -> bool {
        let mut flags = self.flags();
        if flags.state != PaintState::Paused {
            return false;
        }
        flags.paused = false;
        flags.state = PaintState::Running;
        self.shared.wake.notify_all();
        true
    }

    /// Pause if running, resume if paused.
    pub fn toggle_pause(&self) -> bool {
        if self.is_paused() {
            self.resume()
        } else {
            self.pause()
        }
    }

    /// Request the job to stop. Permanent for this job.
    pub fn stop(&self) {
        let mut flags = self.flags();
        flags.stopped = true;
        flags.paused = false;
        match flags.state {
            PaintState::Idle => flags.state = PaintState::Stopped,
            PaintState::Paused => flags.state = PaintState::Running,
            _ => {}
        }
        self.shared.wake.notify_all();
    }

    /// Move `Idle -> Running`; returns the current state when the handle
    /// was already used. A handle stopped while idle is claimed once, as
    /// [`Start::Cancelled`].
    pub(crate) fn begin(&self, pixels_done: usize, pixels_total: usize) -> Result<Start, PaintState> {
        let mut flags = self.flags();
        let start = match flags.state {
            _ if flags.started => return Err(flags.state),
            PaintState::Idle => Start::Run,
            PaintState::Stopped => Start::Cancelled,
            state => return Err(state),
        };
        flags.started = true;
        if start == Start::Run {
            flags.state = PaintState::Running;
        }
        self.shared
            .pixels_total
            .store(pixels_total, Ordering::Release);
        self.shared.pixels_done.store(pixels_done, Ordering::Release);
        Ok(start)
    }

    /// Check before painting whether this handle can still start a job.
    pub(crate) fn ensure_idle(&self) -> Result<(), PaintState> {
        let flags = self.flags();
        match flags.state {
            _ if flags.started => Err(flags.state),
            PaintState::Idle | PaintState::Stopped => Ok(()),
            state => Err(state),
        }
    }

    pub(crate) fn publish_done(&self, pixels_done: usize) {
        self.shared.pixels_done.store(pixels_done, Ordering::Release);
    }

    /// Block while paused. Returns `false` once a stop has been requested.
    ///
    /// `poll` bounds how long a single wait lasts before flags are rechecked.
    pub(crate) fn wait_while_paused(&self, poll: Duration) -> bool {
        let mut flags = self.flags();
        while flags.paused && !flags.stopped {
            flags = match self.shared.wake.wait_timeout(flags, poll) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        !flags.stopped
    }

    /// Enter a terminal state unless one was already reached.
    pub(crate) fn finish(&self, state: PaintState) {
        let mut flags = self.flags();
        if !flags.state.is_terminal() {
            flags.state = state;
            flags.paused = false;
        }
        self.shared.wake.notify_all();
    }
}

/// Marks the job `Failed` if the worker leaves without finishing normally,
/// whether through an error return or a panic.
pub(crate) struct FailOnDrop<'a> {
    handle: &'a PaintHandle,
}

impl<'a> FailOnDrop<'a> {
    pub(crate) fn new(handle: &'a PaintHandle) -> Self {
        Self { handle }
    }
}

impl Drop for FailOnDrop<'_> {
    fn drop(&mut self) {
        self.handle.finish(PaintState::Failed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn pause_and_resume_only_apply_to_active_jobs() {
        let handle = PaintHandle::new();
        assert!(!handle.pause());
        assert!(!handle.resume());

        handle.begin(0, 10).unwrap();
        assert!(!handle.resume());
        assert!(handle.pause());
        assert_eq!(handle.state(), PaintState::Paused);
        assert!(handle.toggle_pause());
        assert_eq!(handle.state(), PaintState::Running);
    }

    #[test]
    fn begin_publishes_initial_progress() {
        let handle = PaintHandle::new();
        assert_eq!(handle.begin(7, 20), Ok(Start::Run));
        assert_eq!(handle.progress(), (7, 20));
        assert_eq!(handle.begin(0, 1), Err(PaintState::Running));
    }

    #[test]
    fn stop_before_start_cancels_the_job_once() {
        let handle = PaintHandle::new();
        handle.stop();
        assert_eq!(handle.state(), PaintState::Stopped);
        assert_eq!(handle.ensure_idle(), Ok(()));

        assert_eq!(handle.begin(0, 4), Ok(Start::Cancelled));
        assert_eq!(handle.state(), PaintState::Stopped);
        assert_eq!(handle.progress(), (0, 4));
        assert_eq!(handle.ensure_idle(), Err(PaintState::Stopped));
        assert_eq!(handle.begin(0, 4), Err(PaintState::Stopped));
    }

    #[test]
    fn stop_wakes_a_paused_worker() {
        let handle = PaintHandle::new();
        handle.begin(0, 1).unwrap();
        handle.pause();

        let remote = handle.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.stop();
        });

        let started = Instant::now();
        // Long poll: only the notification can end the wait promptly.
        assert!(!handle.wait_while_paused(Duration::from_secs(5)));
        assert!(started.elapsed() < Duration::from_secs(2));
        stopper.join().unwrap();
    }

    #[test]
    fn resume_releases_the_wait() {
        let handle = PaintHandle::new();
        handle.begin(0, 1).unwrap();
        handle.pause();

        let remote = handle.clone();
        let resumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            remote.resume();
        });
        assert!(handle.wait_while_paused(Duration::from_millis(5)));
        resumer.join().unwrap();
    }

    #[test]
    fn fail_guard_does_not_override_terminal_state() {
        let handle = PaintHandle::new();
        handle.begin(0, 1).unwrap();
        {
            let _guard = FailOnDrop::new(&handle);
            handle.finish(PaintState::Completed);
        }
        assert_eq!(handle.state(), PaintState::Completed);

        let handle = PaintHandle::new();
        handle.begin(0, 1).unwrap();
        drop(FailOnDrop::new(&handle));
        assert_eq!(handle.state(), PaintState::Failed);
    }
}
