pub mod widgets;

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;

use crate::paint::{PaintHandle, PaintState, Progress};

use widgets::ProgressWidget;

const TICK: Duration = Duration::from_millis(100);

/// What a key press asks the monitor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Stop,
    StopAndQuit,
    Close,
    Ignore,
}

/// Live view of one paint job.
pub struct Monitor {
    title: String,
    handle: PaintHandle,
    updates: Receiver<Progress>,
    latest: Option<Progress>,
    worker_gone: bool,
}

impl Monitor {
    pub fn new(title: impl Into<String>, handle: PaintHandle, updates: Receiver<Progress>) -> Self {
        Self {
            title: title.into(),
            handle,
            updates,
            latest: None,
            worker_gone: false,
        }
    }

    pub fn latest(&self) -> Option<&Progress> {
        self.latest.as_ref()
    }

    /// Pull every queued update, keeping the newest.
    pub fn drain(&mut self) {
        loop {
            match self.updates.try_recv() {
                Ok(progress) => self.latest = Some(progress),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.worker_gone = true;
                    break;
                }
            }
        }
    }

    /// Whether the job is over and its last update has been seen.
    pub fn finished(&self) -> bool {
        self.handle.state().is_terminal() || self.worker_gone
    }

    pub fn key_action(&self, code: KeyCode) -> KeyAction {
        if self.finished() {
            return KeyAction::Close;
        }
        match code {
            KeyCode::Char('o') | KeyCode::Char('O') => KeyAction::TogglePause,
            KeyCode::Char('i') | KeyCode::Char('I') | KeyCode::Esc => KeyAction::Stop,
            KeyCode::Char('q') => KeyAction::StopAndQuit,
            _ => KeyAction::Ignore,
        }
    }

    /// Apply a key. Returns `true` when the monitor should close.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.key_action(code) {
            KeyAction::TogglePause => {
                self.handle.toggle_pause();
                false
            }
            KeyAction::Stop => {
                self.handle.stop();
                false
            }
            KeyAction::StopAndQuit => {
                self.handle.stop();
                true
            }
            KeyAction::Close => true,
            KeyAction::Ignore => false,
        }
    }

    fn draw(&self, terminal: &mut DefaultTerminal) -> Result<()> {
        terminal.draw(|frame| {
            frame.render_widget(
                ProgressWidget::new(
                    &self.title,
                    self.handle.state(),
                    self.handle.progress(),
                    self.latest.as_ref(),
                ),
                frame.area(),
            );
        })?;
        Ok(())
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            self.drain();
            // The worker refused to start; nothing to watch.
            if self.worker_gone && self.handle.state() == PaintState::Idle {
                return Ok(());
            }
            self.draw(terminal)?;

            if !event::poll(TICK)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && self.handle_key(key.code) {
                    return Ok(());
                }
            }
        }
    }

    /// Take over the terminal until the user closes the view.
    ///
    /// The job keeps its own state; closing early with `q` stops it.
    pub fn run(mut self) -> Result<()> {
        let mut terminal = ratatui::init();
        let result = self.event_loop(&mut terminal);
        ratatui::restore();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    use crate::color::Color;

    fn progress(done: usize) -> Progress {
        Progress {
            pixels_done: done,
            pixels_total: 10,
            color: Color::new(0, 0, 0),
            group_index: 1,
            group_count: 1,
            category: Some(1),
        }
    }

    #[test]
    fn drain_keeps_the_newest_update() {
        let (tx, rx) = mpsc::channel();
        let mut monitor = Monitor::new("t", PaintHandle::new(), rx);
        tx.send(progress(1)).unwrap();
        tx.send(progress(4)).unwrap();
        monitor.drain();
        assert_eq!(monitor.latest().map(|p| p.pixels_done), Some(4));
        assert!(!monitor.finished());

        drop(tx);
        monitor.drain();
        assert!(monitor.finished());
    }

    #[test]
    fn keys_before_a_job_starts_do_nothing_harmful() {
        let (_tx, rx) = mpsc::channel();
        let handle = PaintHandle::new();
        let mut monitor = Monitor::new("t", handle.clone(), rx);

        assert_eq!(monitor.key_action(KeyCode::Char('o')), KeyAction::TogglePause);
        assert!(!monitor.handle_key(KeyCode::Char('o')));
        assert_eq!(handle.state(), PaintState::Idle);
        assert_eq!(monitor.key_action(KeyCode::Char('x')), KeyAction::Ignore);
    }

    #[test]
    fn stop_keys_stop_and_q_also_quits() {
        let (_tx, rx) = mpsc::channel();
        let handle = PaintHandle::new();
        let mut monitor = Monitor::new("t", handle.clone(), rx);
        assert_eq!(monitor.key_action(KeyCode::Esc), KeyAction::Stop);
        assert_eq!(monitor.key_action(KeyCode::Char('I')), KeyAction::Stop);
        assert!(monitor.handle_key(KeyCode::Char('q')));
        assert!(handle.is_stopped());

        // Once the job is over every key closes the view.
        assert_eq!(monitor.key_action(KeyCode::Char('o')), KeyAction::Close);
    }
}
