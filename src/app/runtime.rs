//! Single-threaded event loop.
//!
//! Input events and request completions share one channel. Between events
//! the loop sleeps until the earliest timer deadline, then fires whatever is
//! due.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Instant;

use super::{AppController, Event, EventHandler};
use crate::ui::Ui;

/// Channel that carries every [`Event`] into the loop.
pub fn channel() -> (Sender<Event>, Receiver<Event>) {
    mpsc::channel()
}

pub struct Runtime<U: Ui> {
    controller: AppController<U>,
    events: Receiver<Event>,
}

impl<U: Ui> Runtime<U> {
    pub fn new(controller: AppController<U>, events: Receiver<Event>) -> Self {
        Self { controller, events }
    }

    pub fn controller(&self) -> &AppController<U> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut AppController<U> {
        &mut self.controller
    }

    pub fn into_controller(self) -> AppController<U> {
        self.controller
    }

    /// Run until [`Event::Quit`] arrives or every sender is gone.
    pub fn run(&mut self) {
        while let Some(event) = self.next_event() {
            if matches!(event, Event::Quit) {
                break;
            }
            self.dispatch(event);
        }
    }

    /// Pump events and timers until no request is in flight. Used by
    /// one-shot commands after they submit their request.
    pub fn run_until_idle(&mut self) {
        while self.controller.has_in_flight() {
            let Some(event) = self.next_event() else {
                break;
            };
            if matches!(event, Event::Quit) {
                break;
            }
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: Event) {
        let is_tick = matches!(event, Event::Tick(_));
        self.controller.handle(event);
        if !is_tick {
            self.controller.fire_due(Instant::now());
        }
    }

    /// Block for the next event, or synthesize a tick when the earliest
    /// timer is due first. `None` once the channel is closed.
    fn next_event(&self) -> Option<Event> {
        let Some(deadline) = self.controller.next_deadline() else {
            return self.events.recv().ok();
        };

        let wait = deadline.saturating_duration_since(Instant::now());
        match self.events.recv_timeout(wait) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) => Some(Event::Tick(Instant::now())),
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::api::{AnalysisClient, HttpTransport};
    use crate::app::Timings;
    use crate::history::HistoryStore;
    use crate::ui::terminal::TerminalUi;
    use std::sync::Arc;

    fn controller(tx: Sender<Event>) -> AppController<TerminalUi<Vec<u8>>> {
        let transport = HttpTransport::new("http://127.0.0.1:9", Duration::from_millis(200));
        let client = AnalysisClient::new(Arc::new(transport));
        let ui = TerminalUi::new(Vec::new(), std::env::temp_dir().join("unused.png"));
        AppController::new(client, ui, HistoryStore::in_memory(50), tx).with_timings(Timings {
            notification_ttl: Duration::from_millis(20),
            ..Timings::default()
        })
    }

    #[test]
    fn run_stops_on_quit_and_fires_due_timers() {
        let (tx, rx) = channel();
        let mut runtime = Runtime::new(controller(tx.clone()), rx);
        tx.send(Event::SubmitSingle("   ".into())).unwrap();
        let quitter = tx.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            let _ = quitter.send(Event::Quit);
        });

        runtime.run();

        let controller = runtime.into_controller();
        assert!(controller.state().notifications().is_empty());
        assert!(controller.state().last_failure().is_some());
    }

    #[test]
    fn run_until_idle_returns_immediately_without_requests() {
        let (tx, rx) = channel();
        let mut runtime = Runtime::new(controller(tx), rx);
        runtime.run_until_idle();
        assert!(!runtime.controller().has_in_flight());
    }
}
