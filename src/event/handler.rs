use crossterm::event::{self as term, EventStream, KeyEvent, KeyEventKind};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

use crate::ui::panels::TaskOutcome;

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The wizard published a new state
    Wizard,
    /// A background device operation finished
    Task(TaskOutcome),
}

pub type EventSender = mpsc::UnboundedSender<Event>;

/// Merges terminal input, ticks, wizard updates and task results into one
/// queue for the render loop
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: EventSender,
}

impl EventHandler {
    /// Channel only, without the terminal reader
    pub fn detached() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { rx, tx }
    }

    pub fn new(tick_rate: Duration) -> Self {
        let handler = Self::detached();
        let event_tx = handler.tx.clone();

        tokio::spawn(async move {
            let mut reader = EventStream::new();
            let mut ticker = tokio::time::interval(tick_rate);

            loop {
                let event = tokio::select! {
                    _ = ticker.tick() => Event::Tick,
                    next = reader.next() => match next {
                        Some(Ok(term::Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            Event::Key(key)
                        }
                        Some(Ok(term::Event::Resize(_, _))) => Event::Resize,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!("Terminal read failed: {}", e);
                            continue;
                        }
                        None => break,
                    },
                };

                if event_tx.send(event).is_err() {
                    break;
                }
            }
            debug!("Terminal event reader stopped");
        });

        handler
    }

    pub fn sender(&self) -> EventSender {
        self.tx.clone()
    }

    /// Forward every change of `state` as [`Event::Wizard`]
    pub fn watch_wizard<T: Send + Sync + 'static>(&self, mut state: watch::Receiver<T>) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            while state.changed().await.is_ok() {
                if tx.send(Event::Wizard).is_err() {
                    break;
                }
            }
        });
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Next queued event, without waiting
    pub fn try_next(&mut self) -> Option<Event> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wizard_changes_are_forwarded() {
        let mut events = EventHandler::detached();
        let (state_tx, state_rx) = watch::channel(0u32);
        events.watch_wizard(state_rx);

        state_tx.send_replace(1);
        let event = tokio::time::timeout(Duration::from_secs(1), events.next())
            .await
            .expect("timed out");
        assert!(matches!(event, Some(Event::Wizard)));
    }

    #[tokio::test]
    async fn test_sender_feeds_queue() {
        let mut events = EventHandler::detached();
        events
            .sender()
            .send(Event::Task(TaskOutcome::AdminCreated(Ok("admin".to_string()))))
            .expect("queue closed");

        assert!(matches!(events.next().await, Some(Event::Task(_))));
    }
}
