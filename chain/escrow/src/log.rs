//! Append-only event log
//!
//! The ordered record of every state transition and the sole channel
//! between the exchange and its read-model consumers. Supports the two
//! access patterns the read-model needs: bulk scans from genesis
//! (optionally filtered by kind) and live per-subscriber delivery in
//! emission order over an unbounded channel.

use tokio::sync::mpsc;

use crate::events::{EventKind, ExchangeEvent, SequencedEvent};

/// Append-only log with subscriber fan-out.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SequencedEvent>,
    subscribers: Vec<mpsc::UnboundedSender<SequencedEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, assign its sequence number, and forward a copy
    /// to every live subscriber. Subscribers whose receiver was dropped
    /// are pruned.
    pub fn append(&mut self, event: ExchangeEvent) -> u64 {
        let sequence = self.events.len() as u64 + 1;
        let sequenced = SequencedEvent { sequence, event };

        self.subscribers
            .retain(|tx| tx.send(sequenced.clone()).is_ok());
        self.events.push(sequenced);
        sequence
    }

    /// All events from genesis to latest, in emission order.
    pub fn events(&self) -> &[SequencedEvent] {
        &self.events
    }

    /// All events of one kind from genesis to latest, in emission order.
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<SequencedEvent> {
        self.events
            .iter()
            .filter(|e| e.event.kind() == kind)
            .cloned()
            .collect()
    }

    /// Open a subscription delivering one message per event appended
    /// after this call, in emission order.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SequencedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
