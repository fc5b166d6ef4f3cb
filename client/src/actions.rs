use std::collections::VecDeque;

use tandem_shared::{ActionEvent, Tick};

/// Captured action/animation events of a locally-simulated entity, queued
/// until the next movement broadcast drains them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocalActionLog {
    events: Vec<ActionEvent>,
}

impl LocalActionLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn append(&mut self, event: ActionEvent) {
        self.events.push(event);
    }

    pub fn has_pending(&self) -> bool {
        !self.events.is_empty()
    }

    /// Removes and returns all queued events, called once per broadcast tick.
    pub fn drain_for_broadcast(&mut self) -> Vec<ActionEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Action/animation events received from an entity's owner, replayed
/// strictly FIFO once due at the delayed playback tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemoteActionLog {
    events: VecDeque<ActionEvent>,
}

impl RemoteActionLog {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    /// Appends an event, preserving arrival order.
    pub fn enqueue(&mut self, event: ActionEvent) {
        self.events.push_back(event);
    }

    /// Consumes every event due at the playback tick, in FIFO order. The
    /// caller applies them when the entity's representation is ready and
    /// drops them otherwise; replay is visual-only and never retried.
    pub fn take_due(&mut self, playback_tick: Tick) -> Vec<ActionEvent> {
        let mut due = Vec::new();
        while let Some(front) = self.events.front() {
            if front.tick > playback_tick {
                break;
            }
            if let Some(event) = self.events.pop_front() {
                due.push(event);
            }
        }
        due
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(tick: Tick, kind: u32) -> ActionEvent {
        ActionEvent {
            tick,
            kind,
            ..ActionEvent::default()
        }
    }

    #[test]
    fn local_log_drains_in_capture_order() {
        let mut log = LocalActionLog::new();
        log.append(event(10, 1));
        log.append(event(11, 2));

        let drained = log.drain_for_broadcast();
        assert_eq!(drained.iter().map(|e| e.kind).collect::<Vec<_>>(), vec![1, 2]);
        assert!(!log.has_pending());
    }

    #[test]
    fn remote_log_releases_events_as_they_become_due() {
        let mut log = RemoteActionLog::new();
        log.enqueue(event(100, 1));
        log.enqueue(event(200, 2));
        log.enqueue(event(300, 3));

        assert!(log.take_due(50).is_empty());

        let due = log.take_due(250);
        assert_eq!(due.iter().map(|e| e.kind).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(log.len(), 1);
    }
}
