//! Speaking indicators for remote participants.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use classroom_common::ParticipantId;

/// Set of participants currently flagged as speaking.
///
/// An entry clears on an explicit end or once `timeout` passes without a
/// fresh start, whichever comes first.
#[derive(Debug)]
pub struct VoiceActivity {
    timeout: Duration,
    deadlines: HashMap<ParticipantId, Instant>,
}

impl VoiceActivity {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadlines: HashMap::new(),
        }
    }

    /// Flag `id` as speaking until `now + timeout`. Returns `true` if it was
    /// not speaking before. A repeated start pushes the deadline out.
    pub fn start(&mut self, id: &ParticipantId, now: Instant) -> bool {
        self.deadlines
            .insert(id.clone(), now + self.timeout)
            .is_none()
    }

    /// Returns `true` if `id` was speaking.
    pub fn end(&mut self, id: &ParticipantId) -> bool {
        self.deadlines.remove(id).is_some()
    }

    /// Drop every entry whose deadline has passed and return their ids.
    pub fn expire(&mut self, now: Instant) -> Vec<ParticipantId> {
        let expired: Vec<ParticipantId> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            self.deadlines.remove(id);
        }
        expired
    }

    pub fn is_speaking(&self, id: &ParticipantId) -> bool {
        self.deadlines.contains_key(id)
    }

    /// Earliest pending deadline, if anyone is speaking.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn remove(&mut self, id: &ParticipantId) -> bool {
        self.end(id)
    }

    pub fn clear(&mut self) {
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
