use std::collections::HashMap;

use tracing::debug;

use classroom_common::ParticipantId;

use super::types::Participant;

/// Set of remote participants keyed by transport id.
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    /// Our own transport id once the join ack arrives.
    self_id: Option<ParticipantId>,
    participants: HashMap<ParticipantId, Participant>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record which transport id is "self" so it is filtered from every
    /// snapshot and join.
    pub fn set_self_id(&mut self, id: Option<ParticipantId>) {
        if let Some(id) = &id {
            self.participants.remove(id);
        }
        self.self_id = id;
    }

    pub fn self_id(&self) -> Option<&ParticipantId> {
        self.self_id.as_ref()
    }

    fn is_self(&self, id: &ParticipantId) -> bool {
        self.self_id.as_ref() == Some(id)
    }

    /// Replace the whole set. Returns the ids that were present before and
    /// are absent now, so their per-peer state can be released.
    pub fn apply_snapshot(
        &mut self,
        participants: impl IntoIterator<Item = Participant>,
    ) -> Vec<ParticipantId> {
        let mut next = HashMap::new();
        for p in participants {
            if self.is_self(&p.id) {
                continue;
            }
            next.insert(p.id.clone(), p);
        }

        let departed: Vec<ParticipantId> = self
            .participants
            .keys()
            .filter(|id| !next.contains_key(*id))
            .cloned()
            .collect();

        debug!(
            participants = next.len(),
            departed = departed.len(),
            "Presence snapshot applied"
        );
        self.participants = next;
        departed
    }

    /// Add a participant. Returns `false` for a duplicate id or for self.
    pub fn apply_join(&mut self, participant: Participant) -> bool {
        if self.is_self(&participant.id) || self.participants.contains_key(&participant.id) {
            return false;
        }
        self.participants
            .insert(participant.id.clone(), participant);
        true
    }

    /// Remove a participant, returning it if it was present.
    pub fn apply_leave(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    /// Current participants, excluding self. Order is unspecified.
    pub fn list(&self) -> Vec<&Participant> {
        self.participants.values().collect()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    /// First participant with the given display name. Names are not unique;
    /// callers that have an id should prefer it.
    pub fn find_by_name(&self, display_name: &str) -> Option<&Participant> {
        self.participants
            .values()
            .find(|p| p.display_name == display_name)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Forget everyone, including the self id.
    pub fn clear(&mut self) {
        self.participants.clear();
        self.self_id = None;
    }
}
