use std::collections::HashMap;

/// Groups of fields that are written together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedField {
    /// Name, theme and currency of the active profile
    Profile,
    Enterprise,
    SecurityPin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    field: TrackedField,
    seq: u64,
    generation: u64,
}

/// Hands out a [`Ticket`] per write so a response is only applied if it is
/// still the newest for its field and the identity has not changed since
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: HashMap<TrackedField, u64>,
    generation: u64,
}

impl RequestSequencer {
    pub fn issue(&mut self, field: TrackedField) -> Ticket {
        let seq = self.latest.entry(field).or_default();
        *seq += 1;
        Ticket {
            field,
            seq: *seq,
            generation: self.generation,
        }
    }

    /// Returns `true` if the response for `ticket` may still be applied
    #[must_use]
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
            && self.latest.get(&ticket.field).copied() == Some(ticket.seq)
    }

    /// Invalidates every outstanding ticket. Called whenever the active
    /// identity changes
    pub fn advance_generation(&mut self) {
        self.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
