//! Building blocks shared by the controllers' state structs.

/// Loading and failure are mutually exclusive; starting a new attempt always
/// replaces a previous failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Tag carried by an async call so its result can be matched against the
/// controller's current generation when it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic issue/apply counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequencer {
    issued: u64,
    applied: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> Ticket {
        self.issued += 1;
        Ticket(self.issued)
    }

    pub fn is_latest(&self, ticket: Ticket) -> bool {
        ticket.0 == self.issued
    }

    /// Newer than whatever was applied last.
    pub fn is_fresh(&self, ticket: Ticket) -> bool {
        ticket.0 > self.applied
    }

    pub fn mark_applied(&mut self, ticket: Ticket) {
        self.applied = self.applied.max(ticket.0);
    }

    /// Issues and applies in one step, superseding everything in flight.
    pub fn supersede(&mut self) -> Ticket {
        let ticket = self.issue();
        self.mark_applied(ticket);
        ticket
    }

    pub fn has_pending(&self) -> bool {
        self.issued > self.applied
    }
}
