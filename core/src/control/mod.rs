pub mod client;
pub mod dispatcher;
pub mod poller;

pub use client::{Endpoint, PageQuery, RaceControlClient, Variant};
pub use dispatcher::{PenaltyCommand, PenaltyDispatcher, PendingPenalty, Selection, DEFAULT_REASON};
pub use poller::{PollOutcome, PollTicket, StatusPoller};
