//! Network plumbing: link/session supervision, reconnect backoff, the
//! inbound mailbox and outbound publishing.

pub mod backoff;
pub mod channels;
pub mod connectivity;
pub mod publisher;

pub use backoff::{Backoff, BackoffPolicy};
pub use channels::{INBOUND, InboundMessage, drain_inbound, post_inbound};
pub use connectivity::{
    ConnectivityManager, InboundBatch, LinkEvent, LinkPhase, LinkState, SessionEvent,
};
pub use publisher::BusPublisher;
