//! Rich presence model.
//!
//! [`PresenceTracker`] implements the session crate's `PresenceSink`: it
//! builds an [`Activity`] when a session starts, folds in-game messages into
//! it, and hands every change to an [`ActivityPublisher`]. Talking to an
//! actual rich-presence client is the publisher's job.

pub mod activity;
pub mod publisher;
pub mod tracker;

pub use activity::{Activity, ActivityButton, ActivityImage};
pub use publisher::{ActivityPublisher, TracingPublisher};
pub use tracker::{PresenceOptions, PresenceTracker};
