//! Content and session monitor.
//!
//! Two independent behaviors kept together because both act on the rendered
//! document: the text [`scrubber`] and the [`session`] expiry check.

pub mod scrubber;
pub mod session;

pub use scrubber::{ContentScrubber, Document, MemoryDocument, MutationKind, NodeId};
pub use session::{ActivityEvent, SessionMonitor, SessionState};
