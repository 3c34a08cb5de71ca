//! Wrappers around the host's network, navigation and viewer surfaces.
//!
//! Each wrapper takes the captured original as a constructor argument and
//! shares one [`InterceptContext`](context::InterceptContext) with the rest.

pub mod context;
pub mod navigation;
pub mod request;
pub mod viewer;

pub use context::{is_document_request, AccessCounter, InterceptContext, SessionClock};
pub use navigation::{
    AddressFactory, GuardedHistory, GuardedLocation, History, Location, LocationPart, RedactedUrl,
};
pub use request::{Fetch, GuardedFetch, GuardedXhr, GuardedXhrFactory, RequestOptions, XhrRequest};
pub use viewer::{TaskSlot, ViewerApplication};
