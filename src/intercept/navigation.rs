//! Address, location and history interception.
//!
//! The host exposes several overlapping ways to read or change the visible
//! address; each gets its own facade here:
//!
//! - [`AddressFactory`] / [`RedactedUrl`]: address objects parse normally but
//!   render redacted, and refuse sensitive `href` assignments.
//! - [`GuardedLocation`]: current-location reads are redacted, writes pass through.
//! - [`GuardedHistory`]: push/replace with a sensitive target is dropped.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};
use url::Url;

use super::context::InterceptContext;
use crate::error::Result;

/// Replacement for the address-object constructor.
#[derive(Clone)]
pub struct AddressFactory {
    ctx: Arc<InterceptContext>,
}

impl AddressFactory {
    pub fn new(ctx: Arc<InterceptContext>) -> Self {
        Self { ctx }
    }

    /// Parse `input`, resolved against `base` when given.
    pub fn parse(&self, input: &str, base: Option<&str>) -> Result<RedactedUrl> {
        let url = match base {
            Some(base) => Url::parse(base)?.join(input)?,
            None => Url::parse(input)?,
        };
        Ok(RedactedUrl {
            url,
            ctx: self.ctx.clone(),
        })
    }
}

/// A parsed address whose rendering never exposes protected hosts or credentials.
pub struct RedactedUrl {
    url: Url,
    ctx: Arc<InterceptContext>,
}

impl RedactedUrl {
    /// The full address, redacted.
    pub fn href(&self) -> String {
        self.ctx.redactor().address(self.url.as_str())
    }

    /// Assign a new full address. A sensitive value is ignored with a warning.
    pub fn set_href(&mut self, value: &str) -> Result<()> {
        if self.ctx.is_sensitive(value) {
            warn!("Blocked attempt to set sensitive URL");
            self.ctx.console().warn("Blocked attempt to set sensitive URL");
            return Ok(());
        }
        self.url = Url::parse(value)?;
        Ok(())
    }

    /// The underlying parsed address, unredacted. Host code that needs to
    /// issue the real request goes through this.
    pub fn as_url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RedactedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

impl fmt::Debug for RedactedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RedactedUrl").field(&self.href()).finish()
    }
}

/// Accessors of the current-location object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationPart {
    Href,
    Search,
    Pathname,
    Hash,
}

/// The host's location object.
pub trait Location: Send + Sync {
    fn get(&self, part: LocationPart) -> String;
    fn set(&self, part: LocationPart, value: &str);
}

/// Read-side redaction over a [`Location`].
pub struct GuardedLocation<L> {
    inner: L,
    ctx: Arc<InterceptContext>,
}

impl<L: Location> GuardedLocation<L> {
    pub fn new(inner: L, ctx: Arc<InterceptContext>) -> Self {
        Self { inner, ctx }
    }

    pub fn href(&self) -> String {
        self.get(LocationPart::Href)
    }

    pub fn search(&self) -> String {
        self.get(LocationPart::Search)
    }

    pub fn pathname(&self) -> String {
        self.get(LocationPart::Pathname)
    }

    pub fn hash(&self) -> String {
        self.get(LocationPart::Hash)
    }
}

impl<L: Location> Location for GuardedLocation<L> {
    fn get(&self, part: LocationPart) -> String {
        self.ctx.redactor().location(&self.inner.get(part))
    }

    fn set(&self, part: LocationPart, value: &str) {
        self.inner.set(part, value);
    }
}

/// The host's history object.
pub trait History: Send + Sync {
    fn push_state(&self, state: serde_json::Value, title: &str, url: Option<&str>);
    fn replace_state(&self, state: serde_json::Value, title: &str, url: Option<&str>);
}

/// Drops history entries that would put a protected address in the bar.
pub struct GuardedHistory<H> {
    inner: H,
    ctx: Arc<InterceptContext>,
}

impl<H: History> GuardedHistory<H> {
    pub fn new(inner: H, ctx: Arc<InterceptContext>) -> Self {
        Self { inner, ctx }
    }

    fn allows(&self, url: Option<&str>) -> bool {
        match url {
            Some(url) if self.ctx.is_sensitive(url) => {
                warn!("Blocked history manipulation with sensitive URL");
                self.ctx
                    .console()
                    .warn("Blocked history manipulation with sensitive URL");
                false
            }
            _ => true,
        }
    }
}

impl<H: History> History for GuardedHistory<H> {
    fn push_state(&self, state: serde_json::Value, title: &str, url: Option<&str>) {
        if self.allows(url) {
            debug!("delegating pushState");
            self.inner.push_state(state, title, url);
        }
    }

    fn replace_state(&self, state: serde_json::Value, title: &str, url: Option<&str>) {
        if self.allows(url) {
            debug!("delegating replaceState");
            self.inner.replace_state(state, title, url);
        }
    }
}
