//! Outbound request interception.
//!
//! Two call shapes are guarded:
//!
//! - [`Fetch`]: a deferred request function taking a target and options.
//!   [`GuardedFetch`] rejects the future for protected targets.
//! - [`XhrRequest`]: a stateful request object with `open` and `send`.
//!   [`GuardedXhr`] fails `open` synchronously for protected targets.
//!
//! Both shapes share [`admit`]: the pattern check runs first, then the
//! document-retrieval counter. A rejected call never reaches the wrapped
//! primitive.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::context::{is_document_request, InterceptContext};
use crate::error::{Result, ShieldError};

/// Options passed alongside a fetch target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl RequestOptions {
    pub fn new(method: &str) -> Self {
        Self {
            method: method.to_string(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }
}

/// A promise-returning request primitive.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Response: Send;

    async fn fetch(&self, target: &str, options: RequestOptions) -> Result<Self::Response>;
}

/// A stateful request object.
pub trait XhrRequest: Send {
    fn open(&mut self, method: &str, target: &str) -> Result<()>;
    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()>;
    fn send(&mut self, body: Option<&[u8]>) -> Result<()>;
}

/// Decide whether a call may proceed.
///
/// Emits `blocked_message` through the console for protected targets, and
/// exactly one "PDF access attempt N" line for every document-retrieval
/// call that gets past the pattern check.
pub fn admit(ctx: &InterceptContext, target: &str, blocked_message: &str) -> Result<()> {
    if ctx.is_sensitive(target) {
        let findings = ctx.redactor().registry().scan(target);
        warn!(
            findings = %serde_json::to_string(&findings).unwrap_or_default(),
            "{}",
            blocked_message
        );
        ctx.console().warn(blocked_message);
        return Err(ShieldError::AccessDenied);
    }

    if is_document_request(target) {
        let counter = ctx.counter();
        let attempts = counter.record();
        ctx.console().log(&format!("PDF access attempt {}", attempts));
        if counter.exceeds(attempts) {
            warn!(attempts, limit = counter.limit(), "Too many PDF access attempts");
            return Err(ShieldError::RateLimited {
                attempts,
                limit: counter.limit(),
            });
        }
    }

    Ok(())
}

/// Insert `injected` over `headers`; injected names win regardless of case.
fn merge_headers(headers: &mut BTreeMap<String, String>, injected: &BTreeMap<String, String>) {
    for (name, value) in injected {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        headers.insert(name.clone(), value.clone());
    }
}

/// Decorates a [`Fetch`] primitive.
pub struct GuardedFetch<F> {
    inner: F,
    ctx: Arc<InterceptContext>,
}

impl<F: Fetch> GuardedFetch<F> {
    pub fn new(inner: F, ctx: Arc<InterceptContext>) -> Self {
        Self { inner, ctx }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for GuardedFetch<F> {
    type Response = F::Response;

    async fn fetch(&self, target: &str, mut options: RequestOptions) -> Result<F::Response> {
        admit(&self.ctx, target, "Direct worker access blocked")?;
        merge_headers(&mut options.headers, self.ctx.fetch_headers());
        debug!(method = %options.method, "delegating fetch");
        self.inner.fetch(target, options).await
    }
}

/// Decorates one [`XhrRequest`] instance.
pub struct GuardedXhr<R> {
    inner: R,
    ctx: Arc<InterceptContext>,
}

impl<R: XhrRequest> GuardedXhr<R> {
    pub fn new(inner: R, ctx: Arc<InterceptContext>) -> Self {
        Self { inner, ctx }
    }

}

impl<R: XhrRequest> XhrRequest for GuardedXhr<R> {
    fn open(&mut self, method: &str, target: &str) -> Result<()> {
        admit(&self.ctx, target, "XHR worker access blocked")?;
        self.inner.open(method, target)
    }

    fn set_request_header(&mut self, name: &str, value: &str) -> Result<()> {
        self.inner.set_request_header(name, value)
    }

    fn send(&mut self, body: Option<&[u8]>) -> Result<()> {
        for (name, value) in self.ctx.xhr_headers() {
            self.inner.set_request_header(name, value)?;
        }
        self.inner.send(body)
    }
}

/// Replacement for the request-object constructor.
pub struct GuardedXhrFactory<F> {
    construct: F,
    ctx: Arc<InterceptContext>,
}

impl<F, R> GuardedXhrFactory<F>
where
    F: Fn() -> R + Send + Sync,
    R: XhrRequest,
{
    pub fn new(construct: F, ctx: Arc<InterceptContext>) -> Self {
        Self { construct, ctx }
    }

    pub fn create(&self) -> GuardedXhr<R> {
        GuardedXhr::new((self.construct)(), self.ctx.clone())
    }
}
