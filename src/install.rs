//! Install boundary.
//!
//! [`Shield::install`] takes the host's original primitives by value, so each
//! is captured exactly once before anything is replaced, and hands back the
//! wrapped versions for the host to bind into its resolution scope. It also
//! freezes the well-known names through which the originals could otherwise
//! be reached.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ShieldConfig;
use crate::console::{FilteredConsole, LogSink};
use crate::error::Result;
use crate::intercept::{
    AddressFactory, Fetch, GuardedFetch, GuardedHistory, GuardedLocation, GuardedXhrFactory,
    History, InterceptContext, Location, ViewerApplication, XhrRequest,
};
use crate::monitor::{
    ActivityEvent, ContentScrubber, Document, MutationKind, SessionMonitor, SessionState,
};
use crate::patterns::{PatternRegistry, Redactor};

/// Names frozen to an undefined, non-writable, non-configurable value.
pub const FROZEN_GLOBALS: [&str; 2] = ["originalFetch", "originalXHR"];

pub const INSTALL_NOTICE: &str =
    "PDF Security Interceptor initialized - Worker URLs are now hidden";

/// The environment's global resolution scope.
pub trait HostScope {
    /// Define `name` as undefined, non-writable and non-configurable.
    fn freeze_undefined(&mut self, name: &str) -> Result<()>;
}

/// Unwrapped originals, captured at install time.
pub struct HostPrimitives<F, X, L, H, S> {
    pub fetch: F,
    /// Request-object constructor.
    pub xhr: X,
    pub location: L,
    pub history: H,
    pub console: S,
}

/// All installed wrappers plus their shared context.
pub struct Shield<F, X, L, H> {
    ctx: Arc<InterceptContext>,
    console: Arc<dyn LogSink>,
    fetch: GuardedFetch<F>,
    xhr: GuardedXhrFactory<X>,
    address: AddressFactory,
    location: GuardedLocation<L>,
    history: GuardedHistory<H>,
    viewer: ViewerApplication,
    scrubber: ContentScrubber,
    session: Arc<SessionMonitor>,
}

impl<F, X, R, L, H> Shield<F, X, L, H>
where
    F: Fetch,
    X: Fn() -> R + Send + Sync,
    R: XhrRequest,
    L: Location,
    H: History,
{
    pub fn install<S, E>(
        config: &ShieldConfig,
        host: HostPrimitives<F, X, L, H, S>,
        scope: &mut E,
    ) -> Result<Self>
    where
        S: LogSink + 'static,
        E: HostScope + ?Sized,
    {
        let registry = Arc::new(PatternRegistry::from_config(&config.patterns)?);
        let pattern_count = registry.len();
        let redactor = Redactor::new(registry, config.redaction.clone());

        let console: Arc<dyn LogSink> =
            Arc::new(FilteredConsole::new(host.console, redactor.clone()));
        let ctx = Arc::new(InterceptContext::new(config, redactor.clone(), console.clone()));

        let shield = Self {
            fetch: GuardedFetch::new(host.fetch, ctx.clone()),
            xhr: GuardedXhrFactory::new(host.xhr, ctx.clone()),
            address: AddressFactory::new(ctx.clone()),
            location: GuardedLocation::new(host.location, ctx.clone()),
            history: GuardedHistory::new(host.history, ctx.clone()),
            viewer: ViewerApplication::new(ctx.clone()),
            scrubber: ContentScrubber::new(redactor),
            session: Arc::new(SessionMonitor::new(ctx.clone(), config.session.clone())),
            ctx,
            console,
        };

        for name in FROZEN_GLOBALS {
            scope.freeze_undefined(name)?;
        }

        info!(patterns = pattern_count, "interceptor installed");
        shield.console.log(INSTALL_NOTICE);
        Ok(shield)
    }
}

impl<F, X, L, H> Shield<F, X, L, H> {
    pub fn context(&self) -> &Arc<InterceptContext> {
        &self.ctx
    }

    /// The filtered logging sink to bind in place of the original.
    pub fn console(&self) -> &Arc<dyn LogSink> {
        &self.console
    }

    pub fn fetch(&self) -> &GuardedFetch<F> {
        &self.fetch
    }

    pub fn xhr(&self) -> &GuardedXhrFactory<X> {
        &self.xhr
    }

    pub fn address(&self) -> &AddressFactory {
        &self.address
    }

    pub fn location(&self) -> &GuardedLocation<L> {
        &self.location
    }

    pub fn history(&self) -> &GuardedHistory<H> {
        &self.history
    }

    pub fn viewer(&self) -> &ViewerApplication {
        &self.viewer
    }

    pub fn scrubber(&self) -> &ContentScrubber {
        &self.scrubber
    }

    pub fn session(&self) -> &Arc<SessionMonitor> {
        &self.session
    }

    pub fn on_content_loaded<D: Document + ?Sized>(&self, doc: &mut D) -> usize {
        self.scrubber.on_content_loaded(doc)
    }

    pub fn on_mutations<D: Document + ?Sized>(
        &self,
        records: &[MutationKind],
        doc: &mut D,
    ) -> usize {
        self.scrubber.on_mutations(records, doc)
    }

    pub fn on_activity(&self, event: ActivityEvent) {
        self.session.record_activity(event);
    }

    /// Start the periodic session check on the current tokio runtime.
    pub fn spawn_session_monitor<D>(&self, doc: Arc<Mutex<D>>) -> JoinHandle<SessionState>
    where
        D: Document + 'static,
    {
        let session = self.session.clone();
        tokio::spawn(async move { session.run(doc).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::tests::RecordingSink;
    use crate::error::ShieldError;
    use crate::intercept::{LocationPart, RequestOptions};
    use async_trait::async_trait;

    struct NoopFetch;

    #[async_trait]
    impl Fetch for NoopFetch {
        type Response = ();

        async fn fetch(&self, _target: &str, _options: RequestOptions) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct NoopXhr;

    impl XhrRequest for NoopXhr {
        fn open(&mut self, _method: &str, _target: &str) -> crate::error::Result<()> {
            Ok(())
        }

        fn set_request_header(&mut self, _name: &str, _value: &str) -> crate::error::Result<()> {
            Ok(())
        }

        fn send(&mut self, _body: Option<&[u8]>) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct NoopLocation;

    impl Location for NoopLocation {
        fn get(&self, _part: LocationPart) -> String {
            String::new()
        }

        fn set(&self, _part: LocationPart, _value: &str) {}
    }

    struct NoopHistory;

    impl History for NoopHistory {
        fn push_state(&self, _state: serde_json::Value, _title: &str, _url: Option<&str>) {}
        fn replace_state(&self, _state: serde_json::Value, _title: &str, _url: Option<&str>) {}
    }

    #[derive(Default)]
    struct RecordingScope {
        frozen: Vec<String>,
        fail: bool,
    }

    impl HostScope for RecordingScope {
        fn freeze_undefined(&mut self, name: &str) -> crate::error::Result<()> {
            if self.fail {
                return Err(ShieldError::Host(format!("cannot redefine {}", name)));
            }
            self.frozen.push(name.to_string());
            Ok(())
        }
    }

    fn primitives(
        console: RecordingSink,
    ) -> HostPrimitives<NoopFetch, fn() -> NoopXhr, NoopLocation, NoopHistory, RecordingSink> {
        HostPrimitives {
            fetch: NoopFetch,
            xhr: || NoopXhr,
            location: NoopLocation,
            history: NoopHistory,
            console,
        }
    }

    #[test]
    fn install_freezes_names_and_announces() {
        let sink = RecordingSink::default();
        let mut scope = RecordingScope::default();
        let shield =
            Shield::install(&ShieldConfig::default(), primitives(sink.clone()), &mut scope)
                .unwrap();
        assert_eq!(scope.frozen, vec!["originalFetch", "originalXHR"]);
        assert_eq!(sink.lines(), vec![INSTALL_NOTICE]);
        assert_eq!(shield.context().counter().limit(), 3);
    }

    #[test]
    fn install_propagates_scope_failure() {
        let mut scope = RecordingScope {
            fail: true,
            ..Default::default()
        };
        let result = Shield::install(
            &ShieldConfig::default(),
            primitives(RecordingSink::default()),
            &mut scope,
        );
        assert!(matches!(result, Err(ShieldError::Host(_))));
    }

    #[test]
    fn install_rejects_invalid_extra_pattern() {
        let mut config = ShieldConfig::default();
        config.patterns.extra.push("[".to_string());
        let result = Shield::install(
            &config,
            primitives(RecordingSink::default()),
            &mut RecordingScope::default(),
        );
        assert!(matches!(result, Err(ShieldError::Pattern(_))));
    }

    #[test]
    fn installed_console_is_filtered() {
        let sink = RecordingSink::default();
        let shield = Shield::install(
            &ShieldConfig::default(),
            primitives(sink.clone()),
            &mut RecordingScope::default(),
        )
        .unwrap();
        shield.console().log("see x.workers.dev");
        assert_eq!(sink.lines()[1], "see [PROTECTED]");
    }
}
