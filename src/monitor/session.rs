//! Session and inactivity expiry.
//!
//! ```text
//! Active --(session age > max_session)--------> Expired
//! Active --(inactivity > max_inactivity)------> Inactive
//! ```
//!
//! Both outcomes are terminal for the current load: the document body is
//! replaced with a static notice and only a reload starts a new session.
//! Session age is checked first.

use std::sync::{Arc, Mutex};

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::scrubber::Document;
use crate::config::SessionConfig;
use crate::intercept::InterceptContext;

const EXPIRED_NOTICE: &str = r#"
<div style="text-align: center; padding: 50px; font-family: Arial, sans-serif; background: #f5f5f5;">
    <h2 style="color: #d32f2f;">Session Expired</h2>
    <p>Maximum session time exceeded. Please refresh to continue.</p>
</div>
"#;

const INACTIVE_NOTICE: &str = r#"
<div style="text-align: center; padding: 50px; font-family: Arial, sans-serif; background: #f5f5f5;">
    <h2 style="color: #d32f2f;">Session Inactive</h2>
    <p>Session expired due to inactivity. Please refresh to continue.</p>
</div>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Expired,
    Inactive,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionState::Active)
    }

    /// Body markup shown once the session ends.
    pub fn notice(self) -> Option<&'static str> {
        match self {
            SessionState::Active => None,
            SessionState::Expired => Some(EXPIRED_NOTICE),
            SessionState::Inactive => Some(INACTIVE_NOTICE),
        }
    }
}

/// User interactions that count as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityEvent {
    MouseDown,
    MouseMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

impl ActivityEvent {
    pub const ALL: [ActivityEvent; 6] = [
        ActivityEvent::MouseDown,
        ActivityEvent::MouseMove,
        ActivityEvent::KeyPress,
        ActivityEvent::Scroll,
        ActivityEvent::TouchStart,
        ActivityEvent::Click,
    ];

    /// Host event name, e.g. `"mousedown"`.
    pub fn name(self) -> &'static str {
        match self {
            ActivityEvent::MouseDown => "mousedown",
            ActivityEvent::MouseMove => "mousemove",
            ActivityEvent::KeyPress => "keypress",
            ActivityEvent::Scroll => "scroll",
            ActivityEvent::TouchStart => "touchstart",
            ActivityEvent::Click => "click",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }
}

pub struct SessionMonitor {
    ctx: Arc<InterceptContext>,
    config: SessionConfig,
    state: Mutex<SessionState>,
}

impl SessionMonitor {
    pub fn new(ctx: Arc<InterceptContext>, config: SessionConfig) -> Self {
        Self {
            ctx,
            config,
            state: Mutex::new(SessionState::Active),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn record_activity(&self, _event: ActivityEvent) {
        self.ctx.clock().touch();
    }

    /// Record a host event by name. Unknown names are ignored.
    pub fn record_event(&self, name: &str) -> bool {
        match ActivityEvent::from_name(name) {
            Some(event) => {
                self.record_activity(event);
                true
            }
            None => false,
        }
    }

    /// State the session would be in at `now`, without side effects.
    pub fn evaluate(&self, now: Instant) -> SessionState {
        let clock = self.ctx.clock();
        if clock.session_age(now) > self.config.max_session() {
            SessionState::Expired
        } else if clock.inactivity(now) > self.config.max_inactivity() {
            SessionState::Inactive
        } else {
            SessionState::Active
        }
    }

    /// Run one periodic check at `now`, replacing the body on expiry.
    pub fn check_at<D: Document + ?Sized>(&self, now: Instant, doc: &mut D) -> SessionState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.is_terminal() {
            return *state;
        }
        let next = self.evaluate(now);
        if let Some(notice) = next.notice() {
            info!(state = ?next, "session ended, replacing document body");
            doc.replace_body(notice);
        }
        *state = next;
        next
    }

    pub fn check<D: Document + ?Sized>(&self, doc: &mut D) -> SessionState {
        self.check_at(Instant::now(), doc)
    }

    /// Check every `check_interval` until the session ends; returns the final state.
    ///
    /// The first check happens one interval after the call.
    pub async fn run<D: Document>(self: Arc<Self>, doc: Arc<Mutex<D>>) -> SessionState {
        let period = self.config.check_interval();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let state = {
                let mut doc = doc.lock().unwrap_or_else(|e| e.into_inner());
                self.check(&mut *doc)
            };
            debug!(?state, "session check");
            if state.is_terminal() {
                return state;
            }
        }
    }
}
