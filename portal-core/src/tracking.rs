// Analytics events derived from portal actions.

use log::debug;
use serde::Serialize;
use serde_json::{json, Value};

/// Actions the tracking middleware understands. Anything else passes through untracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortalAction {
    LoginSuccess,
    SetupDataStorageSuccess,
    UpdatePatientSuccess,
    UpdateUserSuccess,
    LogoutRequest,
    VerifyCustodialSuccess,
    SignupSuccess { roles: Option<Vec<String>> },
    TurnOnCbgRange { range: String },
    TurnOffCbgRange { range: String },
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricEvent {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

impl MetricEvent {
    fn named(name: &str) -> Self {
        Self { name: name.to_string(), properties: None }
    }
}

pub trait MetricsSink {
    fn track(&self, event: &str, properties: Option<&Value>);
}

/// `%`, URL-encoded, when the range starts with an integer ("80", "-5 pct"), else nothing.
fn range_suffix(range: &str) -> &'static str {
    let trimmed = range.trim_start();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.starts_with(|c: char| c.is_ascii_digit()) {
        "%25"
    } else {
        ""
    }
}

/// The analytics event for `action`, if it has one.
pub fn track_metric(action: &PortalAction) -> Option<MetricEvent> {
    let event = match action {
        PortalAction::LoginSuccess => MetricEvent::named("Logged In"),
        PortalAction::SetupDataStorageSuccess => MetricEvent::named("Created Profile"),
        PortalAction::UpdatePatientSuccess => MetricEvent::named("Updated Profile"),
        PortalAction::UpdateUserSuccess => MetricEvent::named("Updated Account"),
        PortalAction::LogoutRequest => MetricEvent::named("Logged Out"),
        PortalAction::VerifyCustodialSuccess => MetricEvent::named("VCA Home Verification - Verified"),
        PortalAction::SignupSuccess { roles } => MetricEvent {
            name: "Signed Up".to_string(),
            properties: roles.as_ref().map(|roles| json!({ "roles": roles })),
        },
        PortalAction::TurnOnCbgRange { range } => MetricEvent {
            name: format!("Turn on {}{}", range, range_suffix(range)),
            properties: None,
        },
        PortalAction::TurnOffCbgRange { range } => MetricEvent {
            name: format!("Turn off {}{}", range, range_suffix(range)),
            properties: None,
        },
        PortalAction::Other(_) => return None,
    };
    Some(event)
}

pub struct TrackingMiddleware<M: MetricsSink> {
    metrics: M,
}

impl<M: MetricsSink> TrackingMiddleware<M> {
    pub fn new(metrics: M) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &M {
        &self.metrics
    }

    /// Track `action` if it maps to an event, then hand it on to `next`.
    pub fn dispatch<R>(&self, action: PortalAction, next: impl FnOnce(PortalAction) -> R) -> R {
        if let Some(event) = track_metric(&action) {
            debug!("[PHASE: tracking] [STEP: track] {}", event.name);
            self.metrics.track(&event.name, event.properties.as_ref());
        }
        next(action)
    }
}
