//! Bridge status and observer events.
//!
//! Events go out to observers as one JSON object per message:
//!
//! ```json
//! {"type":"status","data":"INITIALIZED"}
//! {"type":"state","data":{"state":{"drive_state":{"speed":0.0}}}}
//! {"type":"input","data":"Program started\n"}
//! ```

use crate::decode::StateTree;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Lifecycle of the bridge.
///
/// `Initializing → Initialized`, and either of them `→ Error`.
/// `Error` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeStatus {
    /// Waiting for the mapping block.
    Initializing,
    /// Layout known; polling and forwarding commands.
    Initialized,
    /// Region absent or mapping rejected. Permanent.
    Error,
}

impl BridgeStatus {
    /// `true` if the transition `self → next` is allowed.
    pub const fn can_transition_to(self, next: BridgeStatus) -> bool {
        matches!(
            (self, next),
            (BridgeStatus::Initializing, BridgeStatus::Initialized)
                | (BridgeStatus::Initializing, BridgeStatus::Error)
                | (BridgeStatus::Initialized, BridgeStatus::Error)
        )
    }

    /// Wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            BridgeStatus::Initializing => "INITIALIZING",
            BridgeStatus::Initialized => "INITIALIZED",
            BridgeStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event delivered to observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum BridgeEvent {
    /// Current bridge status.
    Status(BridgeStatus),
    /// Full decoded state, shared between all observers.
    State(Arc<StateTree>),
    /// Control process output.
    Input(String),
}

impl BridgeEvent {
    /// Serialize to the wire format.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::FieldValue;

    #[test]
    fn transition_table() {
        use BridgeStatus::*;
        assert!(Initializing.can_transition_to(Initialized));
        assert!(Initializing.can_transition_to(Error));
        assert!(Initialized.can_transition_to(Error));

        assert!(!Initialized.can_transition_to(Initializing));
        assert!(!Error.can_transition_to(Initializing));
        assert!(!Error.can_transition_to(Initialized));
        assert!(!Error.can_transition_to(Error));
    }

    #[test]
    fn status_wire_format() {
        assert_eq!(
            BridgeEvent::Status(BridgeStatus::Initializing).to_json().unwrap(),
            r#"{"type":"status","data":"INITIALIZING"}"#
        );
        assert_eq!(
            BridgeEvent::Status(BridgeStatus::Initialized).to_json().unwrap(),
            r#"{"type":"status","data":"INITIALIZED"}"#
        );
        assert_eq!(
            BridgeEvent::Status(BridgeStatus::Error).to_json().unwrap(),
            r#"{"type":"status","data":"ERROR"}"#
        );
    }

    #[test]
    fn input_wire_format() {
        assert_eq!(
            BridgeEvent::Input("Program started\n".to_string())
                .to_json()
                .unwrap(),
            r#"{"type":"input","data":"Program started\n"}"#
        );
    }

    #[test]
    fn state_wire_format() {
        let mut tree = StateTree::new();
        tree.insert(&["speed".to_string()], FieldValue::Float(3.25));
        tree.insert(
            &["battery".to_string(), "voltage".to_string()],
            FieldValue::Unsigned(12),
        );
        assert_eq!(
            BridgeEvent::State(Arc::new(tree)).to_json().unwrap(),
            r#"{"type":"state","data":{"battery":{"voltage":12},"speed":3.25}}"#
        );
    }

    #[test]
    fn non_finite_floats_become_null() {
        let mut tree = StateTree::new();
        tree.insert(&["nan".to_string()], FieldValue::Float(f64::NAN));
        assert_eq!(
            BridgeEvent::State(Arc::new(tree)).to_json().unwrap(),
            r#"{"type":"state","data":{"nan":null}}"#
        );
    }
}
