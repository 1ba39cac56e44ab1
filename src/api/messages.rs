//! Control messages exchanged between the popup and the background controller

use serde::{Deserialize, Serialize};

use crate::state::TimerState;

/// Request kinds accepted on the control channel, tagged by `action`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    StartTimer {
        minutes: f64,
    },
    #[serde(rename_all = "camelCase")]
    PauseTimer {
        time_left: u64,
    },
    ResumeTimer,
    GetTimerState,
}

impl ControlMessage {
    /// Action name as it appears on the wire
    pub fn action(&self) -> &'static str {
        match self {
            ControlMessage::StartTimer { .. } => "startTimer",
            ControlMessage::PauseTimer { .. } => "pauseTimer",
            ControlMessage::ResumeTimer => "resumeTimer",
            ControlMessage::GetTimerState => "getTimerState",
        }
    }
}

/// Acknowledgement for state-changing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply to a control message: an acknowledgement, or the timer state
/// (`null` when no session was ever stored)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlReply {
    Ack(Ack),
    TimerState(Option<TimerState>),
}

impl ControlReply {
    pub fn ok() -> Self {
        ControlReply::Ack(Ack { success: true, error: None })
    }

    pub fn failed(error: String) -> Self {
        ControlReply::Ack(Ack { success: false, error: Some(error) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn messages_use_action_tags() {
        let start: ControlMessage =
            serde_json::from_value(json!({"action": "startTimer", "minutes": 25})).unwrap();
        assert_eq!(start, ControlMessage::StartTimer { minutes: 25.0 });

        let pause: ControlMessage =
            serde_json::from_value(json!({"action": "pauseTimer", "timeLeft": 90})).unwrap();
        assert_eq!(pause, ControlMessage::PauseTimer { time_left: 90 });

        assert_eq!(
            serde_json::to_value(ControlMessage::ResumeTimer).unwrap(),
            json!({"action": "resumeTimer"})
        );
        assert_eq!(ControlMessage::GetTimerState.action(), "getTimerState");
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let parsed = serde_json::from_value::<ControlMessage>(json!({"action": "stopTimer"}));
        assert!(parsed.is_err());
    }

    #[test]
    fn replies_match_the_wire_shapes() {
        assert_eq!(serde_json::to_value(ControlReply::ok()).unwrap(), json!({"success": true}));
        assert_eq!(serde_json::to_value(ControlReply::TimerState(None)).unwrap(), json!(null));

        let null: ControlReply = serde_json::from_value(json!(null)).unwrap();
        assert_eq!(null, ControlReply::TimerState(None));

        let state: ControlReply = serde_json::from_value(
            json!({"active": true, "paused": true, "totalDuration": 60, "remainingTime": 12}),
        )
        .unwrap();
        match state {
            ControlReply::TimerState(Some(timer)) => assert_eq!(timer.remaining_time, 12),
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
