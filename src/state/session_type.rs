//! Work/break session marker

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which kind of session the user is currently in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
    #[default]
    Work,
    Break,
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionType::Work => write!(f, "work"),
            SessionType::Break => write!(f, "break"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_as_plain_strings() {
        assert_eq!(serde_json::to_string(&SessionType::Break).unwrap(), "\"break\"");
        let parsed: SessionType = serde_json::from_str("\"work\"").unwrap();
        assert_eq!(parsed, SessionType::Work);
        assert_eq!(SessionType::Break.to_string(), "break");
    }
}
