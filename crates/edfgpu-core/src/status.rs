//! Plugin result status

use serde::{Deserialize, Serialize};

/// Outcome class of a plugin call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Code {
    /// The call succeeded
    Success,
    /// The node does not fit this work item; not a failure
    Unschedulable,
    /// Something is broken and no decision could be made
    Error,
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Code::Success => write!(f, "Success"),
            Code::Unschedulable => write!(f, "Unschedulable"),
            Code::Error => write!(f, "Error"),
        }
    }
}

/// Status returned by filter, score and pre-enqueue plugins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Outcome class
    pub code: Code,
    /// Human-readable reasons
    pub reasons: Vec<String>,
}

impl Status {
    /// A successful status with no reasons
    pub fn success() -> Self {
        Self {
            code: Code::Success,
            reasons: Vec::new(),
        }
    }

    /// The node does not fit the work item
    pub fn unschedulable(reason: impl Into<String>) -> Self {
        Self {
            code: Code::Unschedulable,
            reasons: vec![reason.into()],
        }
    }

    /// No decision could be made
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            code: Code::Error,
            reasons: vec![reason.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }

    pub fn is_unschedulable(&self) -> bool {
        self.code == Code::Unschedulable
    }

    /// All reasons joined into one message
    pub fn message(&self) -> String {
        self.reasons.join(", ")
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reasons.is_empty() {
            write!(f, "{}", self.code)
        } else {
            write!(f, "{}: {}", self.code, self.message())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_constructors() {
        assert!(Status::success().is_success());
        assert!(Status::unschedulable("no room").is_unschedulable());
        assert_eq!(Status::error("boom").code, Code::Error);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(Status::success().to_string(), "Success");
        assert_eq!(
            Status::unschedulable("insufficient GPU").to_string(),
            "Unschedulable: insufficient GPU"
        );
    }
}
