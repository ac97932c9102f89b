// ABOUTME: Result payload shared by the scheduled jobs
// ABOUTME: Serialized as the trigger response body

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub message: String,
    pub count: usize,
}

impl JobSummary {
    pub fn new(message: impl Into<String>, count: usize) -> Self {
        Self {
            message: message.into(),
            count,
        }
    }
}
