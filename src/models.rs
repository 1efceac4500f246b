use serde::{Deserialize, Serialize};

/// Body of `POST /capture_prompt`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CapturePayload {
    pub prompt: String,
    #[serde(default)]
    pub context: Option<CaptureContext>,
}

/// Where a prompt came from. Every field may be missing or null.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CaptureContext {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub workspace: Option<String>,
    // Not known at UserPromptSubmit time
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl CapturePayload {
    pub fn workspace(&self) -> Option<&str> {
        self.context.as_ref().and_then(|c| c.workspace.as_deref())
    }
}
