use crate::config::HookConfig;
use crate::models::{CaptureContext, CapturePayload};
use crate::output::format_timestamp;
use crate::push;
use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;

/// UserPromptSubmit hook input from Claude Code. Other fields are ignored;
/// missing or null fields read as empty strings.
#[derive(Debug, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    prompt: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    cwd: Option<String>,
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Invalid JSON input")
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or_default()
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or_default()
    }

    pub fn cwd(&self) -> &str {
        self.cwd.as_deref().unwrap_or_default()
    }
}

/// Last non-empty component of a path, handling both Windows and Unix separators
pub fn project_name(cwd: &str) -> Option<String> {
    cwd.split(|c| c == '/' || c == '\\')
        .filter(|s| !s.is_empty())
        .last()
        .map(|s| s.to_string())
}

pub fn build_payload(input: &HookInput, model: &str) -> CapturePayload {
    CapturePayload {
        prompt: input.prompt().to_string(),
        context: Some(CaptureContext {
            project: project_name(input.cwd()),
            workspace: Some(input.cwd().to_string()),
            file: None,
            model: Some(model.to_string()),
            session_id: Some(input.session_id().to_string()),
            timestamp: Some(format_timestamp(chrono::Utc::now())),
        }),
    }
}

/// Parse the hook input and make one best-effort delivery.
/// Only malformed input is an error; delivery failures are swallowed.
pub fn run_hook<R: Read>(mut stdin: R, config: &HookConfig) -> Result<()> {
    let mut raw = String::new();
    stdin
        .read_to_string(&mut raw)
        .context("Failed to read hook input from stdin")?;

    let input = HookInput::parse(&raw)?;
    let payload = build_payload(&input, &config.model);

    let timeout = Duration::from_millis(config.timeout_ms);
    match push::push_capture(&config.endpoint, &payload, timeout) {
        Ok(()) => debug!("Captured prompt via {}", config.endpoint),
        Err(e) => debug!("Prompt capture skipped: {:#}", e),
    }

    Ok(())
}
