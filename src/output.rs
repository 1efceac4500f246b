use crate::config::ServerConfig;
use crate::models::CapturePayload;
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// RFC 3339 UTC with microseconds and a `Z` suffix
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Pick the log file for a payload: `<workspace>/<log_filename>` when the
/// workspace is an existing directory, otherwise the fallback log.
pub fn resolve_log_path(config: &ServerConfig, payload: &CapturePayload) -> PathBuf {
    match payload.workspace() {
        Some(ws) if !ws.is_empty() && Path::new(ws).is_dir() => {
            Path::new(ws).join(&config.log_filename)
        }
        _ => config.fallback_log.clone(),
    }
}

/// Render one Markdown log entry
pub fn render_entry(payload: &CapturePayload, received_at: DateTime<Utc>) -> String {
    let ctx = payload.context.as_ref();
    let project = ctx.and_then(|c| c.project.as_deref()).unwrap_or("");
    let workspace = ctx.and_then(|c| c.workspace.as_deref()).unwrap_or("");
    let file = ctx.and_then(|c| c.file.as_deref()).unwrap_or("");
    let model = ctx.and_then(|c| c.model.as_deref()).unwrap_or("");

    format!(
        "---\n\
         timestamp: {}\n\
         project: {}\n\
         workspace: {}\n\
         file: {}\n\
         model: {}\n\
         ---\n\
         **Prompt:**\n{}\n\n",
        format_timestamp(received_at),
        project,
        workspace,
        file,
        model,
        payload.prompt,
    )
}

/// Append an entry for `payload` to its resolved log file and return that path.
pub fn append_entry(config: &ServerConfig, payload: &CapturePayload) -> Result<PathBuf> {
    let log_path = resolve_log_path(config, payload);

    // Ensure directory exists
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let entry = render_entry(payload, Utc::now());

    // One write per entry; concurrent writers rely on O_APPEND
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

    file.write_all(entry.as_bytes())
        .with_context(|| format!("Failed to append to log file: {}", log_path.display()))?;

    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LOG_FILENAME;
    use crate::models::CaptureContext;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn config_with_fallback(fallback: PathBuf) -> ServerConfig {
        ServerConfig {
            fallback_log: fallback,
            ..ServerConfig::default()
        }
    }

    fn payload(prompt: &str, workspace: Option<&str>) -> CapturePayload {
        CapturePayload {
            prompt: prompt.to_string(),
            context: Some(CaptureContext {
                project: Some("myproj".to_string()),
                workspace: workspace.map(str::to_string),
                model: Some("claude-sonnet-4-5".to_string()),
                ..CaptureContext::default()
            }),
        }
    }

    #[test]
    fn renders_blank_fields_without_context() {
        let at = Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        let entry = render_entry(
            &CapturePayload {
                prompt: "fix the bug".to_string(),
                context: None,
            },
            at,
        );

        assert_eq!(
            entry,
            "---\n\
             timestamp: 2025-03-04T05:06:07.000000Z\n\
             project: \n\
             workspace: \n\
             file: \n\
             model: \n\
             ---\n\
             **Prompt:**\nfix the bug\n\n"
        );
    }

    #[test]
    fn renders_null_context_fields_blank() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let payload: CapturePayload = serde_json::from_str(
            r#"{"prompt": "p", "context": {"project": null, "workspace": "/w", "model": null}}"#,
        )
        .unwrap();
        let entry = render_entry(&payload, at);

        assert!(entry.contains("project: \nworkspace: /w\nfile: \nmodel: \n---\n"));
        assert!(!entry.contains("None"));
        // rendering borrows; the payload is untouched
        assert_eq!(payload.workspace(), Some("/w"));
    }

    #[test]
    fn renders_context_fields() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let entry = render_entry(&payload("multi\nline", Some("/home/user/myproj")), at);

        assert!(entry.contains("project: myproj\n"));
        assert!(entry.contains("workspace: /home/user/myproj\n"));
        assert!(entry.contains("file: \n"));
        assert!(entry.contains("model: claude-sonnet-4-5\n"));
        assert!(entry.ends_with("**Prompt:**\nmulti\nline\n\n"));
    }

    #[test]
    fn existing_workspace_gets_its_own_log() {
        let ws = tempdir().unwrap();
        let fallback = tempdir().unwrap().path().join("global.md");
        let config = config_with_fallback(fallback.clone());

        let ws_str = ws.path().to_string_lossy().to_string();
        let path = resolve_log_path(&config, &payload("x", Some(&ws_str)));
        assert_eq!(path, ws.path().join(LOG_FILENAME));
    }

    #[test]
    fn unusable_workspace_falls_back() {
        let dir = tempdir().unwrap();
        let fallback = dir.path().join("global.md");
        let config = config_with_fallback(fallback.clone());

        let missing = dir.path().join("does-not-exist");
        let missing = missing.to_string_lossy().to_string();
        let file_ws = dir.path().join("plain-file");
        fs::write(&file_ws, "").unwrap();
        let file_ws = file_ws.to_string_lossy().to_string();

        for ws in [None, Some(""), Some(missing.as_str()), Some(file_ws.as_str())] {
            assert_eq!(resolve_log_path(&config, &payload("x", ws)), fallback);
        }

        let no_context = CapturePayload {
            prompt: "x".to_string(),
            context: None,
        };
        assert_eq!(resolve_log_path(&config, &no_context), fallback);
    }

    #[test]
    fn appends_in_order_without_touching_fallback() {
        let ws = tempdir().unwrap();
        let other = tempdir().unwrap();
        let fallback = other.path().join("global.md");
        let config = config_with_fallback(fallback.clone());
        let ws_str = ws.path().to_string_lossy().to_string();

        for i in 0..3 {
            append_entry(&config, &payload(&format!("prompt {}", i), Some(&ws_str))).unwrap();
        }

        let content = fs::read_to_string(ws.path().join(LOG_FILENAME)).unwrap();
        let prompts: Vec<&str> = content
            .split("**Prompt:**\n")
            .skip(1)
            .map(|block| block.lines().next().unwrap())
            .collect();
        assert_eq!(prompts, vec!["prompt 0", "prompt 1", "prompt 2"]);
        assert_eq!(content.matches("---\ntimestamp: ").count(), 3);
        assert!(!fallback.exists());
    }

    #[test]
    fn fallback_parent_directory_is_created() {
        let dir = tempdir().unwrap();
        let fallback = dir.path().join("logs").join("global.md");
        let config = config_with_fallback(fallback.clone());

        let written = append_entry(
            &config,
            &CapturePayload {
                prompt: String::new(),
                context: None,
            },
        )
        .unwrap();

        assert_eq!(written, fallback);
        let content = fs::read_to_string(&fallback).unwrap();
        assert!(content.ends_with("**Prompt:**\n\n\n"));
    }
}
