//! iFlow CLI settings file generation.
//!
//! The iFlow CLI reads `~/.iflow/settings.json`. It is either the user's own
//! JSON (validated and pretty-printed) or generated from the API key, base
//! URL and model.

use crate::config::Config;
use crate::error::{ActionError, Result};
use crate::fs::atomic_write;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Directory under the home directory holding iFlow state.
pub const IFLOW_DIR: &str = ".iflow";

/// Settings file name inside [`IFLOW_DIR`].
pub const SETTINGS_FILE: &str = "settings.json";

/// Generated settings, in the iFlow CLI's camelCase schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IFlowSettings {
    pub theme: String,
    pub selected_auth_type: String,
    pub api_key: String,
    pub base_url: String,
    pub model_name: String,
    pub search_api_key: String,
}

impl IFlowSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            theme: "Default".to_string(),
            selected_auth_type: "iflow".to_string(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model_name: config.model.clone(),
            search_api_key: config.api_key.clone(),
        }
    }
}

/// Where settings live for a given home directory.
pub fn settings_path(home: &Path) -> PathBuf {
    home.join(IFLOW_DIR).join(SETTINGS_FILE)
}

/// The user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| ActionError::SetupError("failed to get home directory".to_string()))
}

/// Render the settings file contents for `config`.
pub fn render_settings(config: &Config) -> Result<String> {
    if config.settings_json.is_empty() {
        return serde_json::to_string_pretty(&IFlowSettings::from_config(config))
            .map_err(|e| ActionError::SetupError(format!("failed to marshal settings: {}", e)));
    }

    let value: serde_json::Value = serde_json::from_str(&config.settings_json)
        .map_err(|e| ActionError::UserError(format!("invalid settings_json provided: {}", e)))?;
    if !value.is_object() {
        return Err(ActionError::UserError(
            "invalid settings_json provided: expected a JSON object".to_string(),
        ));
    }

    serde_json::to_string_pretty(&value)
        .map_err(|e| ActionError::SetupError(format!("failed to format settings JSON: {}", e)))
}

/// Write the settings file under `home`, returning its path.
pub fn write_settings(config: &Config, home: &Path) -> Result<PathBuf> {
    let content = render_settings(config)?;
    let path = settings_path(home);
    atomic_write(&path, content.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use serde_json::json;
    use tempfile::TempDir;

    fn make_config(api_key: &str, settings_json: &str) -> Config {
        Config {
            mode: Mode::Cli,
            prompt: "hi".to_string(),
            api_key: api_key.to_string(),
            settings_json: settings_json.to_string(),
            base_url: "https://apis.iflow.cn/v1".to_string(),
            model: "Qwen3-Coder".to_string(),
            working_dir: PathBuf::from("."),
            timeout_secs: 60,
            extra_args: String::new(),
            precmd: String::new(),
            gh_version: String::new(),
            iflow_version: String::new(),
        }
    }

    #[test]
    fn generated_settings_use_camel_case_schema() {
        let rendered = render_settings(&make_config("sk-abc", "")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(
            value,
            json!({
                "theme": "Default",
                "selectedAuthType": "iflow",
                "apiKey": "sk-abc",
                "baseUrl": "https://apis.iflow.cn/v1",
                "modelName": "Qwen3-Coder",
                "searchApiKey": "sk-abc",
            })
        );
        assert!(rendered.contains("\n  \"theme\""), "two-space indent");
    }

    #[test]
    fn provided_settings_are_pretty_printed() {
        let rendered =
            render_settings(&make_config("", r#"{"theme":"Dark","apiKey":"sk-own"}"#)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value, json!({"theme": "Dark", "apiKey": "sk-own"}));
        assert!(rendered.contains('\n'));
    }

    #[test]
    fn provided_settings_must_be_json_object() {
        let err = render_settings(&make_config("", "{not json")).unwrap_err();
        assert!(err.to_string().contains("invalid settings_json provided"));

        let err = render_settings(&make_config("", "[1, 2]")).unwrap_err();
        assert!(err.to_string().contains("expected a JSON object"));
    }

    #[test]
    fn write_settings_creates_iflow_dir() {
        let home = TempDir::new().unwrap();

        let path = write_settings(&make_config("sk-abc", ""), home.path()).unwrap();

        assert_eq!(path, home.path().join(".iflow").join("settings.json"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"apiKey\": \"sk-abc\""));
    }

    #[test]
    fn write_settings_overwrites_previous_file() {
        let home = TempDir::new().unwrap();
        write_settings(&make_config("sk-old", ""), home.path()).unwrap();

        let path = write_settings(&make_config("sk-new", ""), home.path()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("sk-new"));
        assert!(!content.contains("sk-old"));
    }
}
