use policyqa_core::util::hash_password;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that overrides `llm.api_key`.
pub const API_KEY_ENV: &str = "POLICYQA_API_KEY";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub conversation: ConversationSettings,
    #[serde(default)]
    pub users: Vec<UserCredential>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_bind")]
    pub bind: String,
    /// Set the Secure flag on the session cookie (requires HTTPS).
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default = "ServerConfig::default_session_ttl_minutes")]
    pub session_ttl_minutes: u64,
    #[serde(default = "ServerConfig::default_cleanup_interval_seconds")]
    pub cleanup_interval_seconds: u64,
    #[serde(default = "ServerConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: Self::default_bind(),
            secure_cookies: false,
            session_ttl_minutes: Self::default_session_ttl_minutes(),
            cleanup_interval_seconds: Self::default_cleanup_interval_seconds(),
            max_upload_bytes: Self::default_max_upload_bytes(),
        }
    }
}

impl ServerConfig {
    fn default_bind() -> String {
        "127.0.0.1:5000".to_string()
    }

    const fn default_session_ttl_minutes() -> u64 {
        60
    }

    const fn default_cleanup_interval_seconds() -> u64 {
        300
    }

    const fn default_max_upload_bytes() -> usize {
        16 * 1024 * 1024
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    Ollama,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl ProviderKind {
    /// Hosted providers authenticate with `llm.api_key`.
    #[must_use]
    pub const fn needs_api_key(self) -> bool {
        matches!(self, Self::Gemini | Self::HuggingFace)
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini",
            Self::Ollama => "Ollama",
            Self::HuggingFace => "Hugging Face",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "LlmConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LlmConfig {
    const fn default_timeout_secs() -> u64 {
        60
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ConversationSettings {
    /// Number of past exchanges included in each prompt
    #[serde(default = "ConversationSettings::default_history_window")]
    pub history_window: usize,
    /// Cap on stored exchanges per session; absent means unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stored_entries: Option<usize>,
    /// Replacement for the built-in instruction preamble
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            history_window: Self::default_history_window(),
            max_stored_entries: None,
            preamble: None,
        }
    }
}

impl ConversationSettings {
    const fn default_history_window() -> usize {
        5
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub username: String,
    /// Argon2 PHC string of the password, see `policyqa hash-password`
    pub password_hash: String,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("policyqa"))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load from `~/policyqa/config.json`.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'policyqa init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config = Self::from_json(&content)?;
        config.apply_env_overrides(std::env::var(API_KEY_ENV).ok());
        info!("Loaded config from {}", config_path.display());

        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Apply the value of [`API_KEY_ENV`], if set and non-empty.
    pub fn apply_env_overrides(&mut self, api_key: Option<String>) {
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            info!("Using API key from {API_KEY_ENV}");
            self.llm.api_key = key;
        }
    }

    /// Check the settings needed to serve requests.
    pub fn validate(&self) -> anyhow::Result<()> {
        let provider = self.llm.provider;
        if provider.needs_api_key()
            && (self.llm.api_key.trim().is_empty() || self.llm.api_key == API_KEY_PLACEHOLDER)
        {
            anyhow::bail!(
                "{} API key not configured. Set \"llm.api_key\" in config or {API_KEY_ENV}",
                provider.label()
            );
        }
        if self.llm.timeout_secs == 0 {
            anyhow::bail!("\"llm.timeout_secs\" must be greater than zero");
        }
        if self.users.is_empty() {
            warn!("No users configured; nobody will be able to log in");
        }
        Ok(())
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    /// Default config file contents, with one user `admin` / `changeme`.
    pub fn template() -> anyhow::Result<String> {
        let password_hash = hash_password(DEFAULT_PASSWORD)?;
        Ok(format!(
            r#"{{
  "server": {{
    "bind": "127.0.0.1:5000",
    "secure_cookies": false,
    "session_ttl_minutes": 60,
    "cleanup_interval_seconds": 300,
    "max_upload_bytes": 16777216
  }},
  "llm": {{
    "provider": "gemini",
    "api_key": "{API_KEY_PLACEHOLDER}",
    "model": "gemini-1.5-flash",
    "timeout_secs": 60
  }},
  "conversation": {{
    "history_window": 5
  }},
  "users": [
    {{
      "username": "admin",
      "password_hash": "{password_hash}"
    }}
  ]
}}"#
        ))
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        std::fs::write(&config_path, Self::template()?)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Get a Gemini API key: https://aistudio.google.com/app/apikey");
        println!("   2. Put it in \"llm.api_key\" (or export {API_KEY_ENV})");
        println!("   3. Replace the default login admin / {DEFAULT_PASSWORD}:");
        println!("      policyqa hash-password <new-password>");
        println!("   4. Run 'policyqa serve' and open http://127.0.0.1:5000");
        println!();
        println!("🔧 Configuration options:");
        println!("   - llm.provider: gemini, huggingface or ollama (local, no API key needed)");
        println!("   - conversation.history_window: past Q/A pairs included in each prompt");
        println!("   - conversation.max_stored_entries: cap on stored chat history per session");
        println!();
        Ok(())
    }
}

const API_KEY_PLACEHOLDER: &str = "your-gemini-api-key-here";
const DEFAULT_PASSWORD: &str = "changeme";
