use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::debug;

use crate::error::{PteroError, Result};
use crate::types::ConnectionIdentity;

/// Library identifier appended to the API family in the User-Agent header
pub const DEFAULT_USER_AGENT: &str = concat!("ptero-client v", env!("CARGO_PKG_VERSION"));

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// Connection settings for a [`RequestDispatcher`](crate::RequestDispatcher)
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API family, e.g. "Application" or "Client"
    pub api_family: String,
    /// Panel base URL, used verbatim as a prefix
    pub domain: String,
    /// Bearer token
    pub credential: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per-request timeout; the transport default applies when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ClientConfig {
    pub fn new(
        api_family: impl Into<String>,
        domain: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            api_family: api_family.into(),
            domain: domain.into(),
            credential: credential.into(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs());
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Read a JSON config file
    pub async fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PteroError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;
        config.validate()?;

        debug!(path = %path.display(), "Config loaded successfully");
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub async fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        debug!(path = %path.display(), "Config saved successfully");

        Ok(())
    }

    /// Reject configs that could never authenticate a request
    pub fn validate(&self) -> Result<()> {
        if self.api_family.is_empty() {
            return Err(PteroError::Config("api type is required for requests".into()));
        }
        if self.domain.is_empty() {
            return Err(PteroError::Config("panel domain is required".into()));
        }
        if self.credential.is_empty() {
            return Err(PteroError::Config(
                "missing authorization for requests".into(),
            ));
        }
        Ok(())
    }

    pub fn identity(&self) -> ConnectionIdentity {
        ConnectionIdentity::new(&self.api_family, &self.domain, &self.credential)
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_family", &self.api_family)
            .field("domain", &self.domain)
            .field("credential", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("Client", "https://panel.test", "ptlc_token");
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert!(config.user_agent.starts_with("ptero-client v"));
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validate() {
        let config = ClientConfig::new("", "https://panel.test", "token");
        assert!(matches!(config.validate(), Err(PteroError::Config(_))));

        let config = ClientConfig::new("Client", "https://panel.test", "");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("authorization"));
    }

    #[tokio::test]
    async fn test_config_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ptero.json");

        let config = ClientConfig::new("Application", "https://panel.test", "ptla_token")
            .with_timeout(Duration::from_secs(15));
        config.write(&path).await.unwrap();

        let loaded = ClientConfig::read(&path).await.unwrap();
        assert_eq!(loaded.api_family, "Application");
        assert_eq!(loaded.credential, "ptla_token");
        assert_eq!(loaded.timeout(), Some(Duration::from_secs(15)));
    }

    #[tokio::test]
    async fn test_config_read_applies_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ptero.json");
        std::fs::write(
            &path,
            r#"{"api_family":"Client","domain":"https://panel.test","credential":"abc"}"#,
        )
        .unwrap();

        let loaded = ClientConfig::read(&path).await.unwrap();
        assert_eq!(loaded.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(loaded.timeout_secs, None);
    }

    #[tokio::test]
    async fn test_config_read_errors() {
        let temp_dir = TempDir::new().unwrap();

        let missing = ClientConfig::read(&temp_dir.path().join("absent.json")).await;
        assert!(matches!(missing, Err(PteroError::Io(_))));

        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let invalid = ClientConfig::read(&path).await;
        assert!(matches!(invalid, Err(PteroError::Config(_))));
    }

    #[test]
    fn test_config_debug_redacts_credential() {
        let config = ClientConfig::new("Client", "https://panel.test", "ptlc_secret");
        assert!(!format!("{:?}", config).contains("ptlc_secret"));
    }
}
