use crate::types::{PosterError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Platform OAuth secrets plus the language-model API key.
#[derive(Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub oauth_consumer_key: String,
    #[serde(default)]
    pub oauth_consumer_secret: String,
    #[serde(default)]
    pub oauth_access_token: String,
    #[serde(default)]
    pub oauth_access_token_secret: String,
    #[serde(default)]
    pub xai_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("oauth_consumer_key", &"***")
            .field("oauth_consumer_secret", &"***")
            .field("oauth_access_token", &"***")
            .field("oauth_access_token_secret", &"***")
            .field("xai_api_key", &"***")
            .finish()
    }
}

impl Credentials {
    /// Fails listing every missing or blank secret.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("OAUTH_CONSUMER_KEY", &self.oauth_consumer_key),
            ("OAUTH_CONSUMER_SECRET", &self.oauth_consumer_secret),
            ("OAUTH_ACCESS_TOKEN", &self.oauth_access_token),
            ("OAUTH_ACCESS_TOKEN_SECRET", &self.oauth_access_token_secret),
            ("XAI_API_KEY", &self.xai_api_key),
        ];

        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PosterError::MissingCredentials { names: missing })
        }
    }
}

/// A place credentials may come from.
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> String;

    /// `Ok(None)` when this source has nothing to offer and the next one
    /// should be tried.
    fn load(&self) -> Result<Option<Credentials>>;
}

/// Secrets stored in a TOML file, keys in lowercase.
pub struct FileCredentialSource {
    path: PathBuf,
}

impl FileCredentialSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

impl CredentialSource for FileCredentialSource {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn load(&self) -> Result<Option<Credentials>> {
        if !self.path.exists() {
            debug!("No secrets file at {}", self.path.display());
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let credentials: Credentials = toml::from_str(&raw)
            .map_err(|e| PosterError::Config(format!("{}: {}", self.path.display(), e)))?;
        Ok(Some(credentials))
    }
}

/// Secrets read from environment variables.
pub struct EnvCredentialSource {
    lookup: Box<dyn Fn(&str) -> Option<String> + Send + Sync>,
}

impl EnvCredentialSource {
    pub fn new() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { lookup: Box::new(lookup) }
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialSource for EnvCredentialSource {
    fn name(&self) -> String {
        "environment".to_string()
    }

    fn load(&self) -> Result<Option<Credentials>> {
        let get = |key: &str| (self.lookup)(key).unwrap_or_default();
        Ok(Some(Credentials {
            oauth_consumer_key: get("OAUTH_CONSUMER_KEY"),
            oauth_consumer_secret: get("OAUTH_CONSUMER_SECRET"),
            oauth_access_token: get("OAUTH_ACCESS_TOKEN"),
            oauth_access_token_secret: get("OAUTH_ACCESS_TOKEN_SECRET"),
            xai_api_key: get("XAI_API_KEY"),
        }))
    }
}

/// Tries each source in order; the first one that answers wins.
pub struct CredentialChain {
    sources: Vec<Box<dyn CredentialSource>>,
}

impl CredentialChain {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self { sources }
    }

    /// Secrets file first, then the environment.
    pub fn standard(secrets_path: impl AsRef<Path>) -> Self {
        Self::new(vec![
            Box::new(FileCredentialSource::new(secrets_path)),
            Box::new(EnvCredentialSource::new()),
        ])
    }

    /// Resolve and validate.
    pub fn resolve(&self) -> Result<Credentials> {
        for source in &self.sources {
            if let Some(credentials) = source.load()? {
                info!("Credentials loaded from {}", source.name());
                credentials.validate()?;
                return Ok(credentials);
            }
        }

        Err(PosterError::MissingCredentials {
            names: vec!["no credential source available".to_string()],
        })
    }
}
