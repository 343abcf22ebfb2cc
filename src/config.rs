use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use pluralkit::{ApiVersion, ClientConfig};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use serde_with::DisplayFromStr;
use thiserror::Error;
use url::Url;

const CONFIG_PATH: &str = "pkctl/config.json";

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("could not find the user config directory")]
    NoConfigDir,
    #[error("could not serialize config")]
    Serialize(#[from] serde_json::Error),
    #[error("could not create {}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("could not write {}", .path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[serde_as]
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<ApiVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Url>,
}

fn config_path() -> Option<PathBuf> {
    let Some(dirs) = BaseDirs::new() else {
        log::warn!("could not get basedirs");
        return None;
    };
    Some(dirs.config_dir().join(CONFIG_PATH))
}

impl Config {
    /// Reads the config file. A missing or broken file is an empty config.
    pub fn load() -> Config {
        let Some(path) = config_path() else {
            return Default::default();
        };
        let Ok(contents) = fs::read_to_string(&path) else {
            log::debug!("no config at {}", path.display());
            return Default::default();
        };

        let config: Config = match serde_json::from_str(&contents) {
            Ok(x) => x,
            Err(e) => {
                log::warn!("error deserializing config: {e}");
                return Default::default();
            }
        };

        log::debug!(
            "config: version {:?}, base url {:?}, token set: {}",
            config.api_version,
            config.base_url,
            config.token.is_some()
        );

        config
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let json_str = serde_json::to_string_pretty(&self)?;

        if let Some(ancestor) = path.parent() {
            fs::create_dir_all(ancestor).map_err(|source| ConfigError::CreateDir {
                path: ancestor.to_path_buf(),
                source,
            })?;
        }

        fs::write(path, json_str).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("config written to {}", path.display());
        Ok(())
    }

    /// The client settings, with values given on the command line taking priority.
    pub fn client_config(
        &self,
        token: Option<String>,
        version: Option<ApiVersion>,
        base_url: Option<Url>,
    ) -> ClientConfig {
        let mut config = ClientConfig::new()
            .user_agent(crate::USER_AGENT)
            .version(version.or(self.api_version).unwrap_or_default());
        if let Some(token) = token.or_else(|| self.token.clone()) {
            config = config.token(token);
        }
        if let Some(base_url) = base_url.or_else(|| self.base_url.clone()) {
            config = config.base_url(base_url);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_parse() {
        let config: Config = serde_json::from_str(r#"{ "api_version": "v1" }"#).unwrap();
        assert_eq!(config.api_version, Some(ApiVersion::V1));
        assert!(config.token.is_none());

        let empty: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(serde_json::to_string(&empty).unwrap(), "{}");
    }

    #[test]
    fn test_save_failure_is_reported() {
        let blocker = std::env::temp_dir().join(format!("pkctl-test-{}", std::process::id()));
        fs::write(&blocker, "not a directory").unwrap();

        let config = Config {
            token: Some("tok".to_string()),
            ..Default::default()
        };
        let result = config.save_to(&blocker.join("pkctl").join("config.json"));
        fs::remove_file(&blocker).unwrap();

        assert!(matches!(result, Err(ConfigError::CreateDir { .. })));
    }

    #[test]
    fn test_save_round_trip() {
        let dir = std::env::temp_dir().join(format!("pkctl-test-dir-{}", std::process::id()));
        let path = dir.join("config.json");
        let config = Config {
            api_version: Some(ApiVersion::V1),
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(serde_json::from_str::<Config>(&written).unwrap().api_version, Some(ApiVersion::V1));
    }

    #[test]
    fn test_flags_win() {
        let config = Config {
            token: Some("stored".to_string()),
            api_version: Some(ApiVersion::V1),
            base_url: None,
        };
        let client = config.client_config(None, Some(ApiVersion::V2), None);
        assert!(client.has_token());
        assert_eq!(client.api_version(), ApiVersion::V2);
    }
}
