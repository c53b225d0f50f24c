use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml;

use crate::conversation::ReconcileTarget;
use crate::gateway::http::{DEFAULT_API_BASE, DEFAULT_ASK_PATH, DEFAULT_HEALTH_PATH};
use crate::warn;

/// Overrides `gateway.api_base` when set.
pub(crate) const API_BASE_ENV_VAR: &str = "PORTALCHAT_API_BASE";

const DEFAULT_BANNER: [&str; 3] = [
    "Welcome to DataSaudi Chatbot",
    "Your gateway to Saudi Arabia's data.",
    "Ask me about economy, population, and more!",
];

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("failed to read config \"{0}\": {1}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to reserialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Keybindings {
    #[default]
    Emacs,
    Vi,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct Gateway {
    pub api_base: String,
    pub ask_path: String,
    pub health_path: String,
}

impl Default for Gateway {
    fn default() -> Self {
        Gateway {
            api_base: DEFAULT_API_BASE.to_string(),
            ask_path: DEFAULT_ASK_PATH.to_string(),
            health_path: DEFAULT_HEALTH_PATH.to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub(crate) struct Chat {
    pub keybindings: Keybindings,
    pub reconcile: ReconcileTarget,
    pub banner: Vec<String>,
}

impl Default for Chat {
    fn default() -> Self {
        Chat {
            keybindings: Keybindings::default(),
            reconcile: ReconcileTarget::default(),
            banner: DEFAULT_BANNER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Deserialize, Serialize, Default, Debug, PartialEq, Eq)]
pub(crate) struct Config {
    #[serde(default)]
    pub gateway: Gateway,
    #[serde(default)]
    pub chat: Chat,
}

fn get_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME");

    if let Some(home) = home {
        let home = PathBuf::from(home);

        const USER_PATHS: [&str; 2] = [".config/portalchat/config.toml", ".portalchat.toml"];

        for &path in USER_PATHS.iter() {
            let fullpath = home.join(path);

            if fullpath.exists() {
                return Some(fullpath);
            }
        }
    }

    let system_config = PathBuf::from("/etc/portalchat.toml");

    if system_config.exists() {
        Some(system_config)
    } else {
        None
    }
}

/// Collects the dotted paths of keys present in `user_config` but unknown to
/// `config`.
fn extra_fields_helper<'a>(
    path: &mut Vec<&'a str>,
    user_config: &'a toml::Table,
    config: &'a toml::Table,
    extra: &mut Vec<String>,
) {
    for (user_key, user_value) in user_config {
        path.push(user_key);

        if let Some(config_value) = config.get(user_key) {
            if let (toml::Value::Table(user_value), toml::Value::Table(config_value)) =
                (user_value, config_value)
            {
                extra_fields_helper(path, user_value, config_value, extra)
            }
        } else {
            extra.push(path.join("."));
        }

        path.pop();
    }
}

fn extra_fields(config: &Config, raw_config: &str) -> Result<Vec<String>, Error> {
    let user_config: toml::Table = toml::from_str(raw_config)?;

    let config: toml::Table = {
        let serialized_config = toml::to_string(config)?;

        toml::from_str(&serialized_config)?
    };

    let mut path = Vec::new();
    let mut extra = Vec::new();

    extra_fields_helper(&mut path, &user_config, &config, &mut extra);

    Ok(extra)
}

/// Parses a configuration document, warning about keys it does not know.
pub(crate) fn parse_config(raw_config: &str) -> Result<Config, Error> {
    let config: Config = toml::from_str(raw_config)?;

    for key in extra_fields(&config, raw_config)? {
        warn!("config contains extraneous key \"{}\", ignoring", key);
    }

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, Error> {
    let raw_config =
        std::fs::read_to_string(path).map_err(|e| Error::Read(path.to_path_buf(), e))?;

    parse_config(&raw_config)
}

/// Reads the configuration from `config`, or from the first standard location
/// that exists. Falls back to the defaults when there is no file at all.
pub(crate) fn read_config(config: Option<PathBuf>) -> Result<Config, Error> {
    let config_path = config.or_else(get_config_path);

    let mut config = match config_path {
        Some(path) => read_config_file(&path)?,
        None => Config::default(),
    };

    if let Some(api_base) = std::env::var_os(API_BASE_ENV_VAR) {
        match api_base.into_string() {
            Ok(api_base) => config.gateway.api_base = api_base,
            Err(_) => warn!("{} is not valid unicode, ignoring", API_BASE_ENV_VAR),
        }
    }

    Ok(config)
}
