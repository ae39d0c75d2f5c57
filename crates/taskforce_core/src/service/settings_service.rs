//! Application settings persisted as one JSON value.
//!
//! A stored value that fails to parse is treated as absent: `load` logs it
//! and returns the defaults.

use crate::repo::kv_repo::{KeyValueStore, APP_SETTINGS_KEY};
use crate::repo::RepoError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_APP_NAME: &str = "מערכת משימות צה״ל";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub is_dark_mode: bool,
    pub is_debug_mode: bool,
    pub app_name: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            is_dark_mode: true,
            is_debug_mode: false,
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum SettingsError {
    EmptyAppName,
    Serialize(serde_json::Error),
    Repo(RepoError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAppName => write!(f, "app name must not be empty"),
            Self::Serialize(err) => write!(f, "failed to encode settings: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyAppName => None,
            Self::Serialize(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value)
    }
}

pub struct SettingsService<K: KeyValueStore> {
    store: K,
}

impl<K: KeyValueStore> SettingsService<K> {
    pub fn new(store: K) -> Self {
        Self { store }
    }

    /// Reads stored settings, falling back to defaults.
    pub fn load(&self) -> Result<AppSettings, SettingsError> {
        let Some(raw) = self.store.get_value(APP_SETTINGS_KEY)? else {
            return Ok(AppSettings::default());
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => Ok(settings),
            Err(err) => {
                warn!(
                    "event=settings_load module=settings status=error error_code=invalid_json line={} column={}",
                    err.line(),
                    err.column()
                );
                Ok(AppSettings::default())
            }
        }
    }

    pub fn save(&self, settings: &AppSettings) -> Result<AppSettings, SettingsError> {
        let settings = AppSettings {
            app_name: settings.app_name.trim().to_string(),
            ..settings.clone()
        };
        if settings.app_name.is_empty() {
            return Err(SettingsError::EmptyAppName);
        }
        let raw = serde_json::to_string(&settings)?;
        self.store.set_value(APP_SETTINGS_KEY, &raw)?;
        info!(
            "event=settings_save module=settings status=ok dark_mode={} debug_mode={}",
            settings.is_dark_mode, settings.is_debug_mode
        );
        Ok(settings)
    }

    /// Drops the stored value and returns the defaults.
    pub fn reset(&self) -> Result<AppSettings, SettingsError> {
        let removed = self.store.remove_value(APP_SETTINGS_KEY)?;
        info!("event=settings_reset module=settings status=ok removed={removed}");
        Ok(AppSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{AppSettings, DEFAULT_APP_NAME};

    #[test]
    fn missing_fields_take_defaults() {
        let settings: AppSettings =
            serde_json::from_str(r#"{"isDebugMode":true}"#).expect("partial settings parse");
        assert!(settings.is_dark_mode);
        assert!(settings.is_debug_mode);
        assert_eq!(settings.app_name, DEFAULT_APP_NAME);
    }

    #[test]
    fn settings_serialize_with_camel_case_keys() {
        let json = serde_json::to_value(AppSettings::default()).expect("serialize settings");
        assert_eq!(json["isDarkMode"], true);
        assert_eq!(json["isDebugMode"], false);
        assert_eq!(json["appName"], DEFAULT_APP_NAME);
    }
}
