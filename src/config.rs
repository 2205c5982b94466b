//! Application-level configuration loading, including the runtime gift catalog.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use time::macros::datetime;
use tracing::{info, warn};

use crate::dao::models::{EpochMillis, GiftStockEntity};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BABY_REVEAL_CONFIG_PATH";
/// Environment variable overriding the admin password from the config file.
const ADMIN_PASSWORD_ENV: &str = "BABY_REVEAL_ADMIN_PASSWORD";

/// Baked-in reveal moment used when the config file does not set one.
fn default_reveal_date() -> EpochMillis {
    let moment = datetime!(2025-10-26 19:00 -3);
    EpochMillis((moment.unix_timestamp_nanos() / 1_000_000) as i64)
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Moment of the reveal; submissions close when it passes.
    pub reveal_date: EpochMillis,
    /// Video call link shown to guests once the reveal is near.
    pub meet_link: String,
    /// Password required on admin endpoints.
    pub admin_password: String,
    /// Gift catalog used to seed the baby shower stock.
    pub gifts: Vec<GiftDefinition>,
}

/// One gift entry of the configured catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct GiftDefinition {
    /// Stable identifier of the gift.
    pub id: String,
    /// Display name.
    pub name: String,
    /// How many units guests can claim in total.
    pub max_count: u32,
    /// Whether at most one guest group may claim it.
    #[serde(default)]
    pub is_unique: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        gifts = app_config.gifts.len(),
                        "loaded event configuration from config file"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(password) = env::var(ADMIN_PASSWORD_ENV) {
            if !password.is_empty() {
                config.admin_password = password;
            }
        }

        config
    }

    /// Expand the catalog into fresh stock entries with full counts.
    pub fn initial_gift_stock(&self) -> Vec<GiftStockEntity> {
        self.gifts
            .iter()
            .map(|gift| GiftStockEntity {
                id: gift.id.clone(),
                name: gift.name.clone(),
                max_count: gift.max_count,
                current_count: gift.max_count,
                is_unique: gift.is_unique,
            })
            .collect()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reveal_date: default_reveal_date(),
            meet_link: String::new(),
            admin_password: "admin123".to_owned(),
            gifts: default_gifts(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    reveal_date: Option<i64>,
    meet_link: Option<String>,
    admin_password: Option<String>,
    gifts: Option<Vec<GiftDefinition>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = AppConfig::default();
        Self {
            reveal_date: value
                .reveal_date
                .map(EpochMillis)
                .unwrap_or(defaults.reveal_date),
            meet_link: value.meet_link.unwrap_or(defaults.meet_link),
            admin_password: value.admin_password.unwrap_or(defaults.admin_password),
            gifts: value.gifts.unwrap_or(defaults.gifts),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in gift catalog shipped with the binary.
fn default_gifts() -> Vec<GiftDefinition> {
    fn gift(id: &str, name: &str, max_count: u32, is_unique: bool) -> GiftDefinition {
        GiftDefinition {
            id: id.to_owned(),
            name: name.to_owned(),
            max_count,
            is_unique,
        }
    }

    vec![
        gift(
            "panales-rn-pampers",
            "Pañales RN paquete 36 'Pampers'",
            7,
            false,
        ),
        gift("panales-p-pampers", "Pañales Talla P 'Pampers'", 20, false),
        gift("panales-m-pampers", "Pañales Talla M 'Pampers'", 20, false),
        gift("toallitas-sin-perfume", "Toallitas sin perfume", 5, false),
        gift(
            "bodies-algodon-0-3m",
            "Bodies de algodón 0-3 meses",
            5,
            false,
        ),
        gift("pijamas-0-3m", "Pijamas 0-3 meses", 10, false),
        gift(
            "gorritos-calcetines-0-3m",
            "Gorritos suaves + calcetines 0-3 meses",
            10,
            false,
        ),
        gift(
            "sabanas-cuna-colecho",
            "Sábanas ajustables para cuna colecho",
            5,
            false,
        ),
        gift("baberos", "Baberos", 5, false),
        gift(
            "extractor-leche-haakaa",
            "Extractor de leche 'recolector tipo Haakaa'",
            1,
            true,
        ),
        gift("toallas-con-capucha", "Toallas con capucha", 3, false),
        gift(
            "termometro-digital",
            "Termómetro digital para guagua",
            1,
            true,
        ),
        gift(
            "kit-lima-tijeras",
            "Kit Lima y tijeras de uñas para bebé",
            1,
            true,
        ),
        gift("aspirador-nasal", "Aspirador nasal", 1, true),
        gift(
            "juguetes-sensoriales-0-3m",
            "Set de juguetes sensoriales 0-3 meses",
            4,
            false,
        ),
        gift("fular", "Fular", 1, true),
        gift("mantas-bebe", "Mantas de bebé", 5, false),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_matches_event_planning() {
        let config = AppConfig::default();
        assert_eq!(config.gifts.len(), 17);
        assert!(config.gifts.iter().filter(|gift| gift.is_unique).count() == 5);
    }

    #[test]
    fn initial_stock_starts_full() {
        let config = AppConfig::default();
        let stock = config.initial_gift_stock();
        assert!(stock.iter().all(|entry| entry.current_count == entry.max_count));
        assert!(stock.iter().all(|entry| entry.is_available()));
    }

    #[test]
    fn raw_config_fields_are_optional() {
        let raw: RawConfig = serde_json::from_str("{}").unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.admin_password, "admin123");
        assert_eq!(config.reveal_date, default_reveal_date());
    }
}
