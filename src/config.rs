use crate::error::{NeoCareError, Result};
use neocare_common::{Language, DEFAULT_HISTORY_CAP};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_HOST: &str = "http://localhost:8085";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub pharma_base_url: String,
    pub pharmafast_base_url: String,
    pub chat_base_url: String,
    pub auth_token: Option<String>,
    pub user_id: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub tick_interval_ms: u64,
    pub history_cap: usize,
    pub default_language: Language,
    pub search_radius_km: f64,
    pub rules_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::with_host(DEFAULT_HOST)
    }
}

impl Config {
    /// Every service base under one host
    pub fn with_host(host: &str) -> Self {
        let host = host.trim_end_matches('/');
        Self {
            api_base_url: format!("{}/api/openai", host),
            pharma_base_url: format!("{}/api/pharma", host),
            pharmafast_base_url: format!("{}/api/pharmafast", host),
            chat_base_url: format!("{}/api/chat", host),
            auth_token: None,
            user_id: None,
            timeout_seconds: None,
            tick_interval_ms: 200,
            history_cap: DEFAULT_HISTORY_CAP,
            default_language: Language::En,
            search_radius_km: 5.0,
            rules_file: None,
            data_dir: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            serde_json::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| NeoCareError::Config("home directory not found".into()))?;
        Ok(home.join(".config").join("neocare").join("config.json"))
    }

    /// Directory of the keyed store
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| NeoCareError::Config("data directory not found".into()))?;
        Ok(base.join("neocare"))
    }

    fn apply_env(&mut self) {
        // environment wins over the file
        if let Ok(host) = std::env::var("NEOCARE_API_URL") {
            if !host.trim().is_empty() {
                self.set_host(&host);
            }
        }
        if let Ok(token) = std::env::var("NEOCARE_TOKEN") {
            if !token.trim().is_empty() {
                self.auth_token = Some(token);
            }
        }
    }

    /// Point every service base at another host
    pub fn set_host(&mut self, host: &str) {
        let rebased = Self::with_host(host);
        self.api_base_url = rebased.api_base_url;
        self.pharma_base_url = rebased.pharma_base_url;
        self.pharmafast_base_url = rebased.pharmafast_base_url;
        self.chat_base_url = rebased.chat_base_url;
    }

    pub fn set_api_url(&mut self, host: &str) -> Result<()> {
        self.set_host(host);
        self.save()
    }

    pub fn login(&mut self, user_id: String, token: String) -> Result<()> {
        self.user_id = Some(user_id);
        self.auth_token = Some(token);
        self.save()
    }

    pub fn logout(&mut self) -> Result<()> {
        self.user_id = None;
        self.auth_token = None;
        self.save()
    }
}
