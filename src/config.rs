use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

use crate::notify::mailer::MailConfig;

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    pub server: Option<ServerConfig>,
    pub mail:   Option<MailConfig>,
    pub notify: Option<NotifyConfig>,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct NotifyConfig {
    pub interval_seconds: Option<u64>,
    pub auto_notify:      Option<bool>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let path = config_dir().join("config.toml");
        if path.exists() {
            Ok(toml::from_str(&std::fs::read_to_string(&path)?)?)
        } else {
            Ok(AppConfig::default())
        }
    }

    pub fn bind_addr(&self) -> String {
        let host = self.server.as_ref()
            .and_then(|s| s.host.clone())
            .unwrap_or_else(|| "127.0.0.1".to_owned());
        let port = self.server.as_ref().and_then(|s| s.port).unwrap_or(8750);
        format!("{host}:{port}")
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("studyplanner")
}
