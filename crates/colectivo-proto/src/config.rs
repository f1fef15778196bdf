use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub radio: RadioConfig,
    #[serde(default)]
    pub links: LinksConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Simulated "bot is typing" latency before a canned reply lands.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioConfig {
    #[serde(default = "default_volume")]
    pub default_volume: u8,
    /// Delay before jumping to the next station after an unsupported-format error.
    #[serde(default = "default_auto_advance_delay_ms")]
    pub auto_advance_delay_ms: u64,
    /// A play attempt with no audio after this long is reported as a network error.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Local station catalog override (highest priority).
    #[serde(default = "default_stations_toml")]
    pub stations_toml: PathBuf,
    /// Extended-M3U catalog, used when the TOML file is absent.
    #[serde(default = "default_stations_m3u")]
    pub stations_m3u: PathBuf,
}

/// Outbound destinations for the contact and donation buttons.  Any entry
/// left empty renders as a `#` placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default)]
    pub whatsapp_phone: String,
    #[serde(default = "default_whatsapp_message")]
    pub whatsapp_message: String,
    #[serde(default)]
    pub paypal_url: String,
    #[serde(default)]
    pub patreon_url: String,
    #[serde(default)]
    pub pse_url: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: default_reply_delay_ms(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            auto_advance_delay_ms: default_auto_advance_delay_ms(),
            connect_timeout_secs: default_connect_timeout_secs(),
            stations_toml: default_stations_toml(),
            stations_m3u: default_stations_m3u(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            whatsapp_phone: String::new(),
            whatsapp_message: default_whatsapp_message(),
            paypal_url: String::new(),
            patreon_url: String::new(),
            pse_url: String::new(),
        }
    }
}

impl ChatConfig {
    pub fn reply_delay(&self) -> Duration {
        Duration::from_millis(self.reply_delay_ms)
    }
}

impl RadioConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_delay_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn default_reply_delay_ms() -> u64 {
    1000
}

fn default_volume() -> u8 {
    70
}

fn default_auto_advance_delay_ms() -> u64 {
    2000
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_stations_toml() -> PathBuf {
    platform::config_dir().join("stations.toml")
}

fn default_stations_m3u() -> PathBuf {
    platform::config_dir().join("stations.m3u")
}

fn default_whatsapp_message() -> String {
    "Hola, quiero hablar con alguien del colectivo".to_string()
}

impl Config {
    /// Load `config.toml` from the config dir, writing the defaults on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.chat.reply_delay(), Duration::from_secs(1));
        assert_eq!(config.radio.default_volume, 70);
        assert_eq!(config.radio.auto_advance_delay(), Duration::from_secs(2));
        assert_eq!(
            config.radio.stations_toml,
            platform::config_dir().join("stations.toml")
        );
        if std::env::var_os("COLECTIVO_CONFIG_DIR").is_none() {
            assert!(config.radio.stations_toml.ends_with("colectivo/stations.toml"));
        }
        assert!(config.links.paypal_url.is_empty());
    }

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.radio.connect_timeout_secs, 15);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[chat]\nreply_delay_ms = 250\n\n[links]\nwhatsapp_phone = \"+57 300 123 4567\"\n",
        )
        .unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.chat.reply_delay_ms, 250);
        assert_eq!(config.links.whatsapp_phone, "+57 300 123 4567");
        assert_eq!(config.radio.default_volume, 70);
        assert!(!config.links.whatsapp_message.is_empty());
    }
}
