// config.rs

use anyhow::bail;
use crc::{Crc, CRC_32_ISCSI};
#[cfg(feature = "espidf")]
use esp_idf_svc::nvs;
use log::*;
use serde::{Deserialize, Serialize};

pub const NVS_BUF_SIZE: usize = 512;

const DEFAULT_API_PORT: u16 = 80;
const DEFAULT_TICK_DELAY_MS: u64 = 2000;
const DEFAULT_CONNECT_WAIT: u64 = 10;
const DEFAULT_THRESHOLD: u32 = 300;
const DEFAULT_SEND_INTERVAL: u64 = 300;
const DEFAULT_PULL_CHANCE: f64 = 0.1;
const DEFAULT_HTTP_TIMEOUT: u64 = 10;
const DEFAULT_TOKEN_LIFETIME: u64 = 24 * 3600;

#[cfg(feature = "espidf")]
const CONFIG_NAME: &str = "cfg";

/// How the expiry of a freshly acquired backend token is computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenLifetime {
    /// Always trust the token for this many seconds.
    Fixed { secs: u64 },
    /// Use the `expiresIn` reported by the login response, or the fallback
    /// when it is missing or cannot be parsed.
    Reported { fallback_secs: u64 },
}

impl Default for TokenLifetime {
    fn default() -> Self {
        TokenLifetime::Fixed {
            secs: DEFAULT_TOKEN_LIFETIME,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MyConfig {
    pub port: u16,
    pub delay_ms: u64,
    pub connect_wait: u64,

    pub wifi_ssid: String,
    pub wifi_pass: String,

    pub device_id: String,
    pub backend_url: String,
    pub backend_user: String,
    pub backend_pass: String,

    pub threshold: u32,
    pub send_interval: u64,
    pub pull_chance: f64,
    pub http_timeout: u64,
    pub token_lifetime: TokenLifetime,
}

impl Default for MyConfig {
    fn default() -> Self {
        Self {
            port: option_env!("API_PORT")
                .unwrap_or("-")
                .parse()
                .unwrap_or(DEFAULT_API_PORT),
            delay_ms: DEFAULT_TICK_DELAY_MS,
            connect_wait: DEFAULT_CONNECT_WAIT,

            wifi_ssid: option_env!("WIFI_SSID").unwrap_or("internet").into(),
            wifi_pass: option_env!("WIFI_PASS").unwrap_or("password").into(),

            device_id: String::new(),
            backend_url: option_env!("BACKEND_URL")
                .unwrap_or("http://airpurifier.local:3000")
                .into(),
            backend_user: option_env!("BACKEND_USER").unwrap_or("device").into(),
            backend_pass: option_env!("BACKEND_PASS").unwrap_or("password").into(),

            threshold: DEFAULT_THRESHOLD,
            send_interval: DEFAULT_SEND_INTERVAL,
            pull_chance: DEFAULT_PULL_CHANCE,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            token_lifetime: TokenLifetime::default(),
        }
    }
}

impl MyConfig {
    /// Encode into `buf` as postcard with a CRC-32 trailer.
    pub fn encode<'a>(&self, buf: &'a mut [u8]) -> anyhow::Result<&'a mut [u8]> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        match postcard::to_slice_crc32(self, buf, crc.digest()) {
            Ok(d) => Ok(d),
            Err(e) => bail!("Cannot encode config to buffer {e:?}"),
        }
    }

    pub fn decode(b: &[u8]) -> Option<Self> {
        let crc = Crc::<u32>::new(&CRC_32_ISCSI);
        match postcard::from_bytes_crc32::<MyConfig>(b, crc.digest()) {
            Ok(c) => {
                info!("Successfully parsed config.");
                Some(c)
            }
            Err(e) => {
                error!("Cannot parse config: {e:?}");
                None
            }
        }
    }

    #[cfg(feature = "espidf")]
    pub fn from_nvs(nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> Option<Self> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        info!("Reading up to {sz} bytes from nvs...", sz = NVS_BUF_SIZE);
        let b = match nvs.get_raw(CONFIG_NAME, &mut nvsbuf) {
            Err(e) => {
                error!("Nvs read error {e:?}");
                return None;
            }
            Ok(Some(b)) => b,
            _ => {
                error!("Nvs key not found");
                return None;
            }
        };
        info!("Got {sz} bytes from nvs. Parsing config...", sz = b.len());
        Self::decode(b)
    }

    #[cfg(feature = "espidf")]
    pub fn to_nvs(&self, nvs: &mut nvs::EspNvs<nvs::NvsDefault>) -> anyhow::Result<()> {
        let mut nvsbuf = [0u8; NVS_BUF_SIZE];
        let nvsdata = self.encode(&mut nvsbuf)?;
        info!(
            "Encoded config to {sz} bytes. Saving to nvs...",
            sz = nvsdata.len()
        );

        match nvs.set_raw(CONFIG_NAME, nvsdata) {
            Ok(_) => {
                info!("Config saved.");
                Ok(())
            }
            Err(e) => bail!("Cannot save to nvs: {e:?}"),
        }
    }

    pub fn tick_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_ms)
    }
}


// EOF
