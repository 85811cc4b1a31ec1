// state.rs

use std::str::FromStr;

use crate::*;

/// Who is authoritative for the fan relay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanMode {
    #[default]
    #[serde(rename = "ON")]
    Auto,
    #[serde(rename = "OFF")]
    Manual,
}

impl FanMode {
    pub fn is_auto(self) -> bool {
        self == FanMode::Auto
    }
}

/// An `on`/`off` query value, case-insensitive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Switch(pub bool);

impl FromStr for Switch {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Switch(true))
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Switch(false))
        } else {
            Err(ControlError::BadSwitch(s.to_string()))
        }
    }
}

impl From<Switch> for FanMode {
    fn from(s: Switch) -> Self {
        if s.0 {
            FanMode::Auto
        } else {
            FanMode::Manual
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeviceState {
    pub concentration: f32,
    pub fan_on: bool,
    pub mode: FanMode,
    pub threshold: u32,
    pub last_update: Option<DateTime<Local>>,
}

impl DeviceState {
    pub fn new(threshold: u32) -> Self {
        DeviceState {
            concentration: 0.0,
            fan_on: false,
            mode: FanMode::Auto,
            threshold,
            last_update: None,
        }
    }
}

/// JSON body of `GET /data`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AirStatus {
    pub air_quality: f32,
    pub fan: bool,
    pub auto_mode: FanMode,
    pub threshold: u32,
    pub last_update: String,
}

impl From<&DeviceState> for AirStatus {
    fn from(d: &DeviceState) -> Self {
        AirStatus {
            air_quality: d.concentration,
            fan: d.fan_on,
            auto_mode: d.mode,
            threshold: d.threshold,
            last_update: d
                .last_update
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

pub struct MyState {
    pub config: MyConfig,
    pub uptime: RwLock<u32>,
    pub api_cnt: AtomicU32,
    pub wifi_up: RwLock<bool>,
    pub ip_addr: RwLock<net::Ipv4Addr>,
    pub myid: RwLock<String>,
    pub device: RwLock<DeviceState>,
    pub fan_changed: Notify,
}

impl MyState {
    pub fn new(config: MyConfig) -> Self {
        let myid = if config.device_id.is_empty() {
            "airpurifier".to_string()
        } else {
            config.device_id.clone()
        };
        let device = DeviceState::new(config.threshold);
        MyState {
            config,
            uptime: RwLock::new(0),
            api_cnt: AtomicU32::new(0),
            wifi_up: RwLock::new(false),
            ip_addr: RwLock::new(net::Ipv4Addr::new(0, 0, 0, 0)),
            myid: RwLock::new(myid),
            device: RwLock::new(device),
            fan_changed: Notify::new(),
        }
    }

    pub async fn link_up(&self) -> bool {
        *self.wifi_up.read().await
    }
}


// EOF
