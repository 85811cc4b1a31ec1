// lib.rs
#![warn(clippy::large_futures)]

pub use std::{
    net,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
};

pub use anyhow::bail;
pub use chrono::*;
pub use log::*;
pub use serde::{Deserialize, Serialize};
pub use tokio::{
    sync::{Mutex, Notify, RwLock},
    time::{Duration, Instant, sleep},
};

mod config;
pub use config::*;

mod state;
pub use state::*;

mod policy;
pub use policy::*;

mod measure;
pub use measure::*;

mod actuator;
pub use actuator::*;

mod display;
pub use display::*;

mod error;
pub use error::*;

mod transport;
pub use transport::*;

mod session;
pub use session::*;

mod backend;
pub use backend::*;

mod control;
pub use control::*;

mod orchestrator;
pub use orchestrator::*;

mod apiserver;
pub use apiserver::*;

#[cfg(feature = "espidf")]
mod wifi;
#[cfg(feature = "espidf")]
pub use wifi::*;

pub const FW_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone, Debug, Serialize)]
pub struct Uptime {
    pub uptime: u32,
    pub uptime_s: String,
}

impl Uptime {
    pub fn from_secs(uptime: u32) -> Self {
        let (d, rem) = (uptime / 86400, uptime % 86400);
        let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);
        let uptime_s = if d > 0 {
            format!("{d}d {h:02}:{m:02}:{s:02}")
        } else {
            format!("{h:02}:{m:02}:{s:02}")
        };
        Uptime { uptime, uptime_s }
    }
}


// EOF
