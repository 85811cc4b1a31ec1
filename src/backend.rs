// backend.rs

use rand::Rng;

use crate::*;

pub const READINGS_PATH: &str = "/api/readings";
pub const SETTINGS_PATH: &str = "/api/settings";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingRecord {
    pub device_id: String,
    pub air_quality: f32,
    pub fan_state: bool,
    pub auto_mode: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteSettings {
    #[serde(default)]
    threshold: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct SyncSchedule {
    pub last_send: Option<Instant>,
    pub interval: Duration,
    pub pull_chance: f64,
}

impl SyncSchedule {
    pub fn new(interval: Duration, pull_chance: f64) -> Self {
        SyncSchedule {
            last_send: None,
            interval,
            pull_chance,
        }
    }

    pub fn push_due(&self, now: Instant) -> bool {
        self.last_send
            .map_or(true, |t| now.saturating_duration_since(t) >= self.interval)
    }

    pub fn mark_sent(&mut self, now: Instant) {
        self.last_send = Some(now);
    }

    pub fn pull_due<R: Rng>(&self, rng: &mut R) -> bool {
        if self.pull_chance.is_nan() || self.pull_chance <= 0.0 {
            return false;
        }
        rng.random_bool(self.pull_chance.min(1.0))
    }
}

fn settings_query(device_id: &str) -> Result<String, SyncError> {
    serde_urlencoded::to_string([("device_id", device_id)])
        .map_err(|e| SyncError::RequestFailed(e.to_string()))
}

fn log_sync_error(what: &str, e: &SyncError) {
    match e {
        SyncError::ConnectivityUnavailable => warn!("{what}: {e}"),
        _ => error!("{what}: {e}"),
    }
}

/// Best-effort reading upload and settings download. Nothing is queued or
/// retried: a failed push is dropped, a failed pull keeps local settings.
pub struct BackendSync<T> {
    transport: T,
    session: SessionManager,
    readings_url: String,
    settings_url: String,
    timeout: Duration,
    schedule: Mutex<SyncSchedule>,
}

impl<T: BackendTransport> BackendSync<T> {
    pub fn new(config: &MyConfig, transport: T) -> Self {
        let base = config.backend_url.trim_end_matches('/');
        BackendSync {
            transport,
            session: SessionManager::new(config),
            readings_url: format!("{base}{READINGS_PATH}"),
            settings_url: format!("{base}{SETTINGS_PATH}"),
            timeout: Duration::from_secs(config.http_timeout),
            schedule: Mutex::new(SyncSchedule::new(
                Duration::from_secs(config.send_interval),
                config.pull_chance,
            )),
        }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn schedule(&self) -> SyncSchedule {
        self.schedule.lock().await.clone()
    }

    pub async fn push_reading(&self, record: &ReadingRecord, link_up: bool) -> Result<(), SyncError> {
        let token = self
            .session
            .ensure_authenticated(&self.transport, link_up)
            .await?;
        let req = HttpRequest::post_json(&self.readings_url, record)
            .map_err(|e| SyncError::RequestFailed(e.to_string()))?
            .bearer(&token);

        let resp = exchange(&self.transport, req, self.timeout).await?;
        match resp.status {
            201 => Ok(()),
            401 => {
                self.session.invalidate().await;
                Err(SyncError::Unauthorized)
            }
            s => Err(SyncError::RequestFailed(format!("reading upload returned {s}"))),
        }
    }

    /// Fetch remote settings and apply the threshold, if there is one.
    pub async fn pull_settings(
        &self,
        device_id: &str,
        device: &RwLock<DeviceState>,
        link_up: bool,
    ) -> Result<Option<u32>, SyncError> {
        let token = self
            .session
            .ensure_authenticated(&self.transport, link_up)
            .await?;
        let url = format!("{}?{}", self.settings_url, settings_query(device_id)?);
        let req = HttpRequest::get(url).bearer(&token);

        let resp = exchange(&self.transport, req, self.timeout).await?;
        match resp.status {
            200..=299 => {}
            401 => {
                self.session.invalidate().await;
                return Err(SyncError::Unauthorized);
            }
            s => return Err(SyncError::RequestFailed(format!("settings fetch returned {s}"))),
        }

        let settings: RemoteSettings = serde_json::from_slice(&resp.body)
            .map_err(|e| SyncError::MalformedResponse(e.to_string()))?;
        if let Some(threshold) = settings.threshold {
            let mut d = device.write().await;
            if d.threshold != threshold {
                info!("Threshold {} -> {threshold} from backend", d.threshold);
                d.threshold = threshold;
            }
        }
        Ok(settings.threshold)
    }

    /// One scheduling round: push when the interval has elapsed, pull on a
    /// random fraction of rounds. Errors are logged here.
    pub async fn run_due<R: Rng>(&self, state: &MyState, rng: &mut R) {
        let link_up = state.link_up().await;
        if !link_up {
            return;
        }

        let now = Instant::now();
        let (push, pull) = {
            let mut schedule = self.schedule.lock().await;
            let push = schedule.push_due(now);
            if push {
                // advanced on dispatch so a failing backend is not hammered
                schedule.mark_sent(now);
            }
            (push, schedule.pull_due(rng))
        };
        if !push && !pull {
            return;
        }
        let device_id = state.myid.read().await.clone();

        if push {
            let record = {
                let d = state.device.read().await;
                ReadingRecord {
                    device_id: device_id.clone(),
                    air_quality: d.concentration,
                    fan_state: d.fan_on,
                    auto_mode: d.mode.is_auto(),
                }
            };
            match self.push_reading(&record, link_up).await {
                Ok(()) => info!("Reading sent: {} PPM", record.air_quality),
                Err(e) => {
                    log_sync_error("Reading upload", &e);
                    if pull && !self.session.is_authenticated().await {
                        // no second login attempt in the same round
                        info!("Settings fetch skipped, no session.");
                        return;
                    }
                }
            }
        }

        if pull {
            if let Err(e) = self.pull_settings(&device_id, &state.device, link_up).await {
                log_sync_error("Settings fetch", &e);
            }
        }
    }
}


// EOF
