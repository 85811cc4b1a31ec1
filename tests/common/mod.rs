#![allow(dead_code)]

use std::sync::Mutex as StdMutex;

use airpurifier::*;

#[derive(Clone, Debug)]
pub enum Reply {
    Status(u16, &'static str),
    Fail,
    Hang,
}

/// Scripted backend that records every request it sees.
pub struct MockBackend {
    pub requests: StdMutex<Vec<HttpRequest>>,
    pub login: StdMutex<Reply>,
    pub readings: StdMutex<Reply>,
    pub settings: StdMutex<Reply>,
    pub login_delay: Duration,
}

impl MockBackend {
    pub fn new() -> Self {
        MockBackend {
            requests: StdMutex::new(Vec::new()),
            login: StdMutex::new(Reply::Status(200, r#"{"token":"tok-1","expiresIn":"24h"}"#)),
            readings: StdMutex::new(Reply::Status(201, r#"{"id":1}"#)),
            settings: StdMutex::new(Reply::Status(200, r#"{"threshold":450}"#)),
            login_delay: Duration::ZERO,
        }
    }

    pub fn set_login(&self, r: Reply) {
        *self.login.lock().unwrap() = r;
    }

    pub fn set_readings(&self, r: Reply) {
        *self.readings.lock().unwrap() = r;
    }

    pub fn set_settings(&self, r: Reply) {
        *self.settings.lock().unwrap() = r;
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.contains(path))
            .count()
    }

    pub fn logins(&self) -> usize {
        self.count(LOGIN_PATH)
    }

    pub fn last(&self, path: &str) -> Option<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|r| r.url.contains(path))
            .cloned()
    }
}

impl BackendTransport for MockBackend {
    async fn execute(&self, req: HttpRequest) -> anyhow::Result<HttpResponse> {
        let reply = if req.url.ends_with(LOGIN_PATH) {
            self.login.lock().unwrap().clone()
        } else if req.url.contains(READINGS_PATH) {
            self.readings.lock().unwrap().clone()
        } else if req.url.contains(SETTINGS_PATH) {
            self.settings.lock().unwrap().clone()
        } else {
            Reply::Status(404, "")
        };
        let is_login = req.url.ends_with(LOGIN_PATH);
        self.requests.lock().unwrap().push(req);

        if is_login && !self.login_delay.is_zero() {
            sleep(self.login_delay).await;
        }
        match reply {
            Reply::Status(status, body) => Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }),
            Reply::Fail => anyhow::bail!("connection refused"),
            Reply::Hang => std::future::pending().await,
        }
    }
}

pub struct ScriptedSource {
    pub next: Option<f32>,
}

impl ReadingSource for ScriptedSource {
    fn read(&mut self) -> anyhow::Result<f32> {
        match self.next {
            Some(v) => Ok(v),
            None => anyhow::bail!("sensor not ready"),
        }
    }
}

#[derive(Default)]
pub struct RecordingFan {
    pub history: Vec<bool>,
}

impl RecordingFan {
    pub fn is_on(&self) -> bool {
        self.history.last().copied().unwrap_or(false)
    }
}

impl FanActuator for RecordingFan {
    fn set_fan(&mut self, on: bool) -> anyhow::Result<()> {
        self.history.push(on);
        Ok(())
    }
}

/// Relay whose history stays readable after the orchestrator is spawned.
#[derive(Clone, Default)]
pub struct SharedFan {
    history: Arc<StdMutex<Vec<bool>>>,
}

impl SharedFan {
    pub fn history(&self) -> Vec<bool> {
        self.history.lock().unwrap().clone()
    }
}

impl FanActuator for SharedFan {
    fn set_fan(&mut self, on: bool) -> anyhow::Result<()> {
        self.history.lock().unwrap().push(on);
        Ok(())
    }
}

pub fn test_config() -> MyConfig {
    MyConfig {
        device_id: "airpurifier-test".into(),
        backend_url: "http://backend.test/".into(),
        backend_user: "device".into(),
        backend_pass: "secret".into(),
        connect_wait: 0,
        http_timeout: 5,
        pull_chance: 0.0,
        ..MyConfig::default()
    }
}

pub async fn online_state(config: MyConfig) -> Arc<MyState> {
    let state = Arc::new(MyState::new(config));
    *state.wifi_up.write().await = true;
    state
}

// EOF
