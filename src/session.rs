// session.rs

use serde_json::Value;

use crate::*;

pub const LOGIN_PATH: &str = "/api/auth/login";

#[derive(Clone, Debug, Default)]
pub struct Session {
    pub token: Option<String>,
    pub expiry: Option<Instant>,
}

impl Session {
    pub fn valid_token(&self, now: Instant) -> Option<&str> {
        match (&self.token, self.expiry) {
            (Some(token), Some(expiry)) if now < expiry => Some(token.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(rename = "expiresIn", default)]
    expires_in: Option<Value>,
}

/// Parse a backend lifetime: plain seconds (`3600`, `"3600"`) or a number
/// with one of the `s`, `m`, `h`, `d` suffixes (`"24h"`).
pub fn parse_lifetime(v: &Value) -> Option<Duration> {
    if let Some(secs) = v.as_u64() {
        return Some(Duration::from_secs(secs));
    }
    let s = v.as_str()?.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(i) => s.split_at(i),
        None => (s, "s"),
    };
    let n: u64 = digits.parse().ok()?;
    let mult = match unit.trim() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return None,
    };
    Some(Duration::from_secs(n.checked_mul(mult)?))
}

impl TokenLifetime {
    pub fn ttl(&self, reported: Option<&Value>) -> Duration {
        match *self {
            TokenLifetime::Fixed { secs } => Duration::from_secs(secs),
            TokenLifetime::Reported { fallback_secs } => reported
                .and_then(parse_lifetime)
                .unwrap_or(Duration::from_secs(fallback_secs)),
        }
    }
}

/// Owns the backend token. Logins are single-flight: callers that arrive
/// while one is running wait for it and reuse its token.
pub struct SessionManager {
    login_url: String,
    username: String,
    password: String,
    lifetime: TokenLifetime,
    timeout: Duration,
    session: RwLock<Session>,
    login_lock: Mutex<()>,
    logins: AtomicU32,
}

impl SessionManager {
    pub fn new(config: &MyConfig) -> Self {
        SessionManager {
            login_url: format!("{}{LOGIN_PATH}", config.backend_url.trim_end_matches('/')),
            username: config.backend_user.clone(),
            password: config.backend_pass.clone(),
            lifetime: config.token_lifetime,
            timeout: Duration::from_secs(config.http_timeout),
            session: RwLock::new(Session::default()),
            login_lock: Mutex::new(()),
            logins: AtomicU32::new(0),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.cached_token().await.is_some()
    }

    /// Login exchanges attempted so far.
    pub fn login_count(&self) -> u32 {
        self.logins.load(Ordering::Relaxed)
    }

    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }

    pub async fn invalidate(&self) {
        let mut session = self.session.write().await;
        if session.token.is_some() {
            info!("Backend session invalidated.");
        }
        *session = Session::default();
    }

    /// Return a valid token, logging in first if needed.
    pub async fn ensure_authenticated<T: BackendTransport>(
        &self,
        transport: &T,
        link_up: bool,
    ) -> Result<String, SyncError> {
        if !link_up {
            return Err(SyncError::ConnectivityUnavailable);
        }
        if let Some(token) = self.cached_token().await {
            return Ok(token);
        }

        let _login = self.login_lock.lock().await;
        if let Some(token) = self.cached_token().await {
            debug!("Reusing token from concurrent login.");
            return Ok(token);
        }

        let (token, ttl) = self.login(transport).await?;
        let mut session = self.session.write().await;
        session.token = Some(token.clone());
        session.expiry = Some(Instant::now() + ttl);
        info!("Backend login ok, token valid for {}s", ttl.as_secs());
        Ok(token)
    }

    async fn cached_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .valid_token(Instant::now())
            .map(str::to_string)
    }

    async fn login<T: BackendTransport>(&self, transport: &T) -> Result<(String, Duration), SyncError> {
        let cnt = self.logins.fetch_add(1, Ordering::Relaxed);
        info!("#{cnt} backend login as {}", self.username);

        let body = LoginRequest {
            username: &self.username,
            password: &self.password,
        };
        let req = HttpRequest::post_json(&self.login_url, &body)
            .map_err(|e| SyncError::RequestFailed(e.to_string()))?;
        let resp = exchange(transport, req, self.timeout).await?;

        if resp.status != 200 {
            return Err(SyncError::AuthenticationFailed {
                status: resp.status,
                reason: String::from_utf8_lossy(&resp.body).chars().take(80).collect(),
            });
        }
        let login: LoginResponse =
            serde_json::from_slice(&resp.body).map_err(|e| SyncError::AuthenticationFailed {
                status: resp.status,
                reason: format!("bad login payload: {e}"),
            })?;
        if login.token.is_empty() {
            return Err(SyncError::AuthenticationFailed {
                status: resp.status,
                reason: "empty token".into(),
            });
        }

        let ttl = self.lifetime.ttl(login.expires_in.as_ref());
        Ok((login.token, ttl))
    }
}


// EOF
