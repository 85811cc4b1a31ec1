// transport.rs

use std::future::Future;

use crate::*;

/// Largest backend response body we are willing to buffer.
pub const MAX_BODY: usize = 4096;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub bearer: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            bearer: None,
            body: None,
        }
    }

    pub fn post_json<T: Serialize>(url: impl Into<String>, body: &T) -> serde_json::Result<Self> {
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            bearer: None,
            body: Some(serde_json::to_vec(body)?),
        })
    }

    pub fn bearer(mut self, token: &str) -> Self {
        self.bearer = Some(token.to_string());
        self
    }
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Outbound HTTP to the backend. Errors mean the exchange did not complete;
/// any status code that came back is an `Ok`.
pub trait BackendTransport: Send + Sync {
    fn execute(
        &self,
        req: HttpRequest,
    ) -> impl Future<Output = anyhow::Result<HttpResponse>> + Send;
}

/// Run one exchange bounded by `timeout`. Transport errors and timeouts both
/// come back as `RequestFailed`.
pub async fn exchange<T: BackendTransport>(
    transport: &T,
    req: HttpRequest,
    timeout: Duration,
) -> Result<HttpResponse, SyncError> {
    match tokio::time::timeout(timeout, transport.execute(req)).await {
        Ok(Ok(resp)) => Ok(resp),
        Ok(Err(e)) => Err(SyncError::RequestFailed(format!("{e:#}"))),
        Err(_) => Err(SyncError::RequestFailed(format!(
            "no response within {}s",
            timeout.as_secs()
        ))),
    }
}

#[cfg(feature = "espidf")]
pub struct EspTransport {
    pub timeout: Duration,
}

#[cfg(feature = "espidf")]
impl BackendTransport for EspTransport {
    async fn execute(&self, req: HttpRequest) -> anyhow::Result<HttpResponse> {
        let timeout = self.timeout;
        // the esp-idf client blocks, keep it off the executor thread
        tokio::task::spawn_blocking(move || esp_execute(req, timeout)).await?
    }
}

#[cfg(feature = "espidf")]
fn esp_execute(req: HttpRequest, timeout: Duration) -> anyhow::Result<HttpResponse> {
    use embedded_svc::{
        http::{Method, client::Client as HttpClient},
        io::{Read, Write},
    };
    use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

    let conn = EspHttpConnection::new(&Configuration {
        timeout: Some(timeout),
        ..Default::default()
    })?;
    let mut client = HttpClient::wrap(conn);

    let auth = req.bearer.as_ref().map(|t| format!("Bearer {t}"));
    let len = req.body.as_ref().map(|b| b.len().to_string());
    let mut headers = vec![("accept", "application/json")];
    if let Some(auth) = auth.as_deref() {
        headers.push(("authorization", auth));
    }
    if let Some(len) = len.as_deref() {
        headers.push(("content-type", "application/json"));
        headers.push(("content-length", len));
    }

    let method = match req.method {
        HttpMethod::Get => Method::Get,
        HttpMethod::Post => Method::Post,
    };
    let mut request = client.request(method, &req.url, &headers)?;
    if let Some(body) = req.body.as_deref() {
        request.write_all(body)?;
        request.flush()?;
    }

    let mut response = request.submit()?;
    let status = response.status();
    let mut body = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        let n = response.read(&mut buf)?;
        if n == 0 {
            break;
        }
        if body.len() + n > MAX_BODY {
            bail!("Response body exceeds {MAX_BODY} bytes");
        }
        body.extend_from_slice(&buf[..n]);
    }
    Ok(HttpResponse { status, body })
}

// EOF
