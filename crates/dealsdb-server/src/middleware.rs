use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dealsdb_core::RateLimitConfig;
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

#[derive(Debug, Clone)]
struct RateLimitWindow {
    started_at: Instant,
    count: u32,
}

#[derive(Debug)]
struct ClientWindows {
    windows: HashMap<IpAddr, RateLimitWindow>,
    last_sweep: Instant,
}

/// Fixed-window limiter with one window per client address.
///
/// Clients are identified by the socket peer, or by the first
/// `x-forwarded-for` entry when `trust_forwarded_for` is set. Requests
/// with no identifiable client share one window. Expired windows are
/// swept at most once per window length.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: u32,
    window: Duration,
    trust_forwarded_for: bool,
    clients: Arc<Mutex<ClientWindows>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration, trust_forwarded_for: bool) -> Self {
        Self {
            max_requests,
            window,
            trust_forwarded_for,
            clients: Arc::new(Mutex::new(ClientWindows {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    #[must_use]
    pub fn from_config(config: RateLimitConfig) -> Self {
        Self::new(
            config.max_requests,
            Duration::from_secs(config.window_secs),
            config.trust_forwarded_for,
        )
    }

    fn client_of(&self, req: &Request) -> IpAddr {
        let forwarded = if self.trust_forwarded_for {
            forwarded_for(req.headers())
        } else {
            None
        };
        forwarded
            .or_else(|| {
                req.extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }

    /// Count one request for `client`; `false` if its budget is spent.
    async fn admit(&self, client: IpAddr) -> bool {
        let mut clients = self.clients.lock().await;
        let now = Instant::now();

        if now.duration_since(clients.last_sweep) >= self.window {
            let window = self.window;
            clients
                .windows
                .retain(|_, w| now.duration_since(w.started_at) < window);
            clients.last_sweep = now;
        }

        let entry = clients.windows.entry(client).or_insert(RateLimitWindow {
            started_at: now,
            count: 0,
        });
        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }
        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    #[cfg(test)]
    async fn tracked_clients(&self) -> usize {
        self.clients.lock().await.windows.len()
    }
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse()
        .ok()
}

#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: MiddlewareError,
}

#[derive(Debug, Serialize)]
struct MiddlewareError {
    code: &'static str,
    message: &'static str,
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }

    res
}

/// Middleware enforcing the per-client request budget.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = rate_limit.client_of(&req);
    if !rate_limit.admit(client).await {
        tracing::debug!(%client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(MiddlewareErrorBody {
                error: MiddlewareError {
                    code: "rate_limited",
                    message: "rate limit exceeded",
                },
            }),
        )
            .into_response();
    }

    next.run(req).await
}
