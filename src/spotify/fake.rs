//! Canned Spotify endpoints served over real HTTP on a loopback port.
//!
//! Routes match on path plus query string, optionally restricted to one
//! bearer token. The first matching route answers; anything else is a 404.

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::dev::ServerHandle;
use actix_web::http::{header, StatusCode};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::tests::test_config;
use crate::config::Config;

struct Route {
    target: String,
    bearer: Option<String>,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
}

#[derive(Default)]
struct Shared {
    routes: Mutex<Vec<Route>>,
    /// Every request seen, as (target, bearer).
    seen: Mutex<Vec<(String, Option<String>)>>,
}

pub(crate) struct FakeSpotify {
    addr: SocketAddr,
    handle: ServerHandle,
    shared: Arc<Shared>,
}

async fn answer(req: HttpRequest, shared: web::Data<Arc<Shared>>) -> HttpResponse {
    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    shared.seen.lock().push((target.clone(), bearer.clone()));

    let routes = shared.routes.lock();
    let route = routes
        .iter()
        .find(|r| r.target == target && (r.bearer.is_none() || r.bearer == bearer));

    match route {
        Some(route) => HttpResponse::build(
            StatusCode::from_u16(route.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        )
        .content_type(route.content_type)
        .body(route.body.clone()),
        None => HttpResponse::NotFound()
            .json(serde_json::json!({"error": {"status": 404, "message": "Service not found"}})),
    }
}

impl FakeSpotify {
    /// Bind a loopback port and start serving. Must run inside an actix system.
    pub(crate) fn start() -> Self {
        let shared = Arc::new(Shared::default());
        let data = web::Data::new(shared.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::to(answer))
        })
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);

        Self {
            addr,
            handle,
            shared,
        }
    }

    pub(crate) fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub(crate) fn api_base(&self) -> String {
        format!("{}/v1", self.base_url())
    }

    /// Test configuration with both Spotify bases pointed at this server.
    pub(crate) fn config(&self) -> Config {
        Config {
            api_base: self.api_base(),
            accounts_base: self.base_url(),
            ..test_config()
        }
    }

    fn push(&self, target: &str, bearer: Option<&str>, status: u16, content_type: &'static str, body: Vec<u8>) {
        self.shared.routes.lock().push(Route {
            target: target.to_string(),
            bearer: bearer.map(str::to_string),
            status,
            content_type,
            body,
        });
    }

    /// Answer `target` (path and query, e.g. `/v1/me/tracks?limit=50`) with JSON.
    pub(crate) fn json(&self, target: &str, status: u16, body: Value) {
        self.push(target, None, status, "application/json", body.to_string().into_bytes());
    }

    /// Like [`json`](Self::json), but only for requests carrying `bearer`.
    pub(crate) fn json_for(&self, bearer: &str, target: &str, status: u16, body: Value) {
        self.push(target, Some(bearer), status, "application/json", body.to_string().into_bytes());
    }

    pub(crate) fn text(&self, target: &str, status: u16, body: &str) {
        self.push(target, None, status, "text/plain", body.as_bytes().to_vec());
    }

    pub(crate) fn png(&self, target: &str, bytes: Vec<u8>) {
        self.push(target, None, 200, "image/png", bytes);
    }

    /// Bearer tokens of every request made to `target`, in order.
    pub(crate) fn bearers(&self, target: &str) -> Vec<Option<String>> {
        self.shared
            .seen
            .lock()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, bearer)| bearer.clone())
            .collect()
    }

    pub(crate) async fn stop(self) {
        self.handle.stop(false).await;
    }
}
