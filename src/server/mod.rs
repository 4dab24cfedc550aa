// src/server/mod.rs

//! Development HTTP server.
//!
//! Serves a profile's base directories in order (first directory holding
//! the requested path wins), mounts extra directories under fixed URL
//! prefixes, and pushes live-reload signals to browsers over a WebSocket.
//! HTML responses get a small client script injected so pages reconnect
//! on their own.

use std::future::Future;
use std::path::{Component, Path, PathBuf};

use axum::body::{to_bytes, Body};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::map_response;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};

use crate::engine::LiveReload;
use crate::errors::Result;

pub const LIVERELOAD_PATH: &str = "/__livereload";

const RELOAD_SCRIPT: &str = concat!(
    "<script>(function(){",
    "var p=location.protocol==='https:'?'wss://':'ws://';",
    "var s=new WebSocket(p+location.host+'/__livereload');",
    "s.onmessage=function(e){if(e.data==='reload')location.reload();};",
    "})();</script>"
);

/// What a server session exposes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerProfile {
    /// Directories searched in order for every request not under a route.
    pub bases: Vec<PathBuf>,
    /// `(url prefix, directory)` mounts, e.g. `/bower_components`.
    pub routes: Vec<(String, PathBuf)>,
}

impl ServerProfile {
    pub fn new<P: AsRef<Path>>(root: &Path, bases: &[P]) -> Self {
        Self {
            bases: bases.iter().map(|b| root.join(b)).collect(),
            routes: Vec::new(),
        }
    }

    pub fn route(mut self, prefix: &str, dir: impl Into<PathBuf>) -> Self {
        self.routes.push((prefix.to_string(), dir.into()));
        self
    }
}

#[derive(Clone)]
struct ServerState {
    bases: Vec<PathBuf>,
    reload: LiveReload,
}

/// Build the router for `profile`.
pub fn router(profile: &ServerProfile, reload: LiveReload) -> Router {
    let state = ServerState {
        bases: profile.bases.clone(),
        reload,
    };

    let mut router = Router::new().route(LIVERELOAD_PATH, get(livereload));
    for (prefix, dir) in &profile.routes {
        router = router.nest_service(prefix, ServeDir::new(dir));
    }

    router
        .fallback(serve_bases)
        .with_state(state)
        .layer(map_response(inject_reload_script))
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(url = %format!("http://{addr}/"), "dev server listening");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("dev server stopped");
    Ok(())
}

async fn serve_bases(State(state): State<ServerState>, req: Request) -> Response {
    let Some(base) = pick_base(&state.bases, req.uri().path()) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match ServeDir::new(base).try_call(req).await {
        Ok(res) => res.map(Body::new),
        Err(err) => {
            warn!(base = %base.display(), "serving failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The first base holding `uri_path`, or the first base when none does so
/// it answers with the 404. The path is percent-decoded first, the same
/// way `ServeDir` reads it.
fn pick_base<'a>(bases: &'a [PathBuf], uri_path: &str) -> Option<&'a PathBuf> {
    let Ok(decoded) = urlencoding::decode(uri_path) else {
        return bases.first();
    };
    let rel = Path::new(decoded.trim_start_matches('/'));
    let safe = rel.components().all(|c| matches!(c, Component::Normal(_)));

    if safe {
        for base in bases {
            let candidate = base.join(rel);
            if candidate.is_file() || candidate.join("index.html").is_file() {
                return Some(base);
            }
        }
    }
    bases.first()
}

async fn livereload(ws: WebSocketUpgrade, State(state): State<ServerState>) -> Response {
    let rx = state.reload.subscribe();
    ws.on_upgrade(move |socket| push_reloads(socket, rx))
}

async fn push_reloads(mut socket: WebSocket, mut rx: tokio::sync::broadcast::Receiver<()>) {
    debug!("live reload client connected");
    loop {
        tokio::select! {
            signal = rx.recv() => match signal {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    if socket.send(Message::Text("reload".into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("live reload client gone");
}

async fn inject_reload_script(res: Response) -> Response {
    let is_html = res
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("text/html"));
    if !is_html {
        return res;
    }

    let (mut parts, body) = res.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("reading html response failed: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let page = with_reload_script(&String::from_utf8_lossy(&bytes));
    parts.headers.remove(header::CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(page))
}

/// Insert the client before the last `</body>`, or append it.
fn with_reload_script(page: &str) -> String {
    match page.rfind("</body>") {
        Some(at) => format!("{}{RELOAD_SCRIPT}{}", &page[..at], &page[at..]),
        None => format!("{page}{RELOAD_SCRIPT}"),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn script_goes_before_closing_body() {
        let out = with_reload_script("<html><body><p>x</p></body></html>");
        assert!(out.ends_with(&format!("{RELOAD_SCRIPT}</body></html>")));

        let bare = with_reload_script("<p>fragment</p>");
        assert!(bare.ends_with(RELOAD_SCRIPT));
    }

    #[test]
    fn first_base_with_the_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().join(".tmp");
        let app = dir.path().join("app");
        fs::create_dir_all(tmp.join("assets/css")).unwrap();
        fs::create_dir_all(&app).unwrap();
        fs::write(tmp.join("assets/css/main.css"), "").unwrap();
        fs::write(app.join("index.html"), "").unwrap();
        fs::write(app.join("about us.html"), "").unwrap();
        fs::write(app.join("café.html"), "").unwrap();

        let bases = vec![tmp.clone(), app.clone()];
        assert_eq!(pick_base(&bases, "/assets/css/main.css"), Some(&tmp));
        assert_eq!(pick_base(&bases, "/index.html"), Some(&app));
        assert_eq!(pick_base(&bases, "/"), Some(&app));
        assert_eq!(pick_base(&bases, "/missing.js"), Some(&tmp));
        assert_eq!(pick_base(&bases, "/about%20us.html"), Some(&app));
        assert_eq!(pick_base(&bases, "/caf%C3%A9.html"), Some(&app));
        assert_eq!(pick_base(&bases, "/%2E%2E/secret"), Some(&tmp));
        assert_eq!(pick_base(&bases, "/../secret"), Some(&tmp));
        assert_eq!(pick_base(&[], "/index.html"), None);
    }
}
