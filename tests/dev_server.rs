use std::error::Error;

use siteflow::engine::LiveReload;
use siteflow::server::{self, ServerProfile};
use siteflow_test_utils::builders::TempProject;
use siteflow_test_utils::with_timeout;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

type TestResult = Result<(), Box<dyn Error>>;

async fn get(addr: std::net::SocketAddr, path: &str) -> Result<String, Box<dyn Error>> {
    let mut stream = TcpStream::connect(addr).await?;
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

#[tokio::test]
async fn serves_bases_in_order_with_reload_client() -> TestResult {
    let project = TempProject::new();
    project
        .file("app/index.html", "<html><body><h1>app</h1></body></html>")
        .file("app/about us.html", "<p>about</p>")
        .file("app/assets/css/main.css", "/* stale */")
        .file(".tmp/assets/css/main.css", "body{}")
        .file("bower_components/lib/lib.js", "lib();");

    let profile = ServerProfile::new(project.root(), &[".tmp", "app"])
        .route("/bower_components", project.path("bower_components"));
    let router = server::router(&profile, LiveReload::new());

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server::serve(listener, router, async move {
        let _ = stop_rx.await;
    }));

    let page = with_timeout(get(addr, "/index.html")).await?;
    assert!(page.starts_with("HTTP/1.1 200"));
    assert!(page.contains("<h1>app</h1>"));
    assert!(page.contains("/__livereload"));

    let css = with_timeout(get(addr, "/assets/css/main.css")).await?;
    assert!(css.ends_with("body{}"));
    assert!(!css.contains("__livereload"));

    let lib = with_timeout(get(addr, "/bower_components/lib/lib.js")).await?;
    assert!(lib.ends_with("lib();"));

    let spaced = with_timeout(get(addr, "/about%20us.html")).await?;
    assert!(spaced.starts_with("HTTP/1.1 200"));
    assert!(spaced.contains("<p>about</p>"));

    let missing = with_timeout(get(addr, "/nope.js")).await?;
    assert!(missing.starts_with("HTTP/1.1 404"));

    stop_tx.send(()).ok();
    with_timeout(handle).await??;
    Ok(())
}
