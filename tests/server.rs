//! The server over a real socket.

use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use worldbench::{AppState, MemoryStore, Server, routes};

async fn raw_get(addr: std::net::SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn serves_requests_and_drains_on_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let state = AppState::new(Arc::new(MemoryStore::seeded(0)));
    let app = routes::router().with_state(state);

    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(Server::bind(addr).serve_on(listener, app, async move {
        let _ = stopped.await;
    }));

    let response = raw_get(addr, "/plaintext").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert!(response.to_ascii_lowercase().contains("server: worldbench"), "{response}");
    assert!(response.ends_with("Hello, World!"), "{response}");

    let response = raw_get(addr, "/dbs?queries=3").await;
    assert!(response.starts_with("HTTP/1.1 200 OK"), "{response}");
    assert_eq!(response.matches("\"randomNumber\"").count(), 3, "{response}");

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
