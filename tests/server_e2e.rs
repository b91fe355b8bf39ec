//! End-to-end tests over a real TCP listener.

use std::time::Duration;

use route_host::lifecycle::Shutdown;

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_serves_over_tcp_and_shuts_down() {
    let server = common::test_server(common::test_config());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let client = client();
    let res = client
        .get(format!("http://{}/api/example/hello", addr))
        .send()
        .await
        .expect("Server unreachable");
    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Hello, world!");
    assert_eq!(body["status"], "success");

    let res = client
        .post(format!("http://{}/api/users", addr))
        .json(&serde_json::json!({"name": "grace"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["body"]["name"], "grace");

    assert_eq!(shutdown.trigger(), 1);
    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("Server did not stop after shutdown")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = common::test_config();
    config.security.max_body_size = 64;
    let server = common::test_server(config);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let payload = serde_json::json!({ "blob": "x".repeat(1024) });
    let res = client()
        .post(format!("http://{}/api/users", addr))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 413);

    shutdown.trigger();
}
