//! End-to-end integration tests using a real WebSocket client.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};

use wsevents_core::Event;
use wsevents_server::config::ServerConfig;
use wsevents_server::handlers::HandlerRegistry;
use wsevents_server::server::WseventsServer;

const TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".into(),
        port: 0,
        ..ServerConfig::default()
    }
}

/// Boot a test server and return the WS URL + server.
async fn boot_server(config: ServerConfig, handlers: HandlerRegistry) -> (String, Arc<WseventsServer>) {
    let server = Arc::new(WseventsServer::new(config, handlers));
    let (addr, _handle) = server.listen().await.unwrap();
    (format!("ws://{addr}/ws"), server)
}

async fn connect(url: &str) -> WsStream {
    let (ws, _) = timeout(TIMEOUT, connect_async(url)).await.unwrap().unwrap();
    ws
}

/// Poll the hub until it holds exactly `n` connections.
async fn wait_for_connections(server: &WseventsServer, n: usize) {
    timeout(TIMEOUT, async {
        while server.hub().connection_count().await.unwrap() != n {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("hub never reached {n} connections"));
}

async fn send_json(ws: &mut WsStream, value: &Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Next text frame, decoded as JSON.
async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Wait until the server closes `ws`.
async fn expect_closed(ws: &mut WsStream) {
    loop {
        match timeout(TIMEOUT, ws.next()).await.expect("connection stayed open") {
            None | Some(Ok(Message::Close(_)) | Err(_)) => return,
            Some(Ok(_)) => {}
        }
    }
}

#[tokio::test]
async fn event_is_broadcast_to_all_clients_including_sender() {
    let (url, server) = boot_server(test_config(), HandlerRegistry::new()).await;
    let mut alice = connect(&url).await;
    let mut bob = connect(&url).await;
    wait_for_connections(&server, 2).await;

    let event = json!({"eventName": "chat", "data": {"msg": "hi"}});
    send_json(&mut alice, &event).await;

    assert_eq!(next_json(&mut alice).await, event);
    assert_eq!(next_json(&mut bob).await, event);
}

#[tokio::test]
async fn events_arrive_in_submission_order() {
    let (url, server) = boot_server(test_config(), HandlerRegistry::new()).await;
    let mut sender = connect(&url).await;
    let mut watcher = connect(&url).await;
    wait_for_connections(&server, 2).await;

    for i in 0..10 {
        send_json(&mut sender, &json!({"eventName": "tick", "data": i})).await;
    }
    for i in 0..10 {
        assert_eq!(next_json(&mut watcher).await["data"], i);
    }
}

#[tokio::test]
async fn missing_fields_decode_with_defaults() {
    let (url, server) = boot_server(test_config(), HandlerRegistry::new()).await;
    let mut ws = connect(&url).await;
    wait_for_connections(&server, 1).await;

    send_json(&mut ws, &json!({"data": 42})).await;
    assert_eq!(next_json(&mut ws).await, json!({"eventName": "", "data": 42}));
}

#[tokio::test]
async fn malformed_message_closes_only_the_sender() {
    let (url, server) = boot_server(test_config(), HandlerRegistry::new()).await;
    let mut not_json = connect(&url).await;
    let mut array = connect(&url).await;
    let mut good = connect(&url).await;
    wait_for_connections(&server, 3).await;

    not_json.send(Message::Text("not json".into())).await.unwrap();
    expect_closed(&mut not_json).await;
    wait_for_connections(&server, 2).await;

    array
        .send(Message::Text(r#"["chat",{"msg":"hi"}]"#.into()))
        .await
        .unwrap();
    expect_closed(&mut array).await;
    wait_for_connections(&server, 1).await;

    let event = json!({"eventName": "chat", "data": "still here"});
    send_json(&mut good, &event).await;
    assert_eq!(next_json(&mut good).await, event);
}

#[tokio::test]
async fn client_disconnect_unregisters() {
    let (url, server) = boot_server(test_config(), HandlerRegistry::new()).await;
    let mut ws = connect(&url).await;
    let _other = connect(&url).await;
    wait_for_connections(&server, 2).await;

    ws.close(None).await.unwrap();
    wait_for_connections(&server, 1).await;
}

#[tokio::test]
async fn handler_rewrites_event_before_broadcast() {
    let mut handlers = HandlerRegistry::new();
    handlers.register("chat", |event: Event| {
        let (name, payload) = event.into_parts();
        Some(Event::new(name, json!({"msg": payload["msg"], "color": "blue"})))
    });
    handlers.register("typing", |_event: Event| -> Option<Event> { None });

    let (url, server) = boot_server(test_config(), handlers).await;
    let mut ws = connect(&url).await;
    wait_for_connections(&server, 1).await;

    send_json(&mut ws, &json!({"eventName": "typing", "data": null})).await;
    send_json(&mut ws, &json!({"eventName": "chat", "data": {"msg": "hi"}})).await;

    assert_eq!(
        next_json(&mut ws).await,
        json!({"eventName": "chat", "data": {"msg": "hi", "color": "blue"}})
    );
}

#[tokio::test]
async fn upgrade_refused_at_connection_limit() {
    let config = ServerConfig {
        max_connections: 1,
        ..test_config()
    };
    let (url, server) = boot_server(config, HandlerRegistry::new()).await;
    let _first = connect(&url).await;
    wait_for_connections(&server, 1).await;

    let err = timeout(TIMEOUT, connect_async(&url)).await.unwrap().unwrap_err();
    match err {
        tungstenite::Error::Http(resp) => assert_eq!(resp.status(), 503),
        other => panic!("expected HTTP 503, got {other:?}"),
    }
    assert_eq!(server.hub().connection_count().await.unwrap(), 1);
}
