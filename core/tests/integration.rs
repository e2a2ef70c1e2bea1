//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port in a background runtime, then
//! drives a real `RestClient` over its pooled ureq transport. Route handlers
//! echo back what they received, so each test asserts on what actually went
//! over the wire.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use mock_server::{Echo, Token, UploadedPart, Widget};
use rest_core::{Payload, Proxy, RestClient, RestError};
use serde::Serialize;

/// One server for the whole test binary.
fn server() -> SocketAddr {
    static ADDR: OnceLock<SocketAddr> = OnceLock::new();
    *ADDR.get_or_init(|| {
        let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                mock_server::run(listener).await
            })
            .unwrap();
        });
        addr
    })
}

fn client() -> RestClient {
    RestClient::builder()
        .host("127.0.0.1")
        .port(server().port())
        .build()
        .unwrap()
}

#[derive(Serialize)]
struct TokenQuery {
    subject: String,
    scope: Option<String>,
}

#[test]
fn get_with_form_payload_generates_token() {
    let token: Token = client()
        .get("/security/generate/token")
        .form(&[("subject", "rolroralra")])
        .send_as()
        .unwrap();
    assert_eq!(token.subject, "rolroralra");
    assert!(!token.token.is_empty());
}

#[test]
fn get_with_json_payload_flattens_into_query() {
    let echo: Echo = client()
        .get("/echo")
        .json(&TokenQuery {
            subject: "s p".to_string(),
            scope: None,
        })
        .send_as()
        .unwrap();
    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query, vec![("subject".to_string(), "s p".to_string())]);
    assert!(echo.body.is_empty());
}

#[test]
fn string_verb_call_returns_raw_text() {
    let text = client()
        .call("get", "/security/generate/token?subject=raw", &Payload::None)
        .unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["subject"], "raw");
}

#[test]
fn post_without_payload_sends_empty_json_body() {
    let echo: Echo = client().call_as("POST", "/echo", &Payload::None).unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert!(echo.body.is_empty());
}

#[test]
fn put_with_form_payload_is_urlencoded() {
    let fields: Vec<(String, String)> = client()
        .put("/form")
        .form(&[("name", "a b"), ("x", "1&2")])
        .send_as()
        .unwrap();
    assert_eq!(
        fields,
        vec![
            ("name".to_string(), "a b".to_string()),
            ("x".to_string(), "1&2".to_string()),
        ]
    );
}

#[test]
fn delete_with_json_payload_carries_body() {
    let echo: Echo = client()
        .delete("/echo")
        .json(&serde_json::json!({"id": 42}))
        .send_as()
        .unwrap();
    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.content_type.as_deref(), Some("application/json"));
    assert_eq!(echo.body, r#"{"id":42}"#);
}

#[test]
fn multipart_upload_sends_file_then_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("f.txt");
    std::fs::File::create(&path).unwrap().write_all(b"file body").unwrap();

    let parts: Vec<UploadedPart> = client()
        .post("/upload")
        .multipart(&[("name", "a")], [&path])
        .send_as()
        .unwrap();

    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0].name, "file");
    assert_eq!(parts[0].filename.as_deref(), Some("f.txt"));
    assert_eq!(parts[0].content_type.as_deref(), Some("text/plain"));
    assert_eq!(parts[0].text, "file body");
    assert_eq!(parts[1].name, "name");
    assert_eq!(parts[1].filename, None);
    assert_eq!(parts[1].text, "a");
}

#[test]
fn widget_round_trip_decodes_generic_list() {
    let client = client();
    let created: Widget = client
        .post("/widgets")
        .json(&serde_json::json!({"name": "integration-widget", "quantity": 5}))
        .send_as()
        .unwrap();
    assert_eq!(created.quantity, 5);

    let widgets: Vec<Widget> = client.get("/widgets").send_as().unwrap();
    assert!(widgets.contains(&created));

    let fetched: Widget = client.get(format!("/widgets/{}", created.id)).send_as().unwrap();
    assert_eq!(fetched, created);

    let deleted = client.delete(format!("/widgets/{}", created.id)).send().unwrap();
    assert!(deleted.is_empty());

    let err = client.get(format!("/widgets/{}", created.id)).send().unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[test]
fn not_found_surfaces_server_body() {
    let err = client().get("/no/such/route").send().unwrap_err();
    assert!(matches!(err, RestError::UnsuccessfulResponse { status: 404, .. }));
    assert_eq!(err.body(), Some(r#"{"error":"not found"}"#));
}

#[test]
fn server_error_is_unsuccessful() {
    let err = client().post("/status/500").send().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert_eq!(err.body(), Some("status 500"));
}

#[test]
fn typed_call_on_plain_text_is_deserialization_error() {
    let err = client().get("/status/200").send_as::<Widget>().unwrap_err();
    assert!(matches!(err, RestError::Deserialization { .. }));
    assert_eq!(err.body(), Some("status 200"));
}

#[test]
fn unsupported_method_never_connects() {
    let client = RestClient::builder().host("127.0.0.1").port(1).build().unwrap();
    let err = client.call("PATCH", "/echo", &Payload::None).unwrap_err();
    assert!(matches!(err, RestError::UnsupportedMethod(_)));
}

#[test]
fn connection_refused_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = RestClient::builder()
        .host("127.0.0.1")
        .port(port)
        .connect_timeout(Duration::from_millis(500))
        .build()
        .unwrap();

    let err = client.get("/echo").send().unwrap_err();
    assert!(matches!(err, RestError::Transport(_)));
}

#[test]
fn basic_auth_credentials_reach_the_server() {
    let client = RestClient::builder()
        .host("127.0.0.1")
        .port(server().port())
        .username("user")
        .password("pass")
        .build()
        .unwrap();
    let echo: Echo = client.get("/echo").send_as().unwrap();
    assert_eq!(echo.authorization.as_deref(), Some("Basic dXNlcjpwYXNz"));
}

/// Forwarding HTTP proxy in front of `target`. Records the head of every
/// request it receives, answers `CONNECT` itself, then relays bytes both ways.
fn forwarding_proxy(target: SocketAddr) -> (u16, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let heads = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&heads);

    std::thread::spawn(move || {
        for client in listener.incoming().flatten() {
            let heads = Arc::clone(&recorded);
            std::thread::spawn(move || {
                let _ = relay(client, target, &heads);
            });
        }
    });
    (port, heads)
}

fn relay(mut client: TcpStream, target: SocketAddr, heads: &Mutex<Vec<String>>) -> std::io::Result<()> {
    let (head, rest) = read_head(&mut client)?;
    heads.lock().unwrap().push(head.clone());

    let mut upstream = TcpStream::connect(target)?;
    if head.starts_with("CONNECT") {
        client.write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")?;
    } else {
        upstream.write_all(head.as_bytes())?;
    }
    upstream.write_all(&rest)?;

    let mut downstream = client.try_clone()?;
    let mut from_upstream = upstream.try_clone()?;
    std::thread::spawn(move || {
        let _ = std::io::copy(&mut from_upstream, &mut downstream);
    });
    std::io::copy(&mut client, &mut upstream)?;
    Ok(())
}

/// Read up to the blank line ending the request head. Bytes read past it are
/// returned separately.
fn read_head(stream: &mut TcpStream) -> std::io::Result<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok((String::from_utf8_lossy(&buf).into_owned(), Vec::new()));
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let rest = buf.split_off(end + 4);
            return Ok((String::from_utf8_lossy(&buf).into_owned(), rest));
        }
    }
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

#[test]
fn requests_route_through_proxy_with_verbatim_credentials() {
    let (proxy_port, heads) = forwarding_proxy(server());
    let password = "p@ss a+b%:/";
    let client = RestClient::builder()
        .host("127.0.0.1")
        .port(server().port())
        .proxy(Proxy::new("127.0.0.1", proxy_port).with_auth("bob", password))
        .build()
        .unwrap();

    let echo: Echo = client.get("/echo").form(&[("via", "proxy")]).send_as().unwrap();
    assert_eq!(echo.query, vec![("via".to_string(), "proxy".to_string())]);

    let heads = heads.lock().unwrap();
    let head = heads.first().expect("proxy received no request");
    let expected = format!("Basic {}", STANDARD.encode(format!("bob:{password}")));
    assert_eq!(header_value(head, "proxy-authorization"), Some(expected.as_str()), "{head}");
}

#[test]
fn dead_proxy_is_transport_error() {
    let closed_port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = RestClient::builder()
        .host("127.0.0.1")
        .port(server().port())
        .connect_timeout(Duration::from_millis(500))
        .proxy(Proxy::new("127.0.0.1", closed_port))
        .build()
        .unwrap();
    let err = client.get("/echo").send().unwrap_err();
    assert!(matches!(err, RestError::Transport(_)));
}

#[test]
fn body_larger_than_ten_mebibytes_is_read_whole() {
    let len = 11 * 1024 * 1024;
    let body = client().get(format!("/bytes/{len}")).send().unwrap();
    assert_eq!(body.len(), len);
    assert!(body.bytes().all(|b| b == b'a'));
}

#[test]
fn concurrent_calls_share_one_client() {
    let client = Arc::new(client());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let client = Arc::clone(&client);
            std::thread::spawn(move || {
                let echo: Echo = client
                    .get("/echo")
                    .form(&[("i".to_string(), i.to_string())].to_vec())
                    .send_as()
                    .unwrap();
                echo.query
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), vec![("i".to_string(), i.to_string())]);
    }
}
