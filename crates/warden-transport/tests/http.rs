//! Integration tests for the reqwest transport.
//!
//! These tests spin up a tiny HTTP/1.1 server on a random local port so
//! the request really goes over a socket: headers, JSON bodies, error
//! statuses and connection failures are all exercised end to end.

#[cfg(feature = "reqwest")]
mod http {
    use std::time::Duration;

    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use warden_protocol::HttpRequest;
    use warden_transport::{HttpTransport, Transport, TransportConfig, TransportError};

    /// Accepts one connection, captures the raw request text, and
    /// answers with `status` and `body`.
    async fn one_shot_server(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("should bind");
        let addr = listener.local_addr().expect("has local addr");

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("should accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.expect("should write");
            socket.shutdown().await.ok();
            request
        });

        (format!("http://{addr}/api"), handle)
    }

    /// Reads the head and (Content-Length) body of one request.
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.expect("should read");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    #[tokio::test]
    async fn test_send_success_returns_status_and_json_body() {
        let (base, server) = one_shot_server("200 OK", r#"{"message":"ok"}"#).await;
        let transport = HttpTransport::new(TransportConfig::with_base_url(base)).unwrap();

        let request = HttpRequest::post("/login")
            .json(&json!({ "email": "a@b.c", "password": "pw" }))
            .unwrap();
        let response = transport.send(request).await.expect("should succeed");

        assert_eq!(response.status, 200);
        assert_eq!(response.body, Some(json!({ "message": "ok" })));

        let raw = server.await.unwrap();
        assert!(raw.starts_with("POST /api/login HTTP/1.1"), "got: {raw}");
        assert!(raw.to_ascii_lowercase().contains("content-type: application/json"));
        assert!(raw.contains(r#""email":"a@b.c""#));
    }

    #[tokio::test]
    async fn test_send_forwards_custom_headers() {
        let (base, server) = one_shot_server("200 OK", "{}").await;
        let transport = HttpTransport::new(TransportConfig::with_base_url(base)).unwrap();

        let request = HttpRequest::get("users")
            .header("Authorization", "Bearer aaa.bbb.ccc")
            .header("Accept", "application/json");
        transport.send(request).await.expect("should succeed");

        let raw = server.await.unwrap().to_ascii_lowercase();
        assert!(raw.contains("authorization: bearer aaa.bbb.ccc"));
        assert!(raw.contains("accept: application/json"));
    }

    #[tokio::test]
    async fn test_send_error_status_is_ok_with_body() {
        // Error statuses are still responses; the pipeline decides.
        let (base, _server) =
            one_shot_server("403 Forbidden", r#"{"success":false,"status_code":403}"#).await;
        let transport = HttpTransport::new(TransportConfig::with_base_url(base)).unwrap();

        let response = transport.send(HttpRequest::get("/me")).await.expect("has a status");

        assert_eq!(response.status, 403);
        assert_eq!(response.body, Some(json!({ "success": false, "status_code": 403 })));
    }

    #[tokio::test]
    async fn test_send_refused_connection_returns_network_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpTransport::new(TransportConfig::with_base_url(format!("http://{addr}"))).unwrap();

        let err = transport.send(HttpRequest::get("/status")).await.unwrap_err();

        assert!(err.is_connectivity(), "expected connectivity error, got {err:?}");
    }

    #[tokio::test]
    async fn test_send_silent_server_returns_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold the socket open without answering.
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let transport = HttpTransport::new(TransportConfig {
            base_url: format!("http://{addr}"),
            timeout: Duration::from_millis(200),
        })
        .unwrap();

        let err = transport.send(HttpRequest::get("/slow")).await.unwrap_err();

        assert!(matches!(err, TransportError::Timeout(_)), "got {err:?}");
    }
}
