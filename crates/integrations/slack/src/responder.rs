use std::sync::Arc;

use async_trait::async_trait;
use spyglass_bot::{BotError, Responder};

use crate::client::SlackClient;
use crate::types::PostMessageRequest;

/// Replies into the channel (and thread, if any) a command came from.
#[derive(Debug, Clone)]
pub struct SlackResponder {
    client: Arc<SlackClient>,
    channel: String,
    thread_ts: Option<String>,
}

impl SlackResponder {
    pub fn new(client: Arc<SlackClient>, channel: impl Into<String>) -> Self {
        Self {
            client,
            channel: channel.into(),
            thread_ts: None,
        }
    }

    #[must_use]
    pub fn in_thread(mut self, thread_ts: Option<String>) -> Self {
        self.thread_ts = thread_ts;
        self
    }
}

#[async_trait]
impl Responder for SlackResponder {
    async fn send(&self, text: &str) -> Result<(), BotError> {
        let request = PostMessageRequest {
            channel: self.channel.clone(),
            text: text.to_owned(),
            thread_ts: self.thread_ts.clone(),
            unfurl_links: false,
        };
        self.client.post_message(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::*;
    use crate::config::SlackConfig;

    /// A minimal mock HTTP server that answers one request with a canned
    /// response and hands back the raw request text.
    struct MockSlackServer {
        listener: TcpListener,
        base_url: String,
    }

    impl MockSlackServer {
        async fn start() -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let port = listener.local_addr().unwrap().port();
            Self {
                listener,
                base_url: format!("http://127.0.0.1:{port}"),
            }
        }

        async fn respond_once(self, status_code: u16, body: &'static str) -> String {
            let (mut stream, _) = self.listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;

            let response = format!(
                "HTTP/1.1 {status_code} OK\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\
                 \r\n\
                 {body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        }
    }

    async fn read_request(stream: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(split) = text.find("\r\n\r\n") {
                let length = text[..split]
                    .lines()
                    .find_map(|l| {
                        let (k, v) = l.split_once(':')?;
                        k.eq_ignore_ascii_case("content-length")
                            .then(|| v.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= split + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn responder(base_url: &str, thread: Option<&str>) -> SlackResponder {
        let config = SlackConfig::new("xoxb-test").with_api_base_url(base_url);
        SlackResponder::new(Arc::new(SlackClient::new(config).unwrap()), "C123")
            .in_thread(thread.map(str::to_owned))
    }

    #[tokio::test]
    async fn posts_to_the_originating_channel() {
        let server = MockSlackServer::start().await;
        let responder = responder(&server.base_url, Some("111.222"));
        let handle = tokio::spawn(server.respond_once(
            200,
            r#"{"ok":true,"channel":"C123","ts":"1234567890.123456"}"#,
        ));

        responder.send("✅ done").await.unwrap();
        let request = handle.await.unwrap();

        assert!(request.starts_with("POST /chat.postMessage"));
        assert!(request.to_lowercase().contains("authorization: bearer xoxb-test"));
        let body = &request[request.find("\r\n\r\n").unwrap() + 4..];
        let json: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(json["channel"], "C123");
        assert_eq!(json["text"], "✅ done");
        assert_eq!(json["thread_ts"], "111.222");
    }

    #[tokio::test]
    async fn api_error_becomes_reply_error() {
        let server = MockSlackServer::start().await;
        let responder = responder(&server.base_url, None);
        let handle = tokio::spawn(server.respond_once(200, r#"{"ok":false,"error":"invalid_auth"}"#));

        let err = responder.send("hello").await.unwrap_err();
        handle.await.unwrap();

        assert!(matches!(err, BotError::Reply(ref m) if m.contains("invalid_auth")));
    }

    #[tokio::test]
    async fn rate_limit_is_reported() {
        let server = MockSlackServer::start().await;
        let responder = responder(&server.base_url, None);
        let handle = tokio::spawn(server.respond_once(429, r#"{"ok":false,"error":"rate_limited"}"#));

        let err = responder.send("hello").await.unwrap_err();
        handle.await.unwrap();

        assert!(matches!(err, BotError::Reply(ref m) if m == "rate limited by Slack"));
    }
}
