//! The transport is the wire between us and the messaging service. It's kept
//! behind a trait so the rest of the system doesn't care whether messages go
//! over HTTP or into a vec in a test.

use crate::{
    error::{Error, Result},
    identity::Address,
    message::{Envelope, MessageId},
};
use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// What the messaging service tells us after accepting a message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, getset::Getters)]
#[getset(get = "pub")]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// The id the service assigned, if it bothered to tell us
    #[serde(default)]
    message_id: Option<MessageId>,
}

impl Receipt {
    pub fn new(message_id: Option<MessageId>) -> Self {
        Self { message_id }
    }

    /// Parse a response body into a receipt. Services are free to answer with
    /// an empty body (or whatever else) so anything unparseable gets an empty
    /// receipt.
    pub fn from_body(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }
}

/// An HTTP-shaped messaging service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `POST /messaging`
    async fn post_message(&self, envelope: &Envelope) -> Result<Receipt>;

    /// `GET /messaging/inbox/{address}`. Envelopes come back raw so a single
    /// malformed one can't sink the whole inbox.
    async fn get_inbox(&self, address: &Address) -> Result<Vec<Value>>;

    /// `GET /messaging/inbox/{address}/{messageId}`, a single raw envelope.
    async fn get_message(&self, address: &Address, message_id: &MessageId) -> Result<Value>;

    /// `DELETE /messaging/{messageId}` with a `signature` header proving we're
    /// allowed to.
    async fn delete_message(&self, message_id: &MessageId, signature: &str) -> Result<()>;
}

/// Talks to a messaging service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base: Url,
}

impl HttpTransport {
    /// Create a transport pointed at `base`. If `timeout` is given, every
    /// request gives up after that long.
    pub fn new(base: Url, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/messaging{}", self.base.as_str().trim_end_matches('/'), path)
    }

    async fn failure(response: reqwest::Response) -> Error {
        let status = response.status();
        let reason = match response.text().await {
            Ok(text) if !text.is_empty() => text,
            _ => status.canonical_reason().unwrap_or("unknown").to_string(),
        };
        Error::Transport {
            status: status.as_u16(),
            reason,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_message(&self, envelope: &Envelope) -> Result<Receipt> {
        let response = self.client.post(self.endpoint("")).json(envelope).send().await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        let body = response.text().await?;
        Ok(Receipt::from_body(&body))
    }

    async fn get_inbox(&self, address: &Address) -> Result<Vec<Value>> {
        let response = self
            .client
            .get(self.endpoint(&format!("/inbox/{}", address)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        let envelopes = response.json::<Vec<Value>>().await?;
        Ok(envelopes)
    }

    async fn get_message(&self, address: &Address, message_id: &MessageId) -> Result<Value> {
        let response = self
            .client
            .get(self.endpoint(&format!("/inbox/{}/{}", address, message_id)))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::failure(response).await);
        }
        Ok(response.json::<Value>().await?)
    }

    async fn delete_message(&self, message_id: &MessageId, signature: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/{}", message_id)))
            .header("signature", signature)
            .send()
            .await?;
        match response.status().as_u16() {
            401 | 403 => Err(Error::Unauthorized),
            _ if response.status().is_success() => Ok(()),
            _ => Err(Self::failure(response).await),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        identity::{CTypeHash, Identity, PartialClaim},
        message::MessageBody,
        util::test,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// A one-shot HTTP server: answers the first request it gets with `status`
    /// and `body`, and hands back the raw request it saw.
    async fn stub_server(status: u16, body: &'static str) -> (HttpTransport, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = Url::parse(&format!("http://{}", listener.local_addr().unwrap())).unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_len = loop {
                let read = socket.read(&mut chunk).await.unwrap();
                buf.extend_from_slice(&chunk[..read]);
                if let Some(pos) = buf.windows(4).position(|x| x == b"\r\n\r\n") {
                    break pos + 4;
                }
                if read == 0 {
                    break buf.len();
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_len]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|x| x.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_len + content_length {
                let read = socket.read(&mut chunk).await.unwrap();
                if read == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..read]);
            }
            let response = format!(
                "HTTP/1.1 {} Whatever\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });
        // skip any proxy from the environment, the stub is local
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        (HttpTransport { client, base }, handle)
    }

    fn envelope() -> Envelope {
        let mut rng = test::rng();
        let sender = Identity::generate(&mut rng);
        let receiver = Identity::generate(&mut rng);
        let body = MessageBody::RequestTerms(PartialClaim::new(CTypeHash::from("0x1"), None, None));
        Envelope::encrypt(&mut rng, &body, &sender, &receiver.public_identity()).unwrap()
    }

    #[tokio::test]
    async fn http_post_message() {
        let envelope = envelope();
        let (transport, server) = stub_server(200, r#"{"messageId":"abc-123"}"#).await;
        let receipt = transport.post_message(&envelope).await.unwrap();
        assert_eq!(receipt.message_id(), &Some(MessageId::from("abc-123")));
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /messaging HTTP/1.1"));
        assert!(request.contains(&format!(r#""receiverAddress":"{}""#, envelope.receiver_address())));

        let (transport, server) = stub_server(500, "database on fire").await;
        let res = transport.post_message(&envelope).await;
        assert_eq!(
            res.err(),
            Some(Error::Transport {
                status: 500,
                reason: String::from("database on fire"),
            })
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_get_inbox() {
        let address = Address::from("jerry");
        let (transport, server) = stub_server(200, r#"[{"hello":"there"},{"general":"kenobi"}]"#).await;
        let inbox = transport.get_inbox(&address).await.unwrap();
        assert_eq!(inbox.len(), 2);
        assert!(server.await.unwrap().starts_with("GET /messaging/inbox/jerry HTTP/1.1"));

        let (transport, server) = stub_server(502, "").await;
        let res = transport.get_inbox(&address).await;
        assert_eq!(
            res.err(),
            Some(Error::Transport {
                status: 502,
                reason: String::from("Bad Gateway"),
            })
        );
        server.await.unwrap();

        let (transport, server) = stub_server(200, r#"{"hello":"there"}"#).await;
        let message = transport.get_message(&address, &MessageId::from("m1")).await.unwrap();
        assert_eq!(message["hello"], Value::String("there".into()));
        assert!(server.await.unwrap().starts_with("GET /messaging/inbox/jerry/m1 HTTP/1.1"));

        let (transport, server) = stub_server(404, "no such message").await;
        let res = transport.get_message(&address, &MessageId::from("m2")).await;
        assert!(matches!(res, Err(Error::Transport { status: 404, .. })));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_delete_message() {
        let message_id = MessageId::from("abc-123");
        let (transport, server) = stub_server(200, "").await;
        transport.delete_message(&message_id, "c2lnbmVk").await.unwrap();
        let request = server.await.unwrap();
        assert!(request.starts_with("DELETE /messaging/abc-123 HTTP/1.1"));
        assert!(request.to_lowercase().contains("signature: c2lnbmVk"));

        for status in [401, 403] {
            let (transport, server) = stub_server(status, "go away").await;
            let res = transport.delete_message(&message_id, "c2lnbmVk").await;
            assert_eq!(res, Err(Error::Unauthorized));
            server.await.unwrap();
        }

        let (transport, server) = stub_server(500, "oops").await;
        let res = transport.delete_message(&message_id, "c2lnbmVk").await;
        assert!(matches!(res, Err(Error::Transport { status: 500, .. })));
        server.await.unwrap();
    }

    #[test]
    fn receipt_from_body() {
        let receipt = Receipt::from_body(r#"{"messageId":"abc-123"}"#);
        assert_eq!(receipt.message_id(), &Some(MessageId::from("abc-123")));
        assert_eq!(Receipt::from_body(""), Receipt::default());
        assert_eq!(Receipt::from_body("OK"), Receipt::default());
    }

    #[test]
    fn http_transport_endpoints() {
        let transport = HttpTransport::new(Url::parse("https://services.example.org/").unwrap(), None).unwrap();
        assert_eq!(transport.endpoint(""), "https://services.example.org/messaging");
        assert_eq!(transport.endpoint("/inbox/jerry"), "https://services.example.org/messaging/inbox/jerry");
        let transport = HttpTransport::new(Url::parse("http://localhost:3000/api").unwrap(), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(transport.endpoint("/abc"), "http://localhost:3000/api/messaging/abc");
    }
}
