//! In debug mode, every outgoing body gets a stop on the way out where a user
//! can look it over, edit it, or leave it be.

use crate::message::MessageBody;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// What to do with an intercepted body.
#[derive(Debug, Clone, PartialEq)]
pub enum Interception {
    /// Send it as-is
    Proceed,
    /// Send this instead
    Edited(MessageBody),
    /// Back out of editing. The original body still goes out.
    Cancelled,
}

impl Interception {
    /// Settle on which body to send.
    pub fn resolve(self, original: MessageBody) -> MessageBody {
        match self {
            Self::Edited(body) => body,
            Self::Proceed | Self::Cancelled => original,
        }
    }
}

/// A stop on the outbound path. Implementations may wait as long as they like.
#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, body: &MessageBody) -> Interception;
}

/// Lets everything straight through. Used when debug mode is off.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

#[async_trait]
impl Interceptor for Passthrough {
    async fn intercept(&self, _body: &MessageBody) -> Interception {
        Interception::Proceed
    }
}

/// A body waiting on a decision.
#[derive(Debug)]
pub struct InterceptRequest {
    body: MessageBody,
    reply: oneshot::Sender<Interception>,
}

impl InterceptRequest {
    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn proceed(self) {
        let _ = self.reply.send(Interception::Proceed);
    }

    pub fn edit(self, body: MessageBody) {
        let _ = self.reply.send(Interception::Edited(body));
    }

    pub fn cancel(self) {
        let _ = self.reply.send(Interception::Cancelled);
    }
}

/// Hands each outbound body to whoever holds the receiving end of a channel
/// and waits for them to decide. Dropping a request without answering counts
/// as a cancel, and so does nobody listening at all.
#[derive(Debug, Clone)]
pub struct ChannelInterceptor {
    tx: mpsc::UnboundedSender<InterceptRequest>,
}

impl ChannelInterceptor {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<InterceptRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Interceptor for ChannelInterceptor {
    async fn intercept(&self, body: &MessageBody) -> Interception {
        let (reply, decision) = oneshot::channel();
        let req = InterceptRequest { body: body.clone(), reply };
        if self.tx.send(req).is_err() {
            return Interception::Cancelled;
        }
        decision.await.unwrap_or(Interception::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{CTypeHash, PartialClaim};

    fn body(hash: &str) -> MessageBody {
        MessageBody::RequestTerms(PartialClaim::new(CTypeHash::from(hash), None, None))
    }

    #[tokio::test]
    async fn passthrough_proceeds() {
        let res = Passthrough.intercept(&body("0x1")).await;
        assert_eq!(res.resolve(body("0x1")), body("0x1"));
    }

    #[tokio::test]
    async fn channel_interceptor_decisions() {
        let (interceptor, mut rx) = ChannelInterceptor::new();
        tokio::spawn(async move {
            let req = rx.recv().await.unwrap();
            assert_eq!(req.body(), &body("0x1"));
            req.edit(body("0x2"));
            let req = rx.recv().await.unwrap();
            req.cancel();
            let req = rx.recv().await.unwrap();
            drop(req);
        });
        assert_eq!(interceptor.intercept(&body("0x1")).await, Interception::Edited(body("0x2")));
        assert_eq!(interceptor.intercept(&body("0x1")).await.resolve(body("0x1")), body("0x1"));
        assert_eq!(interceptor.intercept(&body("0x1")).await, Interception::Cancelled);
        // the listener is gone now
        assert_eq!(interceptor.intercept(&body("0x1")).await, Interception::Cancelled);
    }
}
