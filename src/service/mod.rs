//! Services move messages around: out through the [sender], back in through
//! the [inbox], with [contacts], [notifications](notify), and the debug
//! [interception](intercept) hook plugged in along the way.

pub mod contacts;
pub mod dispatch;
pub mod inbox;
pub mod intercept;
pub mod notify;
pub mod sender;
pub mod transport;

pub use contacts::{ContactResolver, MemoryContacts};
pub use dispatch::{sign_deletion, Dispatcher};
pub use inbox::{Inbox, InboxReport, RejectedEnvelope};
pub use intercept::{ChannelInterceptor, InterceptRequest, Interception, Interceptor, Passthrough};
pub use notify::{Notifier, TracingNotifier};
pub use sender::{FanOutSender, SendOutcome};
pub use transport::{HttpTransport, Receipt, Transport};
