//! Configuration for talking to a messaging service. Loaded from the
//! environment or from YAML, and used to wire up the transport, sender,
//! inbox, and workflow helpers in one go.

use crate::{
    error::{Error, Result},
    service::{
        contacts::ContactResolver,
        dispatch::Dispatcher,
        inbox::Inbox,
        intercept::{ChannelInterceptor, InterceptRequest, Interceptor, Passthrough},
        notify::Notifier,
        sender::FanOutSender,
        transport::HttpTransport,
    },
    workflow::Workflow,
};
use serde_derive::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use url::Url;

pub const ENV_SERVICE_URL: &str = "ATTEST_SERVICE_URL";
pub const ENV_DEBUG_MODE: &str = "ATTEST_DEBUG_MODE";
pub const ENV_REQUEST_TIMEOUT: &str = "ATTEST_REQUEST_TIMEOUT";

/// Messaging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, getset::Getters, getset::Setters)]
#[getset(get = "pub", set = "pub")]
pub struct Config {
    /// Base URL of the messaging service. Endpoints live under `/messaging`.
    service_url: Url,
    /// When on, every outbound message is handed over for inspection (and
    /// possibly editing) before it's sent.
    #[serde(default)]
    debug_mode: bool,
    /// Seconds before an HTTP request gives up. None waits forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_timeout_secs: Option<u64>,
}

fn parse_bool(key: &str, val: &str) -> Result<bool> {
    match val.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::Config(format!("{} must be a boolean, got {:?}", key, val))),
    }
}

impl Config {
    pub fn new(service_url: Url) -> Self {
        Self {
            service_url,
            debug_mode: false,
            request_timeout_secs: None,
        }
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to find each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(ENV_SERVICE_URL).ok_or_else(|| Error::Config(format!("{} is not set", ENV_SERVICE_URL)))?;
        let service_url = Url::parse(&url).map_err(|e| Error::Config(format!("{}: {}", ENV_SERVICE_URL, e)))?;
        let debug_mode = match lookup(ENV_DEBUG_MODE) {
            Some(val) => parse_bool(ENV_DEBUG_MODE, &val)?,
            None => false,
        };
        let request_timeout_secs = match lookup(ENV_REQUEST_TIMEOUT) {
            Some(val) => Some(
                val.trim()
                    .parse::<u64>()
                    .map_err(|e| Error::Config(format!("{}: {}", ENV_REQUEST_TIMEOUT, e)))?,
            ),
            None => None,
        };
        Ok(Self {
            service_url,
            debug_mode,
            request_timeout_secs,
        })
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// An HTTP transport pointed at our service.
    pub fn transport(&self) -> Result<HttpTransport> {
        HttpTransport::new(self.service_url.clone(), self.request_timeout_secs.map(Duration::from_secs))
    }

    /// The interception hook for our debug mode. In debug mode, the receiver
    /// hands out every outbound body for a decision.
    pub fn interceptor(&self) -> (Arc<dyn Interceptor>, Option<mpsc::UnboundedReceiver<InterceptRequest>>) {
        if self.debug_mode {
            let (interceptor, rx) = ChannelInterceptor::new();
            (Arc::new(interceptor), Some(rx))
        } else {
            (Arc::new(Passthrough), None)
        }
    }

    /// Wire up everything needed to send and receive messages.
    pub fn messaging(&self, contacts: Arc<dyn ContactResolver>, notifier: Arc<dyn Notifier>) -> Result<Messaging> {
        let dispatcher = Dispatcher::new(Arc::new(self.transport()?));
        let (interceptor, intercepts) = self.interceptor();
        let fanout = FanOutSender::new(dispatcher.clone(), contacts.clone(), notifier, interceptor);
        Ok(Messaging {
            inbox: Inbox::new(dispatcher, contacts),
            workflow: Workflow::new(fanout.clone()),
            fanout,
            intercepts,
        })
    }
}

/// A ready-to-use set of messaging services.
pub struct Messaging {
    pub fanout: FanOutSender,
    pub inbox: Inbox,
    pub workflow: Workflow,
    /// Outbound bodies waiting on a decision, in debug mode
    pub intercepts: Option<mpsc::UnboundedReceiver<InterceptRequest>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{MemoryContacts, TracingNotifier};
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn config_from_lookup() {
        let config = Config::from_lookup(lookup(&[(ENV_SERVICE_URL, "https://services.example.org")])).unwrap();
        assert_eq!(config.service_url().as_str(), "https://services.example.org/");
        assert!(!*config.debug_mode());
        assert_eq!(config.request_timeout_secs(), &None);

        let config = Config::from_lookup(lookup(&[
            (ENV_SERVICE_URL, "http://localhost:3000"),
            (ENV_DEBUG_MODE, "Yes"),
            (ENV_REQUEST_TIMEOUT, " 30 "),
        ]))
        .unwrap();
        assert!(*config.debug_mode());
        assert_eq!(config.request_timeout_secs(), &Some(30));

        assert!(matches!(Config::from_lookup(lookup(&[])), Err(Error::Config(_))));
        assert!(matches!(Config::from_lookup(lookup(&[(ENV_SERVICE_URL, "not a url")])), Err(Error::Config(_))));
        let res = Config::from_lookup(lookup(&[(ENV_SERVICE_URL, "http://localhost"), (ENV_DEBUG_MODE, "maybe")]));
        assert!(matches!(res, Err(Error::Config(_))));
        let res = Config::from_lookup(lookup(&[(ENV_SERVICE_URL, "http://localhost"), (ENV_REQUEST_TIMEOUT, "soon")]));
        assert!(matches!(res, Err(Error::Config(_))));
    }

    #[test]
    fn config_yaml() {
        let config = Config::from_yaml("service_url: http://localhost:3000/\ndebug_mode: true\n").unwrap();
        assert!(*config.debug_mode());
        assert_eq!(config.request_timeout_secs(), &None);
        let yaml = config.to_yaml().unwrap();
        assert_eq!(Config::from_yaml(&yaml).unwrap(), config);
        assert!(matches!(Config::from_yaml("debug_mode: true"), Err(Error::SerializeYaml(_))));
    }

    #[tokio::test]
    async fn config_messaging() {
        let mut config = Config::new(Url::parse("http://localhost:3000").unwrap());
        let messaging = config
            .messaging(Arc::new(MemoryContacts::default()), Arc::new(TracingNotifier))
            .unwrap();
        assert!(messaging.intercepts.is_none());
        config.set_debug_mode(true);
        let messaging = config
            .messaging(Arc::new(MemoryContacts::default()), Arc::new(TracingNotifier))
            .unwrap();
        assert!(messaging.intercepts.is_some());
    }
}
