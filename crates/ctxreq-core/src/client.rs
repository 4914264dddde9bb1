//! Client: builds requests that share transport settings and a default
//! retry policy.

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::context::ExecContext;
use crate::request::{Method, Request};
use crate::retry::{DeadlineRetryer, Retryer};
use crate::transfer::TransferSettings;

#[derive(Clone)]
pub struct Client {
    settings: TransferSettings,
    policy: Arc<dyn Retryer>,
}

impl Client {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            settings: config.transfer_settings(),
            policy: Arc::new(config.retry_policy()),
        }
    }

    pub fn request(&self, method: Method, url: impl Into<String>) -> Request {
        Request::new(method, url)
            .with_settings(self.settings.clone())
            .with_retryer(Arc::clone(&self.policy))
    }

    pub fn get(&self, url: impl Into<String>) -> Request {
        self.request(Method::Get, url)
    }

    /// Request whose retries are gated by `ctx`: a retry is only scheduled
    /// when its backoff fits in the remaining budget.
    pub fn request_in(&self, ctx: &ExecContext, method: Method, url: impl Into<String>) -> Request {
        let gate = DeadlineRetryer::with_policy(ctx.clone(), Arc::clone(&self.policy));
        self.request(method, url).with_retryer(Arc::new(gate))
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new(&ClientConfig::default())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .field("policy", &"<retryer>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use std::time::Duration;

    #[test]
    fn requests_inherit_config() {
        let cfg = ClientConfig {
            request_timeout_ms: Some(300),
            max_redirects: 3,
            retry: Some(RetryConfig {
                max_attempts: 2,
                base_delay_secs: 0.01,
                max_delay_secs: 1,
            }),
            ..ClientConfig::default()
        };
        let client = Client::new(&cfg);
        let req = client.get("http://127.0.0.1/");
        assert_eq!(req.settings().timeout, Some(Duration::from_millis(300)));
        assert_eq!(req.settings().max_redirects, 3);
        assert_eq!(req.method(), Method::Get);
    }
}
