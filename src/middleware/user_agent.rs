//! Sets the `User-Agent` header on outgoing requests.

use async_trait::async_trait;
use reqwest::header::{HeaderValue, USER_AGENT};
use serde::Deserialize;

use crate::configuration::{parse_options, Configurable, Options};
use crate::error::SpiderError;
use crate::item::Outcome;
use crate::request::Request;

use super::DownloaderMiddleware;

pub static DEFAULT_USER_AGENT: &str =
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct UserAgentOptions {
    user_agent: String,
}

impl Default for UserAgentOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct UserAgentMiddleware {
    user_agent: HeaderValue,
}

impl Default for UserAgentMiddleware {
    fn default() -> Self {
        Self {
            user_agent: HeaderValue::from_static(DEFAULT_USER_AGENT),
        }
    }
}

impl Configurable for UserAgentMiddleware {
    fn configure(&mut self, options: Options) -> Result<(), SpiderError> {
        let options: UserAgentOptions = parse_options(options)?;
        self.user_agent = HeaderValue::from_str(&options.user_agent).map_err(|e| {
            SpiderError::GeneralError(format!("`{}` is not a valid header value: {e}", options.user_agent))
        })?;
        Ok(())
    }
}

#[async_trait]
impl DownloaderMiddleware for UserAgentMiddleware {
    async fn handle_request(&self, mut request: Request) -> Result<Outcome<Request>, SpiderError> {
        request.headers.insert(USER_AGENT, self.user_agent.clone());
        Ok(Outcome::Kept(request))
    }
}
