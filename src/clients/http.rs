use http::StatusCode;
use rquest::{Client, RequestBuilder, Response};
use rquest_util::Emulation;
use tracing::debug;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// One rquest client with a fixed browser emulation and the configured
/// request headers applied to every call.
pub struct HttpClient {
    client: Client,
    headers: Vec<(String, String)>,
}

impl HttpClient {
    pub fn new(http: &HttpConfig, emulation: Emulation) -> Result<Self> {
        debug!(emulation = ?emulation, "Creating client with emulation");

        let client = Client::builder().emulation(emulation).build()?;

        Ok(Self {
            client,
            headers: http
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    pub fn get(&self, url: &str) -> RequestBuilder {
        let mut request = self.client.get(url);
        for (key, value) in &self.headers {
            request = request.header(key.as_str(), value.as_str());
        }
        request
    }

    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await?;

        debug!(
            status = response.status().as_u16(),
            url = %response.url(),
            "Response received"
        );

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimit),
            StatusCode::FORBIDDEN => Err(Error::Forbidden),
            StatusCode::NOT_FOUND => Err(Error::PageNotFound),
            _ => Ok(response),
        }
    }
}
