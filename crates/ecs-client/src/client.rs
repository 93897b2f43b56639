//! ECS API client
//!
//! *Note*: only the two read calls a cloud provider needs are implemented.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::errors::Error;
use crate::models::{ListServersDetailsResponse, ShowServerResponse};
use crate::secrets::{Authenticable, Credentials};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a [`Client`]
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the regional ECS endpoint, e.g.
    /// `https://ecs.cn-north-4.myhuaweicloud.com`
    pub endpoint: String,
    /// Timeout applied to every request by the underlying HTTP client
    pub timeout: Duration,
}

impl ClientConfig {
    /// A config for the given endpoint with the default timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        ClientConfig {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The ECS client talks to the cloudservers API of one region.
///
/// A client is built once and can be cloned cheaply; clones share the
/// connection pool.
#[derive(Clone, Debug)]
pub struct Client {
    endpoint: Url,
    credentials: Credentials,
    client: reqwest::Client,
}

impl TryFrom<(ClientConfig, Credentials)> for Client {
    type Error = Error;

    fn try_from((config, credentials): (ClientConfig, Credentials)) -> Result<Self, Self::Error> {
        let endpoint = Url::parse(&config.endpoint)?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "endpoint {} cannot be used as a base URL",
                config.endpoint
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Client {
            endpoint,
            credentials,
            client,
        })
    }
}

impl Client {
    /// Create a new client
    pub fn new(config: ClientConfig, credentials: Credentials) -> Result<Self, Error> {
        Client::try_from((config, credentials))
    }

    /// Fetch a single server by ID.
    ///
    /// A missing server is reported by the API as an [`Error::Api`] whose body
    /// carries the `Ecs.0114` error code.
    pub async fn show_server(&self, server_id: &str) -> Result<ShowServerResponse, Error> {
        let url = self.to_cloudservers_url(&[server_id])?;
        self.get_json(url).await
    }

    /// List servers whose name matches `name`.
    pub async fn list_servers_details(
        &self,
        name: &str,
    ) -> Result<ListServersDetailsResponse, Error> {
        let mut url = self.to_cloudservers_url(&["detail"])?;
        url.query_pairs_mut().append_pair("name", name);
        self.get_json(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let res = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .apply_authentication(&self.credentials)
            .send()
            .await?;

        let status = res.status();
        let text = res.text().await?;
        trace!("ECS response {}: {}", status, text);

        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }

    /// Builds `{endpoint}/v1/{project_id}/cloudservers/{segments...}`.
    ///
    /// Segments are percent-encoded, so IDs cannot escape the path.
    fn to_cloudservers_url(&self, segments: &[&str]) -> Result<Url, Error> {
        let mut url = self.endpoint.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::InvalidConfig("endpoint cannot be a base".to_owned()))?;
            path.pop_if_empty()
                .extend(&["v1", self.credentials.project_id(), "cloudservers"])
                .extend(segments);
        }
        Ok(url)
    }
}
