//! Moving envelopes to and from an endpoint.
use std::future::Future;

use anyhow::{bail, Context};
use log::debug;
use reqwest::{header::CONTENT_TYPE, StatusCode};
use url::Url;

use crate::binding::BindingConfiguration;

/// A reply as received from the endpoint, before any SOAP processing.
#[derive(Clone, Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub text: String,
}

/// An open connection to one endpoint.
pub trait Transport: Send + Sync {
    fn endpoint(&self) -> &Url;

    fn send(
        &self,
        content_type: String,
        envelope: String,
    ) -> impl Future<Output = anyhow::Result<Reply>> + Send;

    fn close(self)
    where
        Self: Sized,
    {
    }
}

/// Opens [`Transport`]s shaped by a [`BindingConfiguration`].
pub trait Connector: Send + Sync {
    type Transport: Transport;

    fn open(
        &self,
        endpoint: &Url,
        binding: &BindingConfiguration,
    ) -> impl Future<Output = anyhow::Result<Self::Transport>> + Send;
}

type Configure = Box<dyn Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync>;

/// Opens HTTP transports backed by [`reqwest`].
///
/// Every transport gets its own client, and with it its own cookie store.
#[derive(Default)]
pub struct HttpConnector {
    configure: Option<Configure>,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust the underlying client beyond what the binding dictates.
    ///
    /// Example: `HttpConnector::new().with_inner(|b| b.danger_accept_invalid_certs(true))`.
    pub fn with_inner(
        mut self,
        f: impl Fn(reqwest::ClientBuilder) -> reqwest::ClientBuilder + Send + Sync + 'static,
    ) -> Self {
        self.configure = Some(Box::new(f));
        self
    }
}

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn open(
        &self,
        endpoint: &Url,
        binding: &BindingConfiguration,
    ) -> impl Future<Output = anyhow::Result<Self::Transport>> + Send {
        let endpoint = endpoint.clone();
        let max_received_message_size = binding.max_received_message_size;
        let mut builder = reqwest::Client::builder().cookie_store(binding.allow_cookies);
        if let Some(configure) = self.configure.as_ref() {
            builder = configure(builder);
        }
        let client = builder.build().context("Could not build HTTP client");
        async move {
            let client = client?;
            debug!("Opened HTTP transport to {endpoint}");
            Ok(HttpTransport {
                client,
                endpoint,
                max_received_message_size,
            })
        }
    }
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    max_received_message_size: u64,
}

impl Transport for HttpTransport {
    fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn send(
        &self,
        content_type: String,
        envelope: String,
    ) -> impl Future<Output = anyhow::Result<Reply>> + Send {
        async move {
            let response = self
                .client
                .post(self.endpoint.clone())
                .header(CONTENT_TYPE, content_type)
                .body(envelope)
                .send()
                .await?;
            let status = response.status();
            if let Some(length) = response.content_length() {
                if length > self.max_received_message_size {
                    bail!(
                        "Reply of {length} bytes exceeds the limit of {} bytes",
                        self.max_received_message_size
                    );
                }
            }
            let text = response.text().await.context(status)?;
            if text.len() as u64 > self.max_received_message_size {
                bail!(
                    "Reply exceeds the limit of {} bytes",
                    self.max_received_message_size
                );
            }
            Ok(Reply { status, text })
        }
    }
}
