//! A SOAP channel bound to one endpoint.
//!
//! The channel owns its binding and an explicit list of [`RequestTransform`]s that every
//! outgoing message passes through, in order, before it is wrapped in an envelope and sent.
use std::{future::Future, time::Duration};

use anyhow::{anyhow, Context};
use log::{debug, trace, warn};
use reqwest::StatusCode;
use url::Url;

use crate::{
    binding::BindingConfiguration,
    error::CallError,
    soap::{parse_fault, Message, SoapRequest, SoapResponse},
    transport::{Connector, Reply, Transport},
};

/// Rewrites outgoing messages, e.g. to add headers.
///
/// An error aborts the call before anything is sent.
pub trait RequestTransform: Send + Sync {
    fn before_send(&self, message: &mut Message) -> anyhow::Result<()>;
}

/// Upper bounds for the suspension points of a channel.
///
/// `None` means waiting for as long as the transport does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeouts {
    pub open: Option<Duration>,
    pub call: Option<Duration>,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            open: Some(Duration::from_secs(10)),
            call: Some(Duration::from_secs(30)),
        }
    }
}

async fn within<F, T>(limit: Option<Duration>, future: F) -> Result<T, CallError>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let result = match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| CallError::Timeout(limit))?,
        None => future.await,
    };
    result.map_err(CallError::Transport)
}

fn from_reply<T>(reply: Reply) -> Result<T, CallError>
where
    T: SoapResponse,
{
    let Reply { status, text } = reply;
    let fault = match parse_fault(&text) {
        Ok(fault) => fault,
        Err(e) if status.is_success() => {
            return Err(CallError::Malformed(
                e.context(format!("status: {status}; text: {text}")),
            ))
        }
        // Error pages from web servers in front of the service are often not XML.
        Err(_) => None,
    };
    if let Some(fault) = fault {
        if status.is_success() {
            warn!("HTTP status {status} does not match SOAP fault");
        }
        if fault.is_authentication_failure() {
            return Err(CallError::Unauthorized(fault.to_string()));
        }
        return Err(CallError::Fault(fault));
    }
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(CallError::Unauthorized(format!("HTTP status {status}")));
    }
    if !status.is_success() {
        return Err(CallError::Transport(anyhow!(
            "HTTP status {status} without SOAP fault"
        )));
    }
    T::from_envelope(&text)
        .with_context(|| format!("Could not parse response; status: {status}; text: {text}"))
        .map_err(CallError::Malformed)
}

pub struct Channel<T> {
    transport: T,
    binding: BindingConfiguration,
    transforms: Vec<Box<dyn RequestTransform>>,
    timeouts: Timeouts,
}

impl<T> Channel<T>
where
    T: Transport,
{
    /// Open a channel to `endpoint`.
    ///
    /// The channel is only returned once the transport is open, so a failed open never leaves a
    /// usable channel behind.
    pub async fn open<C>(
        connector: &C,
        endpoint: &Url,
        binding: BindingConfiguration,
        transforms: Vec<Box<dyn RequestTransform>>,
        timeouts: Timeouts,
    ) -> Result<Self, CallError>
    where
        C: Connector<Transport = T>,
    {
        let transport = within(timeouts.open, connector.open(endpoint, &binding)).await?;
        Ok(Self {
            transport,
            binding,
            transforms,
            timeouts,
        })
    }

    pub fn endpoint(&self) -> &Url {
        self.transport.endpoint()
    }

    pub fn binding(&self) -> &BindingConfiguration {
        &self.binding
    }

    pub async fn invoke<R>(&self, request: &R) -> Result<R::Response, CallError>
    where
        R: SoapRequest,
    {
        let body = request.to_body().map_err(CallError::Encode)?;
        let mut message = Message::new(request.action(), body);
        for transform in &self.transforms {
            transform
                .before_send(&mut message)
                .map_err(CallError::Transform)?;
        }
        if cfg!(debug_assertions) {
            // Headers are left out since they carry credentials.
            trace!("Sending {} to {}: {}", message.action, self.endpoint(), message.body);
        }
        let content_type = self.binding.content_type(&message.action);
        let envelope = message.to_envelope(self.binding.soap_version);
        let reply = within(self.timeouts.call, self.transport.send(content_type, envelope)).await?;
        if cfg!(debug_assertions) {
            trace!("Received {}: {}", reply.status, reply.text);
        }
        from_reply(reply)
    }

    pub fn close(self) {
        debug!("Closing channel to {}", self.endpoint());
        self.transport.close();
    }
}
