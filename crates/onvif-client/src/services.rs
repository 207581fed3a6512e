//! Typed clients for the logical services of a device.
pub mod device;
pub mod imaging;
pub mod media;
pub mod ptz;

use std::fmt::{Display, Formatter};

use url::Url;

use crate::{
    channel::Channel,
    error::CallError,
    services::{
        device::{CapabilityCategory, DeviceClient},
        imaging::ImagingClient,
        media::MediaClient,
        ptz::PtzClient,
    },
    soap::{SimpleRequest, SoapRequest},
    transport::{HttpTransport, Transport},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ServiceKind {
    Device,
    Media,
    Ptz,
    Imaging,
}

impl ServiceKind {
    pub const ALL: [ServiceKind; 4] = [
        ServiceKind::Device,
        ServiceKind::Media,
        ServiceKind::Ptz,
        ServiceKind::Imaging,
    ];

    /// The capability category under which the device advertises this service.
    pub const fn category(self) -> CapabilityCategory {
        match self {
            ServiceKind::Device => CapabilityCategory::Device,
            ServiceKind::Media => CapabilityCategory::Media,
            ServiceKind::Ptz => CapabilityCategory::Ptz,
            ServiceKind::Imaging => CapabilityCategory::Imaging,
        }
    }

    pub const fn namespace(self) -> &'static str {
        match self {
            ServiceKind::Device => device::NAMESPACE,
            ServiceKind::Media => media::NAMESPACE,
            ServiceKind::Ptz => ptz::NAMESPACE,
            ServiceKind::Imaging => imaging::NAMESPACE,
        }
    }
}

impl Display for ServiceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.pad(self.category().as_str())
    }
}

/// Fetch the service capabilities of any service as a raw envelope.
pub fn get_service_capabilities(kind: ServiceKind) -> SimpleRequest<String> {
    SimpleRequest::new(kind.namespace(), "GetServiceCapabilities")
}

/// Define a client type that wraps a [`Channel`] for one service.
macro_rules! service_client {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        pub struct $name<T = $crate::transport::HttpTransport> {
            channel: $crate::channel::Channel<T>,
        }

        impl<T> $name<T>
        where
            T: $crate::transport::Transport,
        {
            pub const KIND: $crate::services::ServiceKind = $kind;

            pub fn from_channel(channel: $crate::channel::Channel<T>) -> Self {
                Self { channel }
            }

            pub fn channel(&self) -> &$crate::channel::Channel<T> {
                &self.channel
            }

            pub fn into_channel(self) -> $crate::channel::Channel<T> {
                self.channel
            }

            pub fn endpoint(&self) -> &url::Url {
                self.channel.endpoint()
            }

            pub async fn invoke<R>(
                &self,
                request: &R,
            ) -> Result<R::Response, $crate::error::CallError>
            where
                R: $crate::soap::SoapRequest,
            {
                self.channel.invoke(request).await
            }

            pub async fn get_service_capabilities(
                &self,
            ) -> Result<String, $crate::error::CallError> {
                self.invoke(&$crate::services::get_service_capabilities(Self::KIND))
                    .await
            }

            pub fn close(self) {
                self.channel.close()
            }
        }
    };
}

pub(crate) use service_client;

/// A client for any one of the services.
pub enum ServiceClient<T = HttpTransport> {
    Device(DeviceClient<T>),
    Media(MediaClient<T>),
    Ptz(PtzClient<T>),
    Imaging(ImagingClient<T>),
}

impl<T> ServiceClient<T>
where
    T: Transport,
{
    pub fn from_channel(kind: ServiceKind, channel: Channel<T>) -> Self {
        match kind {
            ServiceKind::Device => Self::Device(DeviceClient::from_channel(channel)),
            ServiceKind::Media => Self::Media(MediaClient::from_channel(channel)),
            ServiceKind::Ptz => Self::Ptz(PtzClient::from_channel(channel)),
            ServiceKind::Imaging => Self::Imaging(ImagingClient::from_channel(channel)),
        }
    }

    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Device(_) => ServiceKind::Device,
            Self::Media(_) => ServiceKind::Media,
            Self::Ptz(_) => ServiceKind::Ptz,
            Self::Imaging(_) => ServiceKind::Imaging,
        }
    }

    pub fn channel(&self) -> &Channel<T> {
        match self {
            Self::Device(c) => c.channel(),
            Self::Media(c) => c.channel(),
            Self::Ptz(c) => c.channel(),
            Self::Imaging(c) => c.channel(),
        }
    }

    pub fn endpoint(&self) -> &Url {
        self.channel().endpoint()
    }

    pub async fn invoke<R>(&self, request: &R) -> Result<R::Response, CallError>
    where
        R: SoapRequest,
    {
        self.channel().invoke(request).await
    }

    pub fn close(self) {
        match self {
            Self::Device(c) => c.close(),
            Self::Media(c) => c.close(),
            Self::Ptz(c) => c.close(),
            Self::Imaging(c) => c.close(),
        }
    }
}
