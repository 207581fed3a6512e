use std::time::Duration;

use thiserror::Error;

use crate::{services::ServiceKind, soap::Fault};

/// Why a single operation call failed.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("could not encode request")]
    Encode(#[source] anyhow::Error),
    /// A request transform failed; the message was not sent.
    #[error("could not prepare request headers")]
    Transform(#[source] anyhow::Error),
    #[error("transport failure")]
    Transport(#[source] anyhow::Error),
    #[error("no reply within {0:?}")]
    Timeout(Duration),
    /// The device did not accept the credentials or the security header carrying them.
    #[error("device rejected the request as unauthorized ({0})")]
    Unauthorized(String),
    #[error("device returned fault {0}")]
    Fault(Fault),
    #[error("malformed response")]
    Malformed(#[source] anyhow::Error),
}

/// The step of a bootstrap at which it failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Binding,
    Open,
    Probe,
    CapabilityLookup,
    CapabilityMissing,
    EndpointResolution,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("the {service} endpoint {endpoint} cannot be used with the binding")]
    Binding {
        service: ServiceKind,
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("could not open the {service} channel at {endpoint}")]
    Open {
        service: ServiceKind,
        endpoint: String,
        #[source]
        source: CallError,
    },
    #[error("the {service} service at {endpoint} failed the connectivity probe")]
    Probe {
        service: ServiceKind,
        endpoint: String,
        #[source]
        source: CallError,
    },
    #[error("could not look up the address of the {service} service")]
    CapabilityLookup {
        service: ServiceKind,
        #[source]
        source: CallError,
    },
    #[error("the device does not advertise an address for the {service} service")]
    CapabilityMissing { service: ServiceKind },
    #[error("the {service} service address {address:?} is not a valid URL")]
    EndpointResolution {
        service: ServiceKind,
        address: String,
        #[source]
        source: url::ParseError,
    },
}

impl BootstrapError {
    pub fn step(&self) -> Step {
        match self {
            Self::Binding { .. } => Step::Binding,
            Self::Open { .. } => Step::Open,
            Self::Probe { .. } => Step::Probe,
            Self::CapabilityLookup { .. } => Step::CapabilityLookup,
            Self::CapabilityMissing { .. } => Step::CapabilityMissing,
            Self::EndpointResolution { .. } => Step::EndpointResolution,
        }
    }

    /// The service whose client was being created.
    pub fn service(&self) -> ServiceKind {
        match self {
            Self::Binding { service, .. }
            | Self::Open { service, .. }
            | Self::Probe { service, .. }
            | Self::CapabilityLookup { service, .. }
            | Self::CapabilityMissing { service }
            | Self::EndpointResolution { service, .. } => *service,
        }
    }

    /// Whether the device was reached but refused the credentials.
    ///
    /// Lets callers tell a wrong password or a skewed clock apart from an unreachable host.
    pub fn is_authentication_rejection(&self) -> bool {
        match self {
            Self::Open { source, .. }
            | Self::Probe { source, .. }
            | Self::CapabilityLookup { source, .. } => {
                matches!(source, CallError::Unauthorized(_))
            }
            _ => false,
        }
    }
}
