//! The [PTZ service].
//!
//! [PTZ service]: https://www.onvif.org/ver20/ptz/wsdl/ptz.wsdl
use crate::services::{service_client, ServiceKind};

pub const NAMESPACE: &str = "http://www.onvif.org/ver20/ptz/wsdl";

service_client!(
    /// A client for the PTZ service.
    PtzClient,
    ServiceKind::Ptz
);
