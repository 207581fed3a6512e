//! The [imaging service].
//!
//! [imaging service]: https://www.onvif.org/ver20/imaging/wsdl/imaging.wsdl
use crate::services::{service_client, ServiceKind};

pub const NAMESPACE: &str = "http://www.onvif.org/ver20/imaging/wsdl";

service_client!(
    /// A client for the imaging service.
    ImagingClient,
    ServiceKind::Imaging
);
