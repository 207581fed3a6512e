//! A client for ONVIF devices.
//!
//! Clients are created with the functions in [`bootstrap`], e.g.
//!
//! ```no_run
//! # async fn example() -> Result<(), onvif_client::BootstrapError> {
//! use onvif_client::{
//!     bootstrap_media_client, device_service_url, BootstrapOptions, Credentials, HttpConnector,
//! };
//!
//! let endpoint = device_service_url("192.168.0.90")?;
//! let credentials = Credentials::new("admin", "pass");
//! let media = bootstrap_media_client(
//!     &HttpConnector::new(),
//!     &endpoint,
//!     &credentials,
//!     &BootstrapOptions::default(),
//! )
//! .await?;
//! println!("Media service at {}", media.endpoint());
//! # Ok(())
//! # }
//! ```
pub mod apis;
pub mod binding;
pub mod bootstrap;
pub mod channel;
mod error;
pub mod security;
mod services;
pub mod soap;
pub mod transport;

pub use binding::{build_binding, BindingConfiguration};
pub use bootstrap::{
    bootstrap_dependent_client, bootstrap_device_client, bootstrap_imaging_client,
    bootstrap_media_client, bootstrap_ptz_client, device_service_url, open_service_client,
    resolve_service_endpoint, BootstrapOptions,
};
pub use channel::{Channel, RequestTransform, Timeouts};
pub use error::{BootstrapError, CallError, Step};
pub use security::{Credentials, HeaderStyle, NoncePolicy, UsernameTokenInjector};
pub use services::{device, imaging, media, ptz, ServiceClient, ServiceKind};
pub use transport::{Connector, HttpConnector, HttpTransport, Reply, Transport};
