//! The [media service].
//!
//! [media service]: https://www.onvif.org/ver10/media/wsdl/media.wsdl
use serde::Deserialize;

use crate::{
    error::CallError,
    services::{service_client, ServiceKind},
    soap::{parse_soap, SimpleRequest, SoapResponse},
    transport::Transport,
};

pub const NAMESPACE: &str = "http://www.onvif.org/ver10/media/wsdl";

/// The identifying parts of a media profile.
///
/// Configurations in the profile carry names of their own; only the profile's is kept.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Profile {
    #[serde(rename = "@token")]
    pub token: String,
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "@fixed", default)]
    pub fixed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Profiles {
    #[serde(default)]
    pub profiles: Vec<Profile>,
}

impl SoapResponse for Profiles {
    fn from_envelope(text: &str) -> anyhow::Result<Self> {
        parse_soap(text)
    }
}

pub fn get_profiles() -> SimpleRequest<Profiles> {
    SimpleRequest::new(NAMESPACE, "GetProfiles")
}

service_client!(
    /// A client for the media service.
    MediaClient,
    ServiceKind::Media
);

impl<T> MediaClient<T>
where
    T: Transport,
{
    pub async fn get_profiles(&self) -> Result<Vec<Profile>, CallError> {
        Ok(self.invoke(&get_profiles()).await?.profiles)
    }
}
