//! The wire configuration shared by every service channel.
//!
//! There is exactly one binding shape: SOAP 1.2 text envelopes over HTTP, without WS-Addressing,
//! with cookies propagated and no practical limit on message size.
use url::Url;

/// How the envelope is encoded on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageEncoding {
    /// UTF-8 XML text
    Text,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SoapVersion {
    Soap12,
}

impl SoapVersion {
    pub const fn envelope_namespace(self) -> &'static str {
        match self {
            SoapVersion::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
        }
    }

    const fn media_type(self) -> &'static str {
        match self {
            SoapVersion::Soap12 => "application/soap+xml",
        }
    }
}

/// Which WS-Addressing headers, if any, are added to requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddressingVersion {
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportKind {
    Http,
}

impl TransportKind {
    /// Whether an endpoint can be reached with this transport.
    pub fn accepts(self, endpoint: &Url) -> bool {
        match self {
            TransportKind::Http => matches!(endpoint.scheme(), "http" | "https"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingConfiguration {
    pub encoding: MessageEncoding,
    pub soap_version: SoapVersion,
    pub addressing: AddressingVersion,
    pub transport: TransportKind,
    pub allow_cookies: bool,
    pub max_received_message_size: u64,
    pub max_buffer_size: u64,
}

impl BindingConfiguration {
    /// The `Content-Type` header value for a request with the given SOAP action.
    ///
    /// Without WS-Addressing the action travels as a parameter of the SOAP 1.2 media type.
    pub fn content_type(&self, action: &str) -> String {
        let media_type = self.soap_version.media_type();
        match self.addressing {
            AddressingVersion::None if !action.is_empty() => {
                format!(r#"{media_type}; charset=utf-8; action="{action}""#)
            }
            AddressingVersion::None => format!("{media_type}; charset=utf-8"),
        }
    }
}

/// Build the binding used for every channel.
pub fn build_binding() -> BindingConfiguration {
    BindingConfiguration {
        encoding: MessageEncoding::Text,
        soap_version: SoapVersion::Soap12,
        addressing: AddressingVersion::None,
        transport: TransportKind::Http,
        allow_cookies: true,
        max_received_message_size: u64::MAX,
        max_buffer_size: u64::MAX,
    }
}
