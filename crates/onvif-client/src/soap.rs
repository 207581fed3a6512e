//! Utilities for working with SOAP style APIs.
use std::{
    fmt::{Display, Formatter},
    marker::PhantomData,
};

use anyhow::Context;
use quick_xml::{events::Event, Reader};
use serde::{de::DeserializeOwned, Deserialize};

use crate::binding::SoapVersion;

/// Local names of fault codes that mean the device did not accept our credentials.
///
/// Covers the ONVIF `ter:NotAuthorized` subcode and the WS-Security fault codes, including the
/// ones devices send when `Created` falls outside their tolerance window.
const AUTHENTICATION_FAULTS: &[&str] = &[
    "NotAuthorized",
    "FailedAuthentication",
    "FailedCheck",
    "InvalidSecurity",
    "InvalidSecurityToken",
    "MessageExpired",
    "SecurityTokenUnavailable",
];

/// A request as seen by [`crate::channel::RequestTransform`]s just before it is sent.
#[derive(Clone, Debug)]
pub struct Message {
    pub action: String,
    /// Serialized SOAP header blocks, in order.
    pub headers: Vec<String>,
    /// Serialized content of the SOAP body.
    pub body: String,
}

impl Message {
    pub fn new(action: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn to_envelope(&self, version: SoapVersion) -> String {
        let Self { headers, body, .. } = self;
        let mut s = String::new();
        s.push_str(r#"<s:Envelope xmlns:s=""#);
        s.push_str(version.envelope_namespace());
        s.push_str(r#"">"#);
        if !headers.is_empty() {
            s.push_str("<s:Header>");
            for header in headers {
                s.push_str(header);
            }
            s.push_str("</s:Header>");
        }
        s.push_str("<s:Body>");
        s.push_str(body);
        s.push_str("</s:Body>");
        s.push_str("</s:Envelope>");
        s
    }
}

/// The body of a request to a single operation.
#[derive(Clone, Debug)]
pub struct Body {
    namespace: String,
    method: String,
    params: Option<String>,
}

impl Body {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            method: method.into(),
            params: None,
        }
    }

    /// Set the serialized child elements of the operation element.
    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    pub fn action(&self) -> String {
        format!("{}/{}", self.namespace, self.method)
    }

    pub fn build(&self) -> String {
        let mut s = String::new();
        s.push('<');
        s.push_str(&self.method);
        s.push_str(r#" xmlns=""#);
        s.push_str(&self.namespace);
        if let Some(params) = self.params.as_deref() {
            s.push_str(r#"">"#);
            s.push_str(params);
            s.push_str(r#"</"#);
            s.push_str(&self.method);
            s.push('>');
        } else {
            s.push_str(r#""/>"#);
        }
        s
    }
}

pub trait SoapRequest {
    type Response: SoapResponse;

    fn action(&self) -> String;

    fn to_body(&self) -> anyhow::Result<String>;
}

pub trait SoapResponse: Sized {
    fn from_envelope(text: &str) -> anyhow::Result<Self>;
}

/// The raw response envelope.
impl SoapResponse for String {
    fn from_envelope(text: &str) -> anyhow::Result<Self> {
        Ok(text.to_string())
    }
}

/// Any non-fault response.
impl SoapResponse for () {
    fn from_envelope(_: &str) -> anyhow::Result<Self> {
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Envelope<T> {
    body: EnvelopeBody<T>,
}

#[derive(Deserialize)]
struct EnvelopeBody<T> {
    #[serde(rename = "$value")]
    inner: T,
}

/// Deserialize the element in the body of a response envelope.
pub fn parse_soap<T>(text: &str) -> anyhow::Result<T>
where
    T: DeserializeOwned,
{
    let Envelope {
        body: EnvelopeBody { inner },
    } = quick_xml::de::from_str(text).context("Could not deserialize envelope")?;
    Ok(inner)
}

/// A request whose parameters, if any, are supplied pre-serialized.
pub struct SimpleRequest<T> {
    body: Body,
    _phantom: PhantomData<T>,
}

impl<T> SimpleRequest<T> {
    pub fn new(namespace: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            body: Body::new(namespace, method),
            _phantom: PhantomData,
        }
    }

    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.body = self.body.params(params);
        self
    }
}

impl<T> SoapRequest for SimpleRequest<T>
where
    T: SoapResponse,
{
    type Response = T;

    fn action(&self) -> String {
        self.body.action()
    }

    fn to_body(&self) -> anyhow::Result<String> {
        Ok(self.body.build())
    }
}

/// A SOAP fault returned by the device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub subcodes: Vec<String>,
    pub reason: String,
}

impl Fault {
    pub fn is_authentication_failure(&self) -> bool {
        std::iter::once(&self.code)
            .chain(self.subcodes.iter())
            .map(|c| strip_prefix(c))
            .any(|c| AUTHENTICATION_FAULTS.contains(&c))
    }
}

impl Display for Fault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let Self {
            code,
            subcodes,
            reason,
        } = self;
        write!(f, "{code}")?;
        for subcode in subcodes {
            write!(f, "/{subcode}")?;
        }
        if !reason.is_empty() {
            write!(f, ": {reason}")?;
        }
        Ok(())
    }
}

fn strip_prefix(qname: &str) -> &str {
    qname.split(':').next_back().unwrap_or(qname)
}

/// Call `f` with the path of local element names leading to every non-blank text node.
pub(crate) fn visit_text(
    text: &str,
    mut f: impl FnMut(&[String], &str) -> anyhow::Result<()>,
) -> anyhow::Result<()> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<String> = Vec::new();
    loop {
        match reader.read_event().context("Could not parse XML")? {
            Event::Start(e) => {
                stack.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::End(_) => {
                stack.pop();
            }
            Event::Text(e) => {
                let value = e.unescape().context("Could not unescape text")?;
                let value = value.trim();
                if !value.is_empty() {
                    f(&stack, value)?;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

/// Extract the fault, if any, from a response envelope.
///
/// Understands both SOAP 1.2 (`Code`/`Subcode`/`Reason`) and SOAP 1.1 (`faultcode`/`faultstring`)
/// faults since some devices answer with the latter regardless of the request version.
pub fn parse_fault(text: &str) -> anyhow::Result<Option<Fault>> {
    let mut fault: Option<Fault> = None;
    visit_text(text, |path, value| {
        let Some(start) = path.iter().position(|n| n == "Fault") else {
            return Ok(());
        };
        let fault = fault.get_or_insert_with(Fault::default);
        let inner: Vec<&str> = path[start + 1..].iter().map(String::as_str).collect();
        match inner.as_slice() {
            ["Code", "Value"] | ["faultcode"] => fault.code = value.to_string(),
            ["Code", subcodes @ .., "Value"] if subcodes.iter().all(|s| *s == "Subcode") => {
                fault.subcodes.push(value.to_string())
            }
            ["Reason", "Text"] | ["faultstring"] if fault.reason.is_empty() => {
                fault.reason = value.to_string()
            }
            _ => {}
        }
        Ok(())
    })?;
    Ok(fault)
}
