//! WS-Security `UsernameToken` authentication for outgoing requests.
//!
//! Every request gets a freshly built header and `Created` is the moment the message is sent.
use std::fmt::{Debug, Formatter};

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Utc};
use quick_xml::escape::escape;
use rand::RngCore;

use crate::{channel::RequestTransform, soap::Message};

pub const SECEXT_NAMESPACE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const UTILITY_NAMESPACE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";
pub const PASSWORD_TEXT: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText";
pub const BASE64_BINARY: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary";

const CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// What to put in the `Nonce` element.
///
/// Devices in the field have been observed to accept the token with an empty nonce, and that is
/// what is sent by default. `Random` improves replay resistance but should be verified against
/// the target device before relying on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NoncePolicy {
    #[default]
    Empty,
    /// 16 random bytes, base64 encoded, fresh for every message
    Random,
}

impl NoncePolicy {
    fn generate(self) -> anyhow::Result<String> {
        match self {
            NoncePolicy::Empty => Ok(String::new()),
            NoncePolicy::Random => {
                let mut bytes = [0u8; 16];
                rand::thread_rng()
                    .try_fill_bytes(&mut bytes)
                    .context("Could not generate nonce")?;
                Ok(STANDARD.encode(bytes))
            }
        }
    }
}

/// How the WS-Security namespaces are declared on the wire.
///
/// The two forms are not equivalent XML: under a default namespace the token and its children
/// are in the secext namespace, while with a prefix only `Security` is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HeaderStyle {
    /// `<wsse:Security xmlns:wsse="…">` and `<Created xmlns:wsu="…">`
    #[default]
    Prefixed,
    /// `<Security xmlns="…">` and `<Created xmlns="…">`, as sent by some existing clients
    DefaultNamespace,
}

/// A WS-Security header for exactly one message.
pub struct SecurityHeader<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub nonce: String,
    pub created: DateTime<Utc>,
}

impl SecurityHeader<'_> {
    pub fn to_xml(&self, style: HeaderStyle) -> String {
        let Self {
            username,
            password,
            nonce,
            created,
        } = self;
        let (security, declaration, created_declaration) = match style {
            HeaderStyle::Prefixed => ("wsse:Security", r#" xmlns:wsse=""#, r#" xmlns:wsu=""#),
            HeaderStyle::DefaultNamespace => ("Security", r#" xmlns=""#, r#" xmlns=""#),
        };
        let mut s = String::new();
        s.push('<');
        s.push_str(security);
        s.push_str(declaration);
        s.push_str(SECEXT_NAMESPACE);
        s.push_str(r#"">"#);
        s.push_str("<UsernameToken>");

        s.push_str("<Username>");
        s.push_str(&escape(*username));
        s.push_str("</Username>");

        s.push_str(r#"<Password Type=""#);
        s.push_str(PASSWORD_TEXT);
        s.push_str(r#"">"#);
        s.push_str(&escape(*password));
        s.push_str("</Password>");

        s.push_str(r#"<Nonce EncodingType=""#);
        s.push_str(BASE64_BINARY);
        s.push_str(r#"">"#);
        s.push_str(&escape(nonce.as_str()));
        s.push_str("</Nonce>");

        s.push_str("<Created");
        s.push_str(created_declaration);
        s.push_str(UTILITY_NAMESPACE);
        s.push_str(r#"">"#);
        s.push_str(&created.format(CREATED_FORMAT).to_string());
        s.push_str("</Created>");

        s.push_str("</UsernameToken>");
        s.push_str("</");
        s.push_str(security);
        s.push('>');
        s
    }
}

/// Signs every outgoing message with a `UsernameToken` header.
pub struct UsernameTokenInjector {
    credentials: Credentials,
    nonce: NoncePolicy,
    style: HeaderStyle,
    now: fn() -> DateTime<Utc>,
}

impl UsernameTokenInjector {
    pub fn new(credentials: Credentials, nonce: NoncePolicy) -> Self {
        Self {
            credentials,
            nonce,
            style: HeaderStyle::default(),
            now: Utc::now,
        }
    }

    pub fn with_style(mut self, style: HeaderStyle) -> Self {
        self.style = style;
        self
    }

    /// Replace the clock used for `Created`.
    pub fn with_clock(mut self, now: fn() -> DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn header(&self) -> anyhow::Result<String> {
        let Credentials { username, password } = &self.credentials;
        let header = SecurityHeader {
            username,
            password,
            nonce: self.nonce.generate()?,
            created: (self.now)(),
        };
        Ok(header.to_xml(self.style))
    }
}

impl RequestTransform for UsernameTokenInjector {
    fn before_send(&self, message: &mut Message) -> anyhow::Result<()> {
        let header = self.header()?;
        message.headers.insert(0, header);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use quick_xml::{events::Event, Reader};

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, h, m, s).unwrap()
    }

    /// Local names of elements and the unescaped text they contain, in document order.
    fn elements(xml: &str) -> Vec<(String, String)> {
        let mut result = Vec::new();
        crate::soap::visit_text(xml, |path, value| {
            result.push((path.last().unwrap().clone(), value.to_string()));
            Ok(())
        })
        .unwrap();
        result
    }

    fn start_tags(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut tags = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) => {
                    tags.push(String::from_utf8_lossy(e.name().as_ref()).into_owned())
                }
                Event::Eof => break,
                _ => {}
            }
        }
        tags
    }

    const PRETTY_PREFIXED_HEADER: &str = r#"
<wsse:Security xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
  <UsernameToken>
    <Username>admin</Username>
    <Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText">secret</Password>
    <Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary"></Nonce>
    <Created xmlns:wsu="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">2024-03-09T07:50:45Z</Created>
  </UsernameToken>
</wsse:Security>
"#;

    fn admin_header() -> SecurityHeader<'static> {
        SecurityHeader {
            username: "admin",
            password: "secret",
            nonce: String::new(),
            created: at(7, 50, 45),
        }
    }

    #[test]
    fn prefixed_header_matches_wire_format() {
        let expected: String = PRETTY_PREFIXED_HEADER.lines().map(str::trim).collect();
        assert_eq!(admin_header().to_xml(HeaderStyle::Prefixed), expected);
    }

    #[test]
    fn default_namespace_header_matches_wire_format() {
        assert_eq!(
            admin_header().to_xml(HeaderStyle::DefaultNamespace),
            concat!(
                r#"<Security xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">"#,
                "<UsernameToken>",
                "<Username>admin</Username>",
                r#"<Password Type="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-username-token-profile-1.0#PasswordText">secret</Password>"#,
                r#"<Nonce EncodingType="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-soap-message-security-1.0#Base64Binary"></Nonce>"#,
                r#"<Created xmlns="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd">2024-03-09T07:50:45Z</Created>"#,
                "</UsernameToken>",
                "</Security>",
            )
        );
    }

    #[test]
    fn special_characters_are_escaped() {
        for (style, root) in [
            (HeaderStyle::Prefixed, "wsse:Security"),
            (HeaderStyle::DefaultNamespace, "Security"),
        ] {
            for (username, password) in [
                ("", ""),
                ("a<b", "p&ss\"word'"),
                ("</Username><Injected>", "]]>&amp;"),
            ] {
                let xml = SecurityHeader {
                    username,
                    password,
                    nonce: String::new(),
                    created: at(0, 0, 0),
                }
                .to_xml(style);
                assert_eq!(
                    start_tags(&xml),
                    [root, "UsernameToken", "Username", "Password", "Nonce", "Created"]
                );
                let texts = elements(&xml);
                let find = |name: &str| {
                    texts
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| v.as_str())
                        .unwrap_or("")
                };
                assert_eq!(find("Username"), username);
                assert_eq!(find("Password"), password);
            }
        }
    }

    #[test]
    fn created_follows_the_clock_and_shape_does_not_change() {
        let early = SecurityHeader {
            username: "u",
            password: "p",
            nonce: String::new(),
            created: at(10, 0, 0),
        }
        .to_xml(HeaderStyle::Prefixed);
        let late = SecurityHeader {
            username: "u",
            password: "p",
            nonce: String::new(),
            created: at(10, 0, 1),
        }
        .to_xml(HeaderStyle::Prefixed);
        assert_ne!(early, late);
        assert_eq!(start_tags(&early), start_tags(&late));
        assert_eq!(
            early.replace("2024-03-09T10:00:00Z", ""),
            late.replace("2024-03-09T10:00:01Z", "")
        );
    }

    #[test]
    fn injector_inserts_header_first_and_leaves_body_alone() {
        let injector = UsernameTokenInjector::new(Credentials::new("u", "p"), NoncePolicy::Empty)
            .with_clock(|| Utc.with_ymd_and_hms(2001, 2, 3, 4, 5, 6).unwrap());
        let mut message = Message::new("urn:a", "<Body/>");
        message.headers.push("<Other/>".to_string());
        injector.before_send(&mut message).unwrap();

        assert_eq!(message.headers.len(), 2);
        assert!(message.headers[0].starts_with("<wsse:Security "));
        assert!(message.headers[0].contains("<Created xmlns:wsu="));
        assert!(message.headers[0].contains(">2001-02-03T04:05:06Z</Created>"));
        assert_eq!(message.headers[1], "<Other/>");
        assert_eq!(message.body, "<Body/>");
    }

    #[test]
    fn injector_uses_configured_style() {
        let injector = UsernameTokenInjector::new(Credentials::new("u", "p"), NoncePolicy::Empty);
        assert!(injector.header().unwrap().starts_with("<wsse:Security "));

        let injector = injector.with_style(HeaderStyle::DefaultNamespace);
        let header = injector.header().unwrap();
        assert!(header.starts_with("<Security xmlns="));
        assert!(header.ends_with("</Security>"));
    }

    #[test]
    fn injector_reads_clock_per_message() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static TICK: AtomicU32 = AtomicU32::new(0);
        fn ticking() -> DateTime<Utc> {
            let s = TICK.fetch_add(1, Ordering::SeqCst);
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, s).unwrap()
        }

        let injector =
            UsernameTokenInjector::new(Credentials::new("u", "p"), NoncePolicy::Empty)
                .with_clock(ticking);
        let first = injector.header().unwrap();
        let second = injector.header().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn empty_nonce_by_default() {
        assert_eq!(NoncePolicy::default(), NoncePolicy::Empty);
        let header = UsernameTokenInjector::new(Credentials::new("u", "p"), NoncePolicy::default())
            .header()
            .unwrap();
        assert!(header.contains("#Base64Binary\"></Nonce>"));
    }

    #[test]
    fn random_nonce_is_fresh_base64() {
        let first = NoncePolicy::Random.generate().unwrap();
        let second = NoncePolicy::Random.generate().unwrap();
        assert_ne!(first, second);
        assert_eq!(STANDARD.decode(&first).unwrap().len(), 16);
    }

    #[test]
    fn debug_hides_password() {
        let credentials = Credentials::new("admin", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("admin"));
        assert!(!debug.contains("hunter2"));
    }
}
