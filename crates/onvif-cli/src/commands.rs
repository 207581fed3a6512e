pub mod capabilities;
pub mod check;
pub mod profiles;
pub mod store;
pub mod time;

use std::time::Duration;

use anyhow::Context;
use log::debug;
use onvif_client::{
    device_service_url, BootstrapOptions, Credentials, HeaderStyle, HttpConnector, NoncePolicy,
    Timeouts,
};
use onvif_dut::Device;
use url::Url;

/// How to reach the device and authenticate with it.
///
/// When neither a host nor a URL is given, the device stored by `onvif-dut` is used.
#[derive(Clone, Debug, clap::Args)]
pub struct Target {
    /// Host, optionally with a port, of the device.
    #[arg(long, env = "ONVIF_DEVICE_HOST", global = true)]
    host: Option<String>,
    /// Address of the device service; takes precedence over `--host`.
    #[arg(long, env = "ONVIF_DEVICE_URL", global = true)]
    url: Option<Url>,
    #[arg(long, env = "ONVIF_DEVICE_USER", global = true)]
    user: Option<String>,
    #[arg(long, env = "ONVIF_DEVICE_PASS", hide_env_values = true, global = true)]
    pass: Option<String>,
    /// Accept TLS certificates that cannot be verified.
    #[arg(long, global = true)]
    insecure: bool,
    /// Send a random nonce instead of an empty one.
    #[arg(long, global = true)]
    random_nonce: bool,
    /// Declare the security header namespaces as default namespaces instead of prefixes.
    #[arg(long, global = true)]
    default_namespace_header: bool,
    /// Seconds to wait for each call to the device.
    #[arg(long, default_value_t = 30, global = true)]
    timeout: u64,
}

/// Everything needed to bootstrap clients for one device.
pub struct Session {
    pub connector: HttpConnector,
    pub endpoint: Url,
    pub credentials: Credentials,
    pub options: BootstrapOptions,
}

/// Host and port of `url`, in the form accepted by `--host`.
fn authority(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

impl Target {
    /// The device named on the command line, completed from the stored device if none is.
    pub fn device(&self) -> anyhow::Result<Device> {
        let Self {
            host,
            url,
            user,
            pass,
            ..
        } = self;
        let host = match (host, url) {
            (Some(host), _) => host.clone(),
            (None, Some(url)) => authority(url).context("The device URL has no host")?,
            (None, None) => {
                let device =
                    Device::from_anywhere()?.context("No device given, pass --host or --url")?;
                debug!("Using stored device {}", device.host);
                return Ok(Device {
                    username: user.clone().unwrap_or(device.username),
                    password: pass.clone().unwrap_or(device.password),
                    ..device
                });
            }
        };
        Ok(Device {
            host,
            url: url.clone(),
            username: user.clone().context("No username given")?,
            password: pass.clone().context("No password given")?,
        })
    }

    pub fn resolve(self) -> anyhow::Result<Session> {
        let Device {
            host,
            url,
            username,
            password,
        } = self.device()?;
        let endpoint = match url {
            Some(url) => url,
            None => device_service_url(&host)?,
        };
        let credentials = Credentials::new(username, password);

        let mut connector = HttpConnector::new();
        if self.insecure {
            connector = connector.with_inner(|b| b.danger_accept_invalid_certs(true));
        }
        let options = BootstrapOptions {
            timeouts: Timeouts {
                call: Some(Duration::from_secs(self.timeout)),
                ..Default::default()
            },
            nonce: match self.random_nonce {
                true => NoncePolicy::Random,
                false => NoncePolicy::Empty,
            },
            header_style: match self.default_namespace_header {
                true => HeaderStyle::DefaultNamespace,
                false => HeaderStyle::Prefixed,
            },
        };
        Ok(Session {
            connector,
            endpoint,
            credentials,
            options,
        })
    }
}

/// Print rows as left aligned columns, the first row being the header.
pub(crate) fn print_table<const N: usize>(rows: &[[String; N]]) {
    let mut widths = [0; N];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }
    for row in rows {
        let line: Vec<_> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:width$}"))
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_keeps_the_port() {
        let url = Url::parse("http://[fe80::1]:8000/onvif/device_service").unwrap();
        assert_eq!(authority(&url).as_deref(), Some("[fe80::1]:8000"));
        let url = Url::parse("https://cam/onvif/device_service").unwrap();
        assert_eq!(authority(&url).as_deref(), Some("cam"));
    }
}
