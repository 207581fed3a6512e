//! Turning an address and credentials into ready, authenticated clients.
//!
//! Every flow builds its own binding, header injector and transport, so flows can run
//! concurrently without sharing anything. Within a flow the order is fixed: the device client
//! must pass its connectivity probe before any capability is looked up, and a dependent client is
//! only opened at an address the device advertised in that same flow.
use anyhow::anyhow;
use log::debug;
use url::Url;

use crate::{
    binding::build_binding,
    channel::{Channel, RequestTransform, Timeouts},
    error::BootstrapError,
    security::{Credentials, HeaderStyle, NoncePolicy, UsernameTokenInjector},
    services::{
        device::DeviceClient, imaging::ImagingClient, media::MediaClient, ptz::PtzClient,
        ServiceClient, ServiceKind,
    },
    transport::{Connector, Transport},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootstrapOptions {
    pub timeouts: Timeouts,
    pub nonce: NoncePolicy,
    pub header_style: HeaderStyle,
}

/// The conventional device service address of `host`, which may include a port.
///
/// Anything beyond a host and port, such as a path or user info, is rejected.
pub fn device_service_url(host: &str) -> Result<Url, BootstrapError> {
    let address = format!("http://{host}/onvif/device_service");
    // Special schemes skip surplus slashes, so an empty host would otherwise parse.
    let parsed = match host.trim() {
        "" => Err(url::ParseError::EmptyHost),
        _ => Url::parse(&address).and_then(|url| match is_authority_of(host, &url) {
            true => Ok(url),
            false => Err(url::ParseError::InvalidDomainCharacter),
        }),
    };
    parsed.map_err(|source| BootstrapError::EndpointResolution {
        service: ServiceKind::Device,
        address,
        source,
    })
}

fn is_authority_of(host: &str, url: &Url) -> bool {
    let Some(name) = url.host_str() else {
        return false;
    };
    let mut authorities = vec![name.to_string()];
    if let Some(port) = url.port_or_known_default() {
        authorities.push(format!("{name}:{port}"));
    }
    authorities.iter().any(|a| a.eq_ignore_ascii_case(host))
}

async fn open_channel<C>(
    connector: &C,
    service: ServiceKind,
    endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<Channel<C::Transport>, BootstrapError>
where
    C: Connector,
{
    let binding = build_binding();
    if !binding.transport.accepts(endpoint) {
        return Err(BootstrapError::Binding {
            service,
            endpoint: endpoint.to_string(),
            source: anyhow!(
                "scheme {:?} is not supported by the {:?} transport",
                endpoint.scheme(),
                binding.transport
            ),
        });
    }
    let injector = UsernameTokenInjector::new(credentials.clone(), options.nonce)
        .with_style(options.header_style);
    let transforms: Vec<Box<dyn RequestTransform>> = vec![Box::new(injector)];
    debug!("Opening {service} channel at {endpoint}");
    Channel::open(connector, endpoint, binding, transforms, options.timeouts)
        .await
        .map_err(|source| BootstrapError::Open {
            service,
            endpoint: endpoint.to_string(),
            source,
        })
}

/// Open a client for `service` at a known address.
///
/// No capability lookup and no probe beyond opening the transport is done.
pub async fn open_service_client<C>(
    connector: &C,
    service: ServiceKind,
    endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<ServiceClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    let channel = open_channel(connector, service, endpoint, credentials, options).await?;
    Ok(ServiceClient::from_channel(service, channel))
}

/// Open a device client and make sure it is reachable and accepts the credentials.
pub async fn bootstrap_device_client<C>(
    connector: &C,
    endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<DeviceClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    let service = ServiceKind::Device;
    let device = DeviceClient::from_channel(
        open_channel(connector, service, endpoint, credentials, options).await?,
    );
    match device.get_system_date_and_time().await {
        Ok(time) => {
            debug!("Device at {endpoint} is ready, its clock reads {:?}", time.utc);
            Ok(device)
        }
        Err(source) => {
            device.close();
            Err(BootstrapError::Probe {
                service,
                endpoint: endpoint.to_string(),
                source,
            })
        }
    }
}

/// Look up the address at which the device serves `service`.
pub async fn resolve_service_endpoint<T>(
    device: &DeviceClient<T>,
    service: ServiceKind,
) -> Result<Url, BootstrapError>
where
    T: Transport,
{
    if service == ServiceKind::Device {
        return Ok(device.endpoint().clone());
    }
    let category = service.category();
    let capabilities = device
        .get_capabilities(category)
        .await
        .map_err(|source| BootstrapError::CapabilityLookup { service, source })?;
    let Some(address) = capabilities.xaddr(category) else {
        return Err(BootstrapError::CapabilityMissing { service });
    };
    debug!("Device advertises {service} at {address}");
    Url::parse(address).map_err(|source| BootstrapError::EndpointResolution {
        service,
        address: address.to_string(),
        source,
    })
}

async fn bootstrap_dependent_channel<C>(
    connector: &C,
    device_endpoint: &Url,
    credentials: &Credentials,
    service: ServiceKind,
    options: &BootstrapOptions,
) -> Result<Channel<C::Transport>, BootstrapError>
where
    C: Connector,
{
    let device = bootstrap_device_client(connector, device_endpoint, credentials, options).await?;
    let endpoint = resolve_service_endpoint(&device, service).await;
    device.close();
    open_channel(connector, service, &endpoint?, credentials, options).await
}

/// Create a client for `service` using the device at `device_endpoint` to find it.
///
/// A fresh device client is bootstrapped for every call; nothing is cached between calls.
pub async fn bootstrap_dependent_client<C>(
    connector: &C,
    device_endpoint: &Url,
    credentials: &Credentials,
    service: ServiceKind,
    options: &BootstrapOptions,
) -> Result<ServiceClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    if service == ServiceKind::Device {
        let device =
            bootstrap_device_client(connector, device_endpoint, credentials, options).await?;
        return Ok(ServiceClient::Device(device));
    }
    let channel =
        bootstrap_dependent_channel(connector, device_endpoint, credentials, service, options)
            .await?;
    Ok(ServiceClient::from_channel(service, channel))
}

pub async fn bootstrap_media_client<C>(
    connector: &C,
    device_endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<MediaClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    bootstrap_dependent_channel(
        connector,
        device_endpoint,
        credentials,
        ServiceKind::Media,
        options,
    )
    .await
    .map(MediaClient::from_channel)
}

pub async fn bootstrap_ptz_client<C>(
    connector: &C,
    device_endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<PtzClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    bootstrap_dependent_channel(
        connector,
        device_endpoint,
        credentials,
        ServiceKind::Ptz,
        options,
    )
    .await
    .map(PtzClient::from_channel)
}

pub async fn bootstrap_imaging_client<C>(
    connector: &C,
    device_endpoint: &Url,
    credentials: &Credentials,
    options: &BootstrapOptions,
) -> Result<ImagingClient<C::Transport>, BootstrapError>
where
    C: Connector,
{
    bootstrap_dependent_channel(
        connector,
        device_endpoint,
        credentials,
        ServiceKind::Imaging,
        options,
    )
    .await
    .map(ImagingClient::from_channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Step;

    #[test]
    fn host_maps_to_conventional_device_service() {
        assert_eq!(
            device_service_url("192.168.0.90").unwrap().as_str(),
            "http://192.168.0.90/onvif/device_service"
        );
        assert_eq!(
            device_service_url("cam.local:8080").unwrap().as_str(),
            "http://cam.local:8080/onvif/device_service"
        );
    }

    #[test]
    fn host_may_carry_a_port_or_an_ipv6_address() {
        assert_eq!(
            device_service_url("Cam.Local:80").unwrap().as_str(),
            "http://cam.local/onvif/device_service"
        );
        assert_eq!(
            device_service_url("[fe80::1]:8000").unwrap().as_str(),
            "http://[fe80::1]:8000/onvif/device_service"
        );
    }

    #[test]
    fn host_with_more_than_an_authority_is_rejected() {
        for host in ["cam/x", "cam:8080/x", "user@cam", "cam?q=1", "cam#frag", " cam"] {
            let error = device_service_url(host).unwrap_err();
            assert_eq!(error.step(), Step::EndpointResolution, "{host}");
        }
    }

    #[test]
    fn empty_host_fails_endpoint_resolution() {
        let error = device_service_url("").unwrap_err();
        assert_eq!(error.step(), Step::EndpointResolution);
        assert_eq!(error.service(), ServiceKind::Device);
    }
}
