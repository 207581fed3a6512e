use onvif_client::{
    apis, bootstrap_dependent_client, bootstrap_device_client, bootstrap_media_client,
    device::CapabilityCategory, device_service_url, BootstrapOptions, Credentials, HttpConnector,
    ServiceKind, Step,
};
use url::Url;

struct Target {
    connector: HttpConnector,
    endpoint: Url,
    credentials: Credentials,
}

fn test_target() -> Option<Target> {
    match onvif_dut::Device::from_env().unwrap() {
        Some(device) => Some(Target {
            connector: HttpConnector::new().with_inner(|b| b.danger_accept_invalid_certs(true)),
            endpoint: device
                .url
                .unwrap_or_else(|| device_service_url(&device.host).unwrap()),
            credentials: Credentials::new(device.username, device.password),
        }),
        None => {
            eprintln!("No device configured, skipping test.");
            None
        }
    }
}

#[tokio::test]
async fn device_client_reports_clock_and_capabilities() {
    let Some(target) = test_target() else {
        return;
    };
    let device = bootstrap_device_client(
        &target.connector,
        &target.endpoint,
        &target.credentials,
        &BootstrapOptions::default(),
    )
    .await
    .unwrap();

    let time = device.get_system_date_and_time().await.unwrap();
    assert!(time.utc.is_some());

    let capabilities = device
        .get_capabilities(CapabilityCategory::All)
        .await
        .unwrap();
    assert!(capabilities.xaddr(CapabilityCategory::Device).is_some());
    device.close();
}

#[tokio::test]
async fn media_client_lists_profiles() {
    let Some(target) = test_target() else {
        return;
    };
    let media = bootstrap_media_client(
        &target.connector,
        &target.endpoint,
        &target.credentials,
        &BootstrapOptions::default(),
    )
    .await
    .unwrap();

    let profiles = media.get_profiles().await.unwrap();
    assert!(!profiles.is_empty());
}

#[tokio::test]
async fn every_advertised_service_can_be_bootstrapped() {
    let Some(target) = test_target() else {
        return;
    };
    for kind in ServiceKind::ALL {
        match bootstrap_dependent_client(
            &target.connector,
            &target.endpoint,
            &target.credentials,
            kind,
            &BootstrapOptions::default(),
        )
        .await
        {
            Ok(client) => {
                client
                    .invoke(&apis::get_service_capabilities(kind))
                    .await
                    .unwrap();
                client.close();
            }
            // Not every device has PTZ or imaging.
            Err(e) if e.step() == Step::CapabilityMissing => {}
            Err(e) => panic!("Could not bootstrap {kind}: {e:?}"),
        }
    }
}

#[tokio::test]
async fn wrong_password_is_an_authentication_rejection() {
    let Some(target) = test_target() else {
        return;
    };
    let credentials = Credentials::new(target.credentials.username, "not the password");
    // The device clock is commonly readable without credentials, so go one step further.
    let error = bootstrap_media_client(
        &target.connector,
        &target.endpoint,
        &credentials,
        &BootstrapOptions::default(),
    )
    .await
    .map(|_| ())
    .unwrap_err();
    assert!(error.is_authentication_rejection(), "{error:?}");
}
