//! The [device management service].
//!
//! Only the operations needed to bootstrap other clients are typed here.
//!
//! [device management service]: https://www.onvif.org/ver10/device/wsdl/devicemgmt.wsdl
use std::{collections::BTreeMap, str::FromStr};

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::{
    error::CallError,
    services::{service_client, ServiceKind},
    soap::{parse_soap, SimpleRequest, SoapResponse},
    transport::Transport,
};

pub const NAMESPACE: &str = "http://www.onvif.org/ver10/device/wsdl";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CapabilityCategory {
    All,
    Analytics,
    Device,
    Events,
    Imaging,
    Media,
    Ptz,
}

impl CapabilityCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            CapabilityCategory::All => "All",
            CapabilityCategory::Analytics => "Analytics",
            CapabilityCategory::Device => "Device",
            CapabilityCategory::Events => "Events",
            CapabilityCategory::Imaging => "Imaging",
            CapabilityCategory::Media => "Media",
            CapabilityCategory::Ptz => "PTZ",
        }
    }
}

impl FromStr for CapabilityCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "All" => CapabilityCategory::All,
            "Analytics" => CapabilityCategory::Analytics,
            "Device" => CapabilityCategory::Device,
            "Events" => CapabilityCategory::Events,
            "Imaging" => CapabilityCategory::Imaging,
            "Media" => CapabilityCategory::Media,
            "PTZ" => CapabilityCategory::Ptz,
            _ => bail!("Unknown capability category {s:?}"),
        })
    }
}

/// The service addresses advertised by a device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub xaddrs: BTreeMap<CapabilityCategory, String>,
}

impl Capabilities {
    /// The address of `category`, unless it is absent or blank.
    pub fn xaddr(&self, category: CapabilityCategory) -> Option<&str> {
        self.xaddrs
            .get(&category)
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetCapabilitiesResponse {
    capabilities: CapabilitySet,
}

// Categories devices add beyond these, and `Extension`, are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CapabilitySet {
    analytics: Option<ServiceCapability>,
    device: Option<ServiceCapability>,
    events: Option<ServiceCapability>,
    imaging: Option<ServiceCapability>,
    media: Option<ServiceCapability>,
    #[serde(rename = "PTZ")]
    ptz: Option<ServiceCapability>,
}

#[derive(Debug, Deserialize)]
struct ServiceCapability {
    #[serde(rename = "XAddr", default)]
    xaddr: String,
}

impl From<CapabilitySet> for Capabilities {
    fn from(set: CapabilitySet) -> Self {
        let CapabilitySet {
            analytics,
            device,
            events,
            imaging,
            media,
            ptz,
        } = set;
        let xaddrs = [
            (CapabilityCategory::Analytics, analytics),
            (CapabilityCategory::Device, device),
            (CapabilityCategory::Events, events),
            (CapabilityCategory::Imaging, imaging),
            (CapabilityCategory::Media, media),
            (CapabilityCategory::Ptz, ptz),
        ]
        .into_iter()
        .filter_map(|(category, service)| Some((category, service?.xaddr)))
        .collect();
        Self { xaddrs }
    }
}

impl SoapResponse for Capabilities {
    fn from_envelope(text: &str) -> anyhow::Result<Self> {
        let GetCapabilitiesResponse { capabilities } = parse_soap(text)?;
        Ok(capabilities.into())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SystemDateAndTime {
    pub date_time_type: Option<String>,
    pub daylight_savings: Option<bool>,
    pub time_zone: Option<String>,
    pub utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSystemDateAndTimeResponse {
    system_date_and_time: SystemDateAndTimeData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SystemDateAndTimeData {
    date_time_type: Option<String>,
    daylight_savings: Option<bool>,
    time_zone: Option<TimeZone>,
    #[serde(rename = "UTCDateTime")]
    utc_date_time: Option<DateTimeData>,
}

#[derive(Debug, Deserialize)]
struct TimeZone {
    #[serde(rename = "TZ")]
    tz: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DateTimeData {
    date: DateData,
    time: TimeData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DateData {
    year: i32,
    month: u32,
    day: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TimeData {
    hour: u32,
    minute: u32,
    second: u32,
}

impl DateTimeData {
    fn into_utc(self) -> anyhow::Result<DateTime<Utc>> {
        let Self {
            date: DateData { year, month, day },
            time: TimeData {
                hour,
                minute,
                second,
            },
        } = self;
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, minute, second))
            .map(|d| d.and_utc())
            .with_context(|| {
                format!("Invalid UTCDateTime {year}-{month}-{day} {hour}:{minute}:{second}")
            })
    }
}

impl SoapResponse for SystemDateAndTime {
    fn from_envelope(text: &str) -> anyhow::Result<Self> {
        let GetSystemDateAndTimeResponse {
            system_date_and_time:
                SystemDateAndTimeData {
                    date_time_type,
                    daylight_savings,
                    time_zone,
                    utc_date_time,
                },
        } = parse_soap(text)?;
        Ok(Self {
            date_time_type,
            daylight_savings,
            time_zone: time_zone.map(|z| z.tz),
            utc: utc_date_time.map(DateTimeData::into_utc).transpose()?,
        })
    }
}

/// Read the device clock; cheap and free of side effects, which makes it a good probe.
pub fn get_system_date_and_time() -> SimpleRequest<SystemDateAndTime> {
    SimpleRequest::new(NAMESPACE, "GetSystemDateAndTime")
}

pub fn get_capabilities(category: CapabilityCategory) -> SimpleRequest<Capabilities> {
    SimpleRequest::new(NAMESPACE, "GetCapabilities").params(format!(
        "<Category>{}</Category>",
        category.as_str()
    ))
}

service_client!(
    /// A client for the device management service.
    DeviceClient,
    ServiceKind::Device
);

impl<T> DeviceClient<T>
where
    T: Transport,
{
    pub async fn get_system_date_and_time(&self) -> Result<SystemDateAndTime, CallError> {
        self.invoke(&get_system_date_and_time()).await
    }

    pub async fn get_capabilities(
        &self,
        category: CapabilityCategory,
    ) -> Result<Capabilities, CallError> {
        self.invoke(&get_capabilities(category)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_names_round_trip() {
        for category in [
            CapabilityCategory::All,
            CapabilityCategory::Analytics,
            CapabilityCategory::Device,
            CapabilityCategory::Events,
            CapabilityCategory::Imaging,
            CapabilityCategory::Media,
            CapabilityCategory::Ptz,
        ] {
            assert_eq!(category.as_str().parse::<CapabilityCategory>().unwrap(), category);
        }
        "Ptz".parse::<CapabilityCategory>().unwrap_err();
    }

    #[test]
    fn blank_xaddr_counts_as_missing() {
        let mut capabilities = Capabilities::default();
        capabilities
            .xaddrs
            .insert(CapabilityCategory::Ptz, "  ".to_string());
        capabilities.xaddrs.insert(
            CapabilityCategory::Media,
            "http://cam/onvif/media".to_string(),
        );
        assert_eq!(capabilities.xaddr(CapabilityCategory::Ptz), None);
        assert_eq!(capabilities.xaddr(CapabilityCategory::Imaging), None);
        assert_eq!(
            capabilities.xaddr(CapabilityCategory::Media),
            Some("http://cam/onvif/media")
        );
    }

    #[test]
    fn nested_xaddrs_are_ignored() {
        let text = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><GetCapabilitiesResponse><Capabilities><Extension><DeviceIO><XAddr>http://cam/io</XAddr></DeviceIO></Extension><Media><XAddr>http://cam/media</XAddr></Media></Capabilities></GetCapabilitiesResponse></s:Body></s:Envelope>"#;
        let capabilities = Capabilities::from_envelope(text).unwrap();
        assert_eq!(capabilities.xaddrs.len(), 1);
        assert_eq!(
            capabilities.xaddr(CapabilityCategory::Media),
            Some("http://cam/media")
        );
    }

    #[test]
    fn incomplete_utc_is_an_error() {
        let text = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><GetSystemDateAndTimeResponse><SystemDateAndTime><UTCDateTime><Date><Year>2024</Year></Date></UTCDateTime></SystemDateAndTime></GetSystemDateAndTimeResponse></s:Body></s:Envelope>"#;
        SystemDateAndTime::from_envelope(text).unwrap_err();
    }

    #[test]
    fn response_without_system_date_and_time_is_an_error() {
        let text = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope"><s:Body><Other>1</Other></s:Body></s:Envelope>"#;
        SystemDateAndTime::from_envelope(text).unwrap_err();
    }
}
