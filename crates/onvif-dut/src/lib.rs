//! The device under test, as configured in the environment or on disk.
use std::{env, fs, path::PathBuf};

use anyhow::{anyhow, Context};
use url::Url;

const FILENAME: &str = "dut-v0.json";

const HOST: &str = "ONVIF_DEVICE_HOST";
const URL: &str = "ONVIF_DEVICE_URL";
const USER: &str = "ONVIF_DEVICE_USER";
const PASS: &str = "ONVIF_DEVICE_PASS";

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Device {
    /// Host, optionally with a port, of the device.
    pub host: String,
    /// Device service address to use instead of the conventional one derived from `host`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<Url>,
    pub username: String,
    pub password: String,
}

impl Device {
    pub fn from_env() -> anyhow::Result<Option<Self>> {
        let Some(host) = env::var_os(HOST) else {
            return Ok(None);
        };
        let host = host.to_string_lossy().into_owned();
        let username = env::var(USER).with_context(|| format!("{HOST} is set but {USER} is not"))?;
        let password = env::var(PASS).with_context(|| format!("{HOST} is set but {PASS} is not"))?;
        let url = env::var(URL)
            .ok()
            .map(|u| Url::parse(&u))
            .transpose()
            .with_context(|| format!("{URL} is not a valid URL"))?;
        Ok(Some(Self {
            host,
            url,
            username,
            password,
        }))
    }

    fn dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::data_dir()
            .context("Could not infer a data directory")?
            .join("onvif-dut"))
    }

    pub fn from_fs() -> anyhow::Result<Option<Self>> {
        let file = Self::dir()?.join(FILENAME);
        match fs::read_to_string(&file) {
            Ok(t) => serde_json::from_str(&t)
                .context("Failed to deserialize device")
                .with_context(|| format!("Consider removing {file:?}")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow!(e)),
        }
    }

    /// Look in the environment first, then on disk.
    pub fn from_anywhere() -> anyhow::Result<Option<Self>> {
        match Self::from_env()? {
            Some(device) => Ok(Some(device)),
            None => Self::from_fs(),
        }
    }

    pub fn to_env(&self) -> Vec<(String, String)> {
        let Self {
            host,
            url,
            username,
            password,
        } = self;
        let mut envs = vec![
            (HOST.to_string(), host.to_string()),
            (USER.to_string(), username.to_string()),
            (PASS.to_string(), password.to_string()),
        ];
        if let Some(url) = url {
            envs.push((URL.to_string(), url.to_string()));
        }
        envs
    }

    pub fn to_fs(&self) -> anyhow::Result<PathBuf> {
        let device = serde_json::to_string_pretty(&self).context("Failed to serialize device")?;
        let dir = Self::dir()?;
        fs::create_dir_all(&dir).context("Failed to create the data directory")?;
        let destination = dir.join(FILENAME);
        match fs::write(&destination, device) {
            Ok(_) => Ok(destination),
            Err(e) => Err(anyhow!(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_format_is_stable() {
        let text = r#"{"host":"192.168.0.90:8080","username":"admin","password":"pass"}"#;
        let device: Device = serde_json::from_str(text).unwrap();
        assert_eq!(device.host, "192.168.0.90:8080");
        assert_eq!(device.url, None);

        let text = r#"{"host":"cam","url":"http://cam/onvif/device","username":"a","password":"b"}"#;
        let device: Device = serde_json::from_str(text).unwrap();
        assert_eq!(device.url.unwrap().as_str(), "http://cam/onvif/device");
    }

    #[test]
    fn env_includes_url_only_when_set() {
        let mut device = Device {
            host: "cam".to_string(),
            url: None,
            username: "admin".to_string(),
            password: "pass".to_string(),
        };
        let keys: Vec<_> = device.to_env().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, [HOST, USER, PASS]);

        device.url = Some(Url::parse("http://cam/onvif/device_service").unwrap());
        assert_eq!(
            device.to_env().last().unwrap(),
            &(URL.to_string(), "http://cam/onvif/device_service".to_string())
        );
    }
}
