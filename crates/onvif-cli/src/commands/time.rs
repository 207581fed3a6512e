use anyhow::Context;
use chrono::Utc;
use log::warn;
use onvif_client::bootstrap_device_client;

use crate::commands::Session;

#[derive(Clone, Debug, clap::Parser)]
pub struct TimeCommand {}

impl TimeCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let Session {
            connector,
            endpoint,
            credentials,
            options,
        } = session;
        let device = bootstrap_device_client(&connector, &endpoint, &credentials, &options).await?;
        let time = device.get_system_date_and_time().await?;
        device.close();

        let utc = time.utc.context("Device did not report its UTC time")?;
        let skew = utc - Utc::now();
        if skew.num_minutes().abs() >= 5 {
            warn!(
                "Device clock is off by {} seconds, expect authentication failures",
                skew.num_seconds()
            );
        }
        println!("UTC:      {}", utc.to_rfc3339());
        println!("Skew:     {}s", skew.num_seconds());
        if let Some(kind) = time.date_time_type {
            println!("Type:     {kind}");
        }
        if let Some(tz) = time.time_zone {
            println!("TimeZone: {tz}");
        }
        if let Some(dst) = time.daylight_savings {
            println!("DST:      {dst}");
        }
        Ok(())
    }
}
