use anyhow::bail;
use futures_util::future::join_all;
use itertools::Itertools;
use onvif_client::{bootstrap_dependent_client, ServiceKind};

use crate::commands::Session;

#[derive(Clone, Debug, clap::Parser)]
pub struct CheckCommand {
    /// Check only these services; defaults to all of them.
    #[arg(long, value_delimiter = ',', value_parser = parse_service)]
    services: Vec<ServiceKind>,
}

fn parse_service(s: &str) -> Result<ServiceKind, String> {
    ServiceKind::ALL
        .into_iter()
        .find(|k| k.to_string().eq_ignore_ascii_case(s))
        .ok_or_else(|| {
            format!(
                "expected one of {}",
                ServiceKind::ALL.iter().map(|k| k.to_string()).join(", ")
            )
        })
}

impl CheckCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let Session {
            connector,
            endpoint,
            credentials,
            options,
        } = session;
        let services = match self.services.is_empty() {
            true => ServiceKind::ALL.to_vec(),
            false => self.services,
        };

        let results = join_all(services.iter().map(|&kind| {
            bootstrap_dependent_client(&connector, &endpoint, &credentials, kind, &options)
        }))
        .await;

        let mut failed = Vec::new();
        for (kind, result) in services.iter().zip(results) {
            match result {
                Ok(client) => {
                    println!("{kind:8} ok     {}", client.endpoint());
                    client.close();
                }
                Err(e) => {
                    let hint = match e.is_authentication_rejection() {
                        true => " (credentials rejected)",
                        false => "",
                    };
                    let step = e.step();
                    println!("{kind:8} failed at {step:?}{hint}: {:#}", anyhow::Error::from(e));
                    failed.push(kind);
                }
            }
        }
        if !failed.is_empty() {
            bail!("Could not create clients for {}", failed.iter().join(", "));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn services_parse_case_insensitively() {
        assert_eq!(parse_service("ptz").unwrap(), ServiceKind::Ptz);
        assert_eq!(parse_service("Media").unwrap(), ServiceKind::Media);
        parse_service("events").unwrap_err();
    }
}
