use itertools::Itertools;
use onvif_client::bootstrap_media_client;

use crate::commands::{print_table, Session};

#[derive(Clone, Debug, clap::Parser)]
pub struct ProfilesCommand {}

impl ProfilesCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let Session {
            connector,
            endpoint,
            credentials,
            options,
        } = session;
        let media = bootstrap_media_client(&connector, &endpoint, &credentials, &options).await?;
        let profiles = media.get_profiles().await?;
        media.close();

        let rows = std::iter::once(["TOKEN", "NAME", "FIXED"].map(String::from))
            .chain(profiles.into_iter().map(|p| {
                [
                    p.token,
                    p.name.unwrap_or_default(),
                    p.fixed.to_string(),
                ]
            }))
            .collect_vec();
        print_table(&rows);
        Ok(())
    }
}
