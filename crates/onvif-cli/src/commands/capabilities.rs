use itertools::Itertools;
use onvif_client::{bootstrap_device_client, device::CapabilityCategory};

use crate::commands::{print_table, Session};

#[derive(Clone, Debug, clap::Parser)]
pub struct CapabilitiesCommand {
    /// Only ask for this category, e.g. `Media` or `PTZ`.
    #[arg(long, default_value = "All")]
    category: CapabilityCategory,
}

impl CapabilitiesCommand {
    pub async fn exec(self, session: Session) -> anyhow::Result<()> {
        let Session {
            connector,
            endpoint,
            credentials,
            options,
        } = session;
        let device = bootstrap_device_client(&connector, &endpoint, &credentials, &options).await?;
        let capabilities = device.get_capabilities(self.category).await?;
        device.close();

        let rows = std::iter::once(["CATEGORY".to_string(), "XADDR".to_string()])
            .chain(capabilities.xaddrs.keys().filter_map(|&c| {
                let xaddr = capabilities.xaddr(c)?;
                Some([c.as_str().to_string(), xaddr.to_string()])
            }))
            .collect_vec();
        print_table(&rows);
        Ok(())
    }
}
