use log::info;
use onvif_dut::Device;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub(crate) enum Destination {
    /// Write the device to the data directory.
    Filesystem,
    /// Print the device as a shell script that can be sourced.
    Environment,
}

#[derive(Clone, Debug, clap::Parser)]
pub struct StoreCommand {
    /// Where to store the device.
    #[arg(long, default_value = "filesystem")]
    pub(crate) destination: Destination,
}

fn quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

impl StoreCommand {
    pub fn exec(self, device: Device) -> anyhow::Result<()> {
        match self.destination {
            Destination::Filesystem => {
                let path = device.to_fs()?;
                info!("Stored {} in {path:?}", device.host);
            }
            Destination::Environment => {
                for (key, value) in device.to_env() {
                    println!("export {key}={}", quoted(&value));
                }
            }
        }
        Ok(())
    }
}
