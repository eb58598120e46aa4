use std::time::Duration;

use clap::Parser;
use eyre::Result;

use super::inspect::{print_snapshot, InspectArgs};

#[derive(Debug, Clone, Parser)]
pub struct WatchArgs {
    #[command(flatten)]
    pub inspect: InspectArgs,

    /// Seconds between refreshes.
    #[arg(long, default_value = "5", value_name = "SECS")]
    pub interval: u64,
}

impl WatchArgs {
    pub async fn run(self) -> Result<()> {
        let inspector = self.inspect.inspector().await?;
        let mut ticker = tokio::time::interval(Duration::from_secs(self.interval.max(1)));
        loop {
            ticker.tick().await;
            match inspector.refresh().await {
                Some(snapshot) => print_snapshot(&snapshot, self.inspect.pretty)?,
                None => debug!("refresh superseded, nothing to print"),
            }
        }
    }
}
