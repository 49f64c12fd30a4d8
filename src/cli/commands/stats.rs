use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_records, output_success};
use crate::cli::{AdminContext, OutputFormat};
use crate::managers::stats::{self, STATS};

#[derive(Subcommand)]
pub enum StatsCommands {
    #[command(about = "Show the headline statistics")]
    List,

    #[command(about = "Insert the default statistics when the table is empty")]
    Seed,
}

pub async fn handle(cmd: StatsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let context = AdminContext::connect()?;
    context.require_session().await?;
    let controller = context.controller(&STATS);

    match cmd {
        StatsCommands::List => {
            stats::load(&controller).await?;
            output_records(&output_format, &STATS, &controller.records())
        }
        StatsCommands::Seed => {
            controller.fetch_all().await?;
            let inserted = stats::seed_defaults(&controller).await?;
            let message = if inserted == 0 {
                "Statistics already present; nothing seeded".to_string()
            } else {
                format!("Seeded {} default statistics", inserted)
            };
            output_success(&output_format, &message, Some(json!({ "inserted": inserted })))
        }
    }
}
