use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_records, output_success};
use crate::cli::{AdminContext, OutputFormat};
use crate::managers::messages::{self, MessageStatus, MESSAGES};

#[derive(Subcommand)]
pub enum MessagesCommands {
    #[command(about = "List contact submissions, newest first")]
    List {
        #[arg(long, help = "Only unread submissions")]
        unread: bool,
    },

    #[command(about = "Mark a submission unread, read or replied")]
    Status {
        #[arg(help = "Submission ID")]
        id: String,
        #[arg(help = "New status (unread, read, replied)")]
        status: String,
    },
}

pub async fn handle(cmd: MessagesCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let context = AdminContext::connect()?;
    context.require_session().await?;
    let controller = context.controller(&MESSAGES);

    match cmd {
        MessagesCommands::List { unread } => {
            controller.fetch_all().await?;
            let mut records = controller.records();
            if unread {
                records.retain(|record| MessageStatus::of(record) == MessageStatus::Unread);
            }
            if matches!(output_format, OutputFormat::Text) {
                println!("{} unread", messages::unread_count(&controller.records()));
            }
            output_records(&output_format, &MESSAGES, &records)
        }
        MessagesCommands::Status { id, status } => {
            let status: MessageStatus = status.parse()?;
            messages::update_status(&controller, &id, status).await?;
            output_success(
                &output_format,
                &format!("Message {} marked {}", id, status.as_str()),
                Some(json!({ "id": id, "status": status.as_str() })),
            )
        }
    }
}
