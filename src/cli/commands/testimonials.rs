use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{guess_content_type, output_empty_collection, output_success, StdinConfirm};
use crate::cli::{AdminContext, OutputFormat};
use crate::config::config;
use crate::resource::{AssumeYes, Confirm, RemoveOutcome};

#[derive(Subcommand)]
pub enum TestimonialsCommands {
    #[command(about = "List stored testimonial letters")]
    List {
        #[arg(long, help = "Case-insensitive search over file names")]
        search: Option<String>,
    },

    #[command(about = "Upload a testimonial image")]
    Upload {
        #[arg(help = "Path to the image file")]
        file: PathBuf,
    },

    #[command(about = "Delete a stored testimonial")]
    Delete {
        #[arg(help = "Stored file name")]
        name: String,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },
}

pub async fn handle(cmd: TestimonialsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let context = AdminContext::connect()?;
    context.require_session().await?;
    let manager = context.testimonials();

    match cmd {
        TestimonialsCommands::List { search } => {
            manager.fetch_all().await?;
            let files = match search {
                Some(term) => manager.matching(&term),
                None => manager.files(),
            };

            if files.is_empty() {
                return output_empty_collection(&output_format, "testimonials", "No testimonials found");
            }

            match output_format {
                OutputFormat::Json => {
                    let entries: Vec<_> = files
                        .iter()
                        .map(|file| json!({ "name": file.name, "url": manager.public_url(&file.name) }))
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&json!({ "testimonials": entries }))?);
                }
                OutputFormat::Text => {
                    for file in &files {
                        println!("{:<48} {}", file.name, manager.public_url(&file.name));
                    }
                }
            }
            Ok(())
        }
        TestimonialsCommands::Upload { file } => {
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file.to_string_lossy();
            let stored = manager.upload(&file_name, bytes, guess_content_type(&file_name)).await?;

            output_success(
                &output_format,
                &format!("Uploaded {}", stored),
                Some(json!({ "name": stored, "url": manager.public_url(&stored) })),
            )
        }
        TestimonialsCommands::Delete { name, yes } => {
            let confirm: &dyn Confirm = if yes || !config().admin.require_delete_confirmation {
                &AssumeYes
            } else {
                &StdinConfirm
            };

            match manager.remove(&name, confirm).await? {
                RemoveOutcome::Deleted => output_success(&output_format, &format!("Deleted {}", name), Some(json!({ "name": name }))),
                RemoveOutcome::Declined => output_success(&output_format, "Delete cancelled", Some(json!({ "deleted": false }))),
            }
        }
    }
}
