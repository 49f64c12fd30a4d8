use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_records, output_success, read_json_stdin, StdinConfirm};
use crate::cli::{AdminContext, OutputFormat};
use crate::config::config;
use crate::managers::{self, experience, gallery, timeline, EXPERIENCE, TIMELINE};
use crate::resource::{AssumeYes, Confirm, RemoveOutcome, ResourceController};
use crate::store::record::{ContentRecord, Language};
use crate::store::RestStore;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List the records of a resource in display order")]
    List {
        #[arg(help = "Resource name (awards, certifications, experience, timeline, gallery, qualifications, skills, messages, stats, content)")]
        resource: String,
        #[arg(long, help = "Only records in this language (en, ar)")]
        lang: Option<String>,
        #[arg(long, help = "Case-insensitive search over the resource's text fields")]
        search: Option<String>,
    },

    #[command(about = "Create a record from JSON on stdin")]
    Create {
        #[arg(help = "Resource name")]
        resource: String,
    },

    #[command(about = "Update a record from JSON on stdin")]
    Update {
        #[arg(help = "Resource name")]
        resource: String,
        #[arg(help = "Record ID to update")]
        id: String,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(help = "Resource name")]
        resource: String,
        #[arg(help = "Record ID to delete")]
        id: String,
        #[arg(long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    #[command(about = "List the events a gallery item can be filed under")]
    Events,
}

pub async fn handle(cmd: DataCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let context = AdminContext::connect()?;
    context.require_session().await?;

    match cmd {
        DataCommands::List { resource, lang, search } => {
            let spec = managers::lookup(&resource)?;
            let mut controller = context.controller(spec);
            if let Some(lang) = lang {
                controller = controller.with_language(lang.parse::<Language>()?);
            }

            controller.fetch_all().await?;
            let records = match search {
                Some(term) => controller.matching(&term),
                None => controller.records(),
            };
            output_records(&output_format, spec, &records)
        }
        DataCommands::Create { resource } => {
            let spec = managers::lookup(&resource)?;
            let input = ContentRecord::from_input(read_json_stdin()?)?;

            let controller = context.controller(spec);
            controller.begin_create();
            controller.update_form(&input);
            if spec.name == TIMELINE.name {
                timeline::split_achievement_lines(&controller);
            }
            let created = controller.save().await?;

            output_success(
                &output_format,
                &format!("Created {} {}", spec.label, created.id().unwrap_or_default()),
                Some(json!({ "record": created })),
            )
        }
        DataCommands::Update { resource, id } => {
            let spec = managers::lookup(&resource)?;
            let changes = ContentRecord::from_input(read_json_stdin()?)?;

            let controller = context.controller(spec);
            let existing = find_record(&controller, &id).await?;
            if spec.name == EXPERIENCE.name {
                experience::begin_edit(&controller, &existing);
            } else if spec.name == TIMELINE.name {
                timeline::begin_edit(&controller, &existing);
            } else {
                controller.begin_edit(&existing);
            }
            controller.update_form(&changes);
            if spec.name == TIMELINE.name {
                timeline::split_achievement_lines(&controller);
            }
            let updated = controller.save().await?;

            output_success(
                &output_format,
                &format!("Updated {} {}", spec.label, id),
                Some(json!({ "record": updated })),
            )
        }
        DataCommands::Delete { resource, id, yes } => {
            let spec = managers::lookup(&resource)?;
            let controller = context.controller(spec);

            let confirm: &dyn Confirm = if yes || !config().admin.require_delete_confirmation {
                &AssumeYes
            } else {
                &StdinConfirm
            };

            match controller.remove(&id, confirm).await? {
                RemoveOutcome::Deleted => output_success(
                    &output_format,
                    &format!("Deleted {} {}", spec.label, id),
                    Some(json!({ "id": id })),
                ),
                RemoveOutcome::Declined => output_success(&output_format, "Delete cancelled", Some(json!({ "deleted": false }))),
            }
        }
        DataCommands::Events => {
            let store = RestStore::new(context.backend.clone());
            let options = gallery::event_options(&store, context.timeout).await?;
            match output_format {
                OutputFormat::Json => output_success(&output_format, "Events", Some(json!({ "events": options }))),
                OutputFormat::Text => {
                    for option in &options {
                        println!("{}\t{}", option.id, option.label);
                    }
                    Ok(())
                }
            }
        }
    }
}

async fn find_record(controller: &ResourceController, id: &str) -> anyhow::Result<ContentRecord> {
    controller.fetch_all().await?;
    controller
        .records()
        .into_iter()
        .find(|record| record.id().as_deref() == Some(id))
        .ok_or_else(|| anyhow::anyhow!("No {} with id {}", controller.spec().label, id))
}
