use serde_json::{json, Value};
use tracing::info;

use crate::error::AdminError;
use crate::filter::SortDirection;
use crate::resource::{FetchOutcome, ResourceController, ResourceSpec};
use crate::store::record::ContentRecord;

/// Headline impact figures shown on the home page
pub static STATS: ResourceSpec = ResourceSpec {
    name: "stats",
    label: "stat",
    table: "site_stats",
    order_column: "display_order",
    order: SortDirection::Asc,
    required: &["key"],
    template,
    search_fields: &["key", "label_en", "label_ar"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("key", "")
        .set("value", json!(0))
        .set("suffix", "")
        .set("label_en", "")
        .set("label_ar", "")
        .set("display_order", json!(0));
    record
}

/// The four figures a fresh site starts with
pub fn default_stats() -> Vec<ContentRecord> {
    let rows = [
        json!({ "key": "attainment", "value": 96.5, "suffix": "%", "label_en": "Student Attainment", "label_ar": "تحصيل الطلاب", "display_order": 1 }),
        json!({ "key": "stories", "value": 68, "suffix": "K+", "label_en": "Stories Read", "label_ar": "القصص المقروءة", "display_order": 2 }),
        json!({ "key": "experience", "value": 13, "suffix": "+", "label_en": "Years of Experience", "label_ar": "سنوات الخبرة", "display_order": 3 }),
        json!({ "key": "ranking", "value": 1, "suffix": "st", "label_en": "Global Ranking", "label_ar": "الترتيب العالمي", "display_order": 4 }),
    ];
    rows.into_iter()
        .filter_map(|row| match row {
            Value::Object(fields) => Some(ContentRecord::from(fields)),
            _ => None,
        })
        .collect()
}

/// Insert the defaults if the loaded table is empty. Returns how many rows
/// were inserted.
pub async fn seed_defaults(controller: &ResourceController) -> Result<usize, AdminError> {
    if !controller.records().is_empty() {
        return Ok(0);
    }
    info!("site_stats is empty, inserting defaults");
    let inserted = controller.insert_many(&default_stats()).await?;
    Ok(inserted.len())
}

/// Fetch, seeding the defaults the first time the table comes back empty
pub async fn load(controller: &ResourceController) -> Result<FetchOutcome, AdminError> {
    match controller.fetch_all().await? {
        FetchOutcome::Applied(0) => {
            seed_defaults(controller).await?;
            Ok(FetchOutcome::Applied(controller.records().len()))
        }
        outcome => Ok(outcome),
    }
}

/// Write back an edited stat row
pub async fn update_stat(controller: &ResourceController, stat: &ContentRecord) -> Result<ContentRecord, AdminError> {
    let id = stat
        .id()
        .ok_or_else(|| AdminError::validation("Stat has no id", vec!["id".into()]))?;
    STATS.validate(stat)?;
    controller.update_fields(&id, stat).await
}
