use serde_json::{json, Value};

use crate::filter::SortDirection;
use crate::resource::{ResourceController, ResourceSpec};
use crate::store::record::ContentRecord;

pub static TIMELINE: ResourceSpec = ResourceSpec {
    name: "timeline",
    label: "milestone",
    table: "milestones",
    order_column: "date",
    order: SortDirection::Desc,
    required: &["title", "period"],
    template,
    search_fields: &["title", "organization", "period"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("title", "")
        .set("organization", "")
        .set("period", "")
        .set("date", Value::Null)
        .set("description", "")
        .set("achievements", json!([]));
    record
}

/// Open a milestone for editing; achievements behave as on experience rows
pub fn begin_edit(controller: &ResourceController, record: &ContentRecord) {
    super::experience::begin_edit(controller, record);
}

/// Accept achievements typed as one block of text, one entry per non-blank line
pub fn split_achievement_lines(controller: &ResourceController) {
    controller.edit_form(|form| {
        if let Some(Value::String(text)) = form.get("achievements") {
            let lines = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            form.set_achievements(lines);
        }
    });
}
