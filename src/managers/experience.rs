use serde_json::{json, Value};

use crate::filter::SortDirection;
use crate::resource::{ResourceController, ResourceSpec};
use crate::store::record::ContentRecord;

pub static EXPERIENCE: ResourceSpec = ResourceSpec {
    name: "experience",
    label: "experience",
    table: "experience",
    order_column: "display_order",
    order: SortDirection::Asc,
    required: &["title", "organization", "period"],
    template,
    search_fields: &["title", "organization"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("title", "")
        .set("organization", "")
        .set("location", "")
        .set("period", "")
        .set("description", "")
        .set("achievements", json!([]))
        .set("language", "en")
        .set("display_order", json!(0));
    record
}

/// Open a row for editing with its achievements coerced to a string list
pub fn begin_edit(controller: &ResourceController, record: &ContentRecord) {
    let mut record = record.clone();
    if matches!(record.get("achievements"), Some(Value::Array(_))) {
        record.normalize_achievements();
    } else {
        record.set_achievements(Vec::new());
    }
    controller.begin_edit(&record);
}

/// Append an empty achievement line to the open form
pub fn add_achievement(controller: &ResourceController) {
    controller.edit_form(|form| {
        let mut achievements = form.achievements();
        achievements.push(String::new());
        form.set_achievements(achievements);
    });
}

pub fn set_achievement(controller: &ResourceController, index: usize, text: &str) {
    controller.edit_form(|form| {
        let mut achievements = form.achievements();
        if let Some(slot) = achievements.get_mut(index) {
            *slot = text.to_string();
            form.set_achievements(achievements);
        }
    });
}

pub fn remove_achievement(controller: &ResourceController, index: usize) {
    controller.edit_form(|form| {
        let mut achievements = form.achievements();
        if index < achievements.len() {
            achievements.remove(index);
            form.set_achievements(achievements);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn controller() -> ResourceController {
        ResourceController::new(&EXPERIENCE, Arc::new(StubStore::new()), Duration::from_secs(5))
    }

    #[test]
    fn edit_coerces_non_list_achievements() {
        let ctl = controller();
        let record = ContentRecord::from_row(json!({ "id": "e1", "title": "Teacher", "achievements": "led a club" })).unwrap();
        begin_edit(&ctl, &record);
        assert_eq!(ctl.snapshot().form_data.get("achievements"), Some(&json!([])));
    }

    #[test]
    fn edit_without_achievements_gets_an_empty_list() {
        let ctl = controller();
        let record = ContentRecord::from_row(json!({ "id": "e1", "title": "Teacher" })).unwrap();
        begin_edit(&ctl, &record);
        assert_eq!(ctl.snapshot().form_data.achievements(), Vec::<String>::new());
        assert!(ctl.snapshot().form_data.get("achievements").is_some());
    }

    #[test]
    fn achievement_lines_can_be_added_edited_and_removed() {
        let ctl = controller();
        ctl.begin_create();

        add_achievement(&ctl);
        add_achievement(&ctl);
        set_achievement(&ctl, 0, "Raised attainment");
        set_achievement(&ctl, 1, "Founded reading club");
        set_achievement(&ctl, 5, "ignored");
        assert_eq!(
            ctl.snapshot().form_data.achievements(),
            vec!["Raised attainment", "Founded reading club"]
        );

        remove_achievement(&ctl, 0);
        remove_achievement(&ctl, 9);
        assert_eq!(ctl.snapshot().form_data.achievements(), vec!["Founded reading club"]);
    }
}
