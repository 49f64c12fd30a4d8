use serde_json::json;

use crate::filter::SortDirection;
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;

pub static AWARDS: ResourceSpec = ResourceSpec {
    name: "awards",
    label: "award",
    table: "awards",
    order_column: "display_order",
    order: SortDirection::Asc,
    required: &["title", "organization", "year"],
    template,
    search_fields: &["title", "organization"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("title", "")
        .set("organization", "")
        .set("year", "")
        .set("description", "")
        .set("language", "en")
        .set("display_order", json!(0));
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceController;
    use crate::testing::StubStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn award_requires_title_organization_and_year() {
        let store = Arc::new(StubStore::new());
        let ctl = ResourceController::new(&AWARDS, store.clone(), Duration::from_secs(5));
        ctl.begin_create();
        ctl.set_field("title", "Best Teacher");

        let err = ctl.save().await.unwrap_err();
        assert_eq!(err.to_string(), "Title, Organization, and Year are required");
        assert_eq!(store.total_calls(), 0);

        ctl.set_field("organization", "Ministry of Education");
        ctl.set_field("year", "2023");
        ctl.save().await.unwrap();

        let rows = store.rows("awards");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("language"), Some("en"));
        assert_eq!(rows[0].display_order(), Some(0));
    }
}
