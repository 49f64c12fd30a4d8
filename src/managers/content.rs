use crate::filter::SortDirection;
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;

/// Bilingual copy blocks keyed by page section
pub static CONTENT: ResourceSpec = ResourceSpec {
    name: "content",
    label: "content block",
    table: "site_content",
    order_column: "section",
    order: SortDirection::Asc,
    required: &["key", "section"],
    template,
    search_fields: &["key", "section", "value_en", "value_ar"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("key", "")
        .set("section", "")
        .set("value_en", "")
        .set("value_ar", "");
    record
}

/// Localized value of a content block, falling back to English
pub fn localized<'a>(record: &'a ContentRecord, language: crate::store::record::Language) -> Option<&'a str> {
    let field = format!("value_{}", language.as_str());
    record
        .text(&field)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| record.text("value_en"))
}
