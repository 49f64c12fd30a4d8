use crate::error::AdminError;
use crate::filter::{Filter, SortDirection};
use crate::store::record::ContentRecord;

/// Static description of one managed table
#[derive(Debug)]
pub struct ResourceSpec {
    /// CLI/API name, e.g. `awards`
    pub name: &'static str,
    /// Singular noun used in prompts, e.g. `award`
    pub label: &'static str,
    pub table: &'static str,
    pub order_column: &'static str,
    pub order: SortDirection,
    pub required: &'static [&'static str],
    pub template: fn() -> ContentRecord,
    pub search_fields: &'static [&'static str],
    /// Readable through the public API
    pub public: bool,
}

impl ResourceSpec {
    /// A fresh blank form
    pub fn blank(&self) -> ContentRecord {
        (self.template)()
    }

    /// Select-all filter with this resource's ordering
    pub fn base_filter(&self) -> Result<Filter, AdminError> {
        let mut filter = Filter::new(self.table)?;
        filter.select(vec!["*".to_string()])?;
        filter.order_by(self.order_column, self.order)?;
        Ok(filter)
    }

    /// Check required fields before anything is sent
    pub fn validate(&self, form: &ContentRecord) -> Result<(), AdminError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|field| form.is_blank(field))
            .map(|field| field.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        Err(AdminError::validation(required_message(self.required), missing))
    }
}

/// `display_order` -> `Display order`
pub fn humanize(field: &str) -> String {
    let spaced = field.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "Title is required", "Name and Category are required",
/// "Title, Organization, and Year are required"
fn required_message(fields: &[&str]) -> String {
    let names: Vec<String> = fields.iter().map(|f| humanize(f)).collect();
    match names.as_slice() {
        [] => "Required fields are missing".to_string(),
        [only] => format!("{} is required", only),
        [first, second] => format!("{} and {} are required", first, second),
        [rest @ .., last] => format!("{}, and {} are required", rest.join(", "), last),
    }
}
