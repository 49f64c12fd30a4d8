use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AdminError;
use crate::filter::SortDirection;
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;

pub static CERTIFICATIONS: ResourceSpec = ResourceSpec {
    name: "certifications",
    label: "certification",
    table: "certifications",
    order_column: "display_order",
    order: SortDirection::Asc,
    required: &["title", "year", "type"],
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
        .set("type", CertificationType::Core.as_str())
        .set("language", "en")
        .set("display_order", json!(0))
        .set("certificate_path", "");
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificationType {
    License,
    Core,
    Pd,
}

impl CertificationType {
    pub const ALL: [CertificationType; 3] = [Self::License, Self::Core, Self::Pd];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationType::License => "license",
            CertificationType::Core => "core",
            CertificationType::Pd => "pd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CertificationType::License => "Professional License",
            CertificationType::Core => "Core Certification",
            CertificationType::Pd => "Professional Development",
        }
    }
}

impl fmt::Display for CertificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificationType {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AdminError::validation(format!("Unknown certification type '{}'", s), vec!["type".into()]))
    }
}
