use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdminError;
use crate::filter::SortDirection;
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;

pub static QUALIFICATIONS: ResourceSpec = ResourceSpec {
    name: "qualifications",
    label: "qualification",
    table: "qualifications",
    order_column: "year",
    order: SortDirection::Desc,
    required: &["title"],
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
        .set("type", QualificationType::Certification.as_str())
        .set("file_url", "");
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualificationType {
    License,
    Certification,
    Pd,
}

impl QualificationType {
    pub const ALL: [QualificationType; 3] = [Self::License, Self::Certification, Self::Pd];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualificationType::License => "license",
            QualificationType::Certification => "certification",
            QualificationType::Pd => "pd",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualificationType::License => "License",
            QualificationType::Certification => "Certification",
            QualificationType::Pd => "Professional Development",
        }
    }
}

impl fmt::Display for QualificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualificationType {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AdminError::validation(format!("Unknown qualification type '{}'", s), vec!["type".into()]))
    }
}
