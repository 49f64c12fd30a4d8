use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AdminError;
use crate::filter::SortDirection;
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;

pub static SKILLS: ResourceSpec = ResourceSpec {
    name: "skills",
    label: "skill",
    table: "skills",
    order_column: "display_order",
    order: SortDirection::Asc,
    required: &["name", "category"],
    template,
    search_fields: &["name", "category"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("name", "")
        .set("category", SkillCategory::Technical.as_str())
        .set("proficiency", "")
        .set("language", "en")
        .set("display_order", json!(0));
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Technical,
    Soft,
    Languages,
    Teaching,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 4] = [Self::Technical, Self::Soft, Self::Languages, Self::Teaching];

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "technical",
            SkillCategory::Soft => "soft",
            SkillCategory::Languages => "languages",
            SkillCategory::Teaching => "teaching",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SkillCategory::Technical => "Technical Skills",
            SkillCategory::Soft => "Soft Skills",
            SkillCategory::Languages => "Languages",
            SkillCategory::Teaching => "Teaching Expertise",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillCategory {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| AdminError::validation(format!("Unknown skill category '{}'", s), vec!["category".into()]))
    }
}

/// Skills grouped under every category, in category order. Categories with no
/// skills are kept so they can be shown as empty.
pub fn by_category(skills: &[ContentRecord]) -> Vec<(SkillCategory, Vec<ContentRecord>)> {
    SkillCategory::ALL
        .into_iter()
        .map(|category| {
            let members = skills
                .iter()
                .filter(|skill| skill.text("category") == Some(category.as_str()))
                .cloned()
                .collect();
            (category, members)
        })
        .collect()
}
