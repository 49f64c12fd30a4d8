use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdminError;
use crate::filter::{Filter, SortDirection};
use crate::resource::ResourceSpec;
use crate::store::record::ContentRecord;
use crate::store::{with_timeout, RemoteStore};

pub static GALLERY: ResourceSpec = ResourceSpec {
    name: "gallery",
    label: "media item",
    table: "media",
    order_column: "created_at",
    order: SortDirection::Desc,
    required: &["title", "url"],
    template,
    search_fields: &["title", "url"],
    public: true,
};

fn template() -> ContentRecord {
    let mut record = ContentRecord::new();
    record
        .set("title", "")
        .set("event_id", Value::Null)
        .set("url", "")
        .set("type", MediaType::Image.as_str());
    record
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub const ALL: [MediaType; 2] = [Self::Image, Self::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| AdminError::validation(format!("Unknown media type '{}'", s), vec!["type".into()]))
    }
}

/// An event a media item can be filed under, labelled with its workplace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventOption {
    pub id: String,
    pub label: String,
}

/// Events for the media form's event picker, as `Workplace - Event`
pub async fn event_options(store: &dyn RemoteStore, timeout: Duration) -> Result<Vec<EventOption>, AdminError> {
    let workplaces = with_timeout(timeout, store.select(&Filter::new("workplaces")?)).await?;
    let mut events_filter = Filter::new("events")?;
    events_filter.order_by("name", SortDirection::Asc)?;
    let events = with_timeout(timeout, store.select(&events_filter)).await?;

    let names: HashMap<String, &str> = workplaces
        .iter()
        .filter_map(|w| Some((w.id()?, w.text("name")?)))
        .collect();

    Ok(events
        .iter()
        .filter_map(|event| {
            let id = event.id()?;
            let name = event.text("name").unwrap_or_default();
            let workplace = event
                .get("workplace_id")
                .and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .and_then(|wid| names.get(&wid).copied());
            let label = match workplace {
                Some(workplace) => format!("{} - {}", workplace, name),
                None => name.to_string(),
            };
            Some(EventOption { id, label })
        })
        .collect())
}
