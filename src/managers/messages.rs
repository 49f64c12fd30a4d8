use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AdminError;
use crate::filter::SortDirection;
use crate::resource::{ResourceController, ResourceSpec};
use crate::store::record::ContentRecord;

/// Contact-form submissions, newest first. Rows arrive through the public
/// contact endpoint; the admin side reads, flags and deletes them.
pub static MESSAGES: ResourceSpec = ResourceSpec {
    name: "messages",
    label: "message",
    table: "contact_submissions",
    order_column: "created_at",
    order: SortDirection::Desc,
    required: &["name", "email", "subject", "message"],
    template: ContentRecord::new,
    search_fields: &["name", "email", "subject"],
    public: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Unread,
    Read,
    Replied,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Unread => "unread",
            MessageStatus::Read => "read",
            MessageStatus::Replied => "replied",
        }
    }

    /// Missing or unrecognized statuses read as unread
    pub fn of(record: &ContentRecord) -> Self {
        record
            .text("status")
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unread" => Ok(MessageStatus::Unread),
            "read" => Ok(MessageStatus::Read),
            "replied" => Ok(MessageStatus::Replied),
            other => Err(AdminError::validation(
                format!("Unknown message status '{}' (expected unread, read or replied)", other),
                vec!["status".into()],
            )),
        }
    }
}

pub async fn update_status(
    controller: &ResourceController,
    id: &str,
    status: MessageStatus,
) -> Result<ContentRecord, AdminError> {
    let mut changes = ContentRecord::new();
    changes.set("status", status.as_str());
    controller.update_fields(id, &changes).await
}

pub fn unread_count(records: &[ContentRecord]) -> usize {
    records
        .iter()
        .filter(|r| MessageStatus::of(r) == MessageStatus::Unread)
        .count()
}
