//! The portfolio's managed tables, plus the storage-backed testimonials.

pub mod awards;
pub mod certifications;
pub mod content;
pub mod experience;
pub mod gallery;
pub mod messages;
pub mod qualifications;
pub mod skills;
pub mod stats;
pub mod testimonials;
pub mod timeline;

use crate::error::AdminError;
use crate::resource::ResourceSpec;

pub use awards::AWARDS;
pub use certifications::{CertificationType, CERTIFICATIONS};
pub use content::CONTENT;
pub use experience::EXPERIENCE;
pub use gallery::{MediaType, GALLERY};
pub use messages::{MessageStatus, MESSAGES};
pub use qualifications::{QualificationType, QUALIFICATIONS};
pub use skills::{SkillCategory, SKILLS};
pub use stats::STATS;
pub use testimonials::TestimonialsManager;
pub use timeline::TIMELINE;

pub static RESOURCES: [&ResourceSpec; 10] = [
    &AWARDS,
    &CERTIFICATIONS,
    &EXPERIENCE,
    &TIMELINE,
    &GALLERY,
    &QUALIFICATIONS,
    &SKILLS,
    &MESSAGES,
    &STATS,
    &CONTENT,
];

/// Find a managed table by name (`awards`) or table name (`contact_submissions`)
pub fn lookup(name: &str) -> Result<&'static ResourceSpec, AdminError> {
    let wanted = name.trim().to_ascii_lowercase();
    RESOURCES
        .iter()
        .copied()
        .find(|spec| spec.name == wanted || spec.table == wanted)
        .ok_or_else(|| AdminError::UnknownResource(name.to_string()))
}

/// Managed tables readable without a session
pub fn public_resources() -> impl Iterator<Item = &'static ResourceSpec> {
    RESOURCES.iter().copied().filter(|spec| spec.public)
}
