pub mod auth;
pub mod data;
pub mod messages;
pub mod stats;
pub mod testimonials;
