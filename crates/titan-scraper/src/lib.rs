//! Link discovery and article extraction for the supported news sites.

pub mod client;
mod dates;
pub mod error;
mod html;
pub mod sources;

pub use client::NewsClient;
pub use error::ScraperError;
pub use sources::{ApNews, Bbc, Guardian, NewsSource, Npr, SourceRegistry, TechCrunch};
