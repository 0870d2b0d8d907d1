pub mod aliases;
pub mod cities;
pub mod db;
pub mod i18n;
pub mod image_assets;
pub mod items;
pub mod models;
pub mod prospects;
pub mod rules;
pub mod scan_events;
pub mod schema;
pub mod vision_cache;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
