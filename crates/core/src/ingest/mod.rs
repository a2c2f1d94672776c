pub mod attom;
pub mod fred;
pub mod news;
pub mod provider;
pub mod redfin;
pub mod types;
