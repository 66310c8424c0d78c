pub mod analysis;
pub mod dashboard;
pub mod error;
pub mod export;
pub mod filter;
pub mod formatting;
pub mod headers;
pub mod loader;
pub mod parser;
pub mod record;
pub mod settings;
