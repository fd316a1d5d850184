pub mod catalog;
pub mod config;
pub mod denial;
pub mod error;
pub mod logging;
pub mod patient;
pub mod payer;
pub mod pipeline;
pub mod provider;
pub mod random;
pub mod remittance;
pub mod reporter;
pub mod schema;
pub mod sink;
pub mod summary;
pub mod synthesizer;
pub mod table;
