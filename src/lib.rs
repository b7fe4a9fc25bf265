pub mod config;
pub mod constants;
pub mod dates;
pub mod error;
pub mod events_api;
pub mod export;
pub mod filter;
pub mod geo;
pub mod geocode;
pub mod input;
pub mod logging;
pub mod pipeline;
pub mod record;
pub mod response;
pub mod storage;
