pub mod config;
pub mod curator;
pub mod db;
pub mod error;
pub mod explorer;
pub mod filters;
pub mod loading;
pub mod mars_client;
pub mod models;
pub mod prober;
pub mod registry;
pub mod resolver;
pub mod session;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result, SourceError};
