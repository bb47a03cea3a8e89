pub mod config;
pub mod crypto;
pub mod entities;
pub mod error;
pub mod key;
pub mod ports;
pub mod remote;
pub mod resolver;
pub mod store;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Error;
