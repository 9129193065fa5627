#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::panic))]
#![forbid(unsafe_code)]

pub mod chain;
pub mod config;
pub mod decoder;
pub mod entities;
pub mod error;
pub mod framework;
pub mod ledger;
pub mod processors;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;
