#![forbid(unsafe_code)]

pub mod adapter;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod formats;
pub mod logging;
pub mod registry;
pub mod session;
pub mod sites;
