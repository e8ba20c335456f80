pub mod action;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod host;
pub mod io;
pub mod matcher;
pub mod navigation;
pub mod paths;
pub mod poster;
pub mod route;
pub mod viewed;

pub use error::{PlaybooksError, Result};
