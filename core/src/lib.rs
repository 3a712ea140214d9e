pub mod codec;
pub mod config;
pub mod db;
pub mod duration;
pub mod error;
pub mod grocery;
pub mod ingredient;
pub mod models;
pub mod session;
pub mod units;

pub use error::{Result, YummyError};
