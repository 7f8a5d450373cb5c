//! HTTP request handlers.

mod health;
mod train;

pub use health::health_check;
pub use train::{TrainQuery, train};
