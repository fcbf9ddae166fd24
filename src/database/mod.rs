pub mod gateway;
pub mod migrations;
pub mod models;

pub use gateway::{Gateway, GatewayError};
