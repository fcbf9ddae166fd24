pub mod admin;
pub mod auth;
pub mod base;
pub mod error;
pub mod home;
pub mod product;
pub mod user;
