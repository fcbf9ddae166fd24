pub mod config;
pub mod controllers;
pub mod database;
pub mod entities;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod routing;
pub mod server;
pub mod session;
pub mod state;
pub mod validator;
pub mod views;

#[cfg(test)]
pub mod testing;
