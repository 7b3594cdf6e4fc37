//! Dealership backend: user sessions, the local car inventory, and a JSON
//! facade over the external dealer/review and sentiment services.

pub mod api;
pub mod auth;
pub mod config;
pub mod entity;
pub mod inventory;
pub mod upstream;

#[cfg(test)]
mod test_support;
