//! deskadmin library
//!
//! Client-side building blocks for the admin dashboard of a chat-engagement
//! platform: a resource catalog, a REST gateway, list and form controllers,
//! a view composing them, and a small forwarding proxy.

pub mod cli;
pub mod config;
pub mod form;
pub mod gateway;
pub mod list;
pub mod logging;
pub mod model;
pub mod proxy;
pub mod repository;
pub mod resources;
pub mod view;
