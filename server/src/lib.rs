//! Roster Server
//!
//! Project membership API: who belongs to a project, at which access
//! level, and who may change that.

#[macro_use]
pub mod db;

pub mod api;
pub mod auth;
pub mod config;
pub mod members;
pub mod permissions;
