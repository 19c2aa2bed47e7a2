//! Library crate for worship-back, exposing modules for binaries and integration tests.

pub mod config;
pub mod dao;
mod dto;
mod error;
pub mod routes;
pub mod schedule;
pub mod services;
pub mod state;
