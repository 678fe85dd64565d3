//! Avatar and profile backend on top of Supabase storage and PostgREST.

pub mod adapters;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod factory;
pub mod router;
mod routes;
pub mod services;
