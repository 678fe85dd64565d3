//! Thin typed client for the parts of Supabase the profile service talks to:
//! Storage (`/storage/v1`) and PostgREST (`/rest/v1`).

mod client;
mod rest;
mod storage;

pub use client::*;
pub use rest::*;
pub use storage::*;
