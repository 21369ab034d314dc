//! Runnable sage agent: configuration, the per-cycle pipeline, the shared
//! snapshot and the `/health` endpoint.

pub mod api;
pub mod config;
pub mod driver;
pub mod pipeline;
pub mod state;

#[cfg(test)]
mod tests;
