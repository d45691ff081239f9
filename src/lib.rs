//! Request-enrichment middleware: reads a claim from an identity token and
//! republishes it as a request header for downstream consumers.

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
