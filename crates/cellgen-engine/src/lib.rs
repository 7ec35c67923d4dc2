//! cellgen_engine - Field model, prompt templates and the compute shim.

pub mod compute;
pub mod engine;
