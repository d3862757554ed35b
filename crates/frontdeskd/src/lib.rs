//! frontdeskd - conversational front-desk agent daemon.
//!
//! Turn pipeline: deterministic safety scan, concept extraction, intent
//! classification, identity verification, then a bounded reasoning loop
//! over a registry of practice tools, judged post hoc and spooled to disk.

pub mod cortex;
pub mod evaluation;
pub mod llm;
pub mod persistence;
pub mod seed;
pub mod server;
pub mod tools;
pub mod turn;
