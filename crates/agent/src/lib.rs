//! Query answering service for the publications assistant
//!
//! Wires the retrieval engine, prompt assembler, and generation backend
//! into one `Assistant` constructed at process start and shared by
//! reference across request handlers. `ChatSession` adds a bounded
//! rolling conversation on top.

pub mod assistant;
pub mod session;

pub use assistant::{Answer, Assistant};
pub use session::ChatSession;
