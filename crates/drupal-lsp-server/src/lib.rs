//! Drupal Language Server backend.
//!
//! Exposes the tower-lsp backend so the binary and the end-to-end tests
//! can build the same service.

pub mod document;
pub mod server;

pub use server::DrupalLspBackend;
