//! Data layer: line classification, headers, dialect readers.
//!
//! Architecture:
//! ```text
//!  ISO-8859-15 bytes
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  decode, sniff dialect, normalize phase
//!   └──────────┘
//!        │
//!        ├──────────────────────┐
//!        ▼                      ▼
//!   ┌──────────┐          ┌──────────┐
//!   │ spectrum  │          │  sip256   │  readings → remote units → sweeps
//!   └──────────┘          └──────────┘
//!        │                      │
//!        ▼                      ▼
//!   header (Begin/End blocks) + tokenizer (line classes)
//! ```

pub mod dialect;
pub mod header;
pub mod loader;
pub mod model;
pub mod sip256;
pub mod spectrum;
pub mod tokenizer;
