//! Import of spectral induced polarization (SIP) instrument logs.
//!
//! The readers recover frequency / amplitude / phase spectra and the
//! reading → remote unit → sweep hierarchy of SIP256 files from loosely
//! structured device text output.
//!
//! ## Module Structure
//!
//! - [`data`] - line classification, header assembly and dialect readers
//! - [`config`] - loader options
//! - [`export`] - CSV, JSON and Parquet output
//! - [`error`] - fatal errors and per-line diagnostics

pub mod config;
pub mod data;
pub mod error;
pub mod export;

pub use config::LoadOptions;
pub use data::dialect::Dialect;
pub use data::loader::{load, load_from_text, load_sip256, LoadedSpectrum};
pub use data::model::{
    format_frequency, ElectrodePair, HeaderBlock, HeaderValue, PhaseConvention, ReadingGroup,
    RemoteUnitGroup, Sip256Log, SpectrumRecord, SweepRow,
};
pub use error::{Diagnostic, SipError};
pub use export::{export_sip256, export_spectrum, ExportFormat};
