//! Sitemap generator for the business directory.
//!
//! Pages the companies table into fixed-capacity sitemap segments, then writes
//! a manifest listing every segment and a pointer file referencing the
//! manifest. Each run starts from a cleaned output directory and either
//! finishes with a complete, consistent set or fails without writing an index.
//!
//! ```text
//! prepare_output_dir ─► SegmentedExporter ─► write_index
//!   (workspace)           (exporter)           (index)
//! ```

pub mod check;
pub mod cli;
pub mod config;
pub mod error;
pub mod exporter;
pub mod index;
pub mod model;
pub mod pipeline;
pub mod preview;
pub mod source;
pub mod workspace;
pub mod xml;

pub use config::GeneratorConfig;
pub use error::{Result, SitemapError};
pub use exporter::{ExportProgress, NoProgress, SealedSegment, SegmentedExporter};
pub use pipeline::{generate, generate_at, GenerationReport};
pub use source::{CompanySource, SqliteSource, TableSpec};
