//! Indexing and querying of a year-partitioned corpus of versioned paper
//! annotations.
//!
//! A corpus root holds one directory per year and one JSON annotation per
//! paper. Every annotation carries a `version` tag that selects the schema used
//! to read it (see [`schema`]). On top of that the crate offers:
//!
//! - [`field`]: dotted field-path queries over documents or raw JSON,
//! - [`extract`]: base-feature extraction from the preprocessing section,
//! - [`aggregate`]: corpus-wide counts and value-to-papers indexes,
//! - [`filter`]: boolean conditions selecting papers,
//! - [`entity`]: enrichment through a remote academic-graph API, memoized on disk.
//!
//! ```ignore
//! use ntarc_index::{aggregate, Corpus, CountMode, FieldPath};
//!
//! let corpus = Corpus::open("ntarc-database");
//! let counts = aggregate::count(
//!     corpus.documents()?,
//!     &FieldPath::new("analysis_method.algorithms.algorithm"),
//!     CountMode::PerPaper,
//! )?;
//! for (value, papers) in aggregate::by_count_desc(counts) {
//!     println!("{value};{papers}");
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod corpus;
pub mod document;
pub mod entity;
pub mod error;
pub mod extract;
pub mod field;
pub mod filter;
pub mod schema;

pub use aggregate::{BaseFeatures, CountMode, FieldPath, ValueExtractor};
pub use config::Config;
pub use corpus::Corpus;
pub use document::{Document, DocumentKey, PaperReference};
pub use entity::{Entity, EntityKey, EntityKind, EntityResolver, Metadata};
pub use error::{Error, Result};
pub use field::{resolve, Node, Scalar};
pub use filter::Condition;
pub use schema::{PaperSchema, SchemaRegistry};
