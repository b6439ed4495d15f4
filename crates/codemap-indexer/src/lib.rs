//! Codemap Indexer: language adapters, import resolution and graph building

pub mod coordinator;
pub mod discovery;
pub mod extractor;
pub mod languages;
pub mod parser;
pub mod paths;


pub use coordinator::{Coordinator, FileFailure, FileOutcome, IndexReport, SkippedFile, UnresolvedImport};
pub use discovery::{discover, Discovery, SourceFile};
pub use extractor::{LanguageAdapter, ParsedFile, RawImport, ResolveContext, Resolution};
pub use languages::{adapter_for_language, adapter_for_path};
