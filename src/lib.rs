//! Builds a Markdown map of a codebase. Each source file gets a narrative
//! summary from a text-generation service plus locally computed facts
//! (entry-point guard, import lines). Oversized files are split into
//! fixed-size chunks, and a failure in one request or one file never stops
//! the rest of the run.

pub mod chunker;
pub mod config;
pub mod error;
pub mod llm;
pub mod narrative;
pub mod pipeline;
pub mod reporter;
pub mod source_locator;
pub mod static_analysis;

pub use chunker::{AnalysisUnit, ChunkPlanner, UnitPosition};
pub use config::{Config, Credential, LLMConfig, LLMProvider, LanguageProfile};
pub use error::{Error, Result, ServiceError};
pub use llm::{LLMClient, NarrativeService};
pub use narrative::{AnalysisResult, NarrativeAnalyzer, UnitResult};
pub use pipeline::{Pipeline, RunSummary};
pub use reporter::{Report, ReportSection, Reporter, SectionBody};
pub use source_locator::SourceLocator;
pub use static_analysis::{StaticAnalyzer, StaticFacts};
