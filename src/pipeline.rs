use crate::{
    chunker::ChunkPlanner,
    config::Config,
    error::{Error, Result},
    llm::{LLMClient, NarrativeService},
    narrative::NarrativeAnalyzer,
    reporter::{Report, ReportMetadata, ReportSection, Reporter},
    source_locator::SourceLocator,
    static_analysis::StaticAnalyzer,
};
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Drives one end-to-end run: discover, analyze each file, assemble.
pub struct Pipeline<S> {
    locator: SourceLocator,
    planner: ChunkPlanner,
    narrator: NarrativeAnalyzer<S>,
    static_analyzer: StaticAnalyzer,
    reporter: Reporter,
    concurrency: usize,
    write_json: bool,
    model: String,
}

/// What a persisted run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total_files: usize,
    pub unreadable_files: usize,
    pub failed_units: usize,
    pub written: Vec<PathBuf>,
    pub duration: Duration,
}

impl RunSummary {
    pub fn print_summary(&self) {
        println!("Files analyzed: {}", self.total_files);
        if self.unreadable_files > 0 {
            println!("Unreadable files: {}", self.unreadable_files);
        }
        if self.failed_units > 0 {
            println!("Failed model requests: {}", self.failed_units);
        }
        println!("Completed in {:.2}s", self.duration.as_secs_f64());
    }
}

impl Pipeline<LLMClient> {
    /// Build a pipeline backed by the configured provider. Fails if the
    /// configuration is invalid or the credential is missing.
    pub fn from_config(config: Config) -> Result<Self> {
        let credential = config.credential()?;
        let client = LLMClient::new(config.llm.clone(), credential)?;
        Self::new(config, client)
    }
}

impl<S: NarrativeService> Pipeline<S> {
    pub fn new(config: Config, service: S) -> Result<Self> {
        config.validate()?;
        let static_analyzer = StaticAnalyzer::new(&config.language)
            .map_err(|e| Error::config(format!("invalid import prefixes: {}", e)))?;

        Ok(Self {
            locator: SourceLocator::new(config.language.clone(), config.respect_gitignore),
            planner: ChunkPlanner::new(config.chunk_size),
            narrator: NarrativeAnalyzer::new(service, &config.language),
            static_analyzer,
            reporter: Reporter::new(),
            concurrency: config.concurrency,
            write_json: config.write_json,
            model: config.llm.model,
        })
    }

    /// Analyze every matching file under `root`. Only an invalid root is an
    /// error; per-file and per-request failures end up in the report.
    #[instrument(skip_all, fields(root = %root.display()))]
    pub async fn run(&self, root: &Path) -> Result<Report> {
        info!("Discovering files...");
        let files = self.locator.discover(root)?;
        info!("Found {} files", files.len());

        let total = files.len();
        let sections: Vec<ReportSection> = stream::iter(files.into_iter().enumerate())
            .map(|(i, path)| async move {
                info!("Analyzing ({}/{}) {}", i + 1, total, path.display());
                self.process_file(path).await
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut report = Report::new();
        for section in sections {
            report.push(section);
        }
        Ok(report)
    }

    /// Run and write the report to `output`, replacing any earlier one.
    pub async fn run_and_persist(&self, root: &Path, output: &Path) -> Result<RunSummary> {
        let start = Instant::now();
        let report = self.run(root).await?;

        let metadata = self.write_json.then(|| ReportMetadata {
            generated_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            root: root.display().to_string(),
            provider: self.narrator.service().name().to_string(),
            model: self.model.clone(),
            total_files: report.sections.len(),
        });

        let written = self.reporter.export_report(&report, output, metadata.as_ref())?;

        Ok(RunSummary {
            total_files: report.sections.len(),
            unreadable_files: report.sections.iter().filter(|s| s.is_unreadable()).count(),
            failed_units: report.sections.iter().map(ReportSection::failed_units).sum(),
            written,
            duration: start.elapsed(),
        })
    }

    async fn process_file(&self, path: PathBuf) -> ReportSection {
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                return ReportSection::unreadable(path, e.to_string());
            }
        };

        let units = self.planner.plan(&content);
        if units.len() > 1 {
            info!("{} split into {} chunks", path.display(), units.len());
        }
        let results = self.narrator.analyze_file(&path, &units).await;
        let facts = self.static_analyzer.analyze(&content);

        ReportSection::analyzed(path, results, facts)
    }
}
