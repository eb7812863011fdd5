use crate::{
    error::{Error, Result},
    narrative::UnitResult,
    static_analysis::StaticFacts,
};
use serde::Serialize;
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub const REPORT_TITLE: &str = "Code Flow Analysis Report";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub sections: Vec<ReportSection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSection {
    pub path: PathBuf,
    pub body: SectionBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionBody {
    Analyzed {
        units: Vec<UnitResult>,
        facts: StaticFacts,
    },
    Unreadable {
        error: String,
    },
}

/// Context recorded in the JSON export only.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub version: String,
    pub root: String,
    pub provider: String,
    pub model: String,
    pub total_files: usize,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    metadata: &'a ReportMetadata,
    title: &'a str,
    sections: &'a [ReportSection],
}

impl ReportSection {
    pub fn analyzed(path: impl Into<PathBuf>, units: Vec<UnitResult>, facts: StaticFacts) -> Self {
        Self {
            path: path.into(),
            body: SectionBody::Analyzed { units, facts },
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, error: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: SectionBody::Unreadable {
                error: error.into(),
            },
        }
    }

    pub fn failed_units(&self) -> usize {
        match &self.body {
            SectionBody::Analyzed { units, .. } => {
                units.iter().filter(|u| u.result.is_failure()).count()
            }
            SectionBody::Unreadable { .. } => 0,
        }
    }

    pub fn is_unreadable(&self) -> bool {
        matches!(self.body, SectionBody::Unreadable { .. })
    }
}

impl Report {
    pub fn new() -> Self {
        Self {
            title: REPORT_TITLE.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn push(&mut self, section: ReportSection) {
        self.sections.push(section);
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}

/// Renders and persists reports.
pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Self
    }

    pub fn render_markdown(&self, report: &Report) -> String {
        let mut out = format!("# {}\n\n", report.title);
        for section in &report.sections {
            self.render_section(&mut out, section);
        }
        out
    }

    pub fn render_section(&self, out: &mut String, section: &ReportSection) {
        let path = section.path.display();

        match &section.body {
            SectionBody::Unreadable { error } => {
                let _ = write!(out, "## File: `{}`\n\nError reading file: {}\n\n---\n\n", path, error);
            }
            SectionBody::Analyzed { units, facts } => {
                let _ = write!(out, "## File: `{}`\n\n{}\n\n", path, self.render_narrative(units));
                self.render_facts(out, facts);
                out.push_str("\n---\n\n");
            }
        }
    }

    /// A single whole-file result is rendered as is; chunked results get a
    /// banner and a heading per chunk.
    fn render_narrative(&self, units: &[UnitResult]) -> String {
        use crate::chunker::UnitPosition;

        if let [single] = units {
            if single.position == UnitPosition::Whole {
                return single.result.text().to_string();
            }
        }

        let mut out = format!(
            "**Note: This file was too large and has been analyzed in {} chunks.**\n\n",
            units.len()
        );
        for (i, unit) in units.iter().enumerate() {
            let (number, total) = match unit.position {
                UnitPosition::Chunk { index, total } => (index + 1, total),
                UnitPosition::Whole => (i + 1, units.len()),
            };
            let _ = write!(out, "### Analysis of Chunk {}/{}\n\n{}\n\n", number, total, unit.result.text());
        }
        out
    }

    fn render_facts(&self, out: &mut String, facts: &StaticFacts) {
        out.push_str("### Direct Code Analysis\n\n");
        let entry = if facts.has_entry_point { "Yes" } else { "No" };
        let _ = writeln!(out, "- **Potential Entry Point:** {}", entry);

        if facts.dependencies.is_empty() {
            out.push_str("- **Dependencies (Imports):** None found.\n");
        } else {
            out.push_str("- **Dependencies (Imports):**\n");
            for dep in &facts.dependencies {
                let _ = writeln!(out, "  - `{}`", dep);
            }
        }
    }

    pub fn render_json(&self, report: &Report, metadata: &ReportMetadata) -> Result<String> {
        let json = JsonReport {
            metadata,
            title: &report.title,
            sections: &report.sections,
        };
        Ok(serde_json::to_string_pretty(&json)?)
    }

    /// Write the Markdown report to `output`, replacing any previous one,
    /// plus a `.json` sibling when `metadata` is given.
    pub fn export_report(
        &self,
        report: &Report,
        output: &Path,
        metadata: Option<&ReportMetadata>,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        write_file(output, &self.render_markdown(report))?;
        written.push(output.to_path_buf());

        if let Some(metadata) = metadata {
            let json_path = sidecar_path(output);
            write_file(&json_path, &self.render_json(report, metadata)?)?;
            written.push(json_path);
        }

        info!("Report written to {}", output.display());
        Ok(written)
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

/// `report.md` -> `report.json`; an output already ending in `.json` gets a
/// second extension so the Markdown file is never replaced.
fn sidecar_path(output: &Path) -> PathBuf {
    let is_json = output
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        let mut name = output.as_os_str().to_owned();
        name.push(".json");
        PathBuf::from(name)
    } else {
        output.with_extension("json")
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::WriteReport {
            path: path.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| Error::WriteReport {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::UnitPosition;
    use crate::narrative::AnalysisResult;
    use assert_fs::prelude::*;

    fn whole(text: &str) -> Vec<UnitResult> {
        vec![UnitResult {
            position: UnitPosition::Whole,
            result: AnalysisResult::Narrative(text.to_string()),
        }]
    }

    fn facts(entry: bool, deps: &[&str]) -> StaticFacts {
        StaticFacts {
            has_entry_point: entry,
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn empty_report_is_title_only() {
        let md = Reporter::new().render_markdown(&Report::new());
        assert_eq!(md, "# Code Flow Analysis Report\n\n");
    }

    #[test]
    fn whole_file_section_layout() {
        let mut report = Report::new();
        report.push(ReportSection::analyzed("src/a.py", whole("Does things."), facts(false, &["import os"])));

        let md = Reporter::new().render_markdown(&report);
        assert_eq!(
            md,
            "# Code Flow Analysis Report\n\n\
             ## File: `src/a.py`\n\n\
             Does things.\n\n\
             ### Direct Code Analysis\n\n\
             - **Potential Entry Point:** No\n\
             - **Dependencies (Imports):**\n  \
             - `import os`\n\
             \n---\n\n"
        );
    }

    #[test]
    fn chunked_section_has_banner_and_labels() {
        let units = vec![
            UnitResult {
                position: UnitPosition::Chunk { index: 0, total: 2 },
                result: AnalysisResult::Narrative("first".to_string()),
            },
            UnitResult {
                position: UnitPosition::Chunk { index: 1, total: 2 },
                result: AnalysisResult::Failed("Error analyzing chunk: timeout".to_string()),
            },
        ];
        let mut report = Report::new();
        report.push(ReportSection::analyzed("b.py", units, facts(true, &[])));

        let md = Reporter::new().render_markdown(&report);
        assert!(md.contains("**Note: This file was too large and has been analyzed in 2 chunks.**\n\n"));
        assert!(md.contains("### Analysis of Chunk 1/2\n\nfirst\n\n"));
        assert!(md.contains("### Analysis of Chunk 2/2\n\nError analyzing chunk: timeout\n\n"));
        assert!(md.contains("- **Potential Entry Point:** Yes\n"));
        assert!(md.contains("- **Dependencies (Imports):** None found.\n"));
        assert!(md.find("Chunk 1/2").unwrap() < md.find("Chunk 2/2").unwrap());
    }

    #[test]
    fn unreadable_section_has_only_the_error() {
        let mut report = Report::new();
        report.push(ReportSection::unreadable("bad.py", "stream did not contain valid UTF-8"));

        let md = Reporter::new().render_markdown(&report);
        assert!(md.ends_with(
            "## File: `bad.py`\n\nError reading file: stream did not contain valid UTF-8\n\n---\n\n"
        ));
        assert!(!md.contains("Direct Code Analysis"));
    }

    #[test]
    fn sections_keep_insertion_order() {
        let mut report = Report::new();
        for name in ["z.py", "a.py", "m.py"] {
            report.push(ReportSection::analyzed(name, whole("x"), StaticFacts::default()));
        }
        let md = Reporter::new().render_markdown(&report);
        let z = md.find("`z.py`").unwrap();
        let a = md.find("`a.py`").unwrap();
        let m = md.find("`m.py`").unwrap();
        assert!(z < a && a < m);
    }

    #[test]
    fn export_overwrites_and_writes_json_sidecar() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("out/REPORT.md");
        output.write_str("stale content").unwrap();

        let mut report = Report::new();
        report.push(ReportSection::analyzed("a.py", whole("hello"), facts(false, &["import os"])));
        let metadata = ReportMetadata {
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            version: "0.1.0".to_string(),
            root: ".".to_string(),
            provider: "Groq".to_string(),
            model: "llama3-8b-8192".to_string(),
            total_files: 1,
        };

        let written = Reporter::new()
            .export_report(&report, output.path(), Some(&metadata))
            .unwrap();
        assert_eq!(written.len(), 2);

        let md = std::fs::read_to_string(output.path()).unwrap();
        assert!(md.starts_with("# Code Flow Analysis Report"));
        assert!(!md.contains("stale content"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(temp.child("out/REPORT.json").path()).unwrap())
                .unwrap();
        assert_eq!(json["metadata"]["total_files"], 1);
        assert_eq!(json["sections"][0]["path"], "a.py");
        assert_eq!(json["sections"][0]["body"]["status"], "analyzed");
        assert_eq!(json["sections"][0]["body"]["facts"]["dependencies"][0], "import os");
        assert_eq!(json["sections"][0]["body"]["units"][0]["result"]["status"], "narrative");
    }

    #[test]
    fn json_output_name_does_not_clobber_markdown() {
        let temp = assert_fs::TempDir::new().unwrap();
        let output = temp.child("report.json");
        let metadata = ReportMetadata {
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            version: "0.1.0".to_string(),
            root: ".".to_string(),
            provider: "Groq".to_string(),
            model: "llama3-8b-8192".to_string(),
            total_files: 0,
        };

        let written = Reporter::new()
            .export_report(&Report::new(), output.path(), Some(&metadata))
            .unwrap();

        assert_eq!(written[0], output.path());
        assert_eq!(written[1], temp.child("report.json.json").path());
        let md = std::fs::read_to_string(output.path()).unwrap();
        assert_eq!(md, "# Code Flow Analysis Report\n\n");
    }

    #[test]
    fn sidecar_replaces_markdown_extension() {
        assert_eq!(sidecar_path(Path::new("out/REPORT.md")), PathBuf::from("out/REPORT.json"));
        assert_eq!(sidecar_path(Path::new("REPORT")), PathBuf::from("REPORT.json"));
        assert_eq!(sidecar_path(Path::new("r.JSON")), PathBuf::from("r.JSON.json"));
    }
}
