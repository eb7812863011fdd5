use assert_fs::prelude::*;
use assert_fs::TempDir;
use async_trait::async_trait;
use codeflow::{Config, NarrativeService, Pipeline, ServiceError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Returns a fixed summary and counts calls.
#[derive(Default)]
struct CannedService {
    calls: AtomicUsize,
}

#[async_trait]
impl NarrativeService for CannedService {
    fn name(&self) -> &str {
        "Canned"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("Summary of {} chars of prompt.", prompt.len()))
    }
}

fn write_fixture(temp: &TempDir) {
    let mut a = String::from("import os\n");
    while a.len() < 200 {
        a.push_str("x = 1\n");
    }
    a.truncate(200);
    temp.child("a.py").write_str(&a).unwrap();

    let guard = "if __name__ == \"__main__\":\n    main()\n";
    let mut b = "# filler\n".repeat((20_000 - guard.len()) / 9);
    while b.len() + guard.len() < 20_000 {
        b.push('#');
    }
    b.push_str(guard);
    assert_eq!(b.len(), 20_000);
    temp.child("b.py").write_str(&b).unwrap();
}

#[tokio::test]
async fn end_to_end_report_matches_expected_layout() {
    let project = TempDir::new().unwrap();
    write_fixture(&project);
    let out_dir = TempDir::new().unwrap();
    let output = out_dir.child("CODE_FLOW_ANALYSIS.md");

    let pipeline = Pipeline::new(Config::default(), CannedService::default()).unwrap();
    let summary = pipeline.run_and_persist(project.path(), output.path()).await.unwrap();

    assert_eq!(summary.total_files, 2);
    assert_eq!(summary.failed_units, 0);
    assert_eq!(summary.unreadable_files, 0);

    let md = std::fs::read_to_string(output.path()).unwrap();
    assert!(md.starts_with("# Code Flow Analysis Report\n\n"));

    let a_at = md.find("a.py`").unwrap();
    let b_at = md.find("b.py`").unwrap();
    assert!(a_at < b_at);
    let (a_section, b_section) = md.split_at(b_at);

    assert!(!a_section.contains("too large"));
    assert!(a_section.contains("- **Potential Entry Point:** No\n"));
    assert!(a_section.contains("- **Dependencies (Imports):**\n  - `import os`\n"));

    assert!(b_section.contains("has been analyzed in 2 chunks"));
    assert!(b_section.contains("### Analysis of Chunk 1/2"));
    assert!(b_section.contains("### Analysis of Chunk 2/2"));
    assert!(b_section.contains("- **Potential Entry Point:** Yes\n"));
    assert!(b_section.contains("- **Dependencies (Imports):** None found.\n"));
    assert_eq!(md.matches("\n---\n\n").count(), 2);
}

#[tokio::test]
async fn rerun_produces_same_sections_in_same_order() {
    let project = TempDir::new().unwrap();
    write_fixture(&project);
    project.child("pkg/__init__.py").write_str("").unwrap();
    project.child("pkg/util.py").write_str("from os import path\n").unwrap();

    let pipeline = Pipeline::new(Config::default(), CannedService::default()).unwrap();
    let first = pipeline.run(project.path()).await.unwrap();
    let second = pipeline.run(project.path()).await.unwrap();

    let paths = |r: &codeflow::Report| r.sections.iter().map(|s| s.path.clone()).collect::<Vec<_>>();
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(first.sections.len(), 4);
}

#[tokio::test]
async fn placeholder_credential_fails_before_any_work() {
    let config = Config::from_toml(&Config::create_documented_config()).unwrap();
    let err = match Pipeline::from_config(config) {
        Ok(_) => panic!("placeholder key must be rejected"),
        Err(e) => e,
    };
    assert!(err.is_credential());
}
