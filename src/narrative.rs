use crate::chunker::{AnalysisUnit, UnitPosition};
use crate::config::LanguageProfile;
use crate::llm::NarrativeService;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, warn};

/// Outcome of analyzing one unit. Both variants carry non-empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "text", rename_all = "snake_case")]
pub enum AnalysisResult {
    Narrative(String),
    Failed(String),
}

impl AnalysisResult {
    pub fn text(&self) -> &str {
        match self {
            Self::Narrative(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitResult {
    pub position: UnitPosition,
    pub result: AnalysisResult,
}

/// Asks the narrative service about each unit of a file. Service failures
/// stay inside the unit they happened in.
pub struct NarrativeAnalyzer<S> {
    service: S,
    fence: String,
    entry_point_marker: String,
}

impl<S: NarrativeService> NarrativeAnalyzer<S> {
    pub fn new(service: S, profile: &LanguageProfile) -> Self {
        Self {
            service,
            fence: profile.fence.clone(),
            entry_point_marker: profile.entry_point_marker.clone(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Analyze all units of one file, one request at a time, in order.
    pub async fn analyze_file(&self, path: &Path, units: &[AnalysisUnit<'_>]) -> Vec<UnitResult> {
        let mut results = Vec::with_capacity(units.len());
        for unit in units {
            results.push(UnitResult {
                position: unit.position,
                result: self.analyze_unit(path, unit).await,
            });
        }
        results
    }

    pub async fn analyze_unit(&self, path: &Path, unit: &AnalysisUnit<'_>) -> AnalysisResult {
        let prompt = self.build_prompt(path, unit);
        debug!(file = %path.display(), position = ?unit.position, chars = prompt.len(), "sending unit");

        match self.service.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => AnalysisResult::Narrative(text),
            Ok(_) => self.failure(path, unit.position, "service returned an empty response"),
            Err(e) => self.failure(path, unit.position, &e.to_string()),
        }
    }

    fn failure(&self, path: &Path, position: UnitPosition, error: &str) -> AnalysisResult {
        warn!(file = %path.display(), position = ?position, "narrative analysis failed: {}", error);
        let message = match position {
            UnitPosition::Whole => format!(
                "Error analyzing {} with {}: {}",
                path.display(),
                self.service.name(),
                error
            ),
            UnitPosition::Chunk { .. } => format!("Error analyzing chunk: {}", error),
        };
        AnalysisResult::Failed(message)
    }

    /// Whole-file prompts ask for entry point and dependencies too; chunk
    /// prompts leave those to the static analyzer.
    pub fn build_prompt(&self, path: &Path, unit: &AnalysisUnit<'_>) -> String {
        let path = path.display();
        let fence = &self.fence;
        let code = unit.text;

        match unit.position {
            UnitPosition::Whole => {
                let entry_hint = if self.entry_point_marker.is_empty() {
                    String::new()
                } else {
                    format!(" (e.g., contains `{}`)", self.entry_point_marker)
                };
                format!(
                    r#"Analyze the following {fence} code from the file '{path}':

```{fence}
{code}
```

Provide a brief, one-paragraph summary of the file's purpose.
Then, identify the following:
- **Main Functions:** List the key functions and their primary roles.
- **Classes:** List the classes and their responsibilities.
- **Entry Point:** State whether this file appears to be a potential entry point{entry_hint}.
- **Dependencies:** What other files in the project does this file seem to depend on?
"#
                )
            }
            UnitPosition::Chunk { index, total } => {
                let number = index + 1;
                format!(
                    r#"The following is chunk {number} of {total} for the file '{path}'.
Please analyze this specific chunk of {fence} code. Focus only on the code provided in this chunk.

```{fence}
{code}
```

Provide a brief summary of this chunk's purpose.
Then, identify the following within this chunk:
- **Main Functions:** List any functions defined or called.
- **Classes:** List any classes defined.
"#
                )
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::error::ServiceError;
    use crate::llm::NarrativeService;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Test double: echoes a canned summary, fails any prompt containing
    /// one of the configured markers, and records every prompt it sees.
    #[derive(Default)]
    pub struct ScriptedService {
        fail_markers: Vec<String>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedService {
        pub fn failing_on(markers: &[&str]) -> Self {
            Self {
                fail_markers: markers.iter().map(|m| m.to_string()).collect(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl NarrativeService for ScriptedService {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
            let n = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            if self.fail_markers.iter().any(|m| prompt.contains(m.as_str())) {
                return Err(ServiceError::Api {
                    status: 503,
                    body: "upstream unavailable".to_string(),
                });
            }
            Ok(format!("summary #{n}"))
        }
    }
}
