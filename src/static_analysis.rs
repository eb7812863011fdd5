use crate::config::LanguageProfile;
use regex::Regex;
use serde::Serialize;

/// Facts derived from a file's text without consulting the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StaticFacts {
    pub has_entry_point: bool,
    /// Import lines, trimmed, in source order. Duplicates are kept.
    pub dependencies: Vec<String>,
}

/// Line scanner for entry-point guards and import statements.
pub struct StaticAnalyzer {
    entry_point_marker: String,
    import_line: Option<Regex>,
    line_break: Regex,
}

/// Every line boundary, not only `\n`: CR-only files and form feeds split too.
const LINE_BREAK: &str = r"\r\n|[\n\r\x0b\x0c\x1c\x1d\x1e\x{85}\x{2028}\x{2029}]";

impl StaticAnalyzer {
    pub fn new(profile: &LanguageProfile) -> Result<Self, regex::Error> {
        let import_line = if profile.import_prefixes.is_empty() {
            None
        } else {
            let alternatives = profile
                .import_prefixes
                .iter()
                .map(|prefix| regex::escape(prefix))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!("^(?:{})", alternatives))?)
        };

        Ok(Self {
            entry_point_marker: profile.entry_point_marker.clone(),
            import_line,
            line_break: Regex::new(LINE_BREAK)?,
        })
    }

    pub fn analyze(&self, content: &str) -> StaticFacts {
        let has_entry_point =
            !self.entry_point_marker.is_empty() && content.contains(&self.entry_point_marker);

        let dependencies = match &self.import_line {
            Some(import_line) => self
                .line_break
                .split(content)
                .map(str::trim)
                .filter(|line| import_line.is_match(line))
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        StaticFacts {
            has_entry_point,
            dependencies,
        }
    }
}
