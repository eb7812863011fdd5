use crate::config::LanguageProfile;
use crate::error::{Error, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Finds the files of the target language under a root directory.
///
/// Entries are visited sorted by file name within each directory, so two
/// runs over an unchanged tree return the same sequence. That sequence is
/// the section order of the report.
pub struct SourceLocator {
    profile: LanguageProfile,
    respect_gitignore: bool,
}

impl SourceLocator {
    pub fn new(profile: LanguageProfile, respect_gitignore: bool) -> Self {
        Self {
            profile,
            respect_gitignore,
        }
    }

    pub fn discover(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(Error::directory_not_found(root));
        }

        let files = if self.respect_gitignore {
            self.walk_filtered(root)
        } else {
            self.walk_all(root)?
        };

        debug!("Discovered {} .{} files under {}", files.len(), self.profile.extension, root.display());
        Ok(files)
    }

    fn walk_all(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(Error::Walk {
                        path: root.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if is_candidate(entry.file_type(), entry.path()) && self.profile.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn walk_filtered(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();

        let walker = WalkBuilder::new(root)
            .standard_filters(true)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let candidate = entry
                .file_type()
                .map(|t| is_candidate(t, entry.path()))
                .unwrap_or(false);
            if candidate && self.profile.matches(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files
    }
}

/// Regular files, plus symlinks that do not lead to a directory. A dangling
/// link stays in so its read failure shows up in the report.
fn is_candidate(file_type: std::fs::FileType, path: &Path) -> bool {
    file_type.is_file() || (file_type.is_symlink() && !path.is_dir())
}
