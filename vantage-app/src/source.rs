//! Model sources: where a PLY file comes from and how to reach it.

use regex::Regex;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Bundled sample shipped with the repository.
pub const SAMPLE_PATH: &str = "assets/sample.ply";

/// Fixed fallback used only when the bundled sample fails to load.
pub const SAMPLE_FALLBACK_URL: &str =
    "https://raw.githubusercontent.com/mrdoob/three.js/master/examples/models/ply/ascii/dolphins.ply";

static DRIVE_FILE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[-\w]{25,}").expect("literal pattern is always valid"));

/// Origin of a model to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    LocalFile { path: PathBuf },
    RemoteUrl { url: String },
    Sample,
}

/// A resolved fetch locator handed to the load dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Path(PathBuf),
    Url(String),
}

impl ModelSource {
    /// Human-readable name shown in the model-info line.
    pub fn display_name(&self) -> String {
        match self {
            ModelSource::LocalFile { path } => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ModelSource::RemoteUrl { .. } => "Model from URL".to_string(),
            ModelSource::Sample => "Sample Model".to_string(),
        }
    }

    /// Resolve to the locator the dispatcher fetches from.
    pub fn locator(&self) -> Locator {
        match self {
            ModelSource::LocalFile { path } => Locator::Path(path.clone()),
            ModelSource::RemoteUrl { url } => Locator::Url(normalize_url(url)),
            ModelSource::Sample => Locator::Path(PathBuf::from(SAMPLE_PATH)),
        }
    }
}

/// Case-insensitive check for the `.ply` suffix.
pub fn has_ply_extension(name: &str) -> bool {
    name.to_lowercase().ends_with(".ply")
}

/// Rewrite Google Drive share links to the direct-download endpoint.
/// Any other URL passes through unchanged.
pub fn normalize_url(url: &str) -> String {
    if url.contains("drive.google.com") {
        if let Some(file_id) = DRIVE_FILE_ID.find(url) {
            return format!(
                "https://drive.google.com/uc?export=download&id={}",
                file_id.as_str()
            );
        }
    }
    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ply_extension_is_case_insensitive() {
        assert!(has_ply_extension("scan.ply"));
        assert!(has_ply_extension("scan.PLY"));
        assert!(has_ply_extension("scan.Ply"));
        assert!(!has_ply_extension("scan.txt"));
        assert!(!has_ply_extension("ply"));
    }

    #[test]
    fn drive_share_link_is_rewritten() {
        let url = "https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRsTuVwXyZ01234/view?usp=sharing";
        assert_eq!(
            normalize_url(url),
            "https://drive.google.com/uc?export=download&id=1aBcDeFgHiJkLmNoPqRsTuVwXyZ01234"
        );
    }

    #[test]
    fn non_drive_url_passes_through() {
        let url = "https://example.com/models/lucy.ply";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn drive_url_without_long_id_passes_through() {
        let url = "https://drive.google.com/drive/shared";
        assert_eq!(normalize_url(url), url);
    }

    #[test]
    fn remote_url_locator_is_normalized() {
        let source = ModelSource::RemoteUrl {
            url: "https://drive.google.com/file/d/1aBcDeFgHiJkLmNoPqRsTuVwXyZ01234/view".into(),
        };
        assert_eq!(
            source.locator(),
            Locator::Url(
                "https://drive.google.com/uc?export=download&id=1aBcDeFgHiJkLmNoPqRsTuVwXyZ01234"
                    .into()
            )
        );
    }

    #[test]
    fn sample_resolves_to_bundled_path() {
        assert_eq!(
            ModelSource::Sample.locator(),
            Locator::Path(PathBuf::from(SAMPLE_PATH))
        );
        assert_eq!(ModelSource::Sample.display_name(), "Sample Model");
    }

    #[test]
    fn local_file_displays_its_file_name() {
        let source = ModelSource::LocalFile {
            path: PathBuf::from("/tmp/models/bunny.ply"),
        };
        assert_eq!(source.display_name(), "bunny.ply");
    }
}
