use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("openfield"),
            )
        } else {
            ProjectDirs::from("", "", "openfield").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// Where exported reports go when neither the CLI nor the config names a place
    pub fn report_dir() -> PathBuf {
        ProjectDirs::from("", "", "openfield")
            .map(|pd| pd.data_dir().join("reports"))
            .unwrap_or_else(|| PathBuf::from("reports"))
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir()
            .map(|dir| dir.join("openfield.log"))
            .unwrap_or_else(|| PathBuf::from("openfield.log"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_have_expected_file_names() {
        assert!(AppDirs::report_dir().ends_with("reports"));
        assert_eq!(
            AppDirs::log_path().file_name().and_then(|n| n.to_str()),
            Some("openfield.log")
        );
    }
}
