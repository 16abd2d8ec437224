use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One camera to record.
///
/// `name` is non-empty, carries no whitespace and is unique within a config;
/// it prefixes every recording file of this camera.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraSpec {
    pub name: String,
    pub source_url: String,
}

impl CameraSpec {
    pub fn new(name: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_url: source_url.into(),
        }
    }
}

/// Reads and parses a `cameras.config` file.
pub fn load_cameras(path: impl AsRef<Path>) -> Result<Vec<CameraSpec>, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cameras(&text)
}

/// Parses the line-oriented camera config.
///
/// Format: one `<name> <url>` pair per line, separated by whitespace.
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_cameras(text: &str) -> Result<Vec<CameraSpec>, ConfigError> {
    let mut cameras = Vec::new();
    let mut seen = HashSet::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let [name, url] = tokens.as_slice() else {
            return Err(ConfigError::MalformedLine {
                line: idx + 1,
                content: raw.to_string(),
            });
        };

        if !seen.insert(*name) {
            return Err(ConfigError::DuplicateName {
                name: name.to_string(),
                line: idx + 1,
            });
        }
        cameras.push(CameraSpec::new(*name, *url));
    }
    Ok(cameras)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_and_skips_comments() {
        let text = "\
# front of the house
porch rtsp://10.0.0.2/stream1

   
garage\trtsp://10.0.0.3/live
  # indented comment
";
        let cameras = parse_cameras(text).unwrap();
        assert_eq!(
            cameras,
            vec![
                CameraSpec::new("porch", "rtsp://10.0.0.2/stream1"),
                CameraSpec::new("garage", "rtsp://10.0.0.3/live"),
            ]
        );
    }

    #[test]
    fn empty_config_yields_no_cameras() {
        assert!(parse_cameras("").unwrap().is_empty());
        assert!(parse_cameras("# nothing here\n\n").unwrap().is_empty());
    }

    #[test]
    fn rejects_single_token_line() {
        let err = parse_cameras("porch rtsp://a\nlonely\n").unwrap_err();
        match err {
            ConfigError::MalformedLine { line, content } => {
                assert_eq!(line, 2);
                assert_eq!(content, "lonely");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_three_token_line() {
        let err = parse_cameras("porch rtsp://a extra").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_names() {
        let err = parse_cameras("a rtsp://one\nb rtsp://two\na rtsp://three\n").unwrap_err();
        match err {
            ConfigError::DuplicateName { name, line } => {
                assert_eq!(name, "a");
                assert_eq!(line, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            parse_cameras("a x\na y").unwrap_err().as_label(),
            "config_duplicate_name"
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cameras(dir.path().join("cameras.config")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cameras.config");
        fs::write(&path, "porch rtsp://10.0.0.2/s\n").unwrap();

        let cameras = load_cameras(&path).unwrap();
        assert_eq!(cameras.len(), 1);
        assert_eq!(cameras[0].name, "porch");
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_string(&CameraSpec::new("porch", "rtsp://a")).unwrap();
        assert_eq!(json, r#"{"name":"porch","sourceUrl":"rtsp://a"}"#);
    }
}
