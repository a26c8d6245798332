// Keeps the watermark across restarts.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::forms::*;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollState {
    pub watermark: Option<NaiveDateTime>,
}

/// A missing state file means nothing has been seen yet.
pub fn load(path: &str) -> FormResult<Watermark> {
    if !Path::new(path).exists() {
        info!("No state file at {}, starting from the beginning", path);
        return Ok(Watermark::NONE);
    }
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let state: PollState = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let watermark = match state.watermark {
        Some(ts) => Watermark::at(ts),
        None => Watermark::NONE,
    };
    info!("Resuming after {}", watermark);
    Ok(watermark)
}

/// Writes a sibling file first and renames it, so a crash never leaves half a file.
pub fn save(path: &str, watermark: Watermark) -> FormResult<()> {
    let state = PollState {
        watermark: watermark.value(),
    };
    let js = serde_json::to_string_pretty(&state).context(ParsingJsonSnafu {})?;
    let tmp_path = format!("{}.tmp", path);
    fs::write(&tmp_path, js).context(WritingFileSnafu {
        path: tmp_path.as_str(),
    })?;
    fs::rename(&tmp_path, path).context(WritingFileSnafu { path })?;
    debug!("save: watermark {} -> {}", watermark, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        assert_eq!(load(path.to_str().unwrap()).unwrap(), Watermark::NONE);
    }

    #[test]
    fn saved_watermark_is_resumed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let path = path.to_str().unwrap();
        let ts = TimestampField::new("Timestamp")
            .parse_str("11/15/2025 10:03:00")
            .unwrap();
        save(path, Watermark::at(ts)).unwrap();
        assert_eq!(load(path).unwrap(), Watermark::at(ts));
        assert!(!Path::new(&format!("{}.tmp", path)).exists());

        save(path, Watermark::NONE).unwrap();
        assert_eq!(load(path).unwrap(), Watermark::NONE);
    }

    #[test]
    fn corrupt_state_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "watermark: yesterday").unwrap();
        assert!(matches!(
            load(path.to_str().unwrap()),
            Err(FormError::ParsingJson { .. })
        ));
    }
}
