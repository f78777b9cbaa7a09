use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::de::Error as _;
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::StudioState;

/// Storage key of the state document; the file stem inside each tenant directory.
pub const STATE_KEY: &str = "pilatesdesk-state";

/// Whole-state JSON document for one tenant.
///
/// The full state is rewritten on every save (temp file + rename). Loading
/// shallow-merges the stored top-level keys over the defaults, so documents
/// written before a field existed still load.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(format!("{STATE_KEY}.json")),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state. A missing, unreadable or malformed document yields the defaults.
    pub fn load(&self) -> StudioState {
        match self.try_load() {
            Ok(Some(state)) => state,
            Ok(None) => StudioState::default(),
            Err(e) => {
                warn!("failed to load {}: {e}; starting from defaults", self.path.display());
                StudioState::default()
            }
        }
    }

    pub fn try_load(&self) -> io::Result<Option<StudioState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        merge_over_defaults(value)
            .map(Some)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn write(&self, state: &StudioState) -> io::Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, state)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&tmp_path, &self.path)
    }
}

/// Top-level keys of `stored` replace those of the default state; unknown and null keys are ignored.
pub fn merge_over_defaults(stored: Value) -> serde_json::Result<StudioState> {
    let Value::Object(stored) = stored else {
        return Err(serde_json::Error::custom("state document is not a JSON object"));
    };
    let mut merged = match serde_json::to_value(StudioState::default())? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in stored {
        if !value.is_null() && merged.contains_key(&key) {
            merged.insert(key, value);
        }
    }
    serde_json::from_value(Value::Object(merged))
}
