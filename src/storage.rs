use crate::core::deck::CachePayload;
use crate::error::CrawlerResult;
use serde_json::{Map, Value};
use std::fs;
use std::io::{BufWriter, Write};
use std::ops::Deref;
use std::path::Path;
use tracing::{info, warn};

type Underlying = Map<String, Value>;

// Previously written cache, kept as loose json so that older or partially
// compatible files can still be reported on.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorCache(Underlying);

impl PriorCache {
    /// Matches held by the cache, from the `matches` array or else the
    /// `totalMatches` field.
    pub fn match_count(&self) -> usize {
        match (self.get("matches"), self.get("totalMatches")) {
            (Some(Value::Array(matches)), _) => matches.len(),
            (_, Some(total)) => total.as_u64().unwrap_or_default() as usize,
            (_, _) => 0,
        }
    }

    pub fn fetched_at(&self) -> Option<&str> {
        self.get("fetchedAt").and_then(Value::as_str)
    }
}

impl Deref for PriorCache {
    type Target = Underlying;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Load the cache at `path`. Missing and unreadable files both give `None`.
pub fn load(path: &Path) -> Option<PriorCache> {
    if !path.exists() {
        return None;
    }
    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(Value::Object(map)) => Some(PriorCache(map)),
        Ok(_) => {
            warn!("Ignoring cache {}, not a json object.", path.display());
            None
        }
        Err(e) => {
            warn!("Failed to read existing cache {}. {e}", path.display());
            None
        }
    }
}

/// Replace the cache at `path` with `payload`. The content goes to a temporary
/// sibling first and is renamed over the target once complete, the temporary
/// file is removed if anything fails before that.
pub fn save(path: &Path, payload: &CachePayload) -> CrawlerResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = tempfile::Builder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, payload)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    info!(
        "Wrote {} matches to {}.",
        payload.total_matches,
        path.display()
    );
    Ok(())
}
