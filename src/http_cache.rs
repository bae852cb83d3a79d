use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{
    ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT,
};
use serde::{Deserialize, Serialize};

const CACHE_VERSION: u32 = 1;
const CACHE_DIR: &str = "gridiron_props";
const CACHE_FILE: &str = "http_cache.json";
pub const USER_AGENT_VALUE: &str = "gridiron-props/0.1";

static CACHE: Mutex<Option<CacheState>> = Mutex::new(None);

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct HttpCacheFile {
    version: u32,
    entries: HashMap<String, CacheEntry>,
}

#[derive(Debug, Default)]
struct CacheState {
    file: HttpCacheFile,
    dirty: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    body: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// GET a JSON body, revalidating against a previously cached copy with
/// `If-None-Match` / `If-Modified-Since`. Completed game summaries rarely
/// change, so a 304 is the common case on re-runs.
pub fn fetch_json_cached(client: &Client, url: &str) -> Result<String> {
    let cached_entry = with_cache(|state| state.file.entries.get(url).cloned());

    let mut req = client.get(url).header(USER_AGENT, USER_AGENT_VALUE);
    if let Some(entry) = cached_entry.as_ref() {
        if let Some(etag) = entry.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().context("request failed")?;
    let status = resp.status();
    let headers = resp.headers().clone();
    if status == StatusCode::NOT_MODIFIED {
        if let Some(entry) = cached_entry {
            tracing::trace!(url, "http cache revalidated");
            return Ok(entry.body);
        }
        return Err(anyhow::anyhow!("received 304 without cache body"));
    }

    let body = resp.text().context("failed reading body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, snippet(&body)));
    }

    let header_value = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    };
    let entry = CacheEntry {
        body: body.clone(),
        etag: header_value(ETAG),
        last_modified: header_value(LAST_MODIFIED),
        fetched_at: system_time_to_secs(SystemTime::now()).unwrap_or_default(),
    };
    if entry.etag.is_some() || entry.last_modified.is_some() {
        with_cache(|state| {
            state.file.entries.insert(url.to_string(), entry);
            state.dirty = true;
        });
    }
    Ok(body)
}

/// Write pending cache entries to disk. Called once after a fetch batch.
pub fn persist_cache() -> Result<()> {
    with_cache(|state| {
        if !state.dirty {
            return Ok(());
        }
        state.file.version = CACHE_VERSION;
        save_cache_file(&state.file)?;
        state.dirty = false;
        Ok(())
    })
}

/// First 220 chars of a response body on one line, for error messages.
pub fn snippet(body: &str) -> String {
    body.trim()
        .replace(['\n', '\r'], " ")
        .chars()
        .take(220)
        .collect()
}

fn with_cache<R>(action: impl FnOnce(&mut CacheState) -> R) -> R {
    let mut guard = CACHE.lock().unwrap_or_else(PoisonError::into_inner);
    let state = guard.get_or_insert_with(|| CacheState {
        file: load_cache_file(),
        dirty: false,
    });
    action(state)
}

fn load_cache_file() -> HttpCacheFile {
    let Some(path) = cache_path() else {
        return HttpCacheFile::default();
    };
    let Ok(raw) = fs::read_to_string(path) else {
        return HttpCacheFile::default();
    };
    let cache = serde_json::from_str::<HttpCacheFile>(&raw).unwrap_or_default();
    if cache.version != CACHE_VERSION {
        return HttpCacheFile::default();
    }
    cache
}

fn save_cache_file(cache: &HttpCacheFile) -> Result<()> {
    let Some(path) = cache_path() else {
        return Ok(());
    };
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    fs::create_dir_all(dir).with_context(|| format!("create cache dir {}", dir.display()))?;
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string(cache).context("serialize http cache")?;
    fs::write(&tmp, json).context("write http cache")?;
    fs::rename(&tmp, &path).context("swap http cache")?;
    Ok(())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn cache_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(CACHE_FILE))
}

fn system_time_to_secs(time: SystemTime) -> Option<u64> {
    time.duration_since(UNIX_EPOCH).ok().map(|d| d.as_secs())
}

#[cfg(test)]
mod tests {
    use super::snippet;

    #[test]
    fn snippet_is_single_line_and_bounded() {
        let body = format!("line one\r\nline two {}", "x".repeat(400));
        let out = snippet(&body);
        assert!(!out.contains('\n'));
        assert_eq!(out.chars().count(), 220);
        assert!(out.starts_with("line one  line two"));
    }
}
