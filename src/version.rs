//! Update check: one background thread asks the release endpoint for the
//! latest tag and parks the answer where the UI can poll it each frame.

use std::sync::{Arc, OnceLock};
use std::thread;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

const RELEASE_URL: &str = "https://api.github.com/repos/cornifer-map/cornifer/releases/latest";

/// Handle to an in-flight (or finished) update check.
#[derive(Clone, Default)]
pub struct UpdateCheck {
    result: Arc<OnceLock<Option<String>>>,
}

impl UpdateCheck {
    /// Fire off the request on a background thread. Network failures resolve
    /// to "no update"; the editor never blocks on this.
    pub fn spawn() -> UpdateCheck {
        let check = UpdateCheck::default();
        let slot = check.result.clone();
        thread::spawn(move || {
            let latest = fetch_latest_tag(RELEASE_URL).ok();
            let newer = latest.filter(|tag| is_newer(tag, CURRENT_VERSION));
            let _ = slot.set(newer);
        });
        check
    }

    /// The newer version string, once the check finished and found one.
    pub fn newer_version(&self) -> Option<&str> {
        self.result.get().and_then(|v| v.as_deref())
    }
}

fn fetch_latest_tag(url: &str) -> Result<String, Box<dyn std::error::Error>> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(format!("cornifer/{CURRENT_VERSION}"))
        .build()?;
    let body: serde_json::Value = client.get(url).send()?.error_for_status()?.json()?;
    let tag = body
        .get("tag_name")
        .and_then(|t| t.as_str())
        .ok_or("release response has no tag_name")?;
    Ok(tag.trim_start_matches('v').to_string())
}

/// Compare dotted numeric versions; unparsable segments count as zero.
fn is_newer(candidate: &str, current: &str) -> bool {
    let parse = |v: &str| -> Vec<u32> {
        v.split('.')
            .map(|s| s.trim().parse::<u32>().unwrap_or(0))
            .collect()
    };
    let a = parse(candidate);
    let b = parse(current);
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        if x != y {
            return x > y;
        }
    }
    false
}
