//! Video reference parsing and target-URL building.
//!
//! The control panel stores whatever link shape the user pasted (watch page,
//! short link, embed, shorts). The watcher normalises that to a video ID and
//! rebuilds a full-page watch URL from it — loading the native watch page
//! directly sidesteps embed restrictions that break iframe playback on some
//! videos.

use once_cell::sync::Lazy;
use regex::Regex;

static VIDEO_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([^&\n?#/]+)")
            .expect("static pattern"),
        Regex::new(r"youtube\.com/shorts/([^&\n?#/]+)").expect("static pattern"),
    ]
});

/// Extract the video ID from any supported link shape.
pub fn extract_video_id(url: &str) -> Option<&str> {
    for pattern in VIDEO_ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url) {
            return caps.get(1).map(|m| m.as_str());
        }
    }
    None
}

/// Whether `url` is a recognisable video reference.
pub fn is_video_url(url: &str) -> bool {
    extract_video_id(url).is_some()
}

/// Build the full-page watch URL for a video ID.
///
/// When `frontend_base` is set (an alternate privacy frontend such as an
/// Invidious instance), the watch page is built against that host instead of
/// youtube.com.
pub fn watch_url(video_id: &str, frontend_base: Option<&str>) -> String {
    match frontend_base {
        Some(base) => format!("{}/watch?v={video_id}", base.trim_end_matches('/')),
        None => format!("https://www.youtube.com/watch?v={video_id}"),
    }
}

/// Resolve an arbitrary stored video reference into the full-page target URL.
pub fn full_page_target(url: &str, frontend_base: Option<&str>) -> Option<String> {
    extract_video_id(url).map(|id| watch_url(id, frontend_base))
}
