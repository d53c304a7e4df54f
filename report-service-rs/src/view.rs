// report-service-rs/src/view.rs
// View rendering collaborator and HTML minification

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use assistant_sdk::util::truncate_string;

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Renders a named view display to HTML
#[async_trait]
pub trait ViewRenderer: Send + Sync {
    /// Minified HTML, or an empty string when the view is unknown
    async fn render(&self, view_name: &str, display_id: &str) -> String;
}

/// Strip comments, collapse every whitespace run to one space and trim both ends
pub fn minify_html(html: &str) -> String {
    let without_comments = COMMENT_RE.replace_all(html, "");
    WHITESPACE_RE
        .replace_all(&without_comments, " ")
        .trim()
        .to_string()
}

/// Reads `<views_dir>/<view_name>/<display_id>.html`
#[derive(Debug, Clone)]
pub struct FileViewRenderer {
    views_dir: PathBuf,
}

impl FileViewRenderer {
    pub fn new(views_dir: impl Into<PathBuf>) -> Self {
        Self {
            views_dir: views_dir.into(),
        }
    }

    fn view_path(&self, view_name: &str, display_id: &str) -> Option<PathBuf> {
        if !is_plain_segment(view_name) || !is_plain_segment(display_id) {
            return None;
        }
        Some(self.views_dir.join(view_name).join(format!("{}.html", display_id)))
    }
}

fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && Path::new(segment).components().count() == 1
        && !segment.contains(['/', '\\'])
}

#[async_trait]
impl ViewRenderer for FileViewRenderer {
    async fn render(&self, view_name: &str, display_id: &str) -> String {
        info!("Rendering view {} display {}", view_name, display_id);

        let Some(path) = self.view_path(view_name, display_id) else {
            warn!("Rejected view name {} / display {}", view_name, display_id);
            return String::new();
        };

        match tokio::fs::read_to_string(&path).await {
            Ok(html) => {
                let minified = minify_html(&html);
                info!("View HTML extracted and minified: {}", truncate_string(&minified, 1000));
                minified
            }
            Err(e) => {
                error!("No view found at {}: {}", path.display(), e);
                String::new()
            }
        }
    }
}
