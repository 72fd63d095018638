//! Enrichment configuration.
//!
//! Defaults encode GitLab's page contract. Every field can be overridden
//! from JSON (camelCase keys); missing keys keep their defaults.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{Error, Result};

/// Selectors for the host page structure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Selectors {
    /// Container whose subtree is observed.
    pub container: String,
    /// Items of the related issues / merge requests lists.
    pub related_item: String,
    /// Icon present inside closed items.
    pub closed_icon: String,
    /// Link inside an item pointing at the issue or MR.
    pub item_link: String,
    pub item_contents: String,
    pub item_meta: String,
    pub item_path_area: String,
    /// Issue count badge of an epic page.
    pub epic_badge: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            container: ".content-block".to_string(),
            related_item: "ul.related-items-list li".to_string(),
            closed_icon: "svg.issue-token-state-icon-closed".to_string(),
            item_link: ".sortable-link".to_string(),
            item_contents: "div.item-contents".to_string(),
            item_meta: "div.item-meta".to_string(),
            item_path_area: "div.item-path-area".to_string(),
            epic_badge: ".issue-count-badge".to_string(),
        }
    }
}

/// Class names this layer adds to host and injected nodes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerClasses {
    pub processed: String,
    pub closed: String,
    pub failed: String,
    pub labels_area: String,
    pub weight: String,
}

impl Default for MarkerClasses {
    fn default() -> Self {
        Self {
            processed: "gitlab-focus-processed".to_string(),
            closed: "gitlab-focus-closed".to_string(),
            failed: "gitlab-focus-failed".to_string(),
            labels_area: "gitlab-focus-labels".to_string(),
            weight: "gitlab-focus-weight".to_string(),
        }
    }
}

/// Which hosts the enrichment activates on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostMatch {
    /// Host names matched exactly.
    pub hosts: Vec<String>,
    /// Host name prefixes, e.g. `git.` for `git.example.org`.
    pub prefixes: Vec<String>,
}

impl Default for HostMatch {
    fn default() -> Self {
        Self {
            hosts: vec!["gitlab.com".to_string()],
            prefixes: vec!["git.".to_string(), "gl.".to_string()],
        }
    }
}

impl HostMatch {
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.hosts.iter().any(|h| h.eq_ignore_ascii_case(&host))
            || self
                .prefixes
                .iter()
                .any(|p| host.starts_with(&p.to_ascii_lowercase()))
    }

    /// Checks the host of an `http(s)` page URL.
    pub fn matches_url(&self, page_url: &str) -> bool {
        Url::parse(page_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .and_then(|url| url.host_str().map(|host| self.matches(host)))
            .unwrap_or(false)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FocusConfig {
    pub selectors: Selectors,
    pub classes: MarkerClasses,
    /// Width of the epic weight progress bar.
    pub weight_bar_width_px: u32,
    pub activation: HostMatch,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            classes: MarkerClasses::default(),
            weight_bar_width_px: 80,
            activation: HostMatch::default(),
        }
    }
}

impl FocusConfig {
    /// Parses a (partial) JSON override on top of the defaults.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::Config(e.to_string()))
    }
}
