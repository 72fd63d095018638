//! Page-level configuration.
//!
//! A page (or a loader that injects this script) can override the defaults
//! with a JSON block:
//!
//! ```html
//! <script type="application/json" id="gitlab-focus-config">
//!   {"logLevel": "debug", "selectors": {"container": "#content-body"}}
//! </script>
//! ```
//!
//! Every key of [`FocusConfig`] is accepted at the top level, next to
//! `logLevel`.

use gitlab_focus_core::FocusConfig;
use log::LevelFilter;
use serde::Deserialize;
use web_sys::Document;

use crate::logger;

pub const CONFIG_ELEMENT_ID: &str = "gitlab-focus-config";

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageConfig {
    #[serde(flatten)]
    pub focus: FocusConfig,
    /// `error`, `warn`, `info`, `debug`, `trace` or `off`.
    pub log_level: Option<String>,
}

impl PageConfig {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Raw JSON of the config block, if the page has one.
    pub fn read(document: &Document) -> Option<String> {
        document
            .get_element_by_id(CONFIG_ELEMENT_ID)
            .and_then(|element| element.text_content())
            .filter(|raw| !raw.trim().is_empty())
    }

    pub fn level_filter(&self) -> LevelFilter {
        self.log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or_else(logger::default_level)
    }
}
