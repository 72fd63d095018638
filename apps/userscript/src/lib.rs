//! GitLab Focus browser entry point.
//!
//! Compiled to WebAssembly and loaded into GitLab pages. On start it:
//!
//! 1. reads the optional page config and installs the console logger
//! 2. checks the host against the activation rule
//! 3. injects the stylesheet
//! 4. starts the enrichment pipeline on the page's content block

mod config;
mod dom;
mod logger;
mod spawn;
mod style;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::anyhow;
use gitlab_focus_core::Enricher;
use gitlab_focus_host_data::GitlabProvider;
use log::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::Document;

use config::PageConfig;
use dom::{describe, BrowserDocument};
use spawn::BrowserSpawner;

type PageEnricher = Enricher<BrowserDocument, GitlabProvider, BrowserSpawner>;

thread_local! {
    // The mutation observer only holds a weak reference to the pipeline.
    static ENRICHER: RefCell<Option<Rc<PageEnricher>>> = const { RefCell::new(None) };
}

fn csrf_token(document: &Document) -> Option<String> {
    document
        .query_selector("meta[name=\"csrf-token\"]")
        .ok()
        .flatten()
        .and_then(|meta| meta.get_attribute("content"))
}

fn run() -> anyhow::Result<()> {
    let window = web_sys::window().ok_or_else(|| anyhow!("No window"))?;
    let document = window.document().ok_or_else(|| anyhow!("No document"))?;
    let page_url = window
        .location()
        .href()
        .map_err(|e| anyhow!("Failed to read page URL: {}", describe(&e)))?;

    let (config, config_error) = match PageConfig::read(&document).map(|raw| PageConfig::from_json(&raw)) {
        Some(Ok(config)) => (config, None),
        Some(Err(e)) => (PageConfig::default(), Some(e)),
        None => (PageConfig::default(), None),
    };
    logger::init(config.level_filter());
    if let Some(e) = config_error {
        warn!("Ignoring invalid page config: {:#}", e);
    }

    let focus = config.focus;
    if !focus.activation.matches_url(&page_url) {
        info!("Host of {} is not a GitLab instance, staying inactive", page_url);
        return Ok(());
    }

    style::inject(&document)?;

    let mut provider = GitlabProvider::new(&page_url)?;
    if let Some(token) = csrf_token(&document) {
        provider = provider.with_csrf_token(token);
    }

    let enricher = Enricher::new(BrowserDocument::new(document), provider, BrowserSpawner, focus);
    if enricher.start() {
        ENRICHER.with(|slot| *slot.borrow_mut() = Some(enricher));
    }
    Ok(())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    run().map_err(|e| JsValue::from_str(&format!("gitlab-focus: {:#}", e)))
}
