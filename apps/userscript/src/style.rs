//! Static styling injected once at startup.

use anyhow::anyhow;
use web_sys::Document;

use crate::dom::describe;

const STYLE: &str = include_str!("style.css");
const STYLE_ELEMENT_ID: &str = "gitlab-focus-style";

/// Adds the `<style>` block unless an earlier load already did.
pub fn inject(document: &Document) -> anyhow::Result<()> {
    if document.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
        return Ok(());
    }
    let style = document
        .create_element("style")
        .map_err(|e| anyhow!("Failed to create style element: {}", describe(&e)))?;
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(STYLE));

    let parent: web_sys::Node = match (document.head(), document.body()) {
        (Some(head), _) => head.into(),
        (None, Some(body)) => body.into(),
        (None, None) => return Err(anyhow!("Document has neither head nor body")),
    };
    parent
        .append_child(&style)
        .map_err(|e| anyhow!("Failed to inject style: {}", describe(&e)))?;
    Ok(())
}
