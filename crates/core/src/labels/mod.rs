//! Label chips for related issue and merge request items.
//!
//! Two chip shapes mirror GitLab's own label component:
//!
//! - **plain**: one coloured segment with the full title
//! - **scoped**: the scope on the label colour, followed by the name on the
//!   chip's inset background
//!
//! Chips link to the project's list filtered by the label.

use gitlab_focus_host_data::LabelDescriptor;
use log::debug;

use crate::config::FocusConfig;
use crate::dom::{Fragment, HostElement};
use crate::errors::{Error, Result};

/// Tooltip header GitLab shows above scoped label descriptions.
pub const SCOPED_TOOLTIP_HEADER: &str =
    "<span class='font-weight-bold scoped-label-tooltip-title'>Scoped label</span><br />";

const WHITE: &str = "#FFFFFF";

/// Layout classes that keep item rows from wrapping the label area.
const CONTENTS_NOWRAP_CLASS: &str = "flex-xl-nowrap";
const META_JUSTIFY_CLASSES: [&str; 2] = ["justify-content-start", "justify-content-md-between"];

const LABELS_AREA_CLASSES: [&str; 10] = [
    "item-label-area",
    "item-path-id",
    "d-flex",
    "align-items-center",
    "mr-2",
    "mt-2",
    "mt-xl-0",
    "ml-xl-2",
    "flex-grow",
    "justify-content-end",
];

/// URL of the list filtered by `title`: the item link up to its last `/`,
/// so `.../issues/42` filters `.../issues`.
pub fn label_filter_url(item_link: &str, title: &str) -> String {
    let base = item_link.rfind('/').map_or("", |i| &item_link[..i]);
    format!("{}?label_name={}", base, urlencoding::encode(title))
}

pub fn plain_tooltip(description: Option<&str>) -> String {
    description.unwrap_or_default().to_string()
}

pub fn scoped_tooltip(description: Option<&str>) -> String {
    match description {
        Some(description) => format!("{SCOPED_TOOLTIP_HEADER}{description}"),
        None => String::new(),
    }
}

/// Colour of the name segment of a scoped chip.
///
/// The name sits on the chip's light inset background rather than on the
/// label colour, so white text would vanish; it takes the label colour
/// instead.
pub fn scoped_title_color(label: &LabelDescriptor) -> &str {
    if label.text_color.eq_ignore_ascii_case(WHITE) {
        &label.color
    } else {
        &label.text_color
    }
}

fn label_link(label: &LabelDescriptor, item_link: &str, tooltip: String) -> Fragment {
    Fragment::new("a")
        .classes(["gl-link", "gl-label-link", "has-tooltip"])
        .attr("data-html", "true")
        .attr("data-title", tooltip)
        .attr("href", label_filter_url(item_link, &label.title))
        .attr("data-original-title", "")
        .attr("title", "")
        .attr("data-original", format!("~{}", label.id))
        .attr(
            "data-project",
            label.project_id.map(|id| id.to_string()).unwrap_or_default(),
        )
        .attr("data-label", label.id.to_string())
}

fn label_text(color: &str, text: &str) -> Fragment {
    Fragment::new("span")
        .class("gl-label-text")
        .attr("data-container", "body")
        .attr("data-html", "true")
        .style("background-color", color)
        .text(text)
}

/// Builds the chip for one label, plain or scoped depending on its title.
pub fn label_fragment(label: &LabelDescriptor, item_link: &str) -> Fragment {
    match label.scope_parts() {
        None => Fragment::new("span")
            .classes(["gl-label", "gl-label-sm"])
            .style("color", &label.text_color)
            .child(
                label_link(label, item_link, plain_tooltip(label.description.as_deref()))
                    .child(label_text(&label.color, &label.title)),
            ),
        Some((scope, name)) => Fragment::new("span")
            .classes(["gl-label", "gl-label-scoped", "gl-label-sm"])
            .style(
                "--label-inset-border",
                format!("inset 0 0 0 1px {}", label.color),
            )
            .style("color", &label.text_color)
            .child(
                label_link(label, item_link, scoped_tooltip(label.description.as_deref()))
                    .child(label_text(&label.color, scope))
                    .child(
                        Fragment::new("span")
                            .class("gl-label-text-scoped")
                            .attr("data-container", "body")
                            .attr("data-html", "true")
                            .style("color", scoped_title_color(label))
                            .text(name),
                    ),
            ),
    }
}

/// Non-breaking space between chips.
pub fn spacer() -> Fragment {
    Fragment::new("span").text("\u{a0}")
}

pub fn labels_area(config: &FocusConfig) -> Fragment {
    Fragment::new("div")
        .class(&config.classes.labels_area)
        .classes(LABELS_AREA_CLASSES)
}

/// Inserts a labels area into `item` and fills it with chips.
///
/// Returns the area, or `Ok(None)` when there is nothing to add (no labels,
/// or the item already carries an area). `Err(MissingAnchor)` means neither
/// layout the host uses was found.
pub fn render_labels<E: HostElement>(
    item: &E,
    item_link: &str,
    labels: &[LabelDescriptor],
    config: &FocusConfig,
) -> Result<Option<E>> {
    if labels.is_empty() {
        debug!("No labels for {}", item_link);
        return Ok(None);
    }
    let area_selector = format!(".{}", config.classes.labels_area);
    if item.query(&area_selector).is_some() {
        debug!("Labels area already present for {}", item_link);
        return Ok(None);
    }

    let selectors = &config.selectors;
    let path_area = item.query(&selectors.item_path_area);
    let meta = item.query(&selectors.item_meta);
    if path_area.is_none() && meta.is_none() {
        return Err(Error::MissingAnchor);
    }

    if let Some(contents) = item.query(&selectors.item_contents) {
        contents.remove_class(CONTENTS_NOWRAP_CLASS);
    }
    if let Some(meta) = &meta {
        for class in META_JUSTIFY_CLASSES {
            meta.remove_class(class);
        }
    }

    let area = match (path_area, meta) {
        (Some(path_area), _) => path_area.insert_after(&labels_area(config)),
        (None, Some(meta)) => meta.append(&labels_area(config)),
        (None, None) => None,
    };
    let Some(area) = area else {
        return Err(Error::MissingAnchor);
    };

    for label in labels {
        area.append(&label_fragment(label, item_link));
        area.append(&spacer());
    }
    debug!("Rendered {} labels for {}", labels.len(), item_link);
    Ok(Some(area))
}
