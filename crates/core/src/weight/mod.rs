//! Epic weight progress widget.

use gitlab_focus_host_data::DescendantCounts;
use log::debug;

use crate::config::FocusConfig;
use crate::dom::{Fragment, HostElement};

/// Completion of an epic's descendant issues.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightSummary {
    pub opened_issues: u64,
    pub closed_issues: u64,
    pub total: u64,
    /// Share of closed issues in `[0, 100]`, unrounded.
    pub percent: f64,
}

impl WeightSummary {
    pub fn new(opened_issues: u64, closed_issues: u64) -> Self {
        let total = opened_issues.saturating_add(closed_issues);
        let percent = if total == 0 {
            0.0
        } else {
            (100.0 * closed_issues as f64 / total as f64).clamp(0.0, 100.0)
        };
        Self {
            opened_issues,
            closed_issues,
            total,
            percent,
        }
    }

    /// Percent as shown in the label. The bar keeps the unrounded value.
    pub fn rounded_percent(&self) -> u32 {
        self.percent.round() as u32
    }
}

impl From<DescendantCounts> for WeightSummary {
    fn from(counts: DescendantCounts) -> Self {
        Self::new(counts.opened_issues, counts.closed_issues)
    }
}

/// Total, a fixed-width progress bar and the rounded percentage.
pub fn weight_fragment(summary: &WeightSummary, bar_width_px: u32, class: &str) -> Fragment {
    Fragment::new("span")
        .class(class)
        .classes(["d-inline-flex", "align-items-center", "ml-2"])
        .attr(
            "title",
            format!("{} of {} issues closed", summary.closed_issues, summary.total),
        )
        .child(
            Fragment::new("span")
                .class(format!("{class}-total"))
                .text(summary.total.to_string()),
        )
        .child(
            Fragment::new("div")
                .classes(["progress", "mx-2"])
                .style("width", format!("{bar_width_px}px"))
                .child(
                    Fragment::new("div")
                        .classes(["progress-bar", "bg-success"])
                        .attr("role", "progressbar")
                        .style("width", format!("{}%", summary.percent)),
                ),
        )
        .child(
            Fragment::new("span")
                .class(format!("{class}-percent"))
                .text(format!("{}%", summary.rounded_percent())),
        )
}

/// Inserts the widget right after the epic's issue count badge.
pub fn render_weight<E: HostElement>(
    badge: &E,
    summary: &WeightSummary,
    config: &FocusConfig,
) -> Option<E> {
    let widget = badge.insert_after(&weight_fragment(
        summary,
        config.weight_bar_width_px,
        &config.classes.weight,
    ));
    match &widget {
        Some(_) => debug!(
            "Rendered epic weight {}/{} ({}%)",
            summary.closed_issues,
            summary.total,
            summary.rounded_percent()
        ),
        None => debug!("Epic badge has no parent, weight widget skipped"),
    }
    widget
}
