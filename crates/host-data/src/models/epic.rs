use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

lazy_static! {
    /// `.../groups/<full path>/-/epics/<iid>` with an optional trailing section.
    static ref EPIC_PATH: Regex =
        Regex::new(r"^(?:/.*?)?/groups/(?P<group>[^?#]+?)/-/epics/(?P<iid>\d+)(?:/.*)?$")
            .expect("Invalid regex pattern");
}

/// Identifies the epic shown on the current page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicRef {
    /// Scheme, host and port of the page, e.g. `https://gitlab.com`.
    pub origin: String,
    /// Full path of the owning group, subgroups included.
    pub group_path: String,
    pub epic_iid: u64,
}

impl EpicRef {
    /// Parses the page URL. Returns `None` when the page is not an epic page,
    /// which disables the aggregate feature for the whole page.
    pub fn from_page_url(page_url: &str) -> Option<Self> {
        let url = Url::parse(page_url).ok()?;
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let captures = EPIC_PATH.captures(url.path())?;
        let epic_iid = captures["iid"].parse().ok()?;

        Some(Self {
            origin: url.origin().ascii_serialization(),
            group_path: captures["group"].to_string(),
            epic_iid,
        })
    }

    pub fn graphql_endpoint(&self) -> String {
        format!("{}/api/graphql", self.origin)
    }
}

/// Issue counts below an epic, as summed by GitLab's `descendantWeightSum`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescendantCounts {
    pub opened_issues: u64,
    pub closed_issues: u64,
}
