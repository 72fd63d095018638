//! GraphQL document and response shapes for the epic weight query.

use serde::{Deserialize, Serialize};

use crate::errors::HostDataError;
use crate::models::{DescendantCounts, EpicRef};

pub(crate) const EPIC_WEIGHT_QUERY: &str = "query epicDescendantWeightSum($groupFullPath: ID!, $epicIid: ID) {
  group(fullPath: $groupFullPath) {
    epic(iid: $epicIid) {
      descendantWeightSum {
        openedIssues
        closedIssues
      }
    }
  }
}";

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: EpicVariables<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EpicVariables<'a> {
    pub group_full_path: &'a str,
    pub epic_iid: String,
}

impl<'a> GraphQlRequest<'a> {
    pub fn epic_weight(epic: &'a EpicRef) -> Self {
        Self {
            query: EPIC_WEIGHT_QUERY,
            variables: EpicVariables {
                group_full_path: &epic.group_path,
                epic_iid: epic.epic_iid.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Data {
    group: Option<Group>,
}

#[derive(Debug, Deserialize)]
struct Group {
    epic: Option<Epic>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Epic {
    descendant_weight_sum: Option<WeightSum>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeightSum {
    opened_issues: Option<u64>,
    closed_issues: Option<u64>,
}

impl GraphQlResponse {
    /// Extracts the counts, turning GraphQL errors and null nodes into errors.
    ///
    /// A present epic with a null weight sum has no weighted descendants and
    /// yields zero counts.
    pub fn into_counts(self, epic: &EpicRef) -> Result<DescendantCounts, HostDataError> {
        if !self.errors.is_empty() {
            return Err(HostDataError::GraphQl {
                messages: self.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        let found = self
            .data
            .and_then(|d| d.group)
            .and_then(|g| g.epic)
            .ok_or_else(|| HostDataError::EpicNotFound {
                group_path: epic.group_path.clone(),
                epic_iid: epic.epic_iid,
            })?;

        let sum = found.descendant_weight_sum;
        Ok(DescendantCounts {
            opened_issues: sum.as_ref().and_then(|s| s.opened_issues).unwrap_or(0),
            closed_issues: sum.as_ref().and_then(|s| s.closed_issues).unwrap_or(0),
        })
    }
}
