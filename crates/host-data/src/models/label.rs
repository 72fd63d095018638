use serde::{Deserialize, Serialize};

use crate::errors::HostDataError;

/// Separator between the scope and the name of a scoped label.
pub const SCOPE_DELIMITER: &str = "::";

/// A label as returned by the issue/MR JSON endpoint.
///
/// `project_id` is not part of the label objects on the wire; it is copied
/// from the enclosing response by [`IssueLabels::from_json`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDescriptor {
    pub id: u64,
    pub title: String,
    /// Background colour, e.g. `#428BCA`.
    pub color: String,
    /// Foreground colour chosen by GitLab for `color`.
    pub text_color: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
}

impl LabelDescriptor {
    /// Splits a scoped title at the first delimiter into `(scope, name)`.
    ///
    /// Returns `None` for plain labels. Anything after the first delimiter,
    /// further delimiters included, belongs to the name.
    pub fn scope_parts(&self) -> Option<(&str, &str)> {
        self.title.split_once(SCOPE_DELIMITER)
    }

    pub fn is_scoped(&self) -> bool {
        self.scope_parts().is_some()
    }
}

/// Decoded body of `GET <item-link>.json`.
///
/// Only the fields the enrichment needs are read; the endpoint returns the
/// whole issue or merge request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLabels {
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub labels: Vec<LabelDescriptor>,
}

impl IssueLabels {
    /// Decodes a response body and stamps the project id into every label.
    pub fn from_json(endpoint: &str, body: &str) -> Result<Self, HostDataError> {
        let mut decoded: IssueLabels =
            serde_json::from_str(body).map_err(|e| HostDataError::decode(endpoint, e))?;
        let project_id = decoded.project_id;
        for label in &mut decoded.labels {
            label.project_id = project_id;
        }
        Ok(decoded)
    }
}
