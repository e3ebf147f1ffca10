//! Broken saved-content detection.
//!
//! Wraps the platform's own content validation sweep, scoping its findings
//! to the validated model and to the folders the caller selected. Folder
//! selections always extend to subfolders; personal folders can be dropped
//! wholesale.

use crate::error::{ValidateError, ValidateResult};
use lo_api::{ContentDetails, ContentItem, Folder, PlatformClient};
use lo_core::Model;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Kind of saved content carrying an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Look,
    Dashboard,
}

impl ContentKind {
    fn url_segment(&self) -> &'static str {
        match self {
            ContentKind::Look => "looks",
            ContentKind::Dashboard => "dashboards",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentKind::Look => f.write_str("look"),
            ContentKind::Dashboard => f.write_str("dashboard"),
        }
    }
}

/// Kind of dashboard tile carrying an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    DashboardElement,
    DashboardFilter,
}

/// A piece of saved content broken by the model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentError {
    pub model: String,
    pub explore: String,
    pub message: String,
    pub field_name: Option<String>,
    pub content_type: ContentKind,
    pub title: Option<String>,
    pub folder: Option<String>,
    pub url: String,
    /// Set for dashboards, where the error lives in a specific tile.
    pub tile_type: Option<TileKind>,
    pub tile_title: Option<String>,
}

/// Scopes and runs the platform's content validation sweep.
pub struct ContentValidator {
    api: Arc<dyn PlatformClient>,
    exclude_personal: bool,
    include_folders: Vec<String>,
    exclude_folders: Vec<String>,
}

impl ContentValidator {
    /// Create a validator.
    ///
    /// `folders` holds folder ids to inspect; a `-` prefix excludes a
    /// folder instead. Exclusions always win.
    pub fn new(api: Arc<dyn PlatformClient>, exclude_personal: bool, folders: &[String]) -> Self {
        let mut include_folders = Vec::new();
        let mut exclude_folders = Vec::new();
        for folder in folders {
            match folder.strip_prefix('-') {
                Some(excluded) => exclude_folders.push(excluded.to_string()),
                None => include_folders.push(folder.clone()),
            }
        }
        Self {
            api,
            exclude_personal,
            include_folders,
            exclude_folders,
        }
    }

    /// Run the sweep and keep errors tied to the given model.
    pub async fn validate(&self, model: &Model) -> ValidateResult<Vec<ContentError>> {
        let (included, excluded) = self.selected_folders().await?;

        let result = self.api.content_validation().await?;
        let mut errors: Vec<ContentError> = Vec::new();
        for item in &result.content_with_errors {
            let (kind, details) = match content_details(item) {
                Some(found) => found,
                None => {
                    log::warn!("skipping content that is neither a look nor a dashboard");
                    continue;
                }
            };

            // Content can outlive its folder; an orphan carries no folder id.
            let folder_id = details.folder.as_ref().and_then(|f| f.id.as_deref());
            if !folder_selected(folder_id, &included, &excluded) {
                continue;
            }

            let (tile_type, tile_title) = match kind {
                ContentKind::Dashboard => tile_info(item),
                ContentKind::Look => (None, None),
            };

            for error in &item.errors {
                if error.model_name != model.name.as_str() {
                    continue;
                }
                let content_error = ContentError {
                    model: error.model_name.clone(),
                    explore: error.explore_name.clone(),
                    message: error.message.clone(),
                    field_name: error.field_name.clone(),
                    content_type: kind,
                    title: details.title.clone(),
                    folder: details.folder.as_ref().and_then(|f| f.name.clone()),
                    url: format!(
                        "{}/{}/{}",
                        self.api.base_url(),
                        kind.url_segment(),
                        details.id
                    ),
                    tile_type,
                    tile_title: tile_title.clone(),
                };
                // The sweep repeats an error once per broken tile.
                if !errors.contains(&content_error) {
                    errors.push(content_error);
                }
            }
        }
        Ok(errors)
    }

    /// Expand the configured folder selections into full subtree id sets.
    async fn selected_folders(&self) -> ValidateResult<(HashSet<String>, HashSet<String>)> {
        if !self.exclude_personal
            && self.include_folders.is_empty()
            && self.exclude_folders.is_empty()
        {
            return Ok((HashSet::new(), HashSet::new()));
        }
        let folders = self.api.all_folders().await?;

        let mut excluded: HashSet<String> = HashSet::new();
        if self.exclude_personal {
            excluded.extend(
                folders
                    .iter()
                    .filter(|f| f.is_personal || f.is_personal_descendant)
                    .map(|f| f.id.clone()),
            );
        }
        excluded.extend(expand_subtrees(&self.exclude_folders, &folders)?);
        let included = expand_subtrees(&self.include_folders, &folders)?
            .into_iter()
            .collect();
        Ok((included, excluded))
    }
}

/// The item's content type and details. Looks win when both are present.
fn content_details(item: &ContentItem) -> Option<(ContentKind, &ContentDetails)> {
    if let Some(look) = &item.look {
        Some((ContentKind::Look, look))
    } else {
        item.dashboard
            .as_ref()
            .map(|dashboard| (ContentKind::Dashboard, dashboard))
    }
}

fn tile_info(item: &ContentItem) -> (Option<TileKind>, Option<String>) {
    if let Some(element) = &item.dashboard_element {
        (Some(TileKind::DashboardElement), element.title.clone())
    } else if let Some(filter) = &item.dashboard_filter {
        (Some(TileKind::DashboardFilter), filter.title.clone())
    } else {
        (None, None)
    }
}

fn folder_selected(
    folder_id: Option<&str>,
    included: &HashSet<String>,
    excluded: &HashSet<String>,
) -> bool {
    if let Some(id) = folder_id {
        if excluded.contains(id) {
            return false;
        }
    }
    if included.is_empty() {
        return true;
    }
    matches!(folder_id, Some(id) if included.contains(id))
}

/// Expand folder ids to include every descendant.
fn expand_subtrees(roots: &[String], folders: &[Folder]) -> ValidateResult<Vec<String>> {
    let mut expanded = Vec::new();
    for root in roots {
        if !folders.iter().any(|f| f.id == *root) {
            return Err(ValidateError::Discovery(format!(
                "folder '{}' does not exist on the platform",
                root
            )));
        }
        let mut stack = vec![root.clone()];
        while let Some(id) = stack.pop() {
            for child in folders
                .iter()
                .filter(|f| f.parent_id.as_deref() == Some(id.as_str()))
            {
                stack.push(child.id.clone());
            }
            expanded.push(id);
        }
    }
    Ok(expanded)
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
