//! Core domain entities, rules, and traits for InspiCode.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors returned by domain rules, storage, and catalog access.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Returned when a validation rule is violated.
    #[error("validation error: {0}")]
    Validation(String),
    /// Returned when local storage operations fail.
    #[error("storage error: {0}")]
    Storage(String),
    /// Returned when the backend cannot be reached.
    #[error("network error: {0}")]
    Network(String),
    /// Returned when the backend answers with a non-OK status.
    #[error("api error ({status}): {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The `detail` message from the error body, or the status reason.
        detail: String,
    },
    /// Returned when a response body cannot be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Difficulty level of a project idea.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Difficulty {
    /// Beginner friendly.
    Easy,
    /// Some experience needed.
    Medium,
    /// Ambitious projects.
    Hard,
}

impl Difficulty {
    /// All levels in ascending order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Wire value used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(value: &str) -> CoreResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CoreError::Validation(format!("unknown difficulty: {other}"))),
        }
    }
}

impl TryFrom<String> for Difficulty {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        value.parse()
    }
}

/// A project idea as served by the catalog backend.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Project {
    /// Title, also the favorites identity.
    pub title: String,
    /// Full description.
    pub description: String,
    /// Category name, such as "Web" or "Games".
    pub category: String,
    /// Difficulty level.
    pub difficulty: Difficulty,
}

impl Project {
    /// Case-insensitive substring match on title or description.
    ///
    /// `needle` must already be lowercased.
    pub fn mentions(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// A project the user marked as a favorite.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Favorite {
    /// Title of the favorited project.
    pub title: String,
    /// Category at the time it was favorited.
    pub category: String,
    /// Difficulty at the time it was favorited.
    pub difficulty: Difficulty,
    /// Description at the time it was favorited.
    pub description: String,
    /// When the favorite was added.
    pub added_at: DateTime<Utc>,
}

impl Favorite {
    /// Snapshot a project as a new favorite.
    pub fn from_project(project: &Project, added_at: DateTime<Utc>) -> Self {
        Self {
            title: project.title.clone(),
            category: project.category.clone(),
            difficulty: project.difficulty,
            description: project.description.clone(),
            added_at,
        }
    }

    /// Rebuild the catalog view of this favorite.
    pub fn to_project(&self) -> Project {
        Project {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty,
        }
    }
}

/// Catalog totals returned by the stats endpoint.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Stats {
    /// Number of projects in the catalog.
    pub total_projects: u64,
    /// Number of distinct categories.
    pub categories: u64,
    /// Number of distinct difficulty levels.
    #[serde(default)]
    pub difficulties: u64,
}

/// Selectable values for the structured filters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Vocabularies {
    /// Category names, sorted by the backend.
    pub categories: Vec<String>,
    /// Difficulty levels, sorted by the backend.
    pub difficulties: Vec<String>,
}

/// Server-side filters for a project query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    /// Category constraint.
    pub category: Option<String>,
    /// Difficulty constraint.
    pub difficulty: Option<Difficulty>,
    /// Free-text constraint.
    pub search: Option<String>,
}

impl CatalogFilters {
    /// Build filters, treating blank strings as unset.
    pub fn new(
        category: Option<String>,
        difficulty: Option<Difficulty>,
        search: Option<String>,
    ) -> Self {
        Self {
            category: non_blank(category),
            difficulty,
            search: non_blank(search),
        }
    }

    /// True when no constraint is set.
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.difficulty.is_none() && self.search.is_none()
    }

    /// Query parameters in wire order, skipping unset constraints.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = &self.category {
            pairs.push(("category", category.clone()));
        }
        if let Some(difficulty) = self.difficulty {
            pairs.push(("difficulty", difficulty.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            pairs.push(("search", search.clone()));
        }
        pairs
    }

    /// Backend matching rules: exact difficulty, category substring,
    /// and search on title or description, all case-insensitive.
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(difficulty) = self.difficulty {
            if project.difficulty != difficulty {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !project
                .category
                .to_lowercase()
                .contains(&category.to_lowercase())
            {
                return false;
            }
        }
        if let Some(search) = &self.search {
            if !project.mentions(&search.to_lowercase()) {
                return false;
            }
        }
        true
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Color scheme preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    /// Light background.
    #[default]
    Light,
    /// Dark background.
    Dark,
}

impl Theme {
    /// Stored representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Read a stored value. Anything but `"dark"` is light.
    pub fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("dark") => Theme::Dark,
            _ => Theme::Light,
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Read access to the project catalog backend.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the category vocabulary.
    async fn categories(&self) -> CoreResult<Vec<String>>;
    /// Fetch the difficulty vocabulary.
    async fn difficulties(&self) -> CoreResult<Vec<String>>;
    /// Fetch projects matching the filters.
    async fn projects(&self, filters: &CatalogFilters) -> CoreResult<Vec<Project>>;
    /// Fetch one random project matching the category and difficulty.
    async fn random(&self, filters: &CatalogFilters) -> CoreResult<Project>;
    /// Fetch catalog totals.
    async fn stats(&self) -> CoreResult<Stats>;
}

/// String key-value persistence, shaped like browser local storage.
pub trait KeyValueStore {
    /// Read a value.
    fn get(&self, key: &str) -> CoreResult<Option<String>>;
    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;
    /// Delete a value. Missing keys are not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}
