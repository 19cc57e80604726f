//! The user's pantry, kept in a small JSON file between runs.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{SearchError, SearchRequest};

#[derive(Debug, Error)]
pub enum PantryError {
    #[error("ingredient name is empty")]
    EmptyIngredient,
    #[error("pantry file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pantry file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PantryState {
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default = "default_first_time")]
    pub first_time_user: bool,
}

fn default_first_time() -> bool {
    true
}

impl Default for PantryState {
    fn default() -> Self {
        Self {
            ingredients: Vec::new(),
            first_time_user: true,
        }
    }
}

pub struct PantryStore {
    path: PathBuf,
    state: PantryState,
}

impl PantryStore {
    /// Loads the pantry at `path`. A missing file is an empty pantry; a
    /// corrupt one is logged and replaced on the next save.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, PantryError> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "unreadable pantry file, starting empty");
                PantryState::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PantryState::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, state })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ingredients(&self) -> &[String] {
        &self.state.ingredients
    }

    pub fn is_first_time_user(&self) -> bool {
        self.state.first_time_user
    }

    async fn save(&self) -> Result<(), PantryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&self.state)?).await?;
        debug!(path = %self.path.display(), count = self.state.ingredients.len(), "pantry saved");
        Ok(())
    }

    /// Adds an ingredient unless one with the same name (ignoring case) is
    /// already there. Returns whether it was added.
    pub async fn add(&mut self, ingredient: &str) -> Result<bool, PantryError> {
        let name = ingredient.trim();
        if name.is_empty() {
            return Err(PantryError::EmptyIngredient);
        }
        if self.state.ingredients.iter().any(|i| i.eq_ignore_ascii_case(name)) {
            return Ok(false);
        }
        self.state.ingredients.push(name.to_string());
        self.save().await?;
        Ok(true)
    }

    /// Removes an ingredient, ignoring case. Returns whether anything changed.
    pub async fn remove(&mut self, ingredient: &str) -> Result<bool, PantryError> {
        let name = ingredient.trim();
        let before = self.state.ingredients.len();
        self.state.ingredients.retain(|i| !i.eq_ignore_ascii_case(name));
        if self.state.ingredients.len() == before {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    pub async fn clear(&mut self) -> Result<(), PantryError> {
        self.state.ingredients.clear();
        self.save().await
    }

    pub async fn mark_onboarded(&mut self) -> Result<(), PantryError> {
        if self.state.first_time_user {
            self.state.first_time_user = false;
            self.save().await?;
        }
        Ok(())
    }

    pub fn search_request(&self) -> Result<SearchRequest, SearchError> {
        SearchRequest::new(&self.state.ingredients)
    }
}
