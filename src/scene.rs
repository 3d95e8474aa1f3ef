//! Scene persistence.
//!
//! A scene is the sketch source plus the full parameter tree, saved as one
//! JSON document: `{ "src": ..., "edit": ... }`. Saving writes the tree
//! verbatim, transient state included. Loading is where hygiene happens: the
//! parsed tree is cleaned so ephemeral values (shape maps, widget state) come
//! back in a neutral state, and unknown tagged payloads fail the whole load
//! rather than being silently dropped.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::tree::ParamTree;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// The sketch source code.
    pub src: String,
    /// The parameter tree.
    pub edit: ParamTree,
}

impl Scene {
    pub fn new(src: impl Into<String>, edit: ParamTree) -> Self {
        Self {
            src: src.into(),
            edit,
        }
    }

    /// Serialize the scene exactly as it stands. No cleaning on the way out:
    /// what you save is what the tree held.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize scene")
    }

    /// Parse a scene document and clean the tree. Malformed records abort the
    /// load; a partially-understood scene is worse than an error.
    pub fn from_json(json: &str) -> Result<Scene> {
        let scene: Scene = serde_json::from_str(json).context("failed to parse scene")?;
        scene.edit.clean();
        Ok(scene)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;
        fs::write(path, json).with_context(|| format!("failed to write scene {path:?}"))?;
        log::info!("saved scene to {path:?}");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Scene> {
        let path = path.as_ref();
        let json =
            fs::read_to_string(path).with_context(|| format!("failed to read scene {path:?}"))?;
        let scene = Self::from_json(&json).with_context(|| format!("invalid scene {path:?}"))?;
        log::info!("loaded scene from {path:?}");
        Ok(scene)
    }
}
