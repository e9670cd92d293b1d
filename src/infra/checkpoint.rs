// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores encoder weights using Burn's CompactRecorder.
//
// Why save the config and head separately?
//   A Burn record only holds parameters. To load it we first
//   rebuild a model with the same layer plan (gat_config.json)
//   and the same output head (head.json), then pour the
//   weights in. Loading fails if the architecture differs.
//
// File naming convention:
//   checkpoints/
//     model_epoch_1.mpk.gz   ← weights after epoch 1
//     ...
//     latest_epoch.json      ← number of the latest epoch
//     gat_config.json        ← encoder hyperparameters
//     head.json              ← Identity or Classifier { .. }
//     finetune_config.json   ← run settings (written by the use case)
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{bail, Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use serde::{de::DeserializeOwned, Serialize};
use std::{fs, path::{Path, PathBuf}};

use crate::ml::model::{Gat, GatConfig, HeadKind};

const LATEST_EPOCH_FILE: &str = "latest_epoch.json";
const CONFIG_FILE: &str = "gat_config.json";
const HEAD_FILE: &str = "head.json";

/// Manages saving and loading of encoder checkpoints.
/// All files are stored in the configured directory.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    /// Create a new CheckpointManager.
    /// Creates the directory if it doesn't already exist.
    pub fn new(dir: impl Into<String>) -> Self {
        let dir = PathBuf::from(dir.into());
        // .ok(): a missing directory surfaces on the first write
        fs::create_dir_all(&dir).ok();
        Self { dir }
    }

    /// Open a directory that already holds a saved encoder.
    /// Unlike `new`, nothing is created on disk.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let manager = Self { dir: dir.as_ref().to_path_buf() };
        if !manager.has_config() {
            bail!("No encoder checkpoint in '{}'", manager.dir.display());
        }
        Ok(manager)
    }

    /// True once a config has been written to this directory.
    pub fn has_config(&self) -> bool {
        self.dir.join(CONFIG_FILE).is_file()
    }

    /// Save encoder weights for a given epoch and move the
    /// latest-epoch pointer to it.
    pub fn save_model<B: Backend>(&self, model: &Gat<B>, epoch: usize) -> Result<()> {
        // The recorder adds the .mpk.gz extension
        let path = self.dir.join(format!("model_epoch_{epoch}"));

        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        self.write_json(LATEST_EPOCH_FILE, &epoch)?;
        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    /// Load the latest weights into `model`, which must have the
    /// same architecture as the saved one.
    pub fn load_model<B: Backend>(&self, model: Gat<B>, device: &B::Device) -> Result<Gat<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.dir.join(format!("model_epoch_{epoch}"));

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| {
                format!("Cannot load checkpoint '{}'. Have you fine-tuned the model first?", path.display())
            })?;

        Ok(model.load_record(record))
    }

    pub fn save_config(&self, cfg: &GatConfig) -> Result<()> {
        self.write_json(CONFIG_FILE, cfg)
    }

    pub fn load_config(&self) -> Result<GatConfig> {
        self.read_json(CONFIG_FILE)
    }

    pub fn save_head(&self, head: &HeadKind) -> Result<()> {
        self.write_json(HEAD_FILE, head)
    }

    /// A checkpoint without head.json was saved by a bare encoder.
    pub fn load_head(&self) -> Result<HeadKind> {
        if !self.dir.join(HEAD_FILE).exists() {
            return Ok(HeadKind::Identity);
        }
        self.read_json(HEAD_FILE)
    }

    /// Number of the most recently saved epoch.
    pub fn latest_epoch(&self) -> Result<usize> {
        self.read_json(LATEST_EPOCH_FILE)
    }

    /// Serialise any value as pretty JSON into `{dir}/{name}`.
    pub fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.dir.join(name);
        let json = serde_json::to_string_pretty(value)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write '{}'", path.display()))?;
        tracing::debug!("Wrote '{}'", path.display());
        Ok(())
    }

    pub fn read_json<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let path = self.dir.join(name);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read '{}'. Has a checkpoint been saved here?", path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed JSON in '{}'", path.display()))
    }
}
