// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Appends one CSV row per fine-tuning epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: cross-entropy on training nodes (before the step)
//   - train_acc:  accuracy on training nodes (after the step)
//   - val_loss:   cross-entropy on validation nodes
//   - val_acc:    accuracy on validation nodes
//
// Output file: checkpoints/metrics.csv
//
//   epoch,train_loss,train_acc,val_loss,val_acc
//   1,1.098612,0.412500,1.091200,0.375000
//   2,1.034100,0.550000,1.054300,0.458333

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs::OpenOptions, io::Write, path::PathBuf};

const HEADER: &str = "epoch,train_loss,train_acc,val_loss,val_acc";

/// Losses and accuracies after one fine-tuning step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch:      usize,
    pub train_loss: f64,
    pub train_acc:  f64,
    /// NaN when there are no validation nodes
    pub val_loss:   f64,
    pub val_acc:    f64,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, train_acc: f64, val_loss: f64, val_acc: f64) -> Self {
        Self { epoch, train_loss, train_acc, val_loss, val_acc }
    }

    /// Strictly better validation accuracy than `best_val_acc`.
    pub fn is_improvement(&self, best_val_acc: f64) -> bool {
        self.val_acc > best_val_acc
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{:.6}",
            self.epoch, self.train_loss, self.train_acc, self.val_loss, self.val_acc,
        )
    }
}

/// Appends fine-tuning metrics to `{dir}/metrics.csv`.
/// Runs sharing a directory share one file and one header.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create metrics directory '{}'", dir.display()))?;

        let logger = Self { csv_path: dir.join("metrics.csv") };
        if !logger.csv_path.exists() {
            logger.append(HEADER)?;
            tracing::debug!("Started metrics log '{}'", logger.csv_path.display());
        }
        Ok(logger)
    }

    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        self.append(&m.csv_row())?;
        tracing::debug!("metrics.csv <- epoch {} (val_acc={:.4})", m.epoch, m.val_acc);
        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }

    fn append(&self, line: &str) -> Result<()> {
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;
        writeln!(f, "{line}").with_context(|| format!("Cannot write to '{}'", self.csv_path.display()))
    }
}
