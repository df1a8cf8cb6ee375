//! Batch protection of the working set.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::encryption::{protected_output_path, PdfEncryptor};
use crate::models::WorkingSet;

/// Events emitted while encrypting.
#[derive(Debug, Clone)]
pub enum ProtectionEvent {
    /// Encryption of a file started.
    Started { index: usize, file_name: String },
    /// File written.
    Protected { index: usize, output_path: PathBuf },
    /// File failed; the record carries the error.
    Failed { index: usize, error: String },
    /// File skipped for lack of a password.
    Skipped { index: usize, file_name: String },
}

/// Counts for a protection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectSummary {
    pub succeeded: usize,
    pub attempted: usize,
    pub total: usize,
    /// Custom output directory, else the first file's directory.
    pub output_dir: Option<PathBuf>,
}

impl ProtectSummary {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }

    /// Headline for the finished batch.
    pub fn headline(&self) -> String {
        if self.all_succeeded() {
            format!("All {} PDFs have been password-protected!", self.total)
        } else {
            format!("{} of {} PDFs protected", self.succeeded, self.total)
        }
    }
}

/// Encrypt every record with a non-empty password, in order.
///
/// Records without a password are skipped. A record whose output path was
/// already written earlier in the batch fails instead of overwriting it.
/// Outcomes are written back to each record's `output_path` or `encrypt_error`.
pub async fn protect_all(
    set: &mut WorkingSet,
    encryptor: &dyn PdfEncryptor,
    event_tx: Option<mpsc::Sender<ProtectionEvent>>,
) -> ProtectSummary {
    let mut succeeded = 0;
    let mut attempted = 0;
    // Output paths written so far, with the input each came from
    let mut claimed: Vec<(PathBuf, PathBuf)> = Vec::new();

    for index in 0..set.len() {
        let Some(record) = set.get(index) else {
            continue;
        };
        if !record.has_password() {
            send(
                &event_tx,
                ProtectionEvent::Skipped {
                    index,
                    file_name: record.file_name.clone(),
                },
            )
            .await;
            continue;
        }

        let output_dir = set.output_dir_for(record);
        let output_path = protected_output_path(&record.file_path, &output_dir);
        let input = record.file_path.clone();
        let password = record.password.clone();
        send(
            &event_tx,
            ProtectionEvent::Started {
                index,
                file_name: record.file_name.clone(),
            },
        )
        .await;

        attempted += 1;
        let clash = claimed
            .iter()
            .find(|(path, _)| *path == output_path)
            .map(|(_, owner)| owner.clone());
        let result = if let Some(owner) = clash {
            Err(format!(
                "{} would overwrite the protected copy of {}",
                output_path.display(),
                owner.display()
            ))
        } else {
            match tokio::fs::create_dir_all(&output_dir).await {
                Ok(()) => encryptor
                    .encrypt(&input, &output_path, &password)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(format!(
                    "Could not create {}: {}",
                    output_dir.display(),
                    e
                )),
            }
        };

        let Some(record) = set.get_mut(index) else {
            continue;
        };
        match result {
            Ok(()) => {
                succeeded += 1;
                claimed.push((output_path.clone(), input));
                record.output_path = Some(output_path.clone());
                record.encrypt_error = None;
                send(&event_tx, ProtectionEvent::Protected { index, output_path }).await;
            }
            Err(error) => {
                tracing::warn!("Encryption failed for {}: {}", record.file_name, error);
                record.encrypt_error = Some(error.clone());
                send(&event_tx, ProtectionEvent::Failed { index, error }).await;
            }
        }
    }

    ProtectSummary {
        succeeded,
        attempted,
        total: set.len(),
        output_dir: set.display_output_dir(),
    }
}

async fn send(event_tx: &Option<mpsc::Sender<ProtectionEvent>>, event: ProtectionEvent) {
    if let Some(tx) = event_tx {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headline() {
        let summary = ProtectSummary {
            succeeded: 3,
            attempted: 3,
            total: 3,
            output_dir: None,
        };
        assert_eq!(summary.headline(), "All 3 PDFs have been password-protected!");

        let summary = ProtectSummary {
            succeeded: 1,
            attempted: 2,
            total: 3,
            output_dir: None,
        };
        assert_eq!(summary.headline(), "1 of 3 PDFs protected");
    }
}
