// Port for the remote text-classification service.
//
// The core only knows that some classifier turns text into a toxicity score,
// or fails. The infra layer provides the HTTP implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Verdict from the external classifier. 1.0 = maximally toxic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub toxicity_score: f64,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Network error, timeout, non-success status or unreadable body.
    /// Callers recover from it; it is never shown to the submitter.
    #[error("Classifier unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ToxicityClassifier: Send + Sync {
    /// Classify `text`. No retries: the first failure is reported.
    async fn analyze(&self, text: &str) -> Result<Classification, ClassifierError>;

    /// Probe the service with a throwaway input.
    /// For status reporting only, never for decisions.
    async fn is_available(&self) -> bool {
        self.analyze("test").await.is_ok()
    }
}

// Blanket implementation for Box<dyn ToxicityClassifier>
// so the web layer can hold any classifier behind one concrete type.
#[async_trait]
impl ToxicityClassifier for Box<dyn ToxicityClassifier> {
    async fn analyze(&self, text: &str) -> Result<Classification, ClassifierError> {
        (**self).analyze(text).await
    }

    async fn is_available(&self) -> bool {
        (**self).is_available().await
    }
}
