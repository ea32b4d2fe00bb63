//! Voice prompt artifact types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single derived array with its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTensor {
    /// Dimension sizes, outermost first.
    pub shape: Vec<usize>,
    /// Row-major element values.
    pub values: Vec<f32>,
}

impl PromptTensor {
    /// A one-dimensional tensor over `values`.
    pub fn vector(values: Vec<f32>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }
}

/// A derived voice prompt: the expensive per-(audio, text) artifact.
///
/// Newer models produce a record of named tensors; older ones a single
/// tensor. Both shapes round-trip through the persistent store unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VoicePrompt {
    /// Single-tensor prompt.
    Tensor(PromptTensor),
    /// Record of named tensors.
    Record(HashMap<String, PromptTensor>),
}

impl VoicePrompt {
    /// Build a record prompt from named tensors.
    pub fn record<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, PromptTensor)>,
        K: Into<String>,
    {
        Self::Record(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
