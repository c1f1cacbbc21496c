//! Unified emotion labels and per-model vocabularies

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};

/// The unified label space. Declaration order is the canonical order used
/// for reconciled vectors and for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Neutral,
    Calm,
    Happy,
    Sad,
    Angry,
    Fearful,
    Disgust,
    Surprised,
}

impl Emotion {
    /// Number of unified labels
    pub const COUNT: usize = 8;

    /// All labels in canonical order
    pub const ALL: [Emotion; Self::COUNT] = [
        Emotion::Neutral,
        Emotion::Calm,
        Emotion::Happy,
        Emotion::Sad,
        Emotion::Angry,
        Emotion::Fearful,
        Emotion::Disgust,
        Emotion::Surprised,
    ];

    /// Position in the unified label space
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Calm => "calm",
            Emotion::Happy => "happy",
            Emotion::Sad => "sad",
            Emotion::Angry => "angry",
            Emotion::Fearful => "fearful",
            Emotion::Disgust => "disgust",
            Emotion::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = PipelineError;

    /// Exact, case-sensitive match against the unified labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Emotion::ALL
            .iter()
            .copied()
            .find(|e| e.as_str() == s)
            .ok_or_else(|| PipelineError::UnknownLabel(s.to_string()))
    }
}

/// Ordered native label list of one model. Position `i` names output `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary(Vec<Emotion>);

impl Vocabulary {
    /// # Errors
    /// `PipelineError::ModelLoad` if the list is empty or repeats a label.
    pub fn new(labels: Vec<Emotion>) -> PipelineResult<Self> {
        if labels.is_empty() {
            return Err(PipelineError::ModelLoad("Label vocabulary is empty".to_string()));
        }
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(PipelineError::ModelLoad(format!(
                    "Label '{}' appears more than once in vocabulary",
                    label
                )));
            }
        }
        Ok(Self(labels))
    }

    /// Parse label names, e.g. from configuration.
    ///
    /// # Errors
    /// `PipelineError::UnknownLabel` for a name outside the unified space.
    pub fn parse<S: AsRef<str>>(names: &[S]) -> PipelineResult<Self> {
        let labels = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<PipelineResult<Vec<Emotion>>>()?;
        Self::new(labels)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn labels(&self) -> &[Emotion] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<Emotion> {
        self.0.get(index).copied()
    }

    pub fn contains(&self, emotion: Emotion) -> bool {
        self.0.contains(&emotion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_order() {
        let names: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
        assert_eq!(
            names,
            vec!["neutral", "calm", "happy", "sad", "angry", "fearful", "disgust", "surprised"]
        );
        for (i, e) in Emotion::ALL.iter().enumerate() {
            assert_eq!(e.index(), i);
        }
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!("fearful".parse::<Emotion>().unwrap(), Emotion::Fearful);
        assert!(matches!("Fearful".parse::<Emotion>(), Err(PipelineError::UnknownLabel(_))));
        assert!(matches!("fear".parse::<Emotion>(), Err(PipelineError::UnknownLabel(_))));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&Emotion::Surprised).unwrap(), "\"surprised\"");
        let parsed: Emotion = serde_json::from_str("\"calm\"").unwrap();
        assert_eq!(parsed, Emotion::Calm);
    }

    #[test]
    fn test_vocabulary_rejects_duplicates() {
        let result = Vocabulary::new(vec![Emotion::Sad, Emotion::Happy, Emotion::Sad]);
        assert!(matches!(result, Err(PipelineError::ModelLoad(_))));
        assert!(Vocabulary::new(vec![]).is_err());
    }

    #[test]
    fn test_vocabulary_parse_unknown_label() {
        let err = Vocabulary::parse(&["happy", "bored"]).unwrap_err();
        assert_eq!(err.to_string(), "Unknown emotion label: 'bored'");
    }
}
