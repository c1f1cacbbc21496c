//! Projection of native probability vectors onto the unified label space

use crate::classifier::{Emotion, NativePrediction};

/// Probability vector indexed by [`Emotion`] in canonical order.
///
/// Labels the source model does not know stay exactly 0.0; nothing is
/// renormalised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReconciledProbabilities([f32; Emotion::COUNT]);

impl ReconciledProbabilities {
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    pub fn as_array(&self) -> &[f32; Emotion::COUNT] {
        &self.0
    }

    /// (label, probability) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

/// Copy each native probability into its unified position.
pub fn reconcile(prediction: &NativePrediction) -> ReconciledProbabilities {
    let mut values = [0.0f32; Emotion::COUNT];
    for (emotion, probability) in prediction.iter() {
        values[emotion.index()] = probability;
    }
    ReconciledProbabilities(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelKind, Vocabulary};

    fn native(kind: ModelKind, probabilities: Vec<f32>) -> NativePrediction {
        NativePrediction {
            model: kind,
            labels: Vocabulary::new(kind.default_labels().to_vec()).unwrap(),
            probabilities,
        }
    }

    #[test]
    fn test_tess_never_populates_calm() {
        let reconciled = reconcile(&native(
            ModelKind::Tess,
            vec![0.1, 0.2, 0.05, 0.3, 0.15, 0.1, 0.1],
        ));
        assert_eq!(reconciled.get(Emotion::Calm), 0.0);
        assert_eq!(reconciled.get(Emotion::Angry), 0.1);
        assert_eq!(reconciled.get(Emotion::Neutral), 0.1);
        assert_eq!(reconciled.get(Emotion::Happy), 0.3);
    }

    #[test]
    fn test_crema_leaves_calm_and_surprised_empty() {
        let reconciled = reconcile(&native(
            ModelKind::CremaD,
            vec![0.1, 0.2, 0.3, 0.1, 0.2, 0.1],
        ));
        assert_eq!(reconciled.get(Emotion::Calm), 0.0);
        assert_eq!(reconciled.get(Emotion::Surprised), 0.0);
        assert_eq!(reconciled.get(Emotion::Sad), 0.3);
    }

    #[test]
    fn test_no_renormalisation() {
        let probabilities = vec![0.1, 0.2, 0.05, 0.3, 0.15, 0.1, 0.1];
        let reconciled = reconcile(&native(ModelKind::Tess, probabilities.clone()));
        let total: f32 = reconciled.as_array().iter().sum();
        let native_total: f32 = probabilities.iter().sum();
        assert!((total - native_total).abs() < 1e-6);
    }

    #[test]
    fn test_ravdess_is_identity() {
        let probabilities = vec![0.3, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1];
        let reconciled = reconcile(&native(ModelKind::Ravdess, probabilities.clone()));
        assert_eq!(reconciled.as_array().to_vec(), probabilities);
    }
}
