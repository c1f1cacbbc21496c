//! Mean-and-argmax ensemble decision

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::reconcile::reconcile;
use crate::classifier::adapter::argmax;
use crate::classifier::{Emotion, ModelKind, NativePrediction};
use crate::error::{PipelineError, PipelineResult};

/// A model's own top-1 call, in its native label space
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndividualPrediction {
    pub model: ModelKind,
    pub emotion: Emotion,
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsemblePrediction {
    pub emotion: Emotion,
    pub confidence: f32,
}

/// Averaged unified probabilities; serialises as a map in canonical label order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbabilityMap([f32; Emotion::COUNT]);

impl ProbabilityMap {
    pub fn get(&self, emotion: Emotion) -> f32 {
        self.0[emotion.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Emotion, f32)> + '_ {
        Emotion::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

impl Serialize for ProbabilityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Emotion::COUNT))?;
        for (emotion, probability) in self.iter() {
            map.serialize_entry(emotion.as_str(), &probability)?;
        }
        map.end()
    }
}

/// Everything returned for one clip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnsembleResult {
    pub individual_predictions: Vec<IndividualPrediction>,
    pub ensemble_prediction: EnsemblePrediction,
    pub all_probabilities: ProbabilityMap,
}

/// Combine native predictions: reconcile each, average element-wise over the
/// number of models (absent labels contribute 0.0), take the first maximum.
///
/// # Errors
/// `PipelineError::Inference` if there are no predictions or a model
/// produced no usable score.
pub fn aggregate(predictions: &[NativePrediction]) -> PipelineResult<EnsembleResult> {
    if predictions.is_empty() {
        return Err(PipelineError::Inference("No model predictions to combine".to_string()));
    }

    let mut individual_predictions = Vec::with_capacity(predictions.len());
    let mut totals = [0.0f32; Emotion::COUNT];

    for prediction in predictions {
        let (emotion, confidence) = prediction.top().ok_or_else(|| {
            PipelineError::Inference(format!("{} produced no usable scores", prediction.model))
        })?;
        individual_predictions.push(IndividualPrediction {
            model: prediction.model,
            emotion,
            confidence,
        });

        for (total, value) in totals.iter_mut().zip(reconcile(prediction).as_array()) {
            *total += value;
        }
    }

    let count = predictions.len() as f32;
    let averaged = totals.map(|total| total / count);

    let best = argmax(&averaged).ok_or_else(|| {
        PipelineError::Inference("Averaged probabilities are all NaN".to_string())
    })?;

    Ok(EnsembleResult {
        individual_predictions,
        ensemble_prediction: EnsemblePrediction {
            emotion: Emotion::ALL[best],
            confidence: averaged[best],
        },
        all_probabilities: ProbabilityMap(averaged),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Vocabulary;
    use crate::ensemble::ReconciledProbabilities;

    fn native(kind: ModelKind, probabilities: Vec<f32>) -> NativePrediction {
        NativePrediction {
            model: kind,
            labels: Vocabulary::new(kind.default_labels().to_vec()).unwrap(),
            probabilities,
        }
    }

    fn sample() -> Vec<NativePrediction> {
        vec![
            // angry disgust fearful happy sad neutral surprised
            native(ModelKind::Tess, vec![0.05, 0.05, 0.05, 0.6, 0.1, 0.1, 0.05]),
            // neutral calm happy sad angry fearful disgust surprised
            native(ModelKind::Ravdess, vec![0.1, 0.3, 0.2, 0.1, 0.1, 0.1, 0.05, 0.05]),
            // neutral happy sad angry fearful disgust
            native(ModelKind::CremaD, vec![0.2, 0.3, 0.2, 0.1, 0.1, 0.1]),
        ]
    }

    #[test]
    fn test_average_divides_by_model_count() {
        let predictions = sample();
        let result = aggregate(&predictions).unwrap();

        let reconciled: Vec<ReconciledProbabilities> = predictions.iter().map(reconcile).collect();
        for emotion in Emotion::ALL {
            let expected = (reconciled[0].get(emotion) + reconciled[1].get(emotion)
                + reconciled[2].get(emotion))
                / 3.0;
            assert_eq!(result.all_probabilities.get(emotion), expected, "{}", emotion);
        }
        // only RAVDESS knows calm
        assert!((result.all_probabilities.get(Emotion::Calm) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_ensemble_is_argmax_of_average() {
        let result = aggregate(&sample()).unwrap();
        assert_eq!(result.ensemble_prediction.emotion, Emotion::Happy);
        assert!((result.ensemble_prediction.confidence - 1.1 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_individual_predictions_are_native_top() {
        let result = aggregate(&sample()).unwrap();
        let tops: Vec<(ModelKind, Emotion)> = result
            .individual_predictions
            .iter()
            .map(|p| (p.model, p.emotion))
            .collect();
        assert_eq!(
            tops,
            vec![
                (ModelKind::Tess, Emotion::Happy),
                (ModelKind::Ravdess, Emotion::Calm),
                (ModelKind::CremaD, Emotion::Happy),
            ]
        );
    }

    #[test]
    fn test_tie_breaks_on_canonical_order() {
        let uniform_ravdess = native(ModelKind::Ravdess, vec![0.125; 8]);
        let result = aggregate(&[uniform_ravdess.clone(), uniform_ravdess.clone(), uniform_ravdess]).unwrap();
        assert_eq!(result.ensemble_prediction.emotion, Emotion::Neutral);
        assert_eq!(result.individual_predictions[0].emotion, Emotion::Neutral);
    }

    #[test]
    fn test_serialised_shape() {
        let value = serde_json::to_value(aggregate(&sample()).unwrap()).unwrap();

        let individual = value["individual_predictions"].as_array().unwrap();
        assert_eq!(individual.len(), 3);
        assert_eq!(individual[2]["model"], "CREMA-D");
        assert_eq!(individual[1]["emotion"], "calm");
        assert_eq!(value["ensemble_prediction"]["emotion"], "happy");

        let probabilities = value["all_probabilities"].as_object().unwrap();
        assert_eq!(probabilities.len(), 8);
        let total: f64 = probabilities.values().map(|v| v.as_f64().unwrap()).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_map_keys_follow_canonical_order() {
        let json = serde_json::to_string(&aggregate(&sample()).unwrap().all_probabilities).unwrap();
        let positions: Vec<usize> = Emotion::ALL
            .iter()
            .map(|e| json.find(&format!("\"{}\"", e.as_str())).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        assert!(matches!(aggregate(&[]), Err(PipelineError::Inference(_))));
    }
}
