//! Label reconciliation, averaging and the end-to-end pipeline

pub mod aggregate;
pub mod pipeline;
pub mod reconcile;

pub use aggregate::{aggregate, EnsemblePrediction, EnsembleResult, IndividualPrediction, ProbabilityMap};
pub use pipeline::EnsemblePipeline;
pub use reconcile::{reconcile, ReconciledProbabilities};
