//! Pipeline orchestration and the transform/train collaborators.

pub mod pipeline;
pub mod train;
pub mod transform;

pub use pipeline::{PipelineReport, SilentStages, StageReporter, run_pipeline};
pub use train::{EngagementModel, Metrics, ModelTrainer, TitleClassifierTrainer, TrainOutcome};
pub use transform::{EngagementTransformer, FeatureTransformer, TransformOutcome};
