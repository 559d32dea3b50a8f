pub mod aggregator;
pub mod generator;
pub mod pipeline;
pub mod transformer;
pub mod validator;

pub use aggregator::{AggregateMetrics, MetricsAggregator};
pub use generator::RecordGenerator;
pub use pipeline::{DataPipeline, PipelineRun, PipelineRunReport, PipelineSettings, RunStatus};
pub use transformer::DataTransformer;
pub use validator::{DataValidator, ValidationReport};
