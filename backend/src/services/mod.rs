// 服务层模块
pub mod interpreter;
pub mod pipeline;
pub mod vision_client;

pub use interpreter::{Interpretation, ResponseInterpreter};
pub use pipeline::AnalysisPipeline;
pub use vision_client::{AssessmentClient, OpenAiVisionClient};

#[cfg(test)]
pub use vision_client::MockAssessmentClient;
