pub mod analysis;
pub mod system;

pub use analysis::{
    AppState, UploadResponse, get_analysis, get_analysis_image, list_analyses, upload_analysis,
};
pub use system::{db_health_check, health_check, storage_health_check, system_status};
