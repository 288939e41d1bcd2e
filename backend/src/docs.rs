use crate::{
    handlers::UploadResponse,
    models::{AnalysisRecord, AnalysisResult, AnalysisStatus},
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // 分析API
        crate::handlers::analysis::upload_analysis,
        crate::handlers::analysis::list_analyses,
        crate::handlers::analysis::get_analysis,
        crate::handlers::analysis::get_analysis_image,
    ),
    components(
        schemas(
            AnalysisRecord,
            AnalysisResult,
            AnalysisStatus,
            UploadResponse,
        )
    ),
    tags(
        (name = "analyses", description = "口腔照片上传、分析与历史记录查询")
    ),
    info(
        title = "OralScreen API",
        version = "0.1.0",
        description = "口腔图像筛查后端 REST API 文档",
        license(
            name = "CC BY-NC-SA 4.0",
            url = "https://creativecommons.org/licenses/by-nc-sa/4.0/"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "开发环境")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        assert!(json["paths"]["/api/analyses"]["post"].is_object());
        assert!(json["paths"]["/api/analyses"]["get"].is_object());
        assert!(json["paths"]["/api/analyses/{id}"]["get"].is_object());
        assert!(json["paths"]["/api/analyses/{id}/image"]["get"].is_object());
        assert!(json["components"]["schemas"]["AnalysisRecord"].is_object());
        assert!(
            json["paths"]["/api/analyses"]["post"]["requestBody"]["content"]["multipart/form-data"]
                .is_object()
        );
    }
}
