/*
 * OralScreen - Oral Cavity Image Screening Backend
 * Copyright (c) 2024 OralScreen Project
 *
 * This work is licensed under CC BY-NC-SA 4.0
 * https://creativecommons.org/licenses/by-nc-sa/4.0/
 */

use axum::response::Html;
use axum::{Router, http::Method, response::Json, routing::get};
use oral_screen_backend::{
    config::Config,
    database::Database,
    docs::ApiDoc,
    error::AppResult,
    handlers::AppState,
    image_processing::{ImageNormalizer, UploadValidator},
    repositories::{AnalysisRepository, AnalysisStore, MemoryAnalysisRepository},
    routes::create_app,
    services::{AnalysisPipeline, AssessmentClient, OpenAiVisionClient},
    storage::LocalStorage,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

/// Swagger UI 页面（访问路径：/swagger-ui）
async fn swagger_ui_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset=UTF-8>
  <title>OralScreen API 文档</title>
  <link rel=stylesheet href=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui.css>
</head>
<body>
  <div id=swagger-ui></div>
  <script src=https://cdn.jsdelivr.net/npm/swagger-ui-dist@5.11.0/swagger-ui-bundle.js></script>
  <script>
    window.onload = function() {
      window.ui = SwaggerUIBundle({
        url: '/api-docs/openapi.json',
        dom_id: '#swagger-ui',
        deepLinking: true
      });
    };
  </script>
</body>
</html>"#,
    )
}

/// 初始化分析记录存储（连接失败则返回 None，服务降级运行）
async fn init_store(config: &Config) -> Option<Arc<dyn AnalysisStore>> {
    if config.database.is_memory() {
        tracing::warn!("使用进程内记录存储，数据不会持久化");
        return Some(Arc::new(MemoryAnalysisRepository::new()));
    }

    match Database::new(&config.database).await {
        Ok(db) => {
            // 验证数据库连接和表结构
            if let Err(e) = db.verify_connection().await {
                tracing::warn!("数据库验证失败: {}", e);
            }
            Some(Arc::new(AnalysisRepository::new(db)))
        }
        Err(e) => {
            tracing::warn!("数据库连接失败，服务将在无数据库模式下启动: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oral_screen_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置，文件不存在时写入默认配置
    let config = Config::load_or_init("config.toml")?;

    tracing::info!("服务器配置: {}", config.server_addr());

    let store = init_store(&config).await;

    // 初始化本地存储
    let storage = match LocalStorage::new(&config.storage).await {
        Ok(storage) => Some(Arc::new(storage)),
        Err(e) => {
            tracing::warn!("本地存储初始化失败，上传功能将不可用: {}", e);
            None
        }
    };

    // 初始化视觉模型客户端
    let client: Option<Arc<dyn AssessmentClient>> = match OpenAiVisionClient::new(&config.vision)
    {
        Ok(client) => {
            tracing::info!("视觉模型客户端初始化成功，模型: {}", client.model());
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!("视觉模型客户端初始化失败，上传分析将不可用: {}", e);
            None
        }
    };

    let pipeline = match (&client, &storage, &store) {
        (Some(client), Some(storage), Some(store)) => Some(AnalysisPipeline::new(
            ImageNormalizer::new(&config.image),
            client.clone(),
            storage.clone(),
            store.clone(),
        )),
        _ => {
            tracing::warn!("分析流水线初始化跳过：缺少必要的依赖（数据库/存储/视觉模型）");
            None
        }
    };

    // 创建应用状态
    let app_state = AppState {
        store,
        storage,
        pipeline,
        validator: UploadValidator::new(&config.file),
        config: config.clone(),
    };

    // 创建CORS中间件
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        // OpenAPI JSON 路由
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Swagger UI 页面
        .route("/swagger-ui", get(swagger_ui_page))
        .route("/swagger-ui/", get(swagger_ui_page))
        // 业务API路由
        .merge(create_app(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // 启动服务器
    let listener = tokio::net::TcpListener::bind(&config.server_addr()).await?;
    tracing::info!("服务器启动成功，监听地址: {}", config.server_addr());

    axum::serve(listener, app).await?;

    Ok(())
}
