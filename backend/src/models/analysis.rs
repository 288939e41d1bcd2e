use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// 分析结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AnalysisResult {
    /// 未见异常
    Normal,
    /// 可疑，建议就医复查
    Suspicious,
    /// 分析失败
    Error,
}

impl AnalysisResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisResult::Normal => "Normal",
            AnalysisResult::Suspicious => "Suspicious",
            AnalysisResult::Error => "Error",
        }
    }
}

impl std::fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AnalysisResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Normal" => Ok(AnalysisResult::Normal),
            "Suspicious" => Ok(AnalysisResult::Suspicious),
            "Error" => Ok(AnalysisResult::Error),
            _ => Err(format!("无效的分析结论: {}", s)),
        }
    }
}

/// 分析记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// 待分析（保留状态，流水线不会写入）
    Pending,
    /// 已完成
    Completed,
    /// 失败
    Failed,
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStatus::Pending => write!(f, "pending"),
            AnalysisStatus::Completed => write!(f, "completed"),
            AnalysisStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AnalysisStatus::Pending),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            _ => Err(format!("无效的记录状态: {}", s)),
        }
    }
}

// 两个枚举在数据库中以 TEXT 存储
macro_rules! impl_text_column {
    ($ty:ty) => {
        impl sqlx::decode::Decode<'_, sqlx::Postgres> for $ty {
            fn decode(
                value: sqlx::postgres::PgValueRef<'_>,
            ) -> Result<Self, Box<dyn std::error::Error + 'static + Send + Sync>> {
                let s = <String as sqlx::decode::Decode<sqlx::Postgres>>::decode(value)?;
                s.parse().map_err(|e| {
                    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
                        as Box<dyn std::error::Error + 'static + Send + Sync>
                })
            }
        }

        impl sqlx::encode::Encode<'_, sqlx::Postgres> for $ty {
            fn encode_by_ref(
                &self,
                buf: &mut sqlx::postgres::PgArgumentBuffer,
            ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync + 'static>>
            {
                <String as sqlx::encode::Encode<sqlx::Postgres>>::encode_by_ref(
                    &self.to_string(),
                    buf,
                )
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }
        }
    };
}

impl_text_column!(AnalysisResult);
impl_text_column!(AnalysisStatus);

/// 分析记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AnalysisRecord {
    /// 记录唯一标识符（UUID v4）
    pub id: Uuid,
    /// 提交用户ID
    pub owner_id: i64,
    /// 规范化图像在存储中的路径
    pub image_path: String,
    /// 分析结论
    pub result: AnalysisResult,
    /// 补充说明（解析过程中的备注）
    pub detail: Option<String>,
    /// 置信度，范围 [0, 1]
    pub confidence: f64,
    /// 记录状态
    pub status: AnalysisStatus,
    /// 创建时间（UTC时间）
    pub created_at: DateTime<Utc>,
}

/// 创建分析记录请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysisRecord {
    pub owner_id: i64,
    pub image_path: String,
    pub result: AnalysisResult,
    pub detail: Option<String>,
    pub confidence: f64,
    pub status: AnalysisStatus,
}

impl NewAnalysisRecord {
    /// 成功或部分成功的分析，置信度被钳制到 [0, 1]
    pub fn completed(
        owner_id: i64,
        image_path: impl Into<String>,
        result: AnalysisResult,
        confidence: f64,
        detail: Option<String>,
    ) -> Self {
        Self {
            owner_id,
            image_path: image_path.into(),
            result,
            detail,
            confidence: clamp_confidence(confidence),
            status: AnalysisStatus::Completed,
        }
    }

    /// 失败的分析：结论固定为 Error，置信度固定为 0
    pub fn failed(owner_id: i64, image_path: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            owner_id,
            image_path: image_path.into(),
            result: AnalysisResult::Error,
            detail,
            confidence: 0.0,
            status: AnalysisStatus::Failed,
        }
    }

    /// 写入前的最终校验
    pub fn validate(&self) -> Result<(), String> {
        if self.owner_id <= 0 {
            return Err("用户ID无效".into());
        }
        if self.image_path.trim().is_empty() {
            return Err("图像路径不能为空".into());
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("置信度超出范围: {}", self.confidence));
        }
        if self.status == AnalysisStatus::Failed
            && (self.result != AnalysisResult::Error || self.confidence != 0.0)
        {
            return Err("失败记录必须为 Error 且置信度为 0".into());
        }
        Ok(())
    }
}

/// 将置信度钳制到 [0, 1]，非有限值视为 0
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
