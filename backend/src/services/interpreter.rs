use crate::models::{AnalysisResult, AnalysisStatus, NewAnalysisRecord};

/// 置信度无法解析时使用的中性值
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const NOTE_EMPTY_RESPONSE: &str = "empty response";
pub const NOTE_UNRECOGNIZED_CATEGORY: &str = "unrecognized category";
pub const NOTE_CONFIDENCE_UNPARSABLE: &str = "confidence unparsable";
pub const NOTE_CONFIDENCE_PERCENTAGE: &str = "confidence given as percentage";
pub const NOTE_CONFIDENCE_CLAMPED: &str = "confidence clamped to [0, 1]";

/// 模型回复的解释结果
#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    pub result: AnalysisResult,
    pub confidence: f64,
    pub status: AnalysisStatus,
    /// 解析过程中的偏差说明
    pub notes: Vec<String>,
}

impl Interpretation {
    /// 将说明合并为记录的 detail 字段
    pub fn detail(&self) -> Option<String> {
        if self.notes.is_empty() {
            None
        } else {
            Some(self.notes.join("; "))
        }
    }

    /// 生成待写入的记录
    pub fn into_record(self, owner_id: i64, image_path: impl Into<String>) -> NewAnalysisRecord {
        let detail = self.detail();
        match self.status {
            AnalysisStatus::Failed => NewAnalysisRecord::failed(owner_id, image_path, detail),
            _ => NewAnalysisRecord::completed(
                owner_id,
                image_path,
                self.result,
                self.confidence,
                detail,
            ),
        }
    }

    fn failed(note: &str) -> Self {
        Self {
            result: AnalysisResult::Error,
            confidence: 0.0,
            status: AnalysisStatus::Failed,
            notes: vec![note.to_string()],
        }
    }
}

/// 把模型的自由文本回复解析为 `<Category>,<Confidence>`
///
/// 只把回复当作数据处理。格式偏差不会报错，而是记录在 `notes` 中：
/// 无法识别的类别按 Suspicious 处理，无法解析的置信度取 0.5，
/// 大于1或带 `%` 的置信度按百分比换算后再钳制到 [0, 1]。
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseInterpreter;

impl ResponseInterpreter {
    pub fn new() -> Self {
        Self
    }

    pub fn interpret(&self, raw: &str) -> Interpretation {
        let Some(line) = raw.lines().map(str::trim).find(|line| !line.is_empty()) else {
            return Interpretation::failed(NOTE_EMPTY_RESPONSE);
        };

        let line = strip_wrapping(line);
        if line.is_empty() {
            return Interpretation::failed(NOTE_EMPTY_RESPONSE);
        }

        let (category, confidence) = match line.split_once(',') {
            Some((category, confidence)) => (category, Some(confidence)),
            None => (line, None),
        };

        let mut notes = Vec::new();
        let result = parse_category(category).unwrap_or_else(|| {
            notes.push(NOTE_UNRECOGNIZED_CATEGORY.to_string());
            AnalysisResult::Suspicious
        });
        let confidence = parse_confidence(confidence, &mut notes);

        Interpretation {
            result,
            confidence,
            status: AnalysisStatus::Completed,
            notes,
        }
    }
}

fn strip_wrapping(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_whitespace() || matches!(c, '"' | '\'' | '`' | '*'))
}

fn parse_category(token: &str) -> Option<AnalysisResult> {
    let token = strip_wrapping(token).trim_end_matches('.');
    if token.eq_ignore_ascii_case("normal") {
        Some(AnalysisResult::Normal)
    } else if token.eq_ignore_ascii_case("suspicious") {
        Some(AnalysisResult::Suspicious)
    } else {
        None
    }
}

fn parse_confidence(token: Option<&str>, notes: &mut Vec<String>) -> f64 {
    let token = token.map(|t| strip_wrapping(t).trim_end_matches('.').trim());
    let (number, is_percentage) = match token {
        Some(t) => match t.strip_suffix('%') {
            Some(rest) => (rest.trim(), true),
            None => (t, false),
        },
        None => ("", false),
    };

    let value = match number.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => {
            notes.push(NOTE_CONFIDENCE_UNPARSABLE.to_string());
            return DEFAULT_CONFIDENCE;
        }
    };

    let value = if is_percentage || value > 1.0 {
        notes.push(NOTE_CONFIDENCE_PERCENTAGE.to_string());
        value / 100.0
    } else {
        value
    };

    if !(0.0..=1.0).contains(&value) {
        notes.push(NOTE_CONFIDENCE_CLAMPED.to_string());
        return value.clamp(0.0, 1.0);
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interpret(raw: &str) -> Interpretation {
        ResponseInterpreter::new().interpret(raw)
    }

    #[test]
    fn test_well_formed_responses() {
        let normal = interpret("Normal,0.95");
        assert_eq!(normal.result, AnalysisResult::Normal);
        assert_eq!(normal.confidence, 0.95);
        assert_eq!(normal.status, AnalysisStatus::Completed);
        assert!(normal.notes.is_empty());
        assert_eq!(normal.detail(), None);

        let suspicious = interpret("Suspicious,0.85");
        assert_eq!(suspicious.result, AnalysisResult::Suspicious);
        assert_eq!(suspicious.confidence, 0.85);
        assert_eq!(suspicious.status, AnalysisStatus::Completed);
    }

    #[test]
    fn test_tolerates_formatting_noise() {
        let i = interpret("\n  \"suspicious , 0.7\"  \nextra commentary");
        assert_eq!(i.result, AnalysisResult::Suspicious);
        assert_eq!(i.confidence, 0.7);
        assert!(i.notes.is_empty());

        let i = interpret("`NORMAL., 0.6.`");
        assert_eq!(i.result, AnalysisResult::Normal);
        assert_eq!(i.confidence, 0.6);
    }

    #[test]
    fn test_percentage_convention() {
        let i = interpret("Normal,150");
        assert_eq!(i.result, AnalysisResult::Normal);
        assert_eq!(i.confidence, 1.0);
        assert!(i.notes.contains(&NOTE_CONFIDENCE_PERCENTAGE.to_string()));
        assert!(i.notes.contains(&NOTE_CONFIDENCE_CLAMPED.to_string()));

        let i = interpret("Suspicious,85");
        assert!((i.confidence - 0.85).abs() < 1e-9);
        assert_eq!(i.detail().as_deref(), Some(NOTE_CONFIDENCE_PERCENTAGE));

        let i = interpret("Normal,85%");
        assert!((i.confidence - 0.85).abs() < 1e-9);

        // 0.5% 是百分比而不是 0.5
        let i = interpret("Normal,0.5%");
        assert!((i.confidence - 0.005).abs() < 1e-9);
    }

    #[test]
    fn test_negative_confidence_clamped() {
        let i = interpret("Normal,-0.3");
        assert_eq!(i.confidence, 0.0);
        assert_eq!(i.status, AnalysisStatus::Completed);
        assert_eq!(i.detail().as_deref(), Some(NOTE_CONFIDENCE_CLAMPED));
    }

    #[test]
    fn test_garbage() {
        let i = interpret("garbage");
        assert_eq!(i.result, AnalysisResult::Suspicious);
        assert_eq!(i.confidence, DEFAULT_CONFIDENCE);
        assert_eq!(i.status, AnalysisStatus::Completed);
        assert_eq!(
            i.detail().as_deref(),
            Some("unrecognized category; confidence unparsable")
        );
    }

    #[test]
    fn test_unparsable_confidence() {
        for raw in ["Normal", "Normal,", "Normal,high", "Normal,NaN", "Normal,inf"] {
            let i = interpret(raw);
            assert_eq!(i.result, AnalysisResult::Normal, "{}", raw);
            assert_eq!(i.confidence, DEFAULT_CONFIDENCE, "{}", raw);
            assert_eq!(i.notes, vec![NOTE_CONFIDENCE_UNPARSABLE.to_string()], "{}", raw);
        }
    }

    #[test]
    fn test_empty_response_fails() {
        for raw in ["", "   ", "\n\n\t", "\"\""] {
            let i = interpret(raw);
            assert_eq!(i.result, AnalysisResult::Error);
            assert_eq!(i.confidence, 0.0);
            assert_eq!(i.status, AnalysisStatus::Failed);
        }
    }

    #[test]
    fn test_into_record() {
        let record = interpret("Normal,150").into_record(7, "images/a.jpg");
        assert_eq!(record.owner_id, 7);
        assert_eq!(record.status, AnalysisStatus::Completed);
        assert_eq!(record.confidence, 1.0);
        assert!(record.validate().is_ok());

        let record = interpret("").into_record(7, "images/a.jpg");
        assert_eq!(record.status, AnalysisStatus::Failed);
        assert_eq!(record.result, AnalysisResult::Error);
        assert_eq!(record.detail.as_deref(), Some(NOTE_EMPTY_RESPONSE));
        assert!(record.validate().is_ok());
    }
}
