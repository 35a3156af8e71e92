//! 故事响应解析
//!
//! 生成服务返回的是自由文本，可能是纯 JSON、markdown 代码块包裹的 JSON，
//! 也可能在 JSON 前后夹带说明文字。解析按固定顺序尝试，首个得到 JSON
//! 对象的策略胜出：
//!
//! 1. 整段文本直接解析
//! 2. `` ```json `` 代码块内容
//! 3. 第一个 `{` 到最后一个 `}` 之间的子串（含两端）
//!
//! 第 3 步假设 JSON 之外的叙述文字不含花括号，这是已知的脆弱点。
//! 代码块内容无法解析时会继续尝试第 3 步，但此时截取起点就是代码块里
//! 的 `{`，通常同样失败，最终返回 `MalformedResponse`。
//! 得到对象后再校验四个必填字段，任何缺失或类型不符都返回
//! `MalformedResponse`，不会用默认值补齐。

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::story::StoryRecord;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)```json\s*(.*?)\s*```").expect("fenced json pattern is valid")
});

/// 响应解析 trait
pub trait ResponseParser: Send + Sync {
    /// 从原始文本中提取故事记录
    fn extract(&self, raw: &str) -> Result<StoryRecord, GenerationError>;
}

/// 成功解析所用的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTier {
    /// 整段直接解析
    Direct,
    /// `` ```json `` 代码块
    Fenced,
    /// 首尾花括号截取
    BraceScan,
}

/// 宽松 JSON 解析器
#[derive(Debug, Clone, Default)]
pub struct LenientJsonParser;

impl LenientJsonParser {
    pub fn new() -> Self {
        Self
    }

    /// 提取故事记录，并返回命中的策略
    pub fn extract_with_tier(
        &self,
        raw: &str,
    ) -> Result<(StoryRecord, ExtractionTier), GenerationError> {
        let (object, tier) = locate_object(raw).ok_or_else(|| {
            warn!(raw_len = raw.len(), raw = %raw, "no JSON object found in generator output");
            GenerationError::malformed("no JSON object found in response", raw)
        })?;

        debug!(?tier, "structured record located");

        let record = into_story_record(object).map_err(|reason| {
            warn!(?tier, %reason, raw = %raw, "generator output failed validation");
            GenerationError::malformed(reason, raw)
        })?;

        Ok((record, tier))
    }
}

impl ResponseParser for LenientJsonParser {
    fn extract(&self, raw: &str) -> Result<StoryRecord, GenerationError> {
        self.extract_with_tier(raw).map(|(record, _)| record)
    }
}

/// 按顺序尝试三种策略，返回首个 JSON 对象
fn locate_object(raw: &str) -> Option<(Map<String, Value>, ExtractionTier)> {
    if let Some(object) = parse_object(raw) {
        return Some((object, ExtractionTier::Direct));
    }

    if let Some(object) = FENCED_JSON
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .and_then(|inner| parse_object(inner.as_str()))
    {
        return Some((object, ExtractionTier::Fenced));
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if start >= end {
        return None;
    }
    parse_object(&raw[start..=end]).map(|object| (object, ExtractionTier::BraceScan))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text.trim()) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

/// 校验必填字段并转换
fn into_story_record(mut object: Map<String, Value>) -> Result<StoryRecord, String> {
    let story_text = match object.remove("story_text") {
        Some(Value::String(text)) if !text.trim().is_empty() => text,
        Some(Value::String(_)) => return Err("story_text is empty".into()),
        Some(other) => return Err(format!("story_text must be a string, got {}", other)),
        None => return Err("missing field: story_text".into()),
    };

    let choices = match object.remove("choices") {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(choice) => Ok(choice),
                other => Err(format!("choices must contain strings, got {}", other)),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => return Err(format!("choices must be an array, got {}", other)),
        None => return Err("missing field: choices".into()),
    };

    let location = match object.remove("location") {
        Some(Value::String(location)) => location,
        Some(other) => return Err(format!("location must be a string, got {}", other)),
        None => return Err("missing field: location".into()),
    };

    let combat_encounter = match object.remove("combat_encounter") {
        Some(value) => coerce_bool(&value)
            .ok_or_else(|| format!("combat_encounter is not boolean: {}", value))?,
        None => return Err("missing field: combat_encounter".into()),
    };

    Ok(StoryRecord {
        story_text,
        choices,
        location,
        combat_encounter,
    })
}

/// 布尔兼容：true/false、"true"/"false"、0/1
fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(number) => match number.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        _ => None,
    }
}
