//! 结果序列化：任意工具数据转为 JSON，超长列表截断后写入 transcript

use std::fmt::Debug;

use serde::Serialize;
use serde_json::{json, Value};

use crate::tools::ToolResult;

/// transcript 中列表最多保留的元素数
pub const TRUNCATE_LIMIT: usize = 100;

/// 日志与事件中文本预览的最大字符数
pub const PREVIEW_CHARS: usize = 200;

/// 按字符（非字节）截断，超长时追加 "..."
pub fn truncate_chars(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &s[..cut]),
        None => s.to_string(),
    }
}

/// 转为 JSON 值；无法序列化时退化为 Debug 文本，不会失败
pub fn to_json_safe<T: Serialize + Debug + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to debug representation");
            Value::String(format!("{value:?}"))
        }
    }
}

/// 顶层列表超过 limit 时包装为截断对象，其余原样返回
pub fn truncate_list(value: Value, limit: usize) -> Value {
    match value {
        Value::Array(items) if items.len() > limit => {
            let total = items.len();
            let shown: Vec<Value> = items.into_iter().take(limit).collect();
            json!({
                "_truncated": true,
                "_total_items": total,
                "_items_shown": limit,
                "data": shown,
                "note": format!("Response truncated: showing first {limit} of {total} items"),
            })
        }
        other => other,
    }
}

/// IterationRecord.response：仅成功且有数据时存在
pub fn response_payload(result: &ToolResult) -> Option<Value> {
    if !result.success {
        return None;
    }
    match &result.data {
        None | Some(Value::Null) => None,
        Some(data) => Some(truncate_list(data.clone(), TRUNCATE_LIMIT)),
    }
}

/// IterationRecord.metadata：元信息为空时为 None
pub fn metadata_payload(result: &ToolResult) -> Option<Value> {
    if result.metadata.is_empty() {
        None
    } else {
        Some(to_json_safe(&result.metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 6), "abcdef");
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("价格查询工具", 2), "价格...");
        let long = "x".repeat(PREVIEW_CHARS + 5);
        assert_eq!(truncate_chars(&long, PREVIEW_CHARS).chars().count(), PREVIEW_CHARS + 3);
    }

    #[test]
    fn test_to_json_safe_struct() {
        #[derive(Debug, Serialize)]
        struct Bar {
            close: f64,
            tags: Vec<&'static str>,
        }
        let v = to_json_safe(&Bar {
            close: 1.25,
            tags: vec!["a"],
        });
        assert_eq!(v, json!({"close": 1.25, "tags": ["a"]}));
    }

    #[test]
    fn test_to_json_safe_falls_back_to_debug() {
        let mut m: HashMap<(i32, i32), i32> = HashMap::new();
        m.insert((1, 2), 3);
        let v = to_json_safe(&m);
        assert_eq!(v, Value::String("{(1, 2): 3}".to_string()));
    }

    #[test]
    fn test_truncate_long_list() {
        let items: Vec<Value> = (0..150).map(|i| json!(i)).collect();
        let v = truncate_list(Value::Array(items), TRUNCATE_LIMIT);
        assert_eq!(v["_truncated"], true);
        assert_eq!(v["_total_items"], 150);
        assert_eq!(v["_items_shown"], 100);
        assert_eq!(v["data"].as_array().unwrap().len(), 100);
        assert_eq!(v["data"][99], 99);
        assert_eq!(v["note"], "Response truncated: showing first 100 of 150 items");
    }

    #[test]
    fn test_short_list_and_objects_untouched() {
        let list = json!([1, 2, 3]);
        assert_eq!(truncate_list(list.clone(), TRUNCATE_LIMIT), list);
        let exact: Vec<Value> = (0..100).map(|i| json!(i)).collect();
        assert_eq!(
            truncate_list(Value::Array(exact.clone()), TRUNCATE_LIMIT),
            Value::Array(exact)
        );
        let obj = json!({"rows": (0..200).collect::<Vec<i32>>()});
        assert_eq!(truncate_list(obj.clone(), TRUNCATE_LIMIT), obj);
    }

    #[test]
    fn test_response_payload() {
        assert!(response_payload(&ToolResult::failure("x")).is_none());
        assert!(response_payload(&ToolResult::empty()).is_none());
        assert!(response_payload(&ToolResult::ok(Value::Null)).is_none());
        assert_eq!(
            response_payload(&ToolResult::ok(json!({"a": 1}))),
            Some(json!({"a": 1}))
        );
    }

    #[test]
    fn test_metadata_payload() {
        assert!(metadata_payload(&ToolResult::empty()).is_none());
        let r = ToolResult::empty().with_meta("source", json!("cache"));
        assert_eq!(metadata_payload(&r), Some(json!({"source": "cache"})));
    }
}
