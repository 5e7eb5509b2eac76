//! 重复调用检测：记住最近 3 次已执行调用的签名
//!
//! 签名 = 工具名 + 按键排序的 (参数名, 参数值的规范 JSON 文本)，任意 JSON 值（含数组、对象）都可比较。
//! 整数值的浮点数（如 1.0）与对应整数视为同一参数值。

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::agentic::ToolCall;

/// 记忆窗口大小
pub const LOOP_WINDOW: usize = 3;

/// 调用签名
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallSignature {
    name: String,
    args: Vec<(String, String)>,
}

impl CallSignature {
    pub fn new(name: &str, args: &Map<String, Value>) -> Self {
        // serde_json::Map 默认按键有序，嵌套对象的 to_string 同样稳定
        let mut args: Vec<(String, String)> = args
            .iter()
            .map(|(k, v)| (k.clone(), canonical(v).to_string()))
            .collect();
        args.sort();
        Self {
            name: name.to_string(),
            args,
        }
    }

    pub fn of(call: &ToolCall) -> Self {
        Self::new(&call.name, &call.args)
    }
}

/// 把整数值的浮点数收敛为整数，递归处理数组与对象
fn canonical(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (k.clone(), canonical(v)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// FIFO 窗口，满时淘汰最旧的签名
#[derive(Debug, Clone)]
pub struct LoopGuard {
    recent: VecDeque<CallSignature>,
    capacity: usize,
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopGuard {
    pub fn new() -> Self {
        Self::with_capacity(LOOP_WINDOW)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, signature: &CallSignature) -> bool {
        self.recent.contains(signature)
    }

    /// 返回第一个与窗口中签名相同的候选调用
    pub fn first_repeat<'a>(&self, calls: &'a [ToolCall]) -> Option<&'a ToolCall> {
        calls
            .iter()
            .find(|call| self.contains(&CallSignature::of(call)))
    }

    /// 记录一次已执行的调用
    pub fn record(&mut self, signature: CallSignature) {
        if self.capacity == 0 {
            return;
        }
        if self.recent.len() == self.capacity {
            self.recent.pop_front();
        }
        self.recent.push_back(signature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new(name, args.as_object().cloned().unwrap_or_default())
    }

    #[test]
    fn test_signature_ignores_key_order() {
        let a = call("q", json!({"symbol": "AAPL", "period": "1d"}));
        let b = call("q", json!({"period": "1d", "symbol": "AAPL"}));
        assert_eq!(CallSignature::of(&a), CallSignature::of(&b));
    }

    #[test]
    fn test_signature_distinguishes_values_and_names() {
        let base = CallSignature::of(&call("q", json!({"symbol": "AAPL"})));
        assert_ne!(base, CallSignature::of(&call("q", json!({"symbol": "MSFT"}))));
        assert_ne!(base, CallSignature::of(&call("r", json!({"symbol": "AAPL"}))));
        assert_ne!(base, CallSignature::of(&call("q", json!({"symbol": ["AAPL"]}))));
    }

    #[test]
    fn test_unhashable_style_values() {
        let a = call("q", json!({"filters": {"b": 1, "a": [1, 2]}}));
        let b = call("q", json!({"filters": {"a": [1, 2], "b": 1}}));
        assert_eq!(CallSignature::of(&a), CallSignature::of(&b));
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut guard = LoopGuard::new();
        for i in 0..4 {
            guard.record(CallSignature::of(&call("q", json!({"n": i}))));
        }
        assert!(!guard.contains(&CallSignature::of(&call("q", json!({"n": 0})))));
        for i in 1..4 {
            assert!(guard.contains(&CallSignature::of(&call("q", json!({"n": i})))));
        }
    }

    #[test]
    fn test_integral_float_matches_integer() {
        let int = CallSignature::of(&call("q", json!({"n": 1, "xs": [2, {"k": 3}]})));
        let float = CallSignature::of(&call("q", json!({"n": 1.0, "xs": [2.0, {"k": 3.0}]})));
        assert_eq!(int, float);
        assert_ne!(
            CallSignature::of(&call("q", json!({"n": 1.5}))),
            CallSignature::of(&call("q", json!({"n": 1})))
        );
    }

    #[test]
    fn test_first_repeat() {
        let mut guard = LoopGuard::new();
        guard.record(CallSignature::of(&call("q", json!({"n": 1}))));
        let calls = vec![call("q", json!({"n": 2})), call("q", json!({"n": 1}))];
        let repeat = guard.first_repeat(&calls).unwrap();
        assert_eq!(repeat.args["n"], 1);
        assert!(guard.first_repeat(&calls[..1]).is_none());
    }
}
