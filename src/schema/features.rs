//! Feature expressions.
//!
//! A stream's `features` entry is a list of expressions. An expression is a
//! base feature name (a string), a constant (number or boolean, not a feature),
//! or an operation applied to further expressions. In the operation form
//! `{"mean": ["octetTotalCount"]}` the single key names the operation; 3.0 also
//! writes it as `{"function": "mean", "args": ["octetTotalCount"]}`.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureSyntax {
    /// `{op: args}` objects only.
    Operations,
    /// `{op: args}` and `{"function": op, "args": [...]}` objects.
    FunctionCalls,
}

impl FeatureSyntax {
    /// Every base feature name in `features`, depth-first and in order.
    /// Repeated names are kept.
    pub fn base_feature_names(self, features: &Value) -> Vec<String> {
        let mut names = Vec::new();
        self.collect(features, &mut names);
        names
    }

    fn collect(self, expr: &Value, names: &mut Vec<String>) {
        match expr {
            Value::String(name) => names.push(name.clone()),
            Value::Array(items) => {
                for item in items {
                    self.collect(item, names);
                }
            }
            Value::Object(map) => {
                if self == FeatureSyntax::FunctionCalls && map.contains_key("function") {
                    if let Some(args) = map.get("args") {
                        self.collect(args, names);
                    }
                    return;
                }
                for args in map.values() {
                    self.collect(args, names);
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operations_are_unwrapped() {
        let features = json!([
            "sourceIPv4Address",
            {"mean": ["ipTotalLength"]},
            {"divide": [{"count": ["packetTotalCount"]}, 2]},
            true
        ]);
        assert_eq!(
            FeatureSyntax::Operations.base_feature_names(&features),
            vec!["sourceIPv4Address", "ipTotalLength", "packetTotalCount"]
        );
    }

    #[test]
    fn function_call_form_skips_operation_name() {
        let features = json!([
            {"function": "mean", "args": ["ipTotalLength"]},
            {"max": "octetTotalCount"}
        ]);
        assert_eq!(
            FeatureSyntax::FunctionCalls.base_feature_names(&features),
            vec!["ipTotalLength", "octetTotalCount"]
        );
        // Without 3.0 syntax the operation name reads like a base feature.
        assert_eq!(
            FeatureSyntax::Operations.base_feature_names(&features),
            vec!["ipTotalLength", "mean", "octetTotalCount"]
        );
    }

    #[test]
    fn duplicates_are_kept() {
        let features = json!(["a", {"sum": ["a", "b"]}]);
        assert_eq!(
            FeatureSyntax::Operations.base_feature_names(&features),
            vec!["a", "a", "b"]
        );
    }
}
