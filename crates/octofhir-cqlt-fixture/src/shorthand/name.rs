//! Human names: `Given Middle Family`

use super::ShorthandContext;
use serde_json::{Map, Value};

/// Split on whitespace; the last of two or more tokens is the family name.
/// `family` is a one-element list when the schema lets it repeat.
pub fn decode_human_name(raw: &str, ctx: &ShorthandContext<'_>) -> Value {
    let mut tokens: Vec<&str> = raw.split_whitespace().collect();
    let family = if tokens.len() > 1 { tokens.pop() } else { None };

    let mut name = Map::new();
    name.insert(
        "given".into(),
        Value::Array(tokens.into_iter().map(Value::from).collect()),
    );
    if let Some(family) = family {
        let family = Value::from(family);
        let family = if ctx.family_is_list {
            Value::Array(vec![family])
        } else {
            family
        };
        name.insert("family".into(), family);
    }
    Value::Object(name)
}
