//! Parsing of the engine's `--json` standard output.
//!
//! Expected shape: a JSON object with `results` and `errors` arrays. Either
//! field may be missing (treated as empty). Each result's message is read
//! from `message` or `extra.message`; position keys are kept opaque.

use serde_json::{Map, Value};

use crate::engine::result::{EngineError, Match};
use crate::error::MalformedOutput;

const LOCATION_KEYS: &[&str] = &["path", "start", "end"];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub matches: Vec<Match>,
    pub errors: Vec<EngineError>,
}

pub fn parse_engine_output(stdout: &str) -> Result<ParsedOutput, MalformedOutput> {
    let value: Value = serde_json::from_str(stdout)?;
    let object = value.as_object().ok_or(MalformedOutput::NotAnObject)?;

    let matches = array_field(object, "results")?
        .iter()
        .map(to_match)
        .collect();
    let errors = array_field(object, "errors")?
        .iter()
        .map(to_engine_error)
        .collect();

    Ok(ParsedOutput { matches, errors })
}

fn array_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a [Value], MalformedOutput> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(MalformedOutput::NotAnArray(field)),
    }
}

fn to_match(result: &Value) -> Match {
    let location = match result.as_object() {
        Some(object) => {
            let picked: Map<String, Value> = LOCATION_KEYS
                .iter()
                .filter_map(|k| object.get(*k).map(|v| ((*k).to_string(), v.clone())))
                .collect();
            if picked.is_empty() {
                Value::Null
            } else {
                Value::Object(picked)
            }
        }
        None => Value::Null,
    };

    Match {
        message: message_of(result),
        location,
    }
}

fn to_engine_error(error: &Value) -> EngineError {
    EngineError {
        message: message_of(error),
        level: error
            .get("level")
            .and_then(Value::as_str)
            .map(str::to_string),
        detail: error.clone(),
    }
}

fn message_of(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| value.pointer("/extra/message").and_then(Value::as_str))
        .or_else(|| value.as_str())
        .unwrap_or_default()
        .to_string()
}
