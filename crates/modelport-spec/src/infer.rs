//! Parameter schema inference.
//!
//! Turns whatever shape information discovery recovered for an endpoint
//! (a declared signature, a raw example payload, or both) into the ordered
//! [`ParameterSpec`] list that defines the generated function's positional
//! argument contract. Inference is a pure function of its inputs: running it
//! twice on the same descriptor yields structurally equal output, which the
//! generation pipeline relies on for reproducible builds.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::catalog::{Credentials, SignatureEntry};
use crate::types::{ParamKind, classify, classify_entry, is_date_field};

/// One inferred parameter.
///
/// `name` is used verbatim as the JSON object key in request bodies; the
/// position within the owning list is the call-site argument order and is
/// never reordered after inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParameterSpec {
    pub name: String,
    pub kind: ParamKind,
    pub is_array: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<JsonValue>,
}

/// A fully inferred endpoint, ready for the generation pipeline.
///
/// Immutable once emitted; the pipeline owns it for the lifetime of one
/// generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EndpointSchema {
    pub function_name: String,
    pub url: String,
    pub credentials: Credentials,
    pub parameters: Vec<ParameterSpec>,
    pub description: String,
}

/// Infer the ordered parameter list for one endpoint.
///
/// A present, non-empty signature wins; otherwise the example object's keys
/// are classified in their natural order. `None` means the endpoint has no
/// discoverable shape and produces no callable function, an expected
/// outcome rather than an error.
pub fn infer_parameters(
    signature: Option<&[SignatureEntry]>,
    example: Option<&JsonMap<String, JsonValue>>,
) -> Option<Vec<ParameterSpec>> {
    let mut specs = Vec::new();

    match signature {
        Some(entries) if !entries.is_empty() => {
            for entry in entries {
                let name = entry.name.trim();
                if name.is_empty() {
                    continue;
                }
                let sample = example.and_then(|m| m.get(name));
                let (mut kind, is_array) = classify_entry(entry, sample);
                if kind == ParamKind::String && is_date_field(name, sample) {
                    kind = ParamKind::Date;
                }
                specs.push(ParameterSpec {
                    name: name.to_string(),
                    kind,
                    is_array,
                    example: sample.cloned(),
                });
            }
        }
        _ => {
            for (name, value) in example? {
                if name.trim().is_empty() {
                    continue;
                }
                let (mut kind, is_array) = classify(None, name, Some(value));
                if kind == ParamKind::String && is_date_field(name, Some(value)) {
                    kind = ParamKind::Date;
                }
                specs.push(ParameterSpec {
                    name: name.clone(),
                    kind,
                    is_array,
                    example: Some(value.clone()),
                });
            }
        }
    }

    if specs.is_empty() { None } else { Some(specs) }
}

/// Unwrap a raw example payload into the parameter-name → sample-value map.
///
/// Accepts the two payload shapes discovery produces: `{"data": {…}}`
/// request bodies, and registry `dataframe_split` input-example documents
/// (single data row → scalar samples, several rows → per-column arrays,
/// no rows → nulls).
pub fn normalize_example(payload: &JsonValue) -> Option<JsonMap<String, JsonValue>> {
    let obj = payload.as_object()?;

    if let Some(split) = obj.get("dataframe_split").and_then(JsonValue::as_object) {
        let columns: Vec<&str> = split
            .get("columns")?
            .as_array()?
            .iter()
            .filter_map(JsonValue::as_str)
            .collect();
        let rows: Vec<&Vec<JsonValue>> = split
            .get("data")
            .and_then(JsonValue::as_array)
            .map(|rows| rows.iter().filter_map(JsonValue::as_array).collect())
            .unwrap_or_default();

        let mut out = JsonMap::new();
        match rows.len() {
            0 => {
                for col in columns {
                    out.insert(col.to_string(), JsonValue::Null);
                }
            }
            1 => {
                for (i, col) in columns.iter().enumerate() {
                    let value = rows[0].get(i).cloned().unwrap_or(JsonValue::Null);
                    out.insert(col.to_string(), value);
                }
            }
            _ => {
                for (i, col) in columns.iter().enumerate() {
                    let series: Vec<JsonValue> = rows
                        .iter()
                        .map(|row| row.get(i).cloned().unwrap_or(JsonValue::Null))
                        .collect();
                    out.insert(col.to_string(), JsonValue::Array(series));
                }
            }
        }
        return Some(out);
    }

    obj.get("data").and_then(JsonValue::as_object).cloned()
}

/// Parse a registry model-description document (YAML) into signature
/// entries.
///
/// The `signature.inputs` field may be a native list, a JSON-encoded string,
/// or a `{"inputs": […]}` wrapper; all three are handled. `None` for
/// anything that does not yield at least one entry.
pub fn parse_signature_document(text: &str) -> Option<Vec<SignatureEntry>> {
    let doc: JsonValue = serde_yaml::from_str(text).ok()?;
    let inputs = doc.get("signature")?.get("inputs")?;

    let inputs: JsonValue = match inputs {
        JsonValue::String(encoded) => serde_json::from_str(encoded).ok()?,
        other => other.clone(),
    };
    let inputs = match inputs {
        JsonValue::Object(ref map) if map.contains_key("inputs") => map.get("inputs")?.clone(),
        other => other,
    };

    let entries: Vec<SignatureEntry> = serde_json::from_value(inputs).ok()?;
    if entries.is_empty() { None } else { Some(entries) }
}

static CLEAN_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("clean name regex must compile"));

static NAME_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9]+").expect("name split regex must compile"));

/// Clean an endpoint name into a function identifier.
///
/// Already-clean alphanumeric names pass through unchanged; anything with
/// punctuation or spaces is split and CamelCased. Names that would start
/// with a digit get `prefix` prepended.
pub fn clean_function_name(name: &str, prefix: &str) -> String {
    if CLEAN_NAME_RE.is_match(name) {
        return name.to_string();
    }

    let camel: String = NAME_SPLIT_RE
        .split(name)
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();

    if camel.is_empty() {
        return format!("Unnamed{prefix}");
    }
    if camel.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        return format!("{prefix}{camel}");
    }
    camel
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
        None => String::new(),
    }
}
