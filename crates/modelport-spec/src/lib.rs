//! ModelPort catalog spec.
//!
//! Defines the endpoint catalog document handed over by discovery, the
//! declared-type vocabulary, and the schema inference that turns each
//! descriptor into an ordered, strongly-typed parameter list. The runtime
//! crate consumes the inferred [`EndpointSchema`]s to marshal cell values
//! in and spill results out.

pub mod catalog;
pub mod infer;
pub mod types;
pub mod validation;

pub use catalog::{
    CURRENT_SPEC_VERSION, CatalogMeta, Credentials, EndpointCatalog, EndpointDescriptor,
    SPEC_IDENT, SignatureEntry, SpecVersion, TensorSpec,
};
pub use infer::{
    EndpointSchema, ParameterSpec, clean_function_name, infer_parameters, normalize_example,
    parse_signature_document,
};
pub use types::{ParamKind, classify, classify_entry, is_date_field};
pub use validation::{CatalogError, CatalogIssue};

/// JSON Schema for the catalog document, as a `serde_json::Value`.
pub fn generate_schema_value() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(EndpointCatalog))
        .expect("catalog schema serializes to JSON")
}

/// Pretty-printed JSON Schema for the catalog document.
pub fn generate_schema_json_pretty() -> String {
    serde_json::to_string_pretty(&generate_schema_value())
        .expect("catalog schema serializes to JSON")
}
