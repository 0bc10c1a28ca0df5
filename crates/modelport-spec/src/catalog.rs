use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use schemars::{JsonSchema, Schema, SchemaGenerator, json_schema};
use semver::Version;
use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::infer::{EndpointSchema, clean_function_name, infer_parameters, normalize_example};
use crate::validation::{CatalogError, CatalogIssue};

/// Current supported catalog specification version.
pub const CURRENT_SPEC_VERSION: &str = "0.1.0";
/// Constant identifier for this spec.
pub const SPEC_IDENT: &str = "modelport";

static CATALOG_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]{1,62}[a-z0-9]$").expect("catalog id regex must compile")
});

/// Canonical catalog document.
///
/// The discovery service emits one of these per project: an ordered list of
/// endpoint descriptors, each carrying whatever shape information could be
/// recovered (a declared signature, a raw example payload, or both).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(
    title = "ModelPort Endpoint Catalog",
    description = "Ordered endpoint descriptors handed from discovery to schema inference so each endpoint can become a spreadsheet-callable function."
)]
#[serde(deny_unknown_fields)]
pub struct EndpointCatalog {
    /// Identifier for this specification (must be `modelport`).
    pub spec: String,
    #[serde(rename = "spec_version")]
    pub spec_version: SpecVersion,
    /// Human-facing metadata describing the catalog.
    pub catalog: CatalogMeta,
    /// Ordered list of discovered endpoints.
    pub endpoints: Vec<EndpointDescriptor>,
}

impl EndpointCatalog {
    /// Construct a catalog by reading YAML from any reader.
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_reader(reader)
    }

    /// Construct a catalog from a YAML string slice.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Construct a catalog from a JSON string slice.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize this catalog to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Validate the catalog and return granular issues when invariants fail.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut issues = Vec::new();

        if self.spec != SPEC_IDENT {
            issues.push(CatalogIssue::new(
                "spec",
                format!(
                    "expected spec identifier `{}`, found `{}`",
                    SPEC_IDENT, self.spec
                ),
            ));
        }

        let current_version =
            Version::parse(CURRENT_SPEC_VERSION).expect("CURRENT_SPEC_VERSION must be valid semver");
        let spec_version = &self.spec_version.0;
        if spec_version.major != current_version.major {
            issues.push(CatalogIssue::new(
                "spec_version",
                format!(
                    "incompatible major version `{}` (expected `{}`)",
                    spec_version, current_version.major
                ),
            ));
        }

        if !CATALOG_ID_RE.is_match(&self.catalog.id) {
            issues.push(CatalogIssue::new(
                "catalog.id",
                "id must be lowercase alphanumeric with hyphens, 3-64 chars".to_string(),
            ));
        }

        let mut seen_names = std::collections::HashSet::new();
        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.name.trim().is_empty() {
                issues.push(CatalogIssue::new(
                    format!("endpoints[{}].name", idx),
                    "endpoint name must not be empty".to_string(),
                ));
                continue;
            }

            if !endpoint.url.starts_with("http://") && !endpoint.url.starts_with("https://") {
                issues.push(CatalogIssue::new(
                    format!("endpoints[{}].url", idx),
                    format!("url must be absolute http(s), found `{}`", endpoint.url),
                ));
            }

            let function_name = clean_function_name(&endpoint.name, "Model");
            if !seen_names.insert(function_name.clone()) {
                issues.push(CatalogIssue::new(
                    format!("endpoints[{}].name", idx),
                    format!(
                        "endpoint name `{}` collides with an earlier endpoint (both clean to `{}`)",
                        endpoint.name, function_name
                    ),
                ));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(CatalogError::new(issues))
        }
    }

    /// Run schema inference over every descriptor, in catalog order.
    ///
    /// Endpoints with no discoverable shape (no signature and no example)
    /// are skipped; that is a normal outcome, not an error.
    pub fn infer_schemas(&self) -> Vec<EndpointSchema> {
        let mut schemas = Vec::with_capacity(self.endpoints.len());
        for descriptor in &self.endpoints {
            if let Some(schema) = descriptor.infer_schema() {
                schemas.push(schema);
            }
        }
        schemas
    }
}

impl std::str::FromStr for EndpointCatalog {
    type Err = serde_yaml::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EndpointCatalog::from_yaml_str(s)
    }
}

/// Catalog metadata block.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CatalogMeta {
    /// Stable identifier for the catalog (lowercase alphanumeric + hyphen).
    pub id: String,
    /// Human readable catalog name.
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, JsonValue>>,
}

/// One discovered endpoint as handed over by the discovery service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct EndpointDescriptor {
    /// Endpoint name; cleaned into the generated function identifier.
    pub name: String,
    /// Absolute URL of the inference endpoint.
    pub url: String,
    #[serde(default)]
    /// Opaque basic-auth credentials forwarded to the invoker.
    pub credentials: Credentials,
    #[serde(default)]
    /// Optional documentation carried into the generated function.
    pub description: Option<String>,
    #[serde(default)]
    /// Declared input signature, when the model registry provided one.
    pub signature: Option<Vec<SignatureEntry>>,
    #[serde(default)]
    /// Raw example payload (`{"data": …}` or a `dataframe_split` document).
    pub example: Option<JsonValue>,
}

impl EndpointDescriptor {
    /// Infer the callable schema for this endpoint, preferring the declared
    /// signature and falling back to the example payload.
    pub fn infer_schema(&self) -> Option<EndpointSchema> {
        let example = self.example.as_ref().and_then(normalize_example);
        let parameters = infer_parameters(self.signature.as_deref(), example.as_ref())?;
        Some(EndpointSchema {
            function_name: clean_function_name(&self.name, "Model"),
            url: self.url.clone(),
            credentials: self.credentials.clone(),
            parameters,
            description: self
                .description
                .clone()
                .unwrap_or_else(|| format!("Calls the {} model endpoint.", self.name)),
        })
    }
}

/// Opaque basic-auth pair. The core never interprets these; they ride along
/// to the invoker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// One declared input in a model signature.
///
/// These mirror registry signature documents verbatim, so unknown fields are
/// tolerated rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SignatureEntry {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub declared_type: Option<String>,
    #[serde(rename = "tensor-spec", default, skip_serializing_if = "Option::is_none")]
    pub tensor_spec: Option<TensorSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Element declaration for `array` entries: a mapping with a `type` key
    /// or a bare type name.
    pub items: Option<JsonValue>,
}

/// Tensor signature entry payload: a homogeneous array described by an
/// element dtype rather than a nested type expression.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TensorSpec {
    #[serde(default)]
    pub dtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<i64>>,
}

/// Wrapper around semver::Version for serde compatibility.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SpecVersion(pub Version);

impl SpecVersion {
    pub fn new(version: Version) -> Self {
        Self(version)
    }
}

impl Serialize for SpecVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for SpecVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct VersionVisitor;

        impl<'de> Visitor<'de> for VersionVisitor {
            type Value = SpecVersion;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("semantic version string (e.g. 0.1.0)")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Version::parse(v)
                    .map(SpecVersion)
                    .map_err(|err| de::Error::custom(format!("invalid spec_version: {err}")))
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

impl JsonSchema for SpecVersion {
    fn schema_name() -> std::borrow::Cow<'static, str> {
        std::borrow::Cow::Borrowed("SpecVersion")
    }

    fn json_schema(_generator: &mut SchemaGenerator) -> Schema {
        json_schema!({
            "type": "string",
            "pattern": r"^[0-9]+\.[0-9]+\.[0-9]+(?:-[0-9A-Za-z-.]+)?(?:\+[0-9A-Za-z-.]+)?$"
        })
    }
}
