use modelport_common::{CellValue, SpillValue};
use modelport_spec::{Credentials, EndpointCatalog, EndpointSchema};

use crate::error::InvokeError;
use crate::extract::extract_result;
use crate::serialize::build_request_body;
use crate::spill::shape_result;

/// The transport seam.
///
/// Live HTTP lives outside this crate; the runtime only requires something
/// that can turn `(url, credentials, body)` into a response body or a
/// typed failure, and treats that call as already resolved.
pub trait ModelInvoker {
    fn invoke(
        &self,
        url: &str,
        credentials: &Credentials,
        body: &str,
    ) -> Result<String, InvokeError>;
}

/// One callable endpoint: an inferred schema plus the marshalling logic
/// around it.
///
/// Holds no per-call state, so a single instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct EndpointFunction {
    schema: EndpointSchema,
}

impl EndpointFunction {
    pub fn new(schema: EndpointSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &EndpointSchema {
        &self.schema
    }

    pub fn function_name(&self) -> &str {
        &self.schema.function_name
    }

    /// The canonical request body for one set of arguments.
    pub fn request_body(&self, args: &[CellValue]) -> String {
        build_request_body(args, &self.schema.parameters)
    }

    /// Serialize, invoke, extract, shape.
    ///
    /// Every failure mode, transport, HTTP, or extraction, comes back as a
    /// renderable cell value; this method cannot fail.
    pub fn call<I: ModelInvoker>(&self, invoker: &I, args: &[CellValue]) -> SpillValue {
        let body = self.request_body(args);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            endpoint = %self.schema.function_name,
            bytes = body.len(),
            "request body built"
        );

        let response = match invoker.invoke(&self.schema.url, &self.schema.credentials, &body) {
            Ok(response) => response,
            Err(err) => return SpillValue::text(err.to_string()),
        };

        match extract_result(&response) {
            Ok(fragment) => shape_result(fragment),
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %self.schema.function_name, %err, "extraction failed");
                SpillValue::text(err.to_string())
            }
        }
    }

    pub fn into_schema(self) -> EndpointSchema {
        self.schema
    }
}

/// Infer schemas for a whole catalog and wrap each as a callable function.
///
/// Endpoints without a discoverable shape are skipped, matching the
/// catalog's own inference behavior.
pub fn bind_catalog(catalog: &EndpointCatalog) -> Vec<EndpointFunction> {
    catalog
        .infer_schemas()
        .into_iter()
        .map(EndpointFunction::new)
        .collect()
}
