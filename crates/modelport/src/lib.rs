//! ModelPort marshalling runtime.
//!
//! This crate links inferred [`modelport_spec::EndpointSchema`] definitions
//! to the host cell grid: it serializes heterogeneous cell values into
//! canonical JSON request bodies, hands them to a [`ModelInvoker`], and
//! reshapes the response's `result` value into a scalar, row, or grid spill.
//! Every failure mode resolves to a value the grid can render; the cell
//! surface has nowhere to route an exception.

mod error;
mod extract;
mod runtime;
mod serialize;
mod spill;

pub use error::{ExtractError, InvokeError};
pub use extract::extract_result;
pub use runtime::{EndpointFunction, ModelInvoker, bind_catalog};
pub use serialize::{build_request_body, format_date_value, serialize_param};
pub use spill::{parse_single_value, shape_result};
