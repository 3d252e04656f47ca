/*!
 * Monitoring
 * Structured tracing for the engine and the binary
 */

mod tracer;

pub use tracer::{generate_trace_id, init_tracing, span_operation, OperationSpan};
