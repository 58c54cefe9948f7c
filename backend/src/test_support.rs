//! Test doubles shared by unit tests (in `src/`) and integration tests (in
//! `tests/`). Compiled for tests and behind the `test-support` feature.

mod media;
mod timing;

pub use media::{
    EchoTranscoder, ScriptedTranscoder, StubExtractor, StubSearch, candidate, sample_info,
    source_stream,
};
pub use timing::{MutableClock, RecordingSleeper};

pub mod openapi {
    //! OpenAPI schema traversal helpers.

    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::{Object, Schema};

    /// Extract an `Object` schema, panicking with a diagnostic otherwise.
    pub fn unwrap_object_schema<'a>(schema: &'a RefOr<Schema>, name: &str) -> &'a Object {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj,
            RefOr::Ref(reference) => panic!(
                "schema '{name}' is a $ref to '{}'; resolve the reference first",
                reference.ref_location
            ),
            RefOr::T(Schema::Array(_)) => panic!("schema '{name}' is an Array, not an Object"),
            _ => panic!("schema '{name}' is not a plain Object"),
        }
    }
}
