//! Values, coercion, components, and result delivery for the YAIL bridge.

pub mod channel;
pub mod coerce;
pub mod component;
pub mod error;
pub mod schema;
pub mod value;

pub use channel::{Batch, BatchEntry, ChannelError, PendingResult, ResultKind, ResultStatus, ReturnChannel};
pub use coerce::{Coercer, CoercionFailure};
pub use component::{
    ComponentClass, ComponentClassBuilder, ComponentError, ComponentInstance, ComponentRegistry,
    EventQueue, EventSpec, MethodHandler, MethodSpec, PendingEvent, PropertySpec,
};
pub use error::{ErrorKind, ErrorReporter, StructuredError, generate_runtime_type_error};
pub use schema::{ComponentSchema, SchemaError};
pub use value::{ComponentId, NativeValue, TypeTag, UnknownTypeTag, Value};
