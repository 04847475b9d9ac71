//! Domain model (IDs, values, forms, scopes, submissions, errors).

pub mod errors;
pub mod form;
pub mod form_data;
pub mod ids;
pub mod scope;
pub mod state;
pub mod submission;
pub mod value;
pub mod variable;

pub use errors::{EntityKind, ErrorKind, FormError};
pub use form::{
    Constraint, EnumValue, FieldDescriptor, FieldType, FormDefinition, FormDefinitionRef,
    DEFAULT_DATE_PATTERN,
};
pub use form_data::{FormData, FormField, FormTarget};
pub use ids::{ProcessDefinitionId, ProcessInstanceId, ScopeId, TaskId};
pub use scope::{ProcessInstanceRef, ScopeKind, ScopeNode, ScopeState, TaskRecord, TaskState};
pub use state::SubmissionState;
pub use submission::{
    CompleteTaskCommand, ObservedRevision, StartProcessCommand, SubmissionRequest,
    SubmissionResult, SubmissionTarget, VariableWrite,
};
pub use value::{string_variables, TypedValue, ValueType, VariableMap};
pub use variable::{ResolvedVariables, VariableInstance, VariableOrigin};
