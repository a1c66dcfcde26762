//! # shellhub-provider
//!
//! Live, in-process object graphs that answer get/set/invoke requests.
//!
//! ```text
//! ProviderAggregator          shell key → ShellProvider        (RwLock, read-mostly)
//!     │
//! ShellProvider               submodel idShort → SubmodelProvider
//!     │
//! SubmodelProvider            element tree + async invocation table
//!     │
//! SubmodelElement             Property | Operation | Collection
//! ```
//!
//! A provider is not a descriptor: a shell may be hosted here without being
//! registered anywhere, and vice versa. Lookups that miss are `NotFound`
//! outcomes; callers fall back to `SubmodelProvider::empty`.

pub mod aggregator;
pub mod binding;
pub mod element;
pub mod invocation_table;
pub mod invoker;
pub mod operation;
pub mod sample;
pub mod shell;
pub mod submodel;
pub mod value;

pub use aggregator::ProviderAggregator;
pub use binding::{FnBinding, StoredValue, ValueBinding};
pub use element::{Collection, ElementKind, ElementSummary, Property, SubmodelElement, resolve};
pub use invocation_table::{InvocationStatus, InvocationTable};
pub use invoker::invoke;
pub use operation::{
    ArgumentSet, CANCELLATION_MESSAGE, ExecutionState, FnOperation, InvocationRequest,
    InvocationResponse, Operation, OperationCall, OperationHandler, OperationVariable,
};
pub use shell::{ShellProvider, ShellSummary};
pub use submodel::{SubmodelProvider, SubmodelSummary};
pub use value::ValueType;

pub use tokio_util::sync::CancellationToken;
