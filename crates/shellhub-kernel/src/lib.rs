//! # Shellhub Kernel
//!
//! Shared vocabulary for the shell registry, the tenant router, and the live
//! submodel providers.
//!
//! This crate owns no storage and no runtime. It defines:
//! - `Identifier` and the shell/submodel descriptor records
//! - `Outcome<T>`: the uniform success/message/payload result that every
//!   component operation returns across its boundary
//! - `ShellhubError` / `ErrorKind`: the internal error taxonomy
//! - `StorageKey`: the deterministic identifier digest used for on-disk layout
//! - `Settings`: TOML configuration
//!
//! ## Result flow
//!
//! ```text
//! fn internal(..) -> Result<T, ShellhubError>    ← `?` inside components
//!     │
//! Outcome::from_result(..)                       ← component boundary
//!     │
//! Outcome<T> { success, message, payload }       ← callers (CLI, HTTP, tests)
//! ```

pub mod descriptor;
pub mod digest;
pub mod error;
pub mod identifier;
pub mod outcome;
pub mod settings;

pub use descriptor::{
    AdministrativeInformation, Endpoint, LangString, ShellDescriptor, SubmodelDescriptor,
    validate_id_short,
};
pub use digest::StorageKey;
pub use error::{ErrorKind, ShellhubError};
pub use identifier::{Identifier, IdentifierKind};
pub use outcome::{Message, Outcome, Severity};
pub use settings::{LoggingSettings, RegistrySettings, RouterSettings, Settings, SettingsError};
