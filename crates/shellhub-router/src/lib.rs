//! # shellhub-router
//!
//! Turns one externally visible, multi-tenant path scheme into canonical
//! single-tenant routes, then dispatches them onto live providers.
//!
//! ```text
//! /{any}/{shellId}[/aas[/submodels[/{submodelId}[/{elementPath..}]]]]
//!     │  TenantRouter::route      (pure; fresh RequestContext per call)
//!     ▼
//! RoutedRequest { route, context, rewritten_path, query }
//!     │  Gateway::handle          (static route table)
//!     ▼
//! ProviderAggregator → ShellProvider → SubmodelProvider → Outcome<Value>
//! ```

pub mod gateway;
pub mod router;

pub use gateway::{Gateway, Method, Request};
pub use router::{
    CanonicalRoute, RequestContext, RoutedRequest, SHELL_KEYWORD, SUBMODELS_KEYWORD, TenantRouter,
};
