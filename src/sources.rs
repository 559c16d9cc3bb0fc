//! Collaborator ports consumed by the completion engine.
//!
//! The engine itself never talks to the network or reads ambient state;
//! everything it needs beyond configuration arrives through the three
//! traits here, passed explicitly into the entry point:
//!
//! - **`ModuleMetadataSource`**: the curated public-module store —
//!   synchronous lists of module paths and per-module versions.
//! - **`RegistryDiscovery`**: the cloud-side registry enumeration — a
//!   lazily pulled, cancellable stream of host names.
//! - **`TelemetrySink`**: fire-and-forget event posting.
//!
//! Default implementations (`EmptyModuleMetadata`, `NoRegistryDiscovery`,
//! `TracingTelemetry`) let the server run standalone; embedders inject
//! real stores through `Backend::with_sources`.

use std::collections::HashMap;

use futures::stream::{self, BoxStream, StreamExt};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::types::{ModuleMetadataEntry, VersionMetadataEntry};

/// Failure reported by a collaborator.
///
/// `Cancelled` aborts the whole completion request; `Unavailable` only
/// drops that collaborator's contribution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("the operation was cancelled")]
    Cancelled,
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// The curated public-module metadata store.
pub trait ModuleMetadataSource: Send + Sync {
    /// All known public modules.
    fn list_modules(&self) -> Result<Vec<ModuleMetadataEntry>, SourceError>;

    /// Published versions for one module path, most relevant first.
    fn list_versions(&self, module_path: &str) -> Result<Vec<VersionMetadataEntry>, SourceError>;
}

/// A lazily produced sequence of registry host names.
pub type RegistryHostStream<'a> = BoxStream<'a, Result<String, SourceError>>;

/// Enumerates container registries reachable for a cloud profile.
///
/// The returned stream may be unbounded in principle; consumers pull one
/// item at a time and must check `cancel` before every pull. The token is
/// handed to the source so it can abort an in-flight enumeration itself,
/// in which case it yields `Err(SourceError::Cancelled)`.
pub trait RegistryDiscovery: Send + Sync {
    fn discover(&self, cloud_profile: &str, cancel: CancellationToken) -> RegistryHostStream<'static>;
}

/// Event name posted once per completion request that produced registry,
/// path, or version candidates.
pub const MODULE_REGISTRY_PATH_COMPLETION: &str = "ModuleRegistryPathCompletion";

/// Property carrying the registry classification (`"MCR"` or `"ACR"`).
pub const MODULE_REGISTRY_TYPE: &str = "moduleRegistryType";

/// A telemetry event with a flat string property bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub name: &'static str,
    pub properties: HashMap<String, String>,
}

impl TelemetryEvent {
    pub fn module_registry_path_completion(registry_type: &str) -> Self {
        TelemetryEvent {
            name: MODULE_REGISTRY_PATH_COMPLETION,
            properties: HashMap::from([(
                MODULE_REGISTRY_TYPE.to_string(),
                registry_type.to_string(),
            )]),
        }
    }
}

/// Fire-and-forget telemetry posting. Implementations must not block.
pub trait TelemetrySink: Send + Sync {
    fn post(&self, event: TelemetryEvent);
}

/// A metadata source that knows no modules.
#[derive(Debug, Default)]
pub struct EmptyModuleMetadata;

impl ModuleMetadataSource for EmptyModuleMetadata {
    fn list_modules(&self) -> Result<Vec<ModuleMetadataEntry>, SourceError> {
        Ok(Vec::new())
    }

    fn list_versions(&self, _module_path: &str) -> Result<Vec<VersionMetadataEntry>, SourceError> {
        Ok(Vec::new())
    }
}

/// A discovery source that never yields a host.
#[derive(Debug, Default)]
pub struct NoRegistryDiscovery;

impl RegistryDiscovery for NoRegistryDiscovery {
    fn discover(&self, _cloud_profile: &str, _cancel: CancellationToken) -> RegistryHostStream<'static> {
        stream::empty().boxed()
    }
}

/// Telemetry sink that writes events to the tracing log.
#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn post(&self, event: TelemetryEvent) {
        tracing::info!(name = event.name, properties = ?event.properties, "telemetry event");
    }
}
