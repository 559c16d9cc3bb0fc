//! BicepMod LSP — completion for Bicep module reference literals.
//!
//! The server understands the quoted argument of `module`/`using`
//! declarations (`'br:...'`, `'br/alias:...'`, `'ts:...'`) and offers
//! context-aware completions for every segment of the reference: scheme,
//! alias, registry host, repository path, and version. Aliases come from
//! the workspace's `bicepconfig.json`; path and version data from a
//! curated public-module metadata source; additional registry hosts from
//! an optional, cancellable discovery source.
//!
//! The completion engine itself lives in [`completion`] and is fully
//! decoupled from the transport: it receives the literal text, the cursor
//! offset, the effective configuration, and its collaborator ports as
//! explicit parameters.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::Client;
use tower_lsp::lsp_types::MessageType;

pub mod completion;
pub mod config;
pub mod sources;
pub mod types;

mod server;

use crate::config::BicepConfig;
use crate::sources::{
    EmptyModuleMetadata, ModuleMetadataSource, NoRegistryDiscovery, RegistryDiscovery,
    TelemetrySink, TracingTelemetry,
};

/// Shared server state: open documents, the effective configuration, and
/// the collaborator ports handed to the completion engine per request.
pub struct Backend {
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) client: Option<Client>,
    pub(crate) open_files: RwLock<HashMap<String, String>>,
    pub(crate) workspace_root: RwLock<Option<PathBuf>>,
    pub(crate) config: RwLock<BicepConfig>,
    pub(crate) metadata: Arc<dyn ModuleMetadataSource>,
    pub(crate) discovery: Arc<dyn RegistryDiscovery>,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
}

impl Backend {
    /// Production constructor: default (empty) collaborator sources and a
    /// telemetry sink that writes to the tracing log.
    pub fn new(client: Client) -> Self {
        Self::with_sources(
            Some(client),
            Arc::new(EmptyModuleMetadata),
            Arc::new(NoRegistryDiscovery),
            Arc::new(TracingTelemetry),
        )
    }

    /// Constructor with injected collaborator sources — the seam embedders
    /// use to plug in a real metadata store and registry discovery.
    pub fn with_sources(
        client: Option<Client>,
        metadata: Arc<dyn ModuleMetadataSource>,
        discovery: Arc<dyn RegistryDiscovery>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Backend {
            name: "BicepMod LSP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            client,
            open_files: RwLock::new(HashMap::new()),
            workspace_root: RwLock::new(None),
            config: RwLock::new(BicepConfig::default()),
            metadata,
            discovery,
            telemetry,
        }
    }

    /// Test constructor: no client, default sources.
    pub fn new_test() -> Self {
        Self::with_sources(
            None,
            Arc::new(EmptyModuleMetadata),
            Arc::new(NoRegistryDiscovery),
            Arc::new(TracingTelemetry),
        )
    }

    /// Test constructor with injected sources.
    pub fn new_test_with_sources(
        metadata: Arc<dyn ModuleMetadataSource>,
        discovery: Arc<dyn RegistryDiscovery>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self::with_sources(None, metadata, discovery, telemetry)
    }

    /// Replace the effective configuration directly (tests, embedders).
    /// The server normally loads it from `bicepconfig.json` on
    /// `initialized`.
    pub fn set_config(&self, config: BicepConfig) {
        *self.config.write() = config;
    }

    pub(crate) async fn log(&self, typ: MessageType, message: String) {
        if let Some(client) = &self.client {
            client.log_message(typ, message).await;
        }
    }
}
