#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use bicepmod_lsp::completion::CompletionEngine;
use bicepmod_lsp::config::BicepConfig;
use bicepmod_lsp::sources::{
    EmptyModuleMetadata, ModuleMetadataSource, NoRegistryDiscovery, RegistryDiscovery,
    RegistryHostStream, SourceError, TelemetryEvent, TelemetrySink, TracingTelemetry,
};
use bicepmod_lsp::types::{
    CompletionCandidate, CompletionError, ModuleMetadataEntry, VersionMetadataEntry,
};

/// Parse a test configuration from JSON.
pub fn config(json: &str) -> BicepConfig {
    BicepConfig::from_json(json).expect("test configuration should parse")
}

/// Split a `|` cursor marker out of a literal fixture, e.g. `"'br:|'"`.
pub fn literal_with_cursor(fixture: &str) -> (String, usize) {
    let cursor = fixture
        .find('|')
        .expect("fixture must contain a | cursor marker");
    (fixture.replace('|', ""), cursor)
}

/// Run one completion request against explicit sources.
pub async fn complete_with(
    config: &BicepConfig,
    metadata: &dyn ModuleMetadataSource,
    discovery: &dyn RegistryDiscovery,
    telemetry: &dyn TelemetrySink,
    fixture: &str,
) -> Vec<CompletionCandidate> {
    let (literal, cursor) = literal_with_cursor(fixture);
    let engine = CompletionEngine::new(config, metadata, discovery, telemetry);
    engine
        .completions(&literal, cursor, &CancellationToken::new())
        .await
        .expect("completion should not fail")
}

/// Run one completion request with empty default sources.
pub async fn complete(config: &BicepConfig, fixture: &str) -> Vec<CompletionCandidate> {
    complete_with(
        config,
        &EmptyModuleMetadata,
        &NoRegistryDiscovery,
        &TracingTelemetry,
        fixture,
    )
    .await
}

/// Run one completion request and hand back the raw outcome (for
/// cancellation tests).
pub async fn try_complete_with(
    config: &BicepConfig,
    metadata: &dyn ModuleMetadataSource,
    discovery: &dyn RegistryDiscovery,
    telemetry: &dyn TelemetrySink,
    fixture: &str,
    cancel: &CancellationToken,
) -> Result<Vec<CompletionCandidate>, CompletionError> {
    let (literal, cursor) = literal_with_cursor(fixture);
    let engine = CompletionEngine::new(config, metadata, discovery, telemetry);
    engine.completions(&literal, cursor, cancel).await
}

/// In-memory curated module store.
#[derive(Default)]
pub struct FakeModuleMetadata {
    pub modules: Vec<ModuleMetadataEntry>,
    pub versions: HashMap<String, Vec<VersionMetadataEntry>>,
}

impl FakeModuleMetadata {
    pub fn with_modules(entries: &[(&str, Option<&str>, Option<&str>)]) -> Self {
        FakeModuleMetadata {
            modules: entries
                .iter()
                .map(|(path, description, docs_url)| ModuleMetadataEntry {
                    path: path.to_string(),
                    description: description.map(str::to_string),
                    docs_url: docs_url.map(str::to_string),
                })
                .collect(),
            versions: HashMap::new(),
        }
    }

    pub fn with_versions(
        mut self,
        module_path: &str,
        entries: &[(&str, Option<&str>, Option<&str>)],
    ) -> Self {
        self.versions.insert(
            module_path.to_string(),
            entries
                .iter()
                .map(|(version, description, docs_url)| VersionMetadataEntry {
                    version: version.to_string(),
                    description: description.map(str::to_string),
                    docs_url: docs_url.map(str::to_string),
                })
                .collect(),
        );
        self
    }
}

impl ModuleMetadataSource for FakeModuleMetadata {
    fn list_modules(&self) -> Result<Vec<ModuleMetadataEntry>, SourceError> {
        Ok(self.modules.clone())
    }

    fn list_versions(&self, module_path: &str) -> Result<Vec<VersionMetadataEntry>, SourceError> {
        Ok(self.versions.get(module_path).cloned().unwrap_or_default())
    }
}

/// A curated store that is down.
pub struct UnavailableMetadata;

impl ModuleMetadataSource for UnavailableMetadata {
    fn list_modules(&self) -> Result<Vec<ModuleMetadataEntry>, SourceError> {
        Err(SourceError::Unavailable("metadata store offline".to_string()))
    }

    fn list_versions(&self, _module_path: &str) -> Result<Vec<VersionMetadataEntry>, SourceError> {
        Err(SourceError::Unavailable("metadata store offline".to_string()))
    }
}

/// Discovery source yielding a fixed host list, recording whether it was
/// ever consulted.
pub struct ScriptedDiscovery {
    pub hosts: Vec<Result<String, SourceError>>,
    pub called: Arc<AtomicBool>,
}

impl ScriptedDiscovery {
    pub fn with_hosts(hosts: &[&str]) -> Self {
        ScriptedDiscovery {
            hosts: hosts.iter().map(|host| Ok(host.to_string())).collect(),
            called: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Yields the given hosts, then fails with `Unavailable`.
    pub fn failing_after(hosts: &[&str]) -> Self {
        let mut items: Vec<Result<String, SourceError>> =
            hosts.iter().map(|host| Ok(host.to_string())).collect();
        items.push(Err(SourceError::Unavailable("resource graph query failed".to_string())));
        ScriptedDiscovery {
            hosts: items,
            called: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn was_called(&self) -> bool {
        self.called.load(Ordering::SeqCst)
    }
}

impl RegistryDiscovery for ScriptedDiscovery {
    fn discover(&self, _cloud_profile: &str, _cancel: CancellationToken) -> RegistryHostStream<'static> {
        self.called.store(true, Ordering::SeqCst);
        stream::iter(self.hosts.clone()).boxed()
    }
}

/// Discovery source that cancels the request's token while producing its
/// first host, mirroring a provider that notices cancellation mid-flight.
#[derive(Default)]
pub struct CancellingDiscovery {
    pub first_produced: Arc<AtomicBool>,
    pub second_produced: Arc<AtomicBool>,
}

impl RegistryDiscovery for CancellingDiscovery {
    fn discover(&self, _cloud_profile: &str, cancel: CancellationToken) -> RegistryHostStream<'static> {
        let first = self.first_produced.clone();
        let second = self.second_produced.clone();
        stream::unfold(0u32, move |state| {
            let first = first.clone();
            let second = second.clone();
            let cancel = cancel.clone();
            async move {
                match state {
                    0 => {
                        first.store(true, Ordering::SeqCst);
                        cancel.cancel();
                        Some((Ok("testacr3.azurecr.io".to_string()), 1))
                    }
                    1 => {
                        second.store(true, Ordering::SeqCst);
                        Some((Ok("testacr4.azurecr.io".to_string()), 2))
                    }
                    _ => None,
                }
            }
        })
        .boxed()
    }
}

/// Telemetry sink collecting posted events for assertions.
#[derive(Default)]
pub struct RecordingTelemetry {
    pub events: Arc<Mutex<Vec<TelemetryEvent>>>,
}

impl RecordingTelemetry {
    pub fn registry_types(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| event.properties.get("moduleRegistryType").cloned())
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn post(&self, event: TelemetryEvent) {
        self.events.lock().push(event);
    }
}
