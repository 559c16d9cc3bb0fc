//! LSP server trait implementation.
//!
//! This module contains the `impl LanguageServer for Backend` block, which
//! handles all LSP protocol messages (initialize, didOpen, didChange,
//! didClose, completion). The completion handler only extracts the module
//! reference literal around the cursor and translates candidate spans back
//! onto the document line; everything in between is the engine's job.

use tokio_util::sync::CancellationToken;
use tower_lsp::LanguageServer;
use tower_lsp::jsonrpc::{self, Result};
use tower_lsp::lsp_types::*;

use crate::Backend;
use crate::completion::CompletionEngine;
use crate::completion::builder::to_completion_item;
use crate::completion::reference::find_reference_literal;
use crate::config::BicepConfig;
use crate::types::CompletionError;

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        // Remember the workspace root so `initialized` can pick up the
        // bicepconfig.json sitting next to the sources.
        if let Some(root) = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok())
        {
            *self.workspace_root.write() = Some(root);
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                completion_provider: Some(CompletionOptions {
                    resolve_provider: Some(false),
                    trigger_characters: Some(vec![
                        "'".to_string(),
                        ":".to_string(),
                        "/".to_string(),
                    ]),
                    all_commit_characters: None,
                    work_done_progress_options: WorkDoneProgressOptions {
                        work_done_progress: None,
                    },
                    ..CompletionOptions::default()
                }),
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                ..ServerCapabilities::default()
            },
            server_info: Some(ServerInfo {
                name: self.name.clone(),
                version: Some(self.version.clone()),
            }),
            offset_encoding: None,
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        let workspace_root = self.workspace_root.read().clone();

        if let Some(root) = workspace_root {
            let config = BicepConfig::load(&root);
            let alias_count =
                config.module_aliases.br.len() + config.module_aliases.ts.len();
            *self.config.write() = config;

            self.log(
                MessageType::INFO,
                format!("BicepMod LSP initialized! Loaded {} module alias(es)", alias_count),
            )
            .await;
        } else {
            self.log(MessageType::INFO, "BicepMod LSP initialized!".to_string())
                .await;
        }
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        tracing::debug!(%uri, "opened document");
        self.open_files
            .write()
            .insert(uri, params.text_document.text);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri.to_string();

        // FULL sync: the first change carries the whole document.
        if let Some(change) = params.content_changes.first() {
            self.open_files.write().insert(uri, change.text.clone());
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri.to_string();
        self.open_files.write().remove(&uri);
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri.to_string();
        let position = params.text_document_position.position;

        let line = {
            let files = self.open_files.read();
            files.get(&uri).and_then(|content| {
                content
                    .lines()
                    .nth(position.line as usize)
                    .map(|line| line.to_string())
            })
        };
        let Some(line) = line else {
            return Ok(None);
        };

        let Some((literal, literal_start)) = find_reference_literal(&line) else {
            return Ok(None);
        };
        let Some(cursor) = (position.character as usize).checked_sub(literal_start) else {
            return Ok(None);
        };

        let config = self.config.read().clone();
        let engine = CompletionEngine::new(
            &config,
            self.metadata.as_ref(),
            self.discovery.as_ref(),
            self.telemetry.as_ref(),
        );

        let cancel = CancellationToken::new();
        match engine.completions(literal, cursor, &cancel).await {
            Ok(candidates) if candidates.is_empty() => Ok(None),
            Ok(candidates) => {
                let items = candidates
                    .iter()
                    .map(|candidate| {
                        to_completion_item(candidate, position.line, literal_start as u32)
                    })
                    .collect();
                Ok(Some(CompletionResponse::Array(items)))
            }
            Err(CompletionError::Cancelled) => Err(jsonrpc::Error {
                // LSP RequestCancelled
                code: jsonrpc::ErrorCode::ServerError(-32800),
                message: "module reference completion was cancelled".into(),
                data: None,
            }),
        }
    }
}
