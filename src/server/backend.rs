//! The tower-lsp backend: thin handlers that convert protocol positions
//! and delegate every query to the [`Engine`].

use std::path::PathBuf;
use std::sync::Arc;

use rayon::prelude::*;
use tower_lsp::jsonrpc::{Error as JsonRpcError, Result as LspResult};
use tower_lsp::lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    GotoDefinitionParams, GotoDefinitionResponse, InitializeParams, InitializeResult,
    InitializedParams, Location, MessageType, OneOf, PrepareRenameResponse, ReferenceParams,
    RenameOptions, RenameParams, ServerCapabilities, ServerInfo, SymbolInformation,
    TextDocumentPositionParams, TextDocumentSyncCapability, TextDocumentSyncKind, Url,
    WorkDoneProgressOptions, WorkspaceEdit, WorkspaceSymbolParams,
};
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::analysis::{text_scan, AnalysisError, Engine, WORKSPACE_SYMBOL_LIMIT};

pub struct Backend {
    client: Client,
    engine: Arc<Engine>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            engine: Arc::new(Engine::new()),
        }
    }

    pub fn engine(&self) -> Arc<Engine> {
        self.engine.clone()
    }
}

/// Walk the workspace folders and index every source file that is not
/// already open. Runs on the blocking pool with rayon fan-out so request
/// handling never waits on it.
async fn index_workspace(engine: Arc<Engine>) {
    let folders = engine.workspace_folders();
    if folders.is_empty() {
        debug!("no workspace folders to index");
        return;
    }

    let scan_engine = engine.clone();
    let result = tokio::task::spawn_blocking(move || {
        let files: Vec<PathBuf> = folders
            .iter()
            .flat_map(|folder| {
                WalkDir::new(folder)
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .filter(|entry| entry.file_type().is_file())
                    .map(|entry| entry.into_path())
            })
            .filter(|path| text_scan::is_source_file(path))
            .collect();

        let indexed: usize = files
            .par_iter()
            .map(|path| {
                let text = match std::fs::read_to_string(path) {
                    Ok(text) => text,
                    Err(err) => {
                        warn!("cannot read {:?}: {}", path, err);
                        return 0;
                    }
                };
                let Ok(uri) = Url::from_file_path(path) else {
                    return 0;
                };
                // Open documents are already indexed live from their
                // current buffer contents.
                if scan_engine.documents.get(&uri).is_some() {
                    return 0;
                }
                usize::from(scan_engine.index_unopened_file(&uri, &text))
            })
            .sum();
        (files.len(), indexed)
    })
    .await;

    match result {
        Ok((total, indexed)) => info!(
            "workspace indexing complete: {indexed}/{total} file(s), {} symbol(s)",
            engine.index.len()
        ),
        Err(err) => warn!("workspace indexing task failed: {err}"),
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    #[allow(deprecated)] // root_uri fallback for clients without workspace folders
    async fn initialize(&self, params: InitializeParams) -> LspResult<InitializeResult> {
        let mut folders: Vec<PathBuf> = params
            .workspace_folders
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|folder| folder.uri.to_file_path().ok())
            .collect();
        if folders.is_empty() {
            if let Some(root) = params.root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()) {
                folders.push(root);
            }
        }
        info!("initialize: {} workspace folder(s)", folders.len());
        self.engine.set_workspace_folders(folders);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                definition_provider: Some(OneOf::Left(true)),
                references_provider: Some(OneOf::Left(true)),
                rename_provider: Some(OneOf::Right(RenameOptions {
                    prepare_provider: Some(true),
                    work_done_progress_options: WorkDoneProgressOptions::default(),
                })),
                workspace_symbol_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "dws-language-server".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        info!("server initialized; starting background workspace scan");
        self.client
            .log_message(MessageType::INFO, "DWScript language server ready")
            .await;
        let engine = self.engine();
        tokio::spawn(async move {
            index_workspace(engine).await;
        });
    }

    async fn shutdown(&self) -> LspResult<()> {
        info!("shutdown requested");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        debug!("did_open {} v{}", doc.uri, doc.version);
        self.engine.open_document(doc.uri, &doc.text, doc.version);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        debug!(
            "did_change {} v{} ({} change(s))",
            uri,
            version,
            params.content_changes.len()
        );
        if let Err(err) = self
            .engine
            .change_document(&uri, &params.content_changes, version)
        {
            warn!("did_change {uri}: {err}");
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("did_close {uri}");
        self.engine.close_document(&uri);
    }

    async fn goto_definition(
        &self,
        params: GotoDefinitionParams,
    ) -> LspResult<Option<GotoDefinitionResponse>> {
        let uri = params.text_document_position_params.text_document.uri;
        let position = params.text_document_position_params.position;
        debug!("goto_definition {uri} at {position:?}");

        let mut locations = self.engine.resolve_definition(&uri, position);
        Ok(match locations.len() {
            0 => None,
            1 => Some(GotoDefinitionResponse::Scalar(locations.remove(0))),
            _ => Some(GotoDefinitionResponse::Array(locations)),
        })
    }

    async fn references(&self, params: ReferenceParams) -> LspResult<Option<Vec<Location>>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        let include_declaration = params.context.include_declaration;
        debug!("references {uri} at {position:?} (include_decl: {include_declaration})");

        let locations = self
            .engine
            .find_references(&uri, position, include_declaration);
        Ok(if locations.is_empty() {
            None
        } else {
            Some(locations)
        })
    }

    async fn prepare_rename(
        &self,
        params: TextDocumentPositionParams,
    ) -> LspResult<Option<PrepareRenameResponse>> {
        let uri = params.text_document.uri;
        debug!("prepare_rename {uri} at {:?}", params.position);

        match self.engine.prepare_rename(&uri, params.position) {
            Ok((range, placeholder)) => Ok(Some(PrepareRenameResponse::RangeWithPlaceholder {
                range,
                placeholder,
            })),
            Err(err @ AnalysisError::ReservedName(_)) => {
                Err(JsonRpcError::invalid_params(err.to_string()))
            }
            Err(err) => {
                debug!("prepare_rename {uri}: {err}");
                Ok(None)
            }
        }
    }

    async fn rename(&self, params: RenameParams) -> LspResult<Option<WorkspaceEdit>> {
        let uri = params.text_document_position.text_document.uri;
        let position = params.text_document_position.position;
        debug!("rename {uri} at {position:?} -> '{}'", params.new_name);

        match self.engine.rename(&uri, position, &params.new_name) {
            Ok(transaction) => Ok(Some(transaction.into_workspace_edit())),
            Err(err) => Err(JsonRpcError::invalid_params(err.to_string())),
        }
    }

    async fn symbol(
        &self,
        params: WorkspaceSymbolParams,
    ) -> LspResult<Option<Vec<SymbolInformation>>> {
        debug!("workspace symbols for '{}'", params.query);
        Ok(Some(
            self.engine
                .search_symbols(&params.query, WORKSPACE_SYMBOL_LIMIT),
        ))
    }
}
