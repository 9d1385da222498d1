//! LSP server backend implementing the tower-lsp LanguageServer trait.

use crate::document::TextDocument;
use dashmap::DashMap;
use drupal_lsp_completion::{CompletionRequest, ProviderError, WorkspaceProviders};
use drupal_lsp_index::locator::locate_drupal_workspaces;
use drupal_lsp_index::settings::DrupalSettings;
use drupal_lsp_index::workspace::{api_search_url, DEFAULT_DRUPAL_VERSION};
use drupal_lsp_index::FileEvent;
use drupal_lsp_types::{Completion, CompletionKind, InsertFormat};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_lsp::jsonrpc::{Error, Result};
use tower_lsp::ls_types::*;
use tower_lsp::{Client, LanguageServer};

/// `[documentUri, symbol]` → api.drupal.org search URL.
pub const API_SEARCH_COMMAND: &str = "drupal.apiSearchUrl";

const WATCHED_FILES_METHOD: &str = "workspace/didChangeWatchedFiles";

/// Main LSP backend holding all state.
pub struct DrupalLspBackend {
    client: Client,
    /// Open documents (URI string → text).
    documents: Arc<DashMap<String, TextDocument>>,
    /// Providers of every Drupal workspace, in folder order.
    workspaces: RwLock<Vec<Arc<WorkspaceProviders>>>,
    /// Workspace folders from InitializeParams.
    folders: Mutex<Vec<PathBuf>>,
    settings: Mutex<DrupalSettings>,
    /// Tools already reported as missing this session.
    warned_tools: Mutex<HashSet<&'static str>>,
    /// Trace level from InitializeParams (off/messages/verbose).
    trace_level: Mutex<TraceValue>,
    /// Whether the client accepts dynamic file watcher registration.
    dynamic_watchers: AtomicBool,
}

impl DrupalLspBackend {
    pub fn new(client: Client) -> Self {
        DrupalLspBackend {
            client,
            documents: Arc::new(DashMap::new()),
            workspaces: RwLock::new(Vec::new()),
            folders: Mutex::new(Vec::new()),
            settings: Mutex::new(DrupalSettings::default()),
            warned_tools: Mutex::new(HashSet::new()),
            trace_level: Mutex::new(TraceValue::Off),
            dynamic_watchers: AtomicBool::new(false),
        }
    }

    /// Log a message to the client if trace level is verbose.
    async fn log_trace(&self, message: &str) {
        let level = *self.trace_level.lock().await;
        if level == TraceValue::Verbose {
            tracing::trace!("{}", message);
            self.client.log_message(MessageType::LOG, message).await;
        }
    }

    /// Build and populate providers for the Drupal projects among `folders`.
    async fn add_workspaces(&self, folders: Vec<PathBuf>) {
        let folders: Vec<PathBuf> = {
            let existing = self.workspaces.read().await;
            folders
                .into_iter()
                .filter(|f| !existing.iter().any(|w| w.workspace().root() == f.as_path()))
                .collect()
        };
        if folders.is_empty() {
            return;
        }

        let located = match tokio::task::spawn_blocking(move || locate_drupal_workspaces(&folders)).await {
            Ok(located) => located,
            Err(e) => {
                tracing::error!("Drupal workspace detection failed: {}", e);
                return;
            }
        };

        let mut added = Vec::with_capacity(located.len());
        for workspace in located {
            let root = workspace.root().to_path_buf();
            let built = tokio::task::spawn_blocking(move || {
                let providers = WorkspaceProviders::new(workspace)?;
                providers.populate();
                Ok::<_, ProviderError>(providers)
            })
            .await;
            match built {
                Ok(Ok(providers)) => added.push(Arc::new(providers)),
                Ok(Err(e)) => {
                    tracing::error!("Failed to set up providers for {}: {}", root.display(), e)
                }
                Err(e) => tracing::error!("Indexing {} failed: {}", root.display(), e),
            }
        }

        for providers in &added {
            self.log_trace(&format!(
                "Drupal workspace ready: {}",
                providers.workspace().root().display()
            ))
            .await;
            self.register_watchers(providers).await;
            self.check_tools(providers).await;
        }
        self.workspaces.write().await.extend(added);
    }

    async fn remove_workspaces(&self, folders: &[PathBuf]) {
        let removed: Vec<Arc<WorkspaceProviders>> = {
            let mut workspaces = self.workspaces.write().await;
            let (removed, kept): (Vec<_>, Vec<_>) = workspaces
                .drain(..)
                .partition(|w| folders.iter().any(|f| w.workspace().root() == f.as_path()));
            *workspaces = kept;
            removed
        };

        for providers in removed {
            tracing::info!(
                "Dropping Drupal workspace {}",
                providers.workspace().root().display()
            );
            self.unregister_watchers(&providers).await;
        }
    }

    /// Ask the client to report changes to every provider's files.
    async fn register_watchers(&self, providers: &WorkspaceProviders) {
        if !self.dynamic_watchers.load(Ordering::Relaxed) {
            return;
        }
        let root = providers.workspace().root();
        let watchers: Vec<FileSystemWatcher> = providers
            .watch_patterns()
            .iter()
            .map(|pattern| FileSystemWatcher {
                glob_pattern: GlobPattern::String(root.join(pattern).to_string_lossy().into_owned()),
                kind: Some(WatchKind::all()),
            })
            .collect();

        let options = match serde_json::to_value(DidChangeWatchedFilesRegistrationOptions { watchers }) {
            Ok(options) => options,
            Err(e) => {
                tracing::error!("Failed to encode file watchers: {}", e);
                return;
            }
        };
        let registration = Registration {
            id: watcher_registration_id(providers),
            method: WATCHED_FILES_METHOD.to_string(),
            register_options: Some(options),
        };

        match self.client.register_capability(vec![registration]).await {
            Ok(()) => tracing::info!("Registered file watchers for {}", root.display()),
            Err(e) => tracing::error!("Failed to register file watchers: {:?}", e),
        }
    }

    async fn unregister_watchers(&self, providers: &WorkspaceProviders) {
        if !self.dynamic_watchers.load(Ordering::Relaxed) {
            return;
        }
        let unregistration = Unregistration {
            id: watcher_registration_id(providers),
            method: WATCHED_FILES_METHOD.to_string(),
        };
        if let Err(e) = self.client.unregister_capability(vec![unregistration]).await {
            tracing::error!("Failed to unregister file watchers: {:?}", e);
        }
    }

    /// Warn once per tool when an enabled tool has no executable.
    async fn check_tools(&self, providers: &WorkspaceProviders) {
        let settings = self.settings.lock().await.clone();
        let root = providers.workspace().root();

        for (tool, tool_settings) in settings.tools() {
            if !tool_settings.enabled {
                continue;
            }
            let e = match tool_settings.executable(root, tool) {
                Ok(path) => {
                    tracing::debug!(
                        "{} resolved: {} {}",
                        tool,
                        path.display(),
                        tool_settings.args.join(" ")
                    );
                    continue;
                }
                Err(e) => e,
            };
            tracing::warn!("{}", e);
            if self.warned_tools.lock().await.insert(tool) {
                self.client
                    .show_message(MessageType::WARNING, format!("Drupal: {}", e))
                    .await;
            }
        }
    }

    /// Workspaces whose root contains `path`.
    async fn workspaces_for(&self, path: &Path) -> Vec<Arc<WorkspaceProviders>> {
        self.workspaces
            .read()
            .await
            .iter()
            .filter(|w| w.has_file(path))
            .cloned()
            .collect()
    }
}

fn watcher_registration_id(providers: &WorkspaceProviders) -> String {
    format!("drupal-watchers-{}", providers.id())
}

/// Convert a file:// URI to a filesystem path.
pub fn uri_to_path(uri: &str) -> Option<PathBuf> {
    let path = uri.strip_prefix("file://")?;
    let decoded = urlencoding::decode(path).ok()?;
    Some(PathBuf::from(decoded.into_owned()))
}

/// Convert a file path to a file:// URI.
pub fn path_to_uri(path: &Path) -> String {
    let encoded: Vec<String> = path
        .to_string_lossy()
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect();
    format!("file://{}", encoded.join("/"))
}

fn to_lsp_kind(kind: CompletionKind) -> CompletionItemKind {
    match kind {
        CompletionKind::Function => CompletionItemKind::FUNCTION,
        CompletionKind::Keyword => CompletionItemKind::KEYWORD,
        CompletionKind::Class => CompletionItemKind::CLASS,
        CompletionKind::Variable => CompletionItemKind::VARIABLE,
        CompletionKind::Text => CompletionItemKind::TEXT,
    }
}

fn markdown(value: String) -> Documentation {
    Documentation::MarkupContent(MarkupContent {
        kind: MarkupKind::Markdown,
        value,
    })
}

fn to_completion_item(item: Completion) -> CompletionItem {
    let insert_text_format = match item.insert_format {
        InsertFormat::Snippet => Some(InsertTextFormat::SNIPPET),
        InsertFormat::PlainText => None,
    };
    let (insert_text, text_edit) = match (item.replace_range, item.insert_text) {
        (Some((start_line, start_col, end_line, end_col)), Some(new_text)) => (
            None,
            Some(CompletionTextEdit::Edit(TextEdit {
                range: Range::new(
                    Position::new(start_line, start_col),
                    Position::new(end_line, end_col),
                ),
                new_text,
            })),
        ),
        (_, insert_text) => (insert_text, None),
    };

    CompletionItem {
        label: item.label,
        kind: Some(to_lsp_kind(item.kind)),
        detail: item.detail,
        documentation: item.documentation.map(markdown),
        insert_text,
        insert_text_format,
        filter_text: item.filter_text,
        text_edit,
        data: item.data,
        ..Default::default()
    }
}

fn file_event(typ: FileChangeType) -> Option<FileEvent> {
    match typ {
        FileChangeType::CREATED => Some(FileEvent::Created),
        FileChangeType::CHANGED => Some(FileEvent::Changed),
        FileChangeType::DELETED => Some(FileEvent::Deleted),
        _ => None,
    }
}

impl LanguageServer for DrupalLspBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        tracing::info!("drupal-lsp: initialize");

        if let Some(trace) = params.trace {
            *self.trace_level.lock().await = trace;
            tracing::info!("Trace level: {:?}", trace);
        }

        let mut folders: Vec<PathBuf> = params
            .workspace_folders
            .iter()
            .flatten()
            .filter_map(|folder| uri_to_path(folder.uri.as_str()))
            .collect();
        if folders.is_empty() {
            #[allow(deprecated)]
            let root = params
                .root_uri
                .as_ref()
                .and_then(|uri| uri_to_path(uri.as_str()));
            folders.extend(root);
        }
        tracing::info!("Workspace folders: {:?}", folders);
        *self.folders.lock().await = folders;

        if let Some(options) = params.initialization_options {
            match DrupalSettings::from_value(options) {
                Ok(settings) => *self.settings.lock().await = settings,
                Err(e) => tracing::warn!("Ignoring invalid initializationOptions: {}", e),
            }
        }

        let dynamic_watchers = params
            .capabilities
            .workspace
            .as_ref()
            .and_then(|w| w.did_change_watched_files.as_ref())
            .and_then(|c| c.dynamic_registration)
            .unwrap_or(false);
        self.dynamic_watchers.store(dynamic_watchers, Ordering::Relaxed);

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Options(
                    TextDocumentSyncOptions {
                        open_close: Some(true),
                        change: Some(TextDocumentSyncKind::INCREMENTAL),
                        ..Default::default()
                    },
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(
                        ["'", "\"", "$", "|", "{", "("]
                            .iter()
                            .map(|c| c.to_string())
                            .collect(),
                    ),
                    resolve_provider: Some(true),
                    ..Default::default()
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: vec![API_SEARCH_COMMAND.to_string()],
                    ..Default::default()
                }),
                workspace: Some(WorkspaceServerCapabilities {
                    workspace_folders: Some(WorkspaceFoldersServerCapabilities {
                        supported: Some(true),
                        change_notifications: Some(OneOf::Left(true)),
                    }),
                    file_operations: None,
                }),
                ..Default::default()
            },
            offset_encoding: None,
            server_info: Some(ServerInfo {
                name: "drupal-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        tracing::info!("drupal-lsp: initialized");
        self.client
            .log_message(MessageType::INFO, "drupal-lsp server initialized")
            .await;

        let folders = self.folders.lock().await.clone();
        if folders.is_empty() {
            tracing::warn!("No workspace folders, completion is disabled");
            return;
        }
        self.add_workspaces(folders).await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("drupal-lsp: shutdown");
        self.workspaces.write().await.clear();
        Ok(())
    }

    // --- Document Synchronization ---

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri_str = params.text_document.uri.as_str().to_string();
        tracing::debug!("didOpen: {}", uri_str);
        self.log_trace(&format!("didOpen: {}", uri_str)).await;

        let document = TextDocument::new(&params.text_document.text, &params.text_document.language_id);
        self.documents.insert(uri_str, document);
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri_str = params.text_document.uri.as_str().to_string();
        tracing::debug!("didChange: {}", uri_str);

        if let Some(mut document) = self.documents.get_mut(&uri_str) {
            for change in &params.content_changes {
                if let Some(range) = change.range {
                    document.apply_edit(
                        range.start.line,
                        range.start.character,
                        range.end.line,
                        range.end.character,
                        &change.text,
                    );
                } else {
                    document.replace(&change.text);
                }
            }
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri_str = params.text_document.uri.as_str().to_string();
        tracing::debug!("didClose: {}", uri_str);
        self.documents.remove(&uri_str);
    }

    // --- Workspace ---

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        let events: Vec<(PathBuf, FileEvent)> = params
            .changes
            .iter()
            .filter_map(|change| {
                let path = uri_to_path(change.uri.as_str())?;
                Some((path, file_event(change.typ)?))
            })
            .collect();
        if events.is_empty() {
            return;
        }
        self.log_trace(&format!("didChangeWatchedFiles: {} changes", events.len()))
            .await;

        let workspaces = self.workspaces.read().await.clone();
        tokio::task::spawn_blocking(move || {
            for (path, event) in &events {
                for providers in &workspaces {
                    providers.on_file_event(path, *event);
                }
            }
        })
        .await
        .unwrap_or_else(|e| tracing::error!("Applying file events failed: {}", e));
    }

    async fn did_change_workspace_folders(&self, params: DidChangeWorkspaceFoldersParams) {
        let removed: Vec<PathBuf> = params
            .event
            .removed
            .iter()
            .filter_map(|f| uri_to_path(f.uri.as_str()))
            .collect();
        let added: Vec<PathBuf> = params
            .event
            .added
            .iter()
            .filter_map(|f| uri_to_path(f.uri.as_str()))
            .collect();
        tracing::info!("Workspace folders changed: +{:?} -{:?}", added, removed);

        {
            let mut folders = self.folders.lock().await;
            folders.retain(|f| !removed.contains(f));
            folders.extend(added.iter().cloned());
        }
        self.remove_workspaces(&removed).await;
        self.add_workspaces(added).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let settings = match DrupalSettings::from_value(params.settings) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring invalid configuration: {}", e);
                return;
            }
        };
        tracing::debug!("Configuration changed: {:?}", settings);
        *self.settings.lock().await = settings;

        let workspaces = self.workspaces.read().await.clone();
        for providers in &workspaces {
            self.check_tools(providers).await;
        }
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<LSPAny>> {
        if params.command != API_SEARCH_COMMAND {
            return Err(Error::invalid_params(format!(
                "unknown command {}",
                params.command
            )));
        }
        let (Some(uri), Some(symbol)) = (
            params.arguments.first().and_then(|v| v.as_str()),
            params.arguments.get(1).and_then(|v| v.as_str()),
        ) else {
            return Err(Error::invalid_params("expected [documentUri, symbol]"));
        };

        let workspace = match uri_to_path(uri) {
            Some(path) => self.workspaces_for(&path).await.into_iter().next(),
            None => None,
        };
        let url = match workspace {
            Some(providers) => providers.api_search_url(symbol),
            None => api_search_url(DEFAULT_DRUPAL_VERSION, symbol),
        };
        Ok(Some(LSPAny::String(url)))
    }

    // --- Completion ---

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri_str = params
            .text_document_position
            .text_document
            .uri
            .as_str()
            .to_string();
        let pos = params.text_document_position.position;
        tracing::debug!("completion: {}:{}:{}", uri_str, pos.line, pos.character);

        let Some(path) = uri_to_path(&uri_str) else {
            return Ok(None);
        };
        let request = {
            let Some(document) = self.documents.get(&uri_str) else {
                return Ok(None);
            };
            let Some(prefix) = document.line_prefix(pos.line, pos.character) else {
                return Ok(None);
            };
            CompletionRequest::new(path, document.language(), prefix, pos.line)
        };

        let workspaces = self.workspaces_for(&request.path).await;
        if workspaces.is_empty() {
            return Ok(None);
        }
        let completions = tokio::task::spawn_blocking(move || {
            workspaces
                .iter()
                .flat_map(|providers| providers.complete(&request))
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|e| {
            tracing::error!("Completion failed for {}: {}", uri_str, e);
            Error::internal_error()
        })?;
        let items: Vec<CompletionItem> = completions.into_iter().map(to_completion_item).collect();
        self.log_trace(&format!("completion: {} items for {}", items.len(), uri_str))
            .await;

        if items.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(items)))
        }
    }

    async fn completion_resolve(&self, mut item: CompletionItem) -> Result<CompletionItem> {
        if item.documentation.is_some() {
            return Ok(item);
        }
        let Some(data) = item.data.clone() else {
            return Ok(item);
        };

        let mut pending = Completion::new(item.label.clone(), CompletionKind::Function);
        pending.data = Some(data);
        let owner = self
            .workspaces
            .read()
            .await
            .iter()
            .find(|w| w.owns(&pending))
            .cloned();
        let Some(providers) = owner else {
            return Ok(item);
        };

        let resolved = match tokio::task::spawn_blocking(move || providers.resolve(pending)).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::error!("Resolving {} failed: {}", item.label, e);
                return Ok(item);
            }
        };
        if let Some(documentation) = resolved.documentation {
            item.documentation = Some(markdown(documentation));
        }
        Ok(item)
    }
}
