//! End-to-end tests for the Drupal LSP server.
//!
//! These tests exercise the full LSP protocol stack using tower-lsp's
//! in-process service, sending JSON-RPC requests against a Drupal site
//! laid out in a temporary directory.

use futures::StreamExt;
use serde_json::json;
use std::fs;
use std::path::Path;
use tower::{Service, ServiceExt};
use tower_lsp::jsonrpc::{Request, Response};
use tower_lsp::LspService;

use drupal_lsp_server::server::path_to_uri;
use drupal_lsp_server::DrupalLspBackend;

const TWIG_EXTENSION: &str = r#"<?php

namespace Drupal\Core\Template;

class TwigExtension extends AbstractExtension {

  /**
   * Generates a URL path given a route name and parameters.
   */
  public function getPath($name, $parameters = [], $options = []) {
  }

}
"#;

/// A minimal Drupal 11 site with one custom module.
fn site() -> tempfile::TempDir {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path();
    let module = root.join("web/modules/custom/a");
    fs::create_dir_all(module.join("translations")).unwrap();
    fs::write(
        root.join("composer.json"),
        r#"{"require": {"drupal/core-recommended": "^11"}}"#,
    )
    .unwrap();
    fs::write(
        root.join("composer.lock"),
        r#"{"packages": [{"name": "drupal/core", "version": "11.0.5"}]}"#,
    )
    .unwrap();
    fs::write(module.join("a.info.yml"), "name: A\ntype: module\n").unwrap();
    fs::write(module.join("a.routing.yml"), "a.view:\n  path: '/a'\n").unwrap();
    fs::write(
        module.join("translations/de.po"),
        "msgid \"Hello @name\"\nmsgstr \"Hallo @name\"\n",
    )
    .unwrap();

    let template = root.join("web/core/lib/Drupal/Core/Template");
    fs::create_dir_all(&template).unwrap();
    fs::write(template.join("TwigExtension.php"), TWIG_EXTENSION).unwrap();
    tmp
}

fn initialize_request(id: i64, root: &Path) -> Request {
    Request::build("initialize")
        .params(json!({
            "capabilities": {},
            "workspaceFolders": [{ "uri": path_to_uri(root), "name": "site" }],
            "initializationOptions": { "drupal": { "phpcs": { "enabled": false } } }
        }))
        .id(id)
        .finish()
}

fn initialized_notification() -> Request {
    Request::build("initialized").params(json!({})).finish()
}

fn shutdown_request(id: i64) -> Request {
    Request::build("shutdown").id(id).finish()
}

fn did_open_notification(uri: &str, language_id: &str, text: &str) -> Request {
    Request::build("textDocument/didOpen")
        .params(json!({
            "textDocument": {
                "uri": uri,
                "languageId": language_id,
                "version": 1,
                "text": text
            }
        }))
        .finish()
}

fn did_change_notification(uri: &str, line: u32, character: u32, text: &str) -> Request {
    Request::build("textDocument/didChange")
        .params(json!({
            "textDocument": { "uri": uri, "version": 2 },
            "contentChanges": [{
                "range": {
                    "start": { "line": line, "character": character },
                    "end": { "line": line, "character": character }
                },
                "text": text
            }]
        }))
        .finish()
}

fn completion_request(id: i64, uri: &str, line: u32, character: u32) -> Request {
    Request::build("textDocument/completion")
        .params(json!({
            "textDocument": { "uri": uri },
            "position": { "line": line, "character": character }
        }))
        .id(id)
        .finish()
}

fn execute_command_request(id: i64, arguments: serde_json::Value) -> Request {
    Request::build("workspace/executeCommand")
        .params(json!({
            "command": "drupal.apiSearchUrl",
            "arguments": arguments
        }))
        .id(id)
        .finish()
}

/// Helper to extract the "result" field from a JSON-RPC response.
fn extract_result(response: Option<Response>) -> serde_json::Value {
    let resp = response.expect("expected a response");
    let serialized = serde_json::to_value(&resp).unwrap();
    serialized.get("result").cloned().unwrap_or(json!(null))
}

fn labels(result: &serde_json::Value) -> Vec<String> {
    result
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|i| i["label"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

async fn send(service: &mut LspService<DrupalLspBackend>, request: Request) -> serde_json::Value {
    let resp = service.ready().await.unwrap().call(request).await.unwrap();
    extract_result(resp)
}

async fn notify(service: &mut LspService<DrupalLspBackend>, request: Request) {
    let resp = service.ready().await.unwrap().call(request).await.unwrap();
    assert!(resp.is_none(), "notifications should not produce a response");
}

/// Start a server over `root` and run initialize + initialized.
async fn start(root: &Path) -> LspService<DrupalLspBackend> {
    let (mut service, socket) = LspService::new(DrupalLspBackend::new);

    // Drain server→client messages so client.log_message() etc. don't block.
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });

    let result = send(&mut service, initialize_request(1, root)).await;
    assert_eq!(result["serverInfo"]["name"], "drupal-lsp");
    notify(&mut service, initialized_notification()).await;
    service
}

#[tokio::test(flavor = "current_thread")]
async fn test_initialize_advertises_capabilities() {
    let tmp = site();
    let (mut service, socket) = LspService::new(DrupalLspBackend::new);
    tokio::spawn(async move {
        socket.collect::<Vec<_>>().await;
    });

    let result = send(&mut service, initialize_request(1, tmp.path())).await;
    let capabilities = &result["capabilities"];
    assert_eq!(capabilities["completionProvider"]["resolveProvider"], true);
    let triggers = capabilities["completionProvider"]["triggerCharacters"]
        .as_array()
        .unwrap();
    assert!(triggers.contains(&json!("'")));
    assert!(triggers.contains(&json!("|")));
    assert_eq!(
        capabilities["executeCommandProvider"]["commands"],
        json!(["drupal.apiSearchUrl"])
    );

    let result = send(&mut service, shutdown_request(2)).await;
    assert_eq!(result, json!(null));
}

#[tokio::test(flavor = "current_thread")]
async fn test_route_completion_after_edit() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/src/Controller/C.php"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "<?php\n$url = \n"),
    )
    .await;
    notify(
        &mut service,
        did_change_notification(&uri, 1, 7, "Url::fromRoute('"),
    )
    .await;

    let result = send(&mut service, completion_request(2, &uri, 1, 23)).await;
    assert_eq!(labels(&result), vec!["a.view"]);
    assert_eq!(result[0]["detail"], "Route a");
}

#[tokio::test(flavor = "current_thread")]
async fn test_translation_snippet_replaces_typed_quote() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/a.module"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "<?php\n  return t('"),
    )
    .await;

    let result = send(&mut service, completion_request(2, &uri, 1, 12)).await;
    let hello = result
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["label"] == "Hello @name")
        .unwrap();
    assert_eq!(hello["insertTextFormat"], 2);
    assert_eq!(hello["filterText"], "'Hello @name");
    assert_eq!(hello["textEdit"]["range"]["start"], json!({"line": 1, "character": 11}));
    assert_eq!(hello["textEdit"]["newText"], "'Hello @name', ['@name' => $1]");
}

#[tokio::test(flavor = "current_thread")]
async fn test_twig_item_resolves_documentation() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let uri = path_to_uri(&tmp.path().join("web/themes/custom/t/templates/page.html.twig"));
    notify(&mut service, did_open_notification(&uri, "twig", "{{ ")).await;

    let result = send(&mut service, completion_request(2, &uri, 0, 3)).await;
    let path_item = result
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["label"] == "path")
        .cloned()
        .unwrap();
    assert!(path_item.get("documentation").is_none());

    let resolve = Request::build("completionItem/resolve")
        .params(path_item)
        .id(3)
        .finish();
    let resolved = send(&mut service, resolve).await;
    assert_eq!(resolved["documentation"]["kind"], "markdown");
    assert_eq!(
        resolved["documentation"]["value"],
        "Generates a URL path given a route name and parameters."
    );
}

#[tokio::test(flavor = "current_thread")]
async fn test_api_search_url_uses_locked_core_version() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/a.module"));
    let result = send(
        &mut service,
        execute_command_request(2, json!([uri, "hook_form_alter"])),
    )
    .await;
    assert_eq!(
        result,
        "https://api.drupal.org/api/drupal/11/search/hook_form_alter"
    );

    let result = send(
        &mut service,
        execute_command_request(3, json!(["file:///elsewhere/x.php", "t"])),
    )
    .await;
    assert_eq!(result, "https://api.drupal.org/api/drupal/10/search/t");
}

#[tokio::test(flavor = "current_thread")]
async fn test_no_completion_outside_drupal_workspace() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let uri = "file:///elsewhere/x.php";
    notify(
        &mut service,
        did_open_notification(uri, "php", "<?php\nUrl::fromRoute('"),
    )
    .await;
    let result = send(&mut service, completion_request(2, uri, 1, 16)).await;
    assert_eq!(result, json!(null));
}

#[tokio::test(flavor = "current_thread")]
async fn test_watched_file_event_refreshes_routes() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    let b = tmp.path().join("web/modules/custom/b");
    fs::create_dir_all(&b).unwrap();
    fs::write(b.join("b.routing.yml"), "b.list:\n  path: '/b'\n").unwrap();
    notify(
        &mut service,
        Request::build("workspace/didChangeWatchedFiles")
            .params(json!({
                "changes": [{ "uri": path_to_uri(&b.join("b.routing.yml")), "type": 1 }]
            }))
            .finish(),
    )
    .await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/a.module"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "new Url('"),
    )
    .await;
    let result = send(&mut service, completion_request(2, &uri, 0, 9)).await;
    let mut found = labels(&result);
    found.sort();
    assert_eq!(found, vec!["a.view", "b.list"]);
}

#[tokio::test(flavor = "current_thread")]
async fn test_workspace_folder_removal_drops_providers() {
    let tmp = site();
    let mut service = start(tmp.path()).await;

    notify(
        &mut service,
        Request::build("workspace/didChangeWorkspaceFolders")
            .params(json!({
                "event": {
                    "added": [],
                    "removed": [{ "uri": path_to_uri(tmp.path()), "name": "site" }]
                }
            }))
            .finish(),
    )
    .await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/a.module"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "Url::fromRoute('"),
    )
    .await;
    let result = send(&mut service, completion_request(2, &uri, 0, 16)).await;
    assert_eq!(result, json!(null));
}

#[tokio::test(flavor = "current_thread")]
async fn test_malformed_catalog_does_not_disable_site() {
    let tmp = site();
    let translations = tmp.path().join("web/modules/custom/a/translations");
    fs::write(
        translations.join("fr.po"),
        "msgid \"a\"\nmsgid_plural \"as\"\nmsgstr[18446744073709551615] \"x\"\n",
    )
    .unwrap();
    let mut service = start(tmp.path()).await;

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/a.module"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "<?php\n  return t('"),
    )
    .await;
    let result = send(&mut service, completion_request(2, &uri, 1, 12)).await;
    let found = labels(&result);
    assert!(found.contains(&"Hello @name".to_string()));
    assert!(!found.contains(&"a".to_string()));

    let uri = path_to_uri(&tmp.path().join("web/modules/custom/a/src/C.php"));
    notify(
        &mut service,
        did_open_notification(&uri, "php", "Url::fromRoute('"),
    )
    .await;
    let result = send(&mut service, completion_request(3, &uri, 0, 16)).await;
    assert_eq!(labels(&result), vec!["a.view"]);
}
