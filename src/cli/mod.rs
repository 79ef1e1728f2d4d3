//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `resources` -- list the resource catalog
//! - `list|get|create|update|delete|clear` -- list/form operations on one resource
//! - `browse` -- search a resource interactively, one keyword per stdin line
//! - `serve` -- run the local forwarding proxy
//! - `config show|get|set|path` -- read/write configuration
//! - `version` -- print build/version info

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::config::{self, Config};
use crate::form::FormError;
use crate::gateway::HttpGateway;
use crate::list::EmptyState;
use crate::logging;
use crate::model::{Record, RecordId};
use crate::proxy::{self, ProxyState};
use crate::repository::Repository;
use crate::resources::{self, ListStrategy, ResourceSpec};
use crate::view::{NoticeLevel, View, ViewError};

/// Admin client for the chat-engagement platform backend.
#[derive(Parser, Debug)]
#[command(
    name = "deskadmin",
    version = env!("CARGO_PKG_VERSION"),
    about = "deskadmin: list, search and edit admin resources on the REST backend"
)]
pub struct Cli {
    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Backend base URL (overrides ADMIN_API_BASE_URI and the config file).
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List every known resource (default when no subcommand is given).
    Resources,

    /// Show one page of a resource's records.
    List {
        resource: String,

        /// Keyword to search for.
        #[arg(short, long)]
        search: Option<String>,

        /// 1-based page number.
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Rows per page (default: the resource's page size).
        #[arg(long)]
        size: Option<usize>,

        /// Column to sort by.
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending.
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Search a resource interactively: every line read from stdin is a
    /// new keyword, applied once typing pauses (list.debounceMs).
    Browse { resource: String },

    /// Show one record.
    Get { resource: String, id: RecordId },

    /// Create a record.
    Create {
        resource: String,

        /// Field assignment, repeatable (e.g. --set tag=support).
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,

        /// Initial field values as a JSON object.
        #[arg(long, value_name = "JSON")]
        body: Option<String>,
    },

    /// Update a record.
    Update {
        resource: String,
        id: RecordId,

        /// Field assignment, repeatable.
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        sets: Vec<String>,

        /// Field values to merge, as a JSON object.
        #[arg(long, value_name = "JSON")]
        body: Option<String>,
    },

    /// Delete one record.
    Delete { resource: String, id: RecordId },

    /// Delete every record of a resource.
    Clear {
        resource: String,

        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },

    /// Run the local forwarding proxy.
    Serve {
        /// Address to bind (default: from config or 127.0.0.1).
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (default: from config or 3100).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Read or write configuration values.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration (secrets redacted) as JSON.
    Show,

    /// Print a specific configuration value by dot-notation path.
    Get {
        /// Dot-notation key (e.g. "backend.baseUrl", "proxy.port").
        key: String,
    },

    /// Set a configuration value and write to disk.
    Set {
        /// Dot-notation key (e.g. "list.pageSize").
        key: String,

        /// Value to set (interpreted as JSON; bare strings allowed).
        value: String,
    },

    /// Print the resolved configuration file path.
    Path,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Run a parsed command line.
pub async fn run(cli: Cli) -> CliResult {
    // Config commands work on the raw file, even when it fails validation.
    if let Some(Command::Config(cmd)) = &cli.command {
        return match cmd {
            ConfigCommand::Show => handle_config_show(),
            ConfigCommand::Get { key } => handle_config_get(key),
            ConfigCommand::Set { key, value } => handle_config_set(key, value),
            ConfigCommand::Path => {
                handle_config_path();
                Ok(())
            }
        };
    }

    let mut cfg = Config::load()?;
    cfg.resolve_base_url(cli.base_url.as_deref());
    cfg.validate()?;
    if let Err(e) = logging::init_logging(&cfg.logging) {
        eprintln!("Warning: {}", e);
    }
    debug!(base_url = %cfg.backend.base_url, "configuration loaded");

    let out = Output { json: cli.json };
    match cli.command.unwrap_or(Command::Resources) {
        Command::Resources => handle_resources(&out),
        Command::List {
            resource,
            search,
            page,
            size,
            sort,
            desc,
        } => {
            let opts = ListOptions {
                search,
                page,
                size,
                sort,
                desc,
            };
            handle_list(&cfg, &out, &resource, opts).await
        }
        Command::Browse { resource } => handle_browse(&cfg, &out, &resource).await,
        Command::Get { resource, id } => handle_get(&cfg, &out, &resource, id).await,
        Command::Create {
            resource,
            sets,
            body,
        } => handle_save(&cfg, &out, &resource, None, &sets, body.as_deref()).await,
        Command::Update {
            resource,
            id,
            sets,
            body,
        } => handle_save(&cfg, &out, &resource, Some(id), &sets, body.as_deref()).await,
        Command::Delete { resource, id } => handle_delete(&cfg, &out, &resource, id).await,
        Command::Clear { resource, yes } => handle_clear(&cfg, &out, &resource, yes).await,
        Command::Serve { bind, port } => handle_serve(&cfg, bind, port).await,
        Command::Version => {
            handle_version();
            Ok(())
        }
        Command::Config(_) => Ok(()),
    }
}

/// How command results are printed.
pub struct Output {
    pub json: bool,
}

impl Output {
    fn value(&self, value: &Value) -> CliResult {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Options for the `list` subcommand.
#[derive(Debug, Default)]
pub struct ListOptions {
    pub search: Option<String>,
    pub page: usize,
    pub size: Option<usize>,
    pub sort: Option<String>,
    pub desc: bool,
}

fn lookup(name: &str) -> Result<ResourceSpec, Box<dyn std::error::Error>> {
    resources::find_resource(name).ok_or_else(|| {
        format!(
            "unknown resource '{}' (run `deskadmin resources` for the list)",
            name
        )
        .into()
    })
}

fn repository(cfg: &Config, name: &str) -> Result<Repository, Box<dyn std::error::Error>> {
    let mut spec = lookup(name)?;
    if let Some(size) = cfg.list.page_size {
        spec = spec.with_page_size(size);
    }
    let gateway = HttpGateway::from_config(&cfg.backend)?;
    Ok(Repository::new(spec, Arc::new(gateway)))
}

fn print_notices(out: &Output, view: &mut View) {
    for notice in view.take_notices() {
        match notice.level {
            NoticeLevel::Success if !out.json => println!("{}", notice.message),
            NoticeLevel::Success => {}
            // errors are reported once, by the returned error
            NoticeLevel::Error => debug!(message = %notice.message, "error notice"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

/// Run the `resources` subcommand.
pub fn handle_resources(out: &Output) -> CliResult {
    let catalog = resources::catalog();
    if out.json {
        let rows: Vec<Value> = catalog
            .iter()
            .map(|r| {
                serde_json::json!({
                    "name": r.name,
                    "label": r.label,
                    "path": r.path,
                    "strategy": r.strategy.as_str(),
                    "pageSize": r.page_size,
                    "proxied": r.proxied,
                })
            })
            .collect();
        return out.value(&Value::Array(rows));
    }

    let header = ["NAME", "PATH", "SEARCH", "PAGE", "PROXIED"];
    let rows: Vec<Vec<String>> = catalog
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.path.clone(),
                r.strategy.as_str().to_string(),
                r.page_size.to_string(),
                if r.proxied { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print!("{}", render_table(&header, &rows));
    Ok(())
}

/// Run the `list` subcommand.
pub async fn handle_list(cfg: &Config, out: &Output, resource: &str, opts: ListOptions) -> CliResult {
    let mut view = View::new(repository(cfg, resource)?);
    if let Some(size) = opts.size {
        view = view.with_page_size(size);
    }
    let keyword = opts.search.unwrap_or_default();

    match view.list().strategy() {
        ListStrategy::Client => {
            view.mount().await?;
            view.search(&keyword).await?;
        }
        ListStrategy::Server => view.search(&keyword).await?,
    }
    if opts.page > 1 {
        view.go_to_page(opts.page).await?;
    }
    if let Some(key) = &opts.sort {
        view.toggle_sort(key);
        if opts.desc {
            view.toggle_sort(key);
        }
    }

    print_list(out, &view)
}

/// Run the `browse` subcommand.
pub async fn handle_browse(cfg: &Config, out: &Output, resource: &str) -> CliResult {
    let mut view = View::new(repository(cfg, resource)?)
        .with_debounce(Duration::from_millis(cfg.list.debounce_ms));
    view.mount().await?;
    print_list(out, &view)?;

    let (tx, mut rx) = mpsc::channel(16);
    tokio::task::spawn_blocking(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line.trim().to_string()).is_err() {
                break;
            }
        }
    });

    view.follow_search(&mut rx, |view| {
        for notice in view.take_notices() {
            if notice.level == NoticeLevel::Error {
                eprintln!("Error: {}", notice.message);
            }
        }
        if let Err(e) = print_list(out, view) {
            warn!(error = %e, "failed to render list");
        }
    })
    .await;
    Ok(())
}

/// Render the current page of a view as a table, or as JSON.
fn print_list(out: &Output, view: &View) -> CliResult {
    let spec = view.repository().spec();
    let columns = &spec.columns;
    let keyword = view.list().search_term();
    let list = view.list();
    let rows = list.visible();
    if out.json {
        let (start, end, total) = list.range();
        return out.value(&serde_json::json!({
            "content": rows,
            "page": list.current_page(),
            "totalPages": list.total_pages(),
            "totalElements": total,
            "from": start,
            "to": end,
        }));
    }

    match list.empty_state() {
        Some(EmptyState::NoRecords) => {
            println!("No {} yet.", spec.label.to_lowercase());
            println!("Add the first one with: deskadmin create {} --set FIELD=VALUE", spec.name);
        }
        Some(EmptyState::NoMatches) => println!("No records match '{}'.", keyword),
        None => {
            let header: Vec<&str> = columns.iter().map(String::as_str).collect();
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|r| columns.iter().map(|c| truncate(&r.display(c), 40)).collect())
                .collect();
            print!("{}", render_table(&header, &cells));
            let (start, end, total) = list.range();
            println!(
                "Showing {}-{} of {} (page {}/{})",
                start,
                end,
                total,
                list.current_page(),
                list.total_pages()
            );
        }
    }
    Ok(())
}

/// Run the `get` subcommand.
pub async fn handle_get(cfg: &Config, out: &Output, resource: &str, id: RecordId) -> CliResult {
    let repo = repository(cfg, resource)?;
    let record = repo.find(id).await?;
    if out.json {
        return out.value(&record.to_value());
    }
    print!("{}", render_record(repo.spec(), &record));
    Ok(())
}

/// Run the `create` (no id) or `update` (with id) subcommand.
pub async fn handle_save(
    cfg: &Config,
    out: &Output,
    resource: &str,
    id: Option<RecordId>,
    sets: &[String],
    body: Option<&str>,
) -> CliResult {
    let repo = repository(cfg, resource)?;
    let mut view = View::new(repo);
    match id {
        Some(id) => view.open_edit(id).await?,
        None => view.open_add(),
    }

    let assignments = sets
        .iter()
        .map(|s| parse_assignment(s))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(form) = view.form_mut() {
        if let Some(raw) = body {
            let value: Value = serde_json::from_str(raw)?;
            let Value::Object(map) = value else {
                return Err("--body must be a JSON object".into());
            };
            for (key, value) in map {
                form.set(&key, value);
            }
        }
        for (key, raw) in &assignments {
            form.set_text(key, raw);
        }
    }

    match view.save().await {
        Ok(saved) => {
            print_notices(out, &mut view);
            if out.json {
                out.value(&saved.to_value())
            } else {
                print!("{}", render_record(view.repository().spec(), &saved));
                Ok(())
            }
        }
        Err(ViewError::Form(FormError::Invalid(validation))) => {
            for err in &validation.errors {
                eprintln!("  {}", err);
            }
            Err(FormError::Invalid(validation).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Run the `delete` subcommand.
pub async fn handle_delete(cfg: &Config, out: &Output, resource: &str, id: RecordId) -> CliResult {
    let mut view = View::new(repository(cfg, resource)?);
    view.delete(id).await?;
    print_notices(out, &mut view);
    if out.json {
        out.value(&serde_json::json!({ "deleted": id }))?;
    }
    Ok(())
}

/// Run the `clear` subcommand.
pub async fn handle_clear(cfg: &Config, out: &Output, resource: &str, yes: bool) -> CliResult {
    let spec = lookup(resource)?;
    if !yes {
        return Err(format!(
            "refusing to delete all {} without --yes",
            spec.label.to_lowercase()
        )
        .into());
    }
    let mut view = View::new(repository(cfg, resource)?);
    view.clear_all().await?;
    print_notices(out, &mut view);
    if out.json {
        out.value(&serde_json::json!({ "cleared": resource }))?;
    }
    Ok(())
}

/// Run the `serve` subcommand.
pub async fn handle_serve(cfg: &Config, bind: Option<String>, port: Option<u16>) -> CliResult {
    let mut proxy_cfg = cfg.proxy.clone();
    if let Some(bind) = bind {
        proxy_cfg.bind = bind;
    }
    if let Some(port) = port {
        proxy_cfg.port = port;
    }
    let state = ProxyState::from_config(&cfg.backend, resources::catalog())?;
    println!(
        "Proxy listening on http://{}:{} -> {}",
        proxy_cfg.bind, proxy_cfg.port, cfg.backend.base_url
    );
    proxy::serve(&proxy_cfg, state).await?;
    Ok(())
}

/// Key fragments redacted when printing config (`backend.apiToken`).
const SECRET_KEYS: &[&str] = &["token", "secret", "password"];

/// Run the `config show` subcommand.
pub fn handle_config_show() -> CliResult {
    let raw = config::load_config()?;
    let mut merged = serde_json::to_value(Config::default())?;
    merge_values(&mut merged, raw);
    let redacted = redact_secrets(merged);
    println!("{}", serde_json::to_string_pretty(&redacted)?);
    Ok(())
}

/// Run the `config get <key>` subcommand.
pub fn handle_config_get(key: &str) -> CliResult {
    let raw = config::load_config()?;
    let mut merged = serde_json::to_value(Config::default())?;
    merge_values(&mut merged, raw);
    match get_value_at_path(&merged, key) {
        Some(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        None => Err(format!("key not found: {}", key).into()),
    }
}

/// Run the `config set <key> <value>` subcommand.
pub fn handle_config_set(key: &str, raw_value: &str) -> CliResult {
    // Parse value as JSON first; fall back to treating it as a plain string.
    let value: Value =
        serde_json::from_str(raw_value).unwrap_or_else(|_| Value::String(raw_value.to_string()));

    let config_path = config::get_config_path();
    let mut cfg = config::load_config_uncached(&config_path)?;
    set_value_at_path(&mut cfg, key, value.clone());

    let mut merged = serde_json::to_value(Config::default())?;
    merge_values(&mut merged, cfg.clone());
    let checked: Config = serde_json::from_value(merged)?;
    checked.validate()?;

    config::persist_config_file(&config_path, &cfg)?;
    println!("Set {} = {}", key, serde_json::to_string(&value)?);
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("deskadmin {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("DESKADMIN_BUILD_DATE"));
    println!("  Git commit: {}", env!("DESKADMIN_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split `field=value`. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected FIELD=VALUE, got '{}'", raw)),
    }
}

/// Render rows as a left-aligned, space-padded table.
fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<width$}", cell, width = *w))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(header.to_vec());
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}

/// Render one record as `Label: value` lines.
fn render_record(spec: &ResourceSpec, record: &Record) -> String {
    let mut keys: Vec<String> = vec!["id".to_string()];
    keys.extend(spec.fields.iter().map(|f| f.name.clone()));
    for key in record.fields.keys() {
        if !keys.contains(key) {
            keys.push(key.clone());
        }
    }
    keys.extend(["createdAt", "updatedAt"].map(String::from));

    let rows: Vec<(String, String)> = keys
        .iter()
        .map(|k| (spec.label_for(k), record.display(k)))
        .filter(|(_, v)| !v.is_empty())
        .collect();
    let width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    rows.iter()
        .map(|(k, v)| format!("{:<width$}  {}\n", format!("{}:", k), v, width = width + 1))
        .collect()
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Overlay `patch` onto `base`, recursing into objects.
fn merge_values(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Navigate a JSON value by dot-notation path and return the leaf value.
fn get_value_at_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current.clone())
}

/// Set a value at a dot-notation path, creating intermediate objects as needed.
fn set_value_at_path(root: &mut Value, path: &str, value: Value) {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = root;

    for (i, part) in parts.iter().enumerate() {
        if !current.is_object() {
            *current = Value::Object(serde_json::Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if i == parts.len() - 1 {
            map.insert(part.to_string(), value);
            return;
        }
        let child = map
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
        current = child;
    }
}

/// Redact known secret keys in a JSON value (recursive).
fn redact_secrets(mut value: Value) -> Value {
    match &mut value {
        Value::Object(map) => {
            let keys: Vec<String> = map.keys().cloned().collect();
            for key in keys {
                let lower = key.to_lowercase();
                if SECRET_KEYS.iter().any(|s| lower.contains(&s.to_lowercase())) {
                    map.insert(key, Value::String("[REDACTED]".to_string()));
                } else if let Some(child) = map.remove(&key) {
                    map.insert(key, redact_secrets(child));
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                *item = redact_secrets(item.take());
            }
        }
        _ => {}
    }
    value
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;

    #[test]
    fn test_cli_no_args_defaults_to_none() {
        let cli = Cli::try_parse_from(["deskadmin"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.json);
    }

    #[test]
    fn test_cli_list_flags() {
        let cli = Cli::try_parse_from([
            "deskadmin", "list", "payments", "--search", "USD", "--page", "2", "--sort",
            "amount", "--desc", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Command::List {
                ref resource,
                ref search,
                page,
                size,
                ref sort,
                desc,
            }) => {
                assert_eq!(resource, "payments");
                assert_eq!(search.as_deref(), Some("USD"));
                assert_eq!(page, 2);
                assert_eq!(size, None);
                assert_eq!(sort.as_deref(), Some("amount"));
                assert!(desc);
            }
            other => panic!("Expected List, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_browse() {
        let cli = Cli::try_parse_from(["deskadmin", "browse", "payments"]).unwrap();
        match cli.command {
            Some(Command::Browse { resource }) => assert_eq!(resource, "payments"),
            other => panic!("Expected Browse, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_desc_requires_sort() {
        assert!(Cli::try_parse_from(["deskadmin", "list", "tags", "--desc"]).is_err());
    }

    #[test]
    fn test_cli_create_repeated_sets() {
        let cli = Cli::try_parse_from([
            "deskadmin", "create", "tags", "--set", "tag=support", "--set", "isDefault=true",
        ])
        .unwrap();
        match cli.command {
            Some(Command::Create { ref sets, ref body, .. }) => {
                assert_eq!(sets, &["tag=support", "isDefault=true"]);
                assert!(body.is_none());
            }
            other => panic!("Expected Create, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_update_with_body() {
        let cli =
            Cli::try_parse_from(["deskadmin", "update", "tags", "4", "--body", r#"{"tag":"x"}"#])
                .unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Update { id: 4, body: Some(_), .. })
        ));
    }

    #[test]
    fn test_cli_global_base_url_after_subcommand() {
        let cli = Cli::try_parse_from([
            "deskadmin", "get", "tags", "3", "--base-url", "http://staging/api",
        ])
        .unwrap();
        assert_eq!(cli.base_url.as_deref(), Some("http://staging/api"));
    }

    #[test]
    fn test_cli_clear_and_serve() {
        let cli = Cli::try_parse_from(["deskadmin", "clear", "tags", "--yes"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Clear { yes: true, .. })));

        let cli = Cli::try_parse_from(["deskadmin", "serve", "--port", "4000"]).unwrap();
        match cli.command {
            Some(Command::Serve { bind, port }) => {
                assert_eq!(bind, None);
                assert_eq!(port, Some(4000));
            }
            other => panic!("Expected Serve, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_config_subcommands() {
        let cli = Cli::try_parse_from(["deskadmin", "config", "get", "proxy.port"]).unwrap();
        match cli.command {
            Some(Command::Config(ConfigCommand::Get { ref key })) => {
                assert_eq!(key, "proxy.port");
            }
            other => panic!("Expected Config(Get), got {:?}", other),
        }

        let cli =
            Cli::try_parse_from(["deskadmin", "config", "set", "list.pageSize", "25"]).unwrap();
        match cli.command {
            Some(Command::Config(ConfigCommand::Set { ref key, ref value })) => {
                assert_eq!(key, "list.pageSize");
                assert_eq!(value, "25");
            }
            other => panic!("Expected Config(Set), got {:?}", other),
        }

        let cli = Cli::try_parse_from(["deskadmin", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Path))
        ));
    }

    #[test]
    fn test_cli_version_subcommand() {
        let cli = Cli::try_parse_from(["deskadmin", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_assignment("url=https://x/?a=b").unwrap(),
            ("url".to_string(), "https://x/?a=b".to_string())
        );
        assert_eq!(
            parse_assignment("note=").unwrap(),
            ("note".to_string(), String::new())
        );
        assert!(parse_assignment("=x").is_err());
        assert!(parse_assignment("novalue").is_err());
    }

    #[test]
    fn test_render_table_pads_columns() {
        let out = render_table(
            &["id", "tag"],
            &[
                vec!["1".to_string(), "support".to_string()],
                vec!["12".to_string(), "vip".to_string()],
            ],
        );
        assert_eq!(out, "id  tag\n1   support\n12  vip\n");
    }

    #[test]
    fn test_render_record_uses_labels() {
        let spec = ResourceSpec::new("tags", "Tags")
            .field(crate::resources::FieldSpec::text("tag", "Tag"));
        let record = Record::new().with_id(3).with("tag", "support");
        assert_eq!(render_record(&spec, &record), "id:   3\nTag:  support\n");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a\nb", 10), "a b");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }

    #[test]
    fn test_merge_values_overlays_nested() {
        let mut base = json!({"backend": {"baseUrl": "a", "timeoutSeconds": 30}});
        merge_values(&mut base, json!({"backend": {"baseUrl": "b"}, "extra": 1}));
        assert_eq!(
            base,
            json!({"backend": {"baseUrl": "b", "timeoutSeconds": 30}, "extra": 1})
        );
    }

    #[test]
    fn test_get_value_at_path() {
        let val = json!({"proxy": {"port": 3100}});
        assert_eq!(get_value_at_path(&val, "proxy.port"), Some(json!(3100)));
        assert_eq!(get_value_at_path(&val, "proxy.bind"), None);
        assert_eq!(get_value_at_path(&val, "a.b"), None);
    }

    #[test]
    fn test_set_value_at_path_creates_intermediate() {
        let mut val = json!({});
        set_value_at_path(&mut val, "a.b.c", json!(42));
        assert_eq!(val["a"]["b"]["c"], 42);
    }

    #[test]
    fn test_set_value_at_path_overwrites() {
        let mut val = json!({"proxy": {"port": 8080}});
        set_value_at_path(&mut val, "proxy.port", json!(9000));
        assert_eq!(val["proxy"]["port"], 9000);

        let mut val = json!({"proxy": 1});
        set_value_at_path(&mut val, "proxy.port", json!(9000));
        assert_eq!(val["proxy"]["port"], 9000);
    }

    #[test]
    fn test_redact_secrets() {
        let mut cfg = crate::config::Config::default();
        cfg.backend.base_url = "http://x".to_string();
        cfg.backend.api_token = Some("s3cret".to_string());
        let redacted = redact_secrets(serde_json::to_value(&cfg).unwrap());
        assert_eq!(redacted["backend"]["apiToken"], "[REDACTED]");
        assert_eq!(redacted["backend"]["baseUrl"], "http://x");
        assert_eq!(redacted["list"], serde_json::to_value(&cfg.list).unwrap());

        let nested = redact_secrets(json!({ "items": [{ "password": "p" }, { "safe": "ok" }] }));
        assert_eq!(nested["items"][0]["password"], "[REDACTED]");
        assert_eq!(nested["items"][1]["safe"], "ok");
    }
}
