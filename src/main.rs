//! `mouldtrack` command-line client.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use mouldtrack::api::{
    ApiClient, Body, BodyEncoding, DEFAULT_DOWNLOAD_LIMIT, ListQuery, MultipartForm, Resource,
    form::content_type_for,
};
use mouldtrack::auth::{self, Capabilities, GateDecision, routes};
use mouldtrack::config::{self, AppConfig};
use mouldtrack::listing::filter::{self, ALL_COMPANIES, MouldIndex};
use mouldtrack::listing::ordering::{changeover_is_done, sort_moulds_by_maintenance};
use mouldtrack::listing::{ListOrdering, OpenDonePager, PageItem, page_strip, paginate};
use mouldtrack::logging::{self, LoggingOptions};
use mouldtrack::mes::{MachinePanel, PanelRuntime, PanelView, SystemClock};
use mouldtrack::session::{KeyringSessionStore, SessionStore};

const PASSWORD_ENV: &str = "MOULDTRACK_PASSWORD";
const CHANGEOVER_SEARCH_FIELDS: [&str; 5] =
    ["from_mould_id", "to_mould_id", "updated_by", "available_date", "needed_date"];
const DEFAULT_SEARCH_FIELDS: [&str; 4] = ["name", "number", "description", "comment"];

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init_with(LoggingOptions::for_cli(options.verbose)) {
        eprintln!("Logging disabled: {err}");
    }

    let mut config = config::load_or_default().map_err(|err| err.to_string())?;
    if let Some(base_url) = &options.api_base {
        config.api.base_url = base_url.clone();
    }
    let store: Arc<dyn SessionStore> =
        Arc::new(KeyringSessionStore::new().map_err(|err| err.to_string())?);
    let client = Arc::new(
        ApiClient::new(&config.api.base_url, Arc::clone(&store)).map_err(|err| err.to_string())?,
    );

    match options.command {
        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let session = client
                .login(&username, &password)
                .map_err(|err| format!("Login failed: {err}"))?;
            let role = session
                .role()
                .map(|role| role.to_string())
                .or(session.role.clone())
                .unwrap_or_else(|| "unknown".to_string());
            println!("Logged in as {username} (role: {role})");
        }
        Command::Register { username, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            client
                .register(&username, &password)
                .map_err(|err| format!("Registration failed: {err}"))?;
            println!("Registered {username}");
        }
        Command::Logout => {
            client.logout().map_err(|err| err.to_string())?;
            println!("Logged out");
        }
        Command::Whoami { remote } => print_whoami(&client, remote)?,
        Command::CheckRoute { path } => {
            let route = routes::resolve(&path).ok_or_else(|| format!("Unknown route: {path}"))?;
            let token = store.token();
            match auth::check(token.as_deref(), route.gate) {
                GateDecision::Allow => println!("allow {path}"),
                GateDecision::Redirect(target) => println!("redirect {target}"),
            }
        }
        Command::Nav => {
            let token = store.token();
            for item in routes::navigation(Capabilities::from_token(token.as_deref())) {
                println!("{:<24} {}", item.label, item.path);
            }
        }
        Command::List(list) => run_list(&client, &config, list)?,
        Command::History { resource, id } => {
            let rows = client
                .history(resource, &id)
                .map_err(|err| format!("Failed to load history: {err}"))?;
            print_rows(rows.iter());
        }
        Command::Create { resource, fields } => {
            let body = build_body(resource, &fields)?;
            let created = client
                .create(resource, &body)
                .map_err(|err| format!("Create failed: {err}"))?;
            print_value(&created);
        }
        Command::Update {
            resource,
            id,
            fields,
        } => {
            let body = build_body(resource, &fields)?;
            let updated = client
                .update(resource, &id, &body)
                .map_err(|err| format!("Update failed: {err}"))?;
            print_value(&updated);
        }
        Command::Delete { resource, id } => {
            client
                .delete(resource, &id)
                .map_err(|err| format!("Delete failed: {err}"))?;
            println!("Deleted {resource} {id}");
        }
        Command::FetchFile { path, out } => {
            let mut file = std::fs::File::create(&out)
                .map_err(|err| format!("Failed to create {}: {err}", out.display()))?;
            let written = client
                .download(&path, &mut file, DEFAULT_DOWNLOAD_LIMIT)
                .map_err(|err| format!("Download failed: {err}"))?;
            println!("Saved {written} bytes to {}", out.display());
        }
        Command::Reorder { operation_ids } => {
            client
                .reorder_operations(operation_ids)
                .map_err(|err| format!("Reorder failed: {err}"))?;
            println!("Operations reordered");
        }
        Command::Panel(panel) => run_panel(&client, &store, &config, panel)?,
    }
    Ok(())
}

fn print_whoami(client: &ApiClient, remote: bool) -> Result<(), String> {
    let Some(session) = client.session() else {
        println!("Not logged in");
        return Ok(());
    };
    let name = session.display_name().unwrap_or_else(|| "unknown".to_string());
    let role = session.role();
    println!("user:    {name}");
    println!(
        "role:    {}",
        role.as_ref().map(|role| role.to_string()).unwrap_or_else(|| "none".into())
    );
    match session.resolved_user_id() {
        Some(id) => println!("user id: {id}"),
        None => println!("user id: unknown"),
    }
    let caps = Capabilities::from_role(role.as_ref());
    println!(
        "can edit moulds: {}, can manage schedules: {}, superadmin: {}",
        caps.can_edit_moulds, caps.can_manage_schedules, caps.is_superadmin
    );
    if remote {
        let info = client
            .whoami(&name)
            .map_err(|err| format!("Profile lookup failed: {err}"))?;
        println!(
            "server:  id={:?} username={:?} role={:?}",
            info.id, info.username, info.role
        );
    }
    Ok(())
}

fn run_list(client: &ApiClient, config: &AppConfig, options: ListOptions) -> Result<(), String> {
    let resource = options.resource;
    let mut query = ListQuery::for_resource(resource);
    if let Some(limit) = options.limit.or(config.listing.default_limit) {
        query = query.with_limit(Some(limit));
    }
    if let Some(server_search) = &options.server_search {
        query = query.with_search(server_search.clone());
    }
    let mut rows = client
        .list(resource, &query)
        .map_err(|err| format!("Failed to load {resource}: {err}"))?;
    let term = options.search.clone().unwrap_or_default();

    let filtered: Vec<Value> = match resource {
        Resource::Moulds => {
            sort_moulds_by_maintenance(&mut rows);
            let company = options.company.as_deref().unwrap_or(ALL_COMPANIES);
            filter::filter_moulds(&rows, &term, company)
                .into_iter()
                .cloned()
                .collect()
        }
        Resource::Tpm | Resource::Calendar => {
            let ordering = if resource == Resource::Tpm {
                ListOrdering::TPM
            } else {
                ListOrdering::CALENDAR
            };
            ordering.sort(&mut rows);
            if filter::normalize_term(&term).is_some() {
                let moulds = client
                    .list(Resource::Moulds, &ListQuery::for_resource(Resource::Moulds))
                    .map_err(|err| format!("Failed to load moulds: {err}"))?;
                let index = MouldIndex::new(&moulds);
                filter::search_by_mould(&rows, &index, &term)
                    .into_iter()
                    .cloned()
                    .collect()
            } else {
                rows
            }
        }
        Resource::Changeovers => {
            ListOrdering::CHANGEOVERS.sort(&mut rows);
            let matched: Vec<Value> = filter::search(&rows, &CHANGEOVER_SEARCH_FIELDS, &term)
                .into_iter()
                .cloned()
                .collect();
            return print_open_done(&matched, config.listing.open_done_pager(), options.page);
        }
        _ => filter::search(&rows, &DEFAULT_SEARCH_FIELDS, &term)
            .into_iter()
            .cloned()
            .collect(),
    };

    if options.all {
        print_rows(filtered.iter());
        return Ok(());
    }
    let view = paginate(&filtered, options.page, config.listing.page_size);
    print_rows(view.items.iter());
    println!(
        "page {}/{} ({} rows)  {}",
        view.page,
        view.total_pages,
        view.total_items,
        render_strip(&page_strip(view.page, view.total_pages))
    );
    Ok(())
}

fn print_open_done(rows: &[Value], pager: OpenDonePager, page: usize) -> Result<(), String> {
    let (open, done) = OpenDonePager::split(rows, changeover_is_done);
    let total_pages = pager.total_pages(done.len());
    let page = page.clamp(1, total_pages);
    print_rows(pager.page(&open, &done, page).iter());
    println!(
        "page {page}/{total_pages} ({} open, {} done)  {}",
        open.len(),
        done.len(),
        render_strip(&page_strip(page, total_pages))
    );
    Ok(())
}

fn render_strip(items: &[PageItem]) -> String {
    items
        .iter()
        .map(|item| match item {
            PageItem::Page(page) => page.to_string(),
            PageItem::Gap => "…".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn run_panel(
    client: &Arc<ApiClient>,
    store: &Arc<dyn SessionStore>,
    config: &AppConfig,
    options: PanelOptions,
) -> Result<(), String> {
    let context = client
        .load_panel_context(options.operation_id)
        .map_err(|err| format!("Failed to load operation: {err}"))?
        .ok_or_else(|| format!("Operation {} not found", options.operation_id))?;
    let user_id = store.get().and_then(|session| session.resolved_user_id());
    let panel = MachinePanel::new(
        context,
        user_id,
        Arc::clone(client) as Arc<dyn mouldtrack::mes::ProductionBackend>,
        Arc::new(SystemClock),
    );

    match options.action {
        PanelAction::Show => {
            print_buttons(&panel);
            print_view(&panel.view());
        }
        PanelAction::Status(status_id) => {
            let mut panel = panel;
            let button = panel.select_status(status_id).map_err(|err| err.to_string())?;
            println!("Status set to {} ({})", button.label, button.id);
            print_view(&panel.view());
        }
        PanelAction::Watch { status_id, seconds } => {
            let runtime = PanelRuntime::start(
                panel,
                config.panel.runtime_options(),
                |view: &PanelView| {
                    let status = view
                        .active_status
                        .as_ref()
                        .map(|button| button.label.as_str())
                        .unwrap_or("—");
                    print!(
                        "\r{}  op {}  status {}   ",
                        status,
                        view.operation_clock(),
                        view.status_clock()
                    );
                    let _ = std::io::stdout().flush();
                },
            )
            .map_err(|err| format!("Failed to start panel: {err}"))?;
            if let Some(status_id) = status_id {
                runtime
                    .select_status(status_id)
                    .map_err(|err| err.to_string())?;
            }
            match seconds {
                Some(seconds) => std::thread::sleep(Duration::from_secs(seconds)),
                None => wait_for_enter(),
            }
            drop(runtime);
            println!();
        }
    }
    Ok(())
}

fn print_buttons(panel: &MachinePanel) {
    for button in panel.buttons() {
        let marker = if panel.active_status().map(|active| active.id) == Some(button.id) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} [{}] {} (no {}, {}{})",
            button.id,
            button.label,
            button
                .status_no
                .map(|no| no.to_string())
                .unwrap_or_else(|| "-".into()),
            button.color,
            if button.has_timer { "" } else { ", stops timer" }
        );
    }
}

fn print_view(view: &PanelView) {
    for row in &view.info_rows {
        println!("{:<14} {}", row.label, row.value);
    }
    println!("{:<14} {}", "Operation time", view.operation_clock());
    println!("{:<14} {}", "Status time", view.status_clock());
}

fn wait_for_enter() {
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}

fn read_password() -> Result<String, String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    eprint!("Password: ");
    let _ = std::io::stderr().flush();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|err| format!("Failed to read password: {err}"))?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("Password is required".to_string());
    }
    Ok(password)
}

fn build_body(resource: Resource, fields: &[FieldArg]) -> Result<Body, String> {
    match resource.body_encoding() {
        BodyEncoding::Json => {
            let mut object = serde_json::Map::new();
            for field in fields {
                match field {
                    FieldArg::Text { name, value } => {
                        let parsed = serde_json::from_str::<Value>(value)
                            .unwrap_or_else(|_| Value::String(value.clone()));
                        object.insert(name.clone(), parsed);
                    }
                    FieldArg::File { name, .. } => {
                        return Err(format!("{resource} does not accept file field {name}"));
                    }
                }
            }
            Ok(Body::Json(Value::Object(object)))
        }
        BodyEncoding::Multipart => {
            let mut form = MultipartForm::new();
            for field in fields {
                form = match field {
                    FieldArg::Text { name, value } => form.text(name, value),
                    FieldArg::File { name, path } => {
                        let bytes = std::fs::read(path)
                            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
                        let filename = path
                            .file_name()
                            .map(|name| name.to_string_lossy().into_owned())
                            .unwrap_or_else(|| "upload".to_string());
                        let content_type = content_type_for(&filename);
                        form.file(name, filename, content_type, bytes)
                    }
                };
            }
            Ok(Body::Form(form))
        }
    }
}

fn print_rows<'a>(rows: impl Iterator<Item = &'a Value>) {
    for row in rows {
        println!("{row}");
    }
}

fn print_value(value: &Value) {
    match value {
        Value::Null => println!("OK"),
        other => println!("{other}"),
    }
}

#[derive(Debug, PartialEq)]
struct Options {
    api_base: Option<String>,
    verbose: bool,
    command: Command,
}

#[derive(Debug, PartialEq)]
enum Command {
    Login {
        username: String,
        password: Option<String>,
    },
    Register {
        username: String,
        password: Option<String>,
    },
    Logout,
    Whoami {
        remote: bool,
    },
    CheckRoute {
        path: String,
    },
    Nav,
    List(ListOptions),
    History {
        resource: Resource,
        id: String,
    },
    Create {
        resource: Resource,
        fields: Vec<FieldArg>,
    },
    Update {
        resource: Resource,
        id: String,
        fields: Vec<FieldArg>,
    },
    Delete {
        resource: Resource,
        id: String,
    },
    FetchFile {
        path: String,
        out: PathBuf,
    },
    Reorder {
        operation_ids: Vec<i64>,
    },
    Panel(PanelOptions),
}

#[derive(Debug, PartialEq)]
struct ListOptions {
    resource: Resource,
    search: Option<String>,
    server_search: Option<String>,
    company: Option<String>,
    limit: Option<u32>,
    page: usize,
    all: bool,
}

#[derive(Debug, PartialEq)]
struct PanelOptions {
    operation_id: i64,
    action: PanelAction,
}

#[derive(Debug, PartialEq)]
enum PanelAction {
    Show,
    Status(i64),
    Watch {
        status_id: Option<i64>,
        seconds: Option<u64>,
    },
}

#[derive(Debug, PartialEq)]
enum FieldArg {
    Text { name: String, value: String },
    File { name: String, path: PathBuf },
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut api_base = None;
    let mut verbose = false;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--api-base" => {
                idx += 1;
                let value = args
                    .get(idx)
                    .ok_or_else(|| "--api-base requires a value".to_string())?;
                api_base = Some(value.to_string());
            }
            "-v" | "--verbose" => verbose = true,
            _ => break,
        }
        idx += 1;
    }
    let Some(name) = args.get(idx) else {
        return Err(format!("Missing command\n\n{}", help_text()));
    };
    let rest = &args[idx + 1..];
    let command = match name.as_str() {
        "login" => {
            let (username, password) = parse_credentials(rest)?;
            Command::Login { username, password }
        }
        "register" => {
            let (username, password) = parse_credentials(rest)?;
            Command::Register { username, password }
        }
        "logout" => Command::Logout,
        "whoami" => Command::Whoami {
            remote: rest.iter().any(|arg| arg == "--remote"),
        },
        "check-route" => Command::CheckRoute {
            path: positional(rest, 0, "path")?,
        },
        "nav" => Command::Nav,
        "list" => Command::List(parse_list(rest)?),
        "history" => Command::History {
            resource: parse_resource(rest)?,
            id: positional(rest, 1, "id")?,
        },
        "create" => Command::Create {
            resource: parse_resource(rest)?,
            fields: parse_fields(&rest[1..])?,
        },
        "update" => Command::Update {
            resource: parse_resource(rest)?,
            id: positional(rest, 1, "id")?,
            fields: parse_fields(&rest[2..])?,
        },
        "delete" => Command::Delete {
            resource: parse_resource(rest)?,
            id: positional(rest, 1, "id")?,
        },
        "fetch-file" => {
            let path = positional(rest, 0, "path")?;
            let out = flag_value(rest, "--out")?
                .map(PathBuf::from)
                .unwrap_or_else(|| {
                    PathBuf::from(path.rsplit('/').next().filter(|name| !name.is_empty()).unwrap_or("download"))
                });
            Command::FetchFile { path, out }
        }
        "reorder" => {
            if rest.is_empty() {
                return Err("reorder requires at least one operation id".to_string());
            }
            let operation_ids = rest
                .iter()
                .map(|id| parse_number::<i64>(id, "operation id"))
                .collect::<Result<Vec<_>, _>>()?;
            Command::Reorder { operation_ids }
        }
        "panel" => Command::Panel(parse_panel(rest)?),
        unknown => return Err(format!("Unknown command: {unknown}\n\n{}", help_text())),
    };
    Ok(Some(Options {
        api_base,
        verbose,
        command,
    }))
}

fn parse_credentials(args: &[String]) -> Result<(String, Option<String>), String> {
    let username = positional(args, 0, "username")?;
    let password = flag_value(args, "--password")?;
    Ok((username, password))
}

fn parse_list(args: &[String]) -> Result<ListOptions, String> {
    let mut options = ListOptions {
        resource: parse_resource(args)?,
        search: None,
        server_search: None,
        company: None,
        limit: None,
        page: 1,
        all: false,
    };
    let mut idx = 1usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        if flag == "--all" {
            options.all = true;
            idx += 1;
            continue;
        }
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires a value"))?;
        match flag {
            "--search" => options.search = Some(value.clone()),
            "--query" => options.server_search = Some(value.clone()),
            "--company" => options.company = Some(value.clone()),
            "--limit" => options.limit = Some(parse_number(value, "--limit")?),
            "--page" => options.page = parse_number(value, "--page")?,
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(options)
}

fn parse_panel(args: &[String]) -> Result<PanelOptions, String> {
    let action_name = positional(args, 0, "panel action")?;
    let operation_id = parse_number(&positional(args, 1, "operation id")?, "operation id")?;
    let action = match action_name.as_str() {
        "show" => PanelAction::Show,
        "status" => PanelAction::Status(parse_number(
            &positional(args, 2, "status id")?,
            "status id",
        )?),
        "watch" => PanelAction::Watch {
            status_id: flag_value(args, "--status")?
                .map(|value| parse_number(&value, "--status"))
                .transpose()?,
            seconds: flag_value(args, "--seconds")?
                .map(|value| parse_number(&value, "--seconds"))
                .transpose()?,
        },
        unknown => return Err(format!("Unknown panel action: {unknown}")),
    };
    Ok(PanelOptions {
        operation_id,
        action,
    })
}

fn parse_fields(args: &[String]) -> Result<Vec<FieldArg>, String> {
    let mut fields = Vec::new();
    let mut idx = 0usize;
    while idx < args.len() {
        let flag = args[idx].as_str();
        idx += 1;
        let value = args
            .get(idx)
            .ok_or_else(|| format!("{flag} requires name=value"))?;
        let (name, value) = value
            .split_once('=')
            .ok_or_else(|| format!("{flag} expects name=value, got {value}"))?;
        match flag {
            "--field" => fields.push(FieldArg::Text {
                name: name.to_string(),
                value: value.to_string(),
            }),
            "--file" => fields.push(FieldArg::File {
                name: name.to_string(),
                path: PathBuf::from(value),
            }),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(fields)
}

fn parse_resource(args: &[String]) -> Result<Resource, String> {
    let name = positional(args, 0, "resource")?;
    Resource::parse(&name).ok_or_else(|| {
        let known: Vec<&str> = Resource::ALL.iter().map(|resource| resource.name()).collect();
        format!("Unknown resource: {name} (expected one of {})", known.join(", "))
    })
}

/// `index`-th argument that is not a flag or a flag's value.
fn positional(args: &[String], index: usize, what: &str) -> Result<String, String> {
    let mut seen = 0usize;
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = &args[idx];
        if arg.starts_with("--") {
            idx += if takes_value(arg) { 2 } else { 1 };
            continue;
        }
        if seen == index {
            return Ok(arg.clone());
        }
        seen += 1;
        idx += 1;
    }
    Err(format!("Missing {what}"))
}

fn takes_value(flag: &str) -> bool {
    !matches!(flag, "--all" | "--remote")
}

fn flag_value(args: &[String], flag: &str) -> Result<Option<String>, String> {
    match args.iter().position(|arg| arg == flag) {
        None => Ok(None),
        Some(pos) => args
            .get(pos + 1)
            .cloned()
            .map(Some)
            .ok_or_else(|| format!("{flag} requires a value")),
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid {what}: {value}"))
}

fn help_text() -> String {
    [
        "mouldtrack",
        "",
        "Client for the mould-tracking and MES backend.",
        "",
        "Usage:",
        "  mouldtrack [--api-base <url>] [-v] <command> [args]",
        "",
        "Commands:",
        "  login <username> [--password <pw>]      Log in and store the session.",
        "  register <username> [--password <pw>]   Create an account.",
        "  logout                                  Forget the stored session.",
        "  whoami [--remote]                       Show the current session.",
        "  check-route <path>                      Show whether a route is reachable.",
        "  nav                                     List navigation entries for this role.",
        "  list <resource> [--search <t>] [--query <t>] [--company <c>]",
        "       [--limit <n>] [--page <n>] [--all]",
        "  history <changeovers|calendar> <id>     Show a record's audit log.",
        "  create <resource> [--field k=v]... [--file k=path]...",
        "  update <resource> <id> [--field k=v]... [--file k=path]...",
        "  delete <resource> <id>",
        "  fetch-file <path> [--out <file>]        Download a stored photo or attachment.",
        "  reorder <operation id>...               Save a new operation order.",
        "  panel show <operation id>",
        "  panel status <operation id> <status id>",
        "  panel watch <operation id> [--status <id>] [--seconds <n>]",
        "",
        "Environment:",
        "  MOULDTRACK_API_BASE       Backend base URL.",
        "  MOULDTRACK_CONFIG_HOME    Directory holding .mouldtrack/.",
        "  MOULDTRACK_PASSWORD       Password for login/register when not given.",
        "  MOULDTRACK_DISABLE_KEYRING=1  Keep the token in an encrypted file.",
        "  MOULDTRACK_LOG            Log filter directives, e.g. mouldtrack=trace.",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|arg| arg.to_string()).collect()
    }

    fn command(list: &[&str]) -> Command {
        parse_args(args(list)).unwrap().unwrap().command
    }

    #[test]
    fn parses_global_flags_before_command() {
        let options = parse_args(args(&["--api-base", "http://mes:8000", "-v", "nav"]))
            .unwrap()
            .unwrap();
        assert_eq!(options.api_base.as_deref(), Some("http://mes:8000"));
        assert!(options.verbose);
        assert_eq!(options.command, Command::Nav);
    }

    #[test]
    fn parses_list_options() {
        let Command::List(list) = command(&[
            "list", "tpm", "--search", "F12", "--page", "3", "--limit", "50",
        ]) else {
            panic!("expected list");
        };
        assert_eq!(list.resource, Resource::Tpm);
        assert_eq!(list.search.as_deref(), Some("F12"));
        assert_eq!(list.page, 3);
        assert_eq!(list.limit, Some(50));
        assert!(!list.all);
    }

    #[test]
    fn parses_update_fields() {
        assert_eq!(
            command(&[
                "update",
                "calendar",
                "12",
                "--field",
                "is_active=false",
                "--file",
                "photo=/tmp/a.png",
            ]),
            Command::Update {
                resource: Resource::Calendar,
                id: "12".into(),
                fields: vec![
                    FieldArg::Text {
                        name: "is_active".into(),
                        value: "false".into()
                    },
                    FieldArg::File {
                        name: "photo".into(),
                        path: PathBuf::from("/tmp/a.png")
                    },
                ],
            }
        );
    }

    #[test]
    fn parses_panel_actions() {
        assert_eq!(
            command(&["panel", "watch", "7", "--status", "2", "--seconds", "30"]),
            Command::Panel(PanelOptions {
                operation_id: 7,
                action: PanelAction::Watch {
                    status_id: Some(2),
                    seconds: Some(30)
                },
            })
        );
        assert_eq!(
            command(&["panel", "status", "7", "4"]),
            Command::Panel(PanelOptions {
                operation_id: 7,
                action: PanelAction::Status(4),
            })
        );
    }

    #[test]
    fn login_password_flag_is_not_the_username() {
        assert_eq!(
            command(&["login", "--password", "pw", "anna"]),
            Command::Login {
                username: "anna".into(),
                password: Some("pw".into())
            }
        );
    }

    #[test]
    fn rejects_unknown_input() {
        assert!(parse_args(args(&["list", "widgets"])).is_err());
        assert!(parse_args(args(&["frobnicate"])).is_err());
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["create", "tpm", "--field", "novalue"])).is_err());
    }

    #[test]
    fn json_bodies_parse_scalar_values() {
        let body = build_body(
            Resource::Orders,
            &[
                FieldArg::Text {
                    name: "team".into(),
                    value: "A".into(),
                },
                FieldArg::Text {
                    name: "order_type_id".into(),
                    value: "3".into(),
                },
            ],
        )
        .unwrap();
        let Body::Json(value) = body else {
            panic!("expected json body");
        };
        assert_eq!(value, serde_json::json!({"team": "A", "order_type_id": 3}));
    }

    #[test]
    fn fetch_file_defaults_output_name() {
        assert_eq!(
            command(&["fetch-file", "uploads/m1.png"]),
            Command::FetchFile {
                path: "uploads/m1.png".into(),
                out: PathBuf::from("m1.png")
            }
        );
    }
}
