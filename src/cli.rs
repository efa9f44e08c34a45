use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::auth::{self, OAuthClient};
use crate::client::TickTickClient;
use crate::config::{ConfigFile, ConfigStore, Credentials, SettingKey};
use crate::models::{Priority, Project, Task, TickTickTime};
use crate::{runtime, setup, tui, ui};

#[derive(Parser, Debug)]
#[command(
    name = "ticktick-tui",
    version,
    about = "Manage TickTick projects and tasks from the terminal",
    long_about = "Manage TickTick projects and tasks from the terminal.\n\n\
                  Configure your OAuth app credentials first (`setup` or `config set`), \
                  then authorize with `auth login` / `auth token`. Running without a \
                  subcommand opens the interactive TUI."
)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive terminal UI (default)
    Tui,
    /// Interactive credential setup
    Setup,
    /// Read and write settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// OAuth authorization
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Project commands
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },
    /// Task commands
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a value (client_id, client_secret, redirect_uri, access_token)
    Set { key: SettingKey, value: String },
    /// Show all values; secrets are masked
    List,
}

#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Print the authorization URL to open in a browser
    Login,
    /// Exchange an authorization code for an access token and store it
    Token { code: String },
}

#[derive(Subcommand, Debug)]
pub enum ProjectAction {
    /// List projects grouped by folder
    List,
    /// Show a project with its tasks and columns
    Data { project_id: String },
    /// Create a project
    Create(CreateProjectArgs),
    /// Update a project
    Update(UpdateProjectArgs),
    /// Delete a project
    Delete { project_id: String },
}

#[derive(Args, Debug)]
pub struct CreateProjectArgs {
    #[arg(short, long)]
    pub name: String,
    /// Hex colour, e.g. #F18181
    #[arg(short, long)]
    pub color: Option<String>,
    /// list, kanban or timeline
    #[arg(long, default_value = "list")]
    pub view_mode: String,
    /// TASK or NOTE
    #[arg(long, default_value = "TASK")]
    pub kind: String,
}

#[derive(Args, Debug)]
pub struct UpdateProjectArgs {
    pub project_id: String,
    #[arg(short, long)]
    pub name: Option<String>,
    #[arg(short, long)]
    pub color: Option<String>,
    #[arg(long)]
    pub view_mode: Option<String>,
    #[arg(long)]
    pub kind: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum TaskAction {
    /// Show one task
    Get { project_id: String, task_id: String },
    /// Create a task
    Create(CreateTaskArgs),
    /// Update a task
    Update(UpdateTaskArgs),
    /// Mark a task completed
    Complete { project_id: String, task_id: String },
    /// Delete a task
    Delete { project_id: String, task_id: String },
}

#[derive(Args, Debug)]
pub struct CreateTaskArgs {
    #[arg(short, long)]
    pub title: String,
    /// Project id
    #[arg(short, long)]
    pub project: String,
    #[arg(short, long)]
    pub content: Option<String>,
    #[arg(short, long)]
    pub desc: Option<String>,
    /// 0 (none), 1 (low), 3 (medium), 5 (high)
    #[arg(short = 'r', long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
    /// Due date, YYYY-MM-DD
    #[arg(long, value_parser = parse_due)]
    pub due: Option<TickTickTime>,
}

#[derive(Args, Debug)]
pub struct UpdateTaskArgs {
    pub task_id: String,
    /// Project id
    #[arg(short, long)]
    pub project: String,
    #[arg(short, long)]
    pub title: Option<String>,
    #[arg(short, long)]
    pub content: Option<String>,
    #[arg(short, long)]
    pub desc: Option<String>,
    /// 0 (none), 1 (low), 3 (medium), 5 (high)
    #[arg(short = 'r', long, value_parser = parse_priority)]
    pub priority: Option<Priority>,
}

fn parse_priority(raw: &str) -> Result<Priority, String> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(Priority::from_level)
        .ok_or_else(|| format!("priority must be one of 0, 1, 3, 5 (got '{raw}')"))
}

fn parse_due(raw: &str) -> Result<TickTickTime, String> {
    TickTickTime::from_date(raw)
        .ok_or_else(|| format!("invalid due date '{raw}' (expected YYYY-MM-DD)"))
}

pub fn run(command: Option<Commands>, store: Arc<ConfigFile>) -> Result<()> {
    match command.unwrap_or(Commands::Tui) {
        Commands::Tui => tui::run_tui(store),
        Commands::Setup => {
            setup::run_setup(store.as_ref())?;
            ui::print_outro("Setup complete.");
            Ok(())
        }
        Commands::Config { action } => run_config(action, store.as_ref()),
        Commands::Auth { action } => run_auth(action, store.as_ref()),
        Commands::Projects { action } => {
            let client = api_client(store.as_ref())?;
            runtime::block_on(run_projects(action, &client))
        }
        Commands::Tasks { action } => {
            let client = api_client(store.as_ref())?;
            runtime::block_on(run_tasks(action, &client))
        }
    }
}

fn run_config(action: ConfigAction, store: &dyn ConfigStore) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            store.set(key, &value)?;
            let shown = if key.is_secret() { "***" } else { value.as_str() };
            ui::print_success(&format!("Set {} = {}", key, shown));
        }
        ConfigAction::List => {
            let entries: Vec<(SettingKey, String)> = SettingKey::ALL
                .iter()
                .map(|&key| (key, store.get(key)))
                .collect();
            if entries.iter().all(|(_, v)| v.is_empty()) {
                ui::print_info("No configuration found.");
                return Ok(());
            }
            for (key, value) in entries {
                ui::print_setting(key.as_str(), &masked(key, &value));
            }
        }
    }
    Ok(())
}

fn masked(key: SettingKey, value: &str) -> String {
    if key.is_secret() && !value.is_empty() {
        "***".to_string()
    } else {
        value.to_string()
    }
}

fn stored_credentials(store: &dyn ConfigStore) -> Credentials {
    Credentials {
        client_id: store.get(SettingKey::ClientId),
        client_secret: store.get(SettingKey::ClientSecret),
        redirect_uri: store.get(SettingKey::RedirectUri),
    }
}

fn run_auth(action: AuthAction, store: &dyn ConfigStore) -> Result<()> {
    let credentials = stored_credentials(store);
    match action {
        AuthAction::Login => {
            if credentials.client_id.is_empty() || credentials.redirect_uri.is_empty() {
                bail!("client_id and redirect_uri must be configured first (see `ticktick-tui setup`)");
            }
            ui::print_info("Open this URL in your browser to authorize:");
            println!("{}", auth::authorization_url(&credentials));
            ui::print_info(
                "After authorizing, copy the code from the redirect URL and run:\n  ticktick-tui auth token <authorization_code>",
            );
        }
        AuthAction::Token { code } => {
            if !credentials.is_complete() {
                bail!("client_id, client_secret and redirect_uri must be configured first (see `ticktick-tui setup`)");
            }
            let oauth = OAuthClient::new();
            let token = runtime::block_on(ui::with_spinner(
                "Exchanging authorization code",
                "Token received",
                || oauth.exchange(&credentials, &code),
            ))?;
            store.set(SettingKey::AccessToken, &token.access_token)?;
            ui::print_success("Access token saved.");
        }
    }
    Ok(())
}

fn api_client(store: &dyn ConfigStore) -> Result<TickTickClient> {
    let token = store.get(SettingKey::AccessToken);
    if token.is_empty() {
        bail!("No access token found. Run 'ticktick-tui auth login' to authorize first.");
    }
    Ok(TickTickClient::new(token))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectGroup {
    pub group_id: String,
    pub projects: Vec<Project>,
}

/// Named groups by id, then `Ungrouped`, then `Archived`; projects in each
/// group ordered by sort order.
pub fn group_projects(mut projects: Vec<Project>) -> Vec<ProjectGroup> {
    projects.sort_by_key(|p| p.sort_order);

    let mut named: BTreeMap<String, Vec<Project>> = BTreeMap::new();
    let mut ungrouped = Vec::new();
    let mut archived = Vec::new();
    for project in projects {
        if project.closed {
            archived.push(project);
        } else if project.group_id.is_empty() {
            ungrouped.push(project);
        } else {
            named
                .entry(project.group_id.clone())
                .or_default()
                .push(project);
        }
    }

    let mut groups: Vec<ProjectGroup> = named
        .into_iter()
        .map(|(group_id, projects)| ProjectGroup { group_id, projects })
        .collect();
    for (label, projects) in [("Ungrouped", ungrouped), ("Archived", archived)] {
        if !projects.is_empty() {
            groups.push(ProjectGroup {
                group_id: label.to_string(),
                projects,
            });
        }
    }
    groups
}

async fn run_projects(action: ProjectAction, client: &TickTickClient) -> Result<()> {
    match action {
        ProjectAction::List => {
            let projects = client.get_projects().await?;
            tracing::info!(count = projects.len(), "listed projects");
            ui::print_json(&group_projects(projects))
        }
        ProjectAction::Data { project_id } => {
            let data = client.get_project_data(&project_id).await?;
            ui::print_json(&data)
        }
        ProjectAction::Create(args) => {
            let project = Project {
                name: args.name,
                color: args.color.unwrap_or_default(),
                view_mode: args.view_mode,
                kind: args.kind,
                ..Project::default()
            };
            let created = client.create_project(&project).await?;
            ui::print_success("Project created:");
            ui::print_json(&created)
        }
        ProjectAction::Update(args) => {
            let project = Project {
                name: args.name.unwrap_or_default(),
                color: args.color.unwrap_or_default(),
                view_mode: args.view_mode.unwrap_or_default(),
                kind: args.kind.unwrap_or_default(),
                ..Project::default()
            };
            let updated = client.update_project(&args.project_id, &project).await?;
            ui::print_success("Project updated:");
            ui::print_json(&updated)
        }
        ProjectAction::Delete { project_id } => {
            client.delete_project(&project_id).await?;
            ui::print_success("Project deleted.");
            Ok(())
        }
    }
}

async fn run_tasks(action: TaskAction, client: &TickTickClient) -> Result<()> {
    match action {
        TaskAction::Get {
            project_id,
            task_id,
        } => {
            let task = client.get_task(&project_id, &task_id).await?;
            ui::print_json(&task)
        }
        TaskAction::Create(args) => {
            let task = new_task(args);
            let created = client.create_task(&task).await?;
            ui::print_success("Task created:");
            ui::print_json(&created)
        }
        TaskAction::Update(args) => {
            let task_id = args.task_id.clone();
            let task = task_patch(args);
            let updated = client.update_task(&task_id, &task).await?;
            ui::print_success("Task updated:");
            ui::print_json(&updated)
        }
        TaskAction::Complete {
            project_id,
            task_id,
        } => {
            client.complete_task(&project_id, &task_id).await?;
            ui::print_success("Task marked as completed.");
            Ok(())
        }
        TaskAction::Delete {
            project_id,
            task_id,
        } => {
            client.delete_task(&project_id, &task_id).await?;
            ui::print_success("Task deleted.");
            Ok(())
        }
    }
}

fn new_task(args: CreateTaskArgs) -> Task {
    Task {
        title: args.title,
        project_id: args.project,
        content: args.content.unwrap_or_default(),
        desc: args.desc.unwrap_or_default(),
        priority: args.priority.unwrap_or_default(),
        due_date: args.due,
        ..Task::default()
    }
}

/// Only the flags that were given end up in the request body.
fn task_patch(args: UpdateTaskArgs) -> Task {
    Task {
        id: args.task_id,
        project_id: args.project,
        title: args.title.unwrap_or_default(),
        content: args.content.unwrap_or_default(),
        desc: args.desc.unwrap_or_default(),
        priority: args.priority.unwrap_or_default(),
        ..Task::default()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn project(id: &str, group: &str, order: i64, closed: bool) -> Project {
        Project {
            id: id.into(),
            group_id: group.into(),
            sort_order: order,
            closed,
            ..Project::default()
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_tui() {
        let cli = Cli::try_parse_from(["ticktick-tui"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["ticktick-tui", "config", "list", "--config", "/tmp/c.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn unknown_setting_key_is_rejected() {
        assert!(Cli::try_parse_from(["ticktick-tui", "config", "set", "token", "x"]).is_err());
        let cli = Cli::try_parse_from(["ticktick-tui", "config", "set", "client_id", "x"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Config {
                action: ConfigAction::Set {
                    key: SettingKey::ClientId,
                    ..
                }
            })
        ));
    }

    #[test]
    fn task_create_validates_priority_and_due() {
        let bad = Cli::try_parse_from([
            "ticktick-tui", "tasks", "create", "-t", "x", "-p", "p1", "--priority", "2",
        ]);
        assert!(bad.is_err());

        let bad_due = Cli::try_parse_from([
            "ticktick-tui", "tasks", "create", "-t", "x", "-p", "p1", "--due", "31/01/2024",
        ]);
        assert!(bad_due.is_err());

        let cli = Cli::try_parse_from([
            "ticktick-tui", "tasks", "create", "-t", "Ship", "-p", "p1", "-r", "5", "--due", "2024-01-31",
        ])
        .unwrap();
        let Some(Commands::Tasks {
            action: TaskAction::Create(args),
        }) = cli.command
        else {
            panic!("expected tasks create");
        };
        let task = new_task(args);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date.unwrap().to_wire(), "2024-01-31T00:00:00.000+0000");
    }

    #[test]
    fn task_patch_keeps_id_and_omits_unset_fields() {
        let task = task_patch(UpdateTaskArgs {
            task_id: "t1".into(),
            project: "p1".into(),
            title: Some("New title".into()),
            content: None,
            desc: None,
            priority: None,
        });
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["title"], "New title");
        assert!(value.get("content").is_none());
        assert!(value.get("priority").is_none());
    }

    #[test]
    fn projects_group_named_then_ungrouped_then_archived() {
        let groups = group_projects(vec![
            project("z", "", 2, false),
            project("old", "g2", 0, true),
            project("b2", "g2", 9, false),
            project("a", "g1", 1, false),
            project("b1", "g2", 3, false),
            project("y", "", 1, false),
        ]);

        let shape: Vec<(String, Vec<String>)> = groups
            .iter()
            .map(|g| {
                (
                    g.group_id.clone(),
                    g.projects.iter().map(|p| p.id.clone()).collect(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("g1".to_string(), vec!["a".to_string()]),
                ("g2".to_string(), vec!["b1".to_string(), "b2".to_string()]),
                ("Ungrouped".to_string(), vec!["y".to_string(), "z".to_string()]),
                ("Archived".to_string(), vec!["old".to_string()]),
            ]
        );
    }

    #[test]
    fn secrets_are_masked_in_listing() {
        assert_eq!(masked(SettingKey::ClientSecret, "abc"), "***");
        assert_eq!(masked(SettingKey::AccessToken, ""), "");
        assert_eq!(masked(SettingKey::ClientId, "abc"), "abc");
    }
}
