use crate::auth;
use crate::config::{Config, Credentials};
use crate::models::{self, Project, Task};

use super::cursor::SelectionCursor;
use super::event::{AppEvent, Command};
use super::form::{FormField, FormInputSet};
use super::input;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Config,
    Auth,
    ProjectList,
    TaskList,
    // Placeholders: no items, no behaviour yet.
    #[allow(dead_code)]
    TaskDetail,
    #[allow(dead_code)]
    CreateTask,
    #[allow(dead_code)]
    CreateProject,
    #[allow(dead_code)]
    DeleteConfirm,
}

impl View {
    pub fn badge(self) -> &'static str {
        match self {
            View::Config => "CONFIG",
            View::Auth => "AUTH",
            View::ProjectList => "PROJECTS",
            View::TaskList => "TASKS",
            View::TaskDetail => "TASK",
            View::CreateTask | View::CreateProject | View::DeleteConfirm => " ",
        }
    }

    pub fn is_form(self) -> bool {
        matches!(self, View::Config | View::Auth)
    }

    pub fn is_list(self) -> bool {
        matches!(self, View::ProjectList | View::TaskList)
    }
}

/// One selectable entry of the active view.
#[derive(Clone)]
pub enum Item {
    Field(FormField),
    Project(Project),
    Task(Task),
}

pub struct App {
    pub view: View,
    pub projects: Vec<Project>,
    pub current_project: Option<Project>,
    pub tasks: Vec<Task>,
    pub items: Vec<Item>,
    pub cursor: SelectionCursor,

    pub loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
    pub auth_url: Option<String>,

    pub spinner_index: usize,
    pub width: u16,
    pub height: u16,
    pub should_quit: bool,

    /// Bumped on every view change; snapshot loads are tagged with it.
    generation: u64,
    config_inputs: FormInputSet,
    auth_inputs: FormInputSet,
    credentials: Credentials,
    access_token: Option<String>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let mut config_inputs = FormInputSet::new(vec![
            FormField::new("Client ID"),
            FormField::new("Client Secret").masked(),
            FormField::new("Redirect URI"),
        ]);
        let credentials = config.credentials();
        config_inputs.set_values(&[
            &credentials.client_id,
            &credentials.client_secret,
            &credentials.redirect_uri,
        ]);

        Self {
            view: View::Config,
            projects: vec![],
            current_project: None,
            tasks: vec![],
            items: vec![],
            cursor: SelectionCursor::new(),

            loading: false,
            error: None,
            message: None,
            auth_url: None,

            spinner_index: 0,
            width: 0,
            height: 0,
            should_quit: false,

            generation: 0,
            config_inputs,
            auth_inputs: FormInputSet::new(vec![FormField::new("Authorization Code")]),
            credentials,
            access_token: config.access_token().map(str::to_string),
        }
    }

    /// Picks the first screen from what is already configured.
    pub fn init(&mut self) -> Option<Command> {
        let target = if !self.credentials.is_complete() {
            View::Config
        } else if self.access_token.is_none() {
            View::Auth
        } else {
            View::ProjectList
        };
        tracing::info!(view = ?target, "starting");
        let command = self.change_view(target);
        self.sync_focus();
        command
    }

    pub fn selected_index(&self) -> usize {
        self.cursor.index()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn on_event(&mut self, event: AppEvent) -> Option<Command> {
        let command = match event {
            AppEvent::Key(key) => input::dispatch_key(self, key),
            AppEvent::Resize(width, height) => {
                self.width = width;
                self.height = height;
                None
            }
            AppEvent::Tick => {
                self.spinner_index = self.spinner_index.wrapping_add(1);
                None
            }

            AppEvent::ProjectsLoaded {
                generation,
                mut projects,
            } => {
                if self.is_stale(generation) {
                    return None;
                }
                self.loading = false;
                self.clear_feedback();
                models::sort_projects(&mut projects);
                self.projects = projects;
                self.items = self.projects.iter().cloned().map(Item::Project).collect();
                None
            }
            AppEvent::TasksLoaded { generation, tasks } => {
                if self.is_stale(generation) {
                    return None;
                }
                self.loading = false;
                self.clear_feedback();
                self.tasks = tasks;
                self.items = self.tasks.iter().cloned().map(Item::Task).collect();
                None
            }
            AppEvent::LoadFailed {
                generation,
                message,
            } => {
                if self.is_stale(generation) {
                    return None;
                }
                self.loading = false;
                self.error = Some(message);
                None
            }

            AppEvent::ConfigSaved(credentials) => {
                self.loading = false;
                self.credentials = credentials;
                self.message = Some("Configuration saved!".to_string());
                self.change_view(View::Auth)
            }
            AppEvent::TokenExchanged { access_token } => {
                self.loading = false;
                self.access_token = Some(access_token);
                self.error = None;
                self.message = Some("Authorization successful!".to_string());
                self.change_view(View::ProjectList)
            }
            AppEvent::SubmitFailed(message) => {
                self.loading = false;
                self.error = Some(message);
                None
            }
        };

        self.sync_focus();
        command
    }

    fn is_stale(&self, generation: u64) -> bool {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "discarding stale completion"
            );
            return true;
        }
        false
    }

    fn clear_feedback(&mut self) {
        self.error = None;
        self.message = None;
    }

    /// Enters `target`, rebuilding its items from scratch.
    ///
    /// TaskList is only entered when the highlighted project exists; otherwise
    /// the error is set and the current view is kept.
    pub fn change_view(&mut self, target: View) -> Option<Command> {
        if target == View::TaskList {
            if self.projects.is_empty() {
                self.error = Some("No projects available.".to_string());
                return None;
            }
            match self.projects.get(self.cursor.index()) {
                Some(project) => self.current_project = Some(project.clone()),
                None => {
                    self.error = Some("Invalid project selection.".to_string());
                    return None;
                }
            }
        }

        tracing::debug!(from = ?self.view, to = ?target, "change view");
        self.generation += 1;
        self.view = target;
        self.cursor.reset();
        self.items.clear();
        self.loading = false;

        match target {
            View::Config => {
                self.items = fields_as_items(&self.config_inputs);
                None
            }
            View::Auth => {
                let url = auth::authorization_url(&self.credentials);
                self.auth_url = Some(url.clone());
                self.auth_inputs.reset();
                self.items = fields_as_items(&self.auth_inputs);
                Some(Command::CopyToClipboard(url))
            }
            View::ProjectList => self.start_project_load(),
            View::TaskList => self.start_task_load(),
            View::TaskDetail | View::CreateTask | View::CreateProject | View::DeleteConfirm => None,
        }
    }

    fn session_token(&mut self) -> Option<String> {
        if self.access_token.is_none() {
            self.error = Some("Not authorized. Restart to sign in again.".to_string());
        }
        self.access_token.clone()
    }

    fn start_project_load(&mut self) -> Option<Command> {
        let access_token = self.session_token()?;
        self.loading = true;
        Some(Command::LoadProjects {
            generation: self.generation,
            access_token,
        })
    }

    fn start_task_load(&mut self) -> Option<Command> {
        let project_id = match &self.current_project {
            Some(project) => project.id.clone(),
            None => {
                self.error = Some("No project selected.".to_string());
                return None;
            }
        };
        let access_token = self.session_token()?;
        self.loading = true;
        Some(Command::LoadTasks {
            generation: self.generation,
            access_token,
            project_id,
        })
    }

    /// Activates the current view (Enter).
    pub fn submit(&mut self) -> Option<Command> {
        let was_loading = self.loading;
        self.clear_feedback();
        self.loading = true;

        match self.view {
            View::Config => {
                let live = self.field_values();
                self.config_inputs.set_values(&live);
                if self.config_inputs.any_empty() {
                    self.error = Some("All fields must be filled out.".to_string());
                    self.loading = false;
                    return None;
                }
                let values = self.config_inputs.values();
                Some(Command::SaveConfig(Credentials {
                    client_id: values[0].clone(),
                    client_secret: values[1].clone(),
                    redirect_uri: values[2].clone(),
                }))
            }
            View::Auth => {
                let live = self.field_values();
                self.auth_inputs.set_values(&live);
                if self.auth_inputs.any_empty() {
                    self.error = Some("Authorization code must be filled out.".to_string());
                    self.loading = false;
                    return None;
                }
                let code = self.auth_inputs.values().concat();
                Some(Command::ExchangeCode {
                    credentials: self.credentials.clone(),
                    code,
                })
            }
            View::ProjectList => {
                self.loading = false;
                let command = self.change_view(View::TaskList);
                if self.view == View::ProjectList {
                    // Aborted; a project load may still be outstanding.
                    self.loading = was_loading;
                }
                command
            }
            _ => {
                self.loading = false;
                None
            }
        }
    }

    /// Trimmed live values of the form fields currently on screen.
    fn field_values(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::Field(field) => Some(field.value().trim().to_string()),
                _ => None,
            })
            .collect()
    }

    pub fn navigate(&mut self, direction: i32) {
        self.cursor.advance(direction, self.items.len());
        self.sync_focus();
    }

    /// Focuses exactly the field under the cursor.
    pub fn sync_focus(&mut self) {
        let selected = self.cursor.index();
        for (idx, item) in self.items.iter_mut().enumerate() {
            if let Item::Field(field) = item {
                if idx == selected {
                    field.focus();
                } else {
                    field.blur();
                }
            }
        }
    }

    pub fn focused_field_mut(&mut self) -> Option<&mut FormField> {
        match self.items.get_mut(self.cursor.index()) {
            Some(Item::Field(field)) if field.is_focused() => Some(field),
            _ => None,
        }
    }

    /// Re-fetches the snapshot behind the active list view.
    pub fn reload(&mut self) -> Option<Command> {
        self.clear_feedback();
        match self.view {
            View::ProjectList => self.change_view(View::ProjectList),
            View::TaskList => {
                self.generation += 1;
                self.cursor.reset();
                self.items.clear();
                self.start_task_load()
            }
            _ => None,
        }
    }

    /// Esc: leaves the task list for the project list.
    pub fn back(&mut self) -> Option<Command> {
        if self.view != View::TaskList {
            return None;
        }
        self.clear_feedback();
        self.change_view(View::ProjectList)
    }

    /// 1-based position for the status bar.
    pub fn position(&self) -> Option<(usize, usize)> {
        let total = match self.view {
            View::ProjectList => self.projects.len(),
            View::TaskList => self.tasks.len(),
            View::Config => return Some((self.cursor.index() + 1, self.config_inputs.len())),
            _ => 0,
        };
        if total == 0 {
            return None;
        }
        Some((self.cursor.index() + 1, total))
    }
}

fn fields_as_items(inputs: &FormInputSet) -> Vec<Item> {
    inputs.fields().iter().cloned().map(Item::Field).collect()
}
