use std::sync::{
    mpsc::{self, Receiver, Sender, TryRecvError},
    Arc,
};
use std::thread;

use crate::auth::TokenExchange;
use crate::client::TaskService;
use crate::clipboard::Clipboard;
use crate::config::{ConfigStore, SettingKey};

use super::event::{AppEvent, Command};

/// Opens a REST session for an access token.
pub type Connect = Arc<dyn Fn(&str) -> Arc<dyn TaskService> + Send + Sync>;

/// External collaborators the loader drives on behalf of the state machine.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn ConfigStore>,
    pub oauth: Arc<dyn TokenExchange>,
    pub connect: Connect,
    pub clipboard: Arc<dyn Clipboard>,
}

/// Runs commands on background threads and hands their completions back to
/// the UI thread.
///
/// Each command runs on its own worker. The worker never touches `App`; it
/// only sends one `AppEvent` (or nothing, for clipboard writes) over the
/// channel, and the UI thread applies it on the next `drain`.
pub struct AsyncLoader {
    services: Services,
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl AsyncLoader {
    pub fn new(services: Services) -> Self {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        Self { services, tx, rx }
    }

    /// Fire-and-forget.
    pub fn spawn(&self, command: Command) {
        let services = self.services.clone();
        let tx = self.tx.clone();
        thread::spawn(move || {
            if let Some(event) = execute(command, &services) {
                let _ = tx.send(event);
            }
        });
    }

    /// Non-blocking; call once per loop iteration.
    pub fn drain(&self) -> Vec<AppEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(ev) => events.push(ev),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

/// Performs one command synchronously and maps its outcome to a completion.
pub fn execute(command: Command, services: &Services) -> Option<AppEvent> {
    match command {
        Command::LoadProjects {
            generation,
            access_token,
        } => {
            let service = (services.connect)(&access_token);
            Some(match service.list_projects() {
                Ok(projects) => {
                    tracing::debug!(count = projects.len(), generation, "projects loaded");
                    AppEvent::ProjectsLoaded {
                        generation,
                        projects,
                    }
                }
                Err(e) => {
                    tracing::warn!("project load failed: {e:#}");
                    AppEvent::LoadFailed {
                        generation,
                        message: format!("Failed to load projects: {e:#}"),
                    }
                }
            })
        }

        Command::LoadTasks {
            generation,
            access_token,
            project_id,
        } => {
            let service = (services.connect)(&access_token);
            Some(match service.project_bundle(&project_id) {
                Ok(bundle) => {
                    tracing::debug!(count = bundle.tasks.len(), %project_id, "tasks loaded");
                    AppEvent::TasksLoaded {
                        generation,
                        tasks: bundle.tasks,
                    }
                }
                Err(e) => {
                    tracing::warn!("task load failed: {e:#}");
                    AppEvent::LoadFailed {
                        generation,
                        message: format!("Failed to load tasks: {e:#}"),
                    }
                }
            })
        }

        Command::SaveConfig(credentials) => {
            let entries = [
                (SettingKey::ClientId, credentials.client_id.as_str()),
                (SettingKey::ClientSecret, credentials.client_secret.as_str()),
                (SettingKey::RedirectUri, credentials.redirect_uri.as_str()),
            ];
            for (key, value) in entries {
                if let Err(e) = services.store.set(key, value) {
                    return Some(AppEvent::SubmitFailed(format!(
                        "Failed to save configuration: {e:#}"
                    )));
                }
            }
            Some(AppEvent::ConfigSaved(credentials))
        }

        Command::ExchangeCode { credentials, code } => {
            let token = match services.oauth.exchange_code(&credentials, &code) {
                Ok(token) => token,
                Err(e) => {
                    return Some(AppEvent::SubmitFailed(format!(
                        "Failed to exchange authorization code: {e:#}"
                    )));
                }
            };
            if let Err(e) = services
                .store
                .set(SettingKey::AccessToken, &token.access_token)
            {
                return Some(AppEvent::SubmitFailed(format!(
                    "Failed to save access token: {e:#}"
                )));
            }
            Some(AppEvent::TokenExchanged {
                access_token: token.access_token,
            })
        }

        Command::CopyToClipboard(text) => {
            services.clipboard.write_best_effort(&text);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::sync::Mutex;

    use anyhow::{anyhow, Result};

    use super::*;
    use crate::config::Credentials;
    use crate::models::{OAuthToken, Project, ProjectData, Task};

    #[derive(Default)]
    pub struct RecordingStore {
        pub writes: Mutex<Vec<(SettingKey, String)>>,
        pub fail: bool,
    }

    impl ConfigStore for RecordingStore {
        fn get(&self, key: SettingKey) -> String {
            self.writes
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        }

        fn set(&self, key: SettingKey, value: &str) -> Result<()> {
            if self.fail {
                return Err(anyhow!("disk full"));
            }
            self.writes.lock().unwrap().push((key, value.to_string()));
            Ok(())
        }
    }

    pub struct FakeExchange(pub Result<String, String>);

    impl TokenExchange for FakeExchange {
        fn exchange_code(&self, _credentials: &Credentials, _code: &str) -> Result<OAuthToken> {
            match &self.0 {
                Ok(token) => Ok(OAuthToken {
                    access_token: token.clone(),
                    ..OAuthToken::default()
                }),
                Err(e) => Err(anyhow!(e.clone())),
            }
        }
    }

    #[derive(Default)]
    pub struct FakeService {
        pub projects: Vec<Project>,
        pub tasks: Vec<Task>,
        pub fail: bool,
    }

    impl TaskService for FakeService {
        fn list_projects(&self) -> Result<Vec<Project>> {
            if self.fail {
                return Err(anyhow!("API error: 500"));
            }
            Ok(self.projects.clone())
        }

        fn project_bundle(&self, project_id: &str) -> Result<ProjectData> {
            if self.fail {
                return Err(anyhow!("API error: 500"));
            }
            Ok(ProjectData {
                project: Project {
                    id: project_id.to_string(),
                    ..Project::default()
                },
                tasks: self.tasks.clone(),
                columns: vec![],
            })
        }
    }

    #[derive(Default)]
    pub struct RecordingClipboard(pub Mutex<Vec<String>>);

    impl Clipboard for RecordingClipboard {
        fn write_best_effort(&self, text: &str) {
            self.0.lock().unwrap().push(text.to_string());
        }
    }

    pub fn services(
        store: Arc<RecordingStore>,
        exchange: FakeExchange,
        service: FakeService,
    ) -> Services {
        let service: Arc<dyn TaskService> = Arc::new(service);
        Services {
            store,
            oauth: Arc::new(exchange),
            connect: Arc::new(move |_token: &str| service.clone()),
            clipboard: Arc::new(RecordingClipboard::default()),
        }
    }
}
