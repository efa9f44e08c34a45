use crossterm::event::KeyEvent;

use crate::config::Credentials;
use crate::models::{Project, Task};

/// Everything the state machine reacts to: terminal input plus completions
/// delivered by the loader.
#[derive(Debug, Clone)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,

    ProjectsLoaded {
        generation: u64,
        projects: Vec<Project>,
    },
    TasksLoaded {
        generation: u64,
        tasks: Vec<Task>,
    },
    /// A snapshot load failed. `message` is already user-facing.
    LoadFailed {
        generation: u64,
        message: String,
    },

    ConfigSaved(Credentials),
    TokenExchanged {
        access_token: String,
    },
    SubmitFailed(String),
}

/// Asynchronous work requested by the state machine.
///
/// Snapshot loads carry the view generation they were issued for so late
/// completions can be told apart from current ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    LoadProjects {
        generation: u64,
        access_token: String,
    },
    LoadTasks {
        generation: u64,
        access_token: String,
        project_id: String,
    },
    SaveConfig(Credentials),
    ExchangeCode {
        credentials: Credentials,
        code: String,
    },
    CopyToClipboard(String),
}
