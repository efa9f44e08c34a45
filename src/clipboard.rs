use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

/// Best-effort text clipboard. Failures are logged and otherwise ignored.
pub trait Clipboard: Send + Sync {
    fn write_best_effort(&self, text: &str);
}

/// System clipboard via `arboard`.
///
/// A dedicated thread owns the `arboard` handle for the rest of the process:
/// on X11 the selection is only served while that handle is alive.
pub struct SystemClipboard {
    tx: Mutex<Sender<String>>,
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClipboard {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel::<String>();
        thread::spawn(move || serve(rx));
        Self { tx: Mutex::new(tx) }
    }
}

fn serve(rx: Receiver<String>) {
    let mut handle: Option<arboard::Clipboard> = None;
    while let Ok(text) = rx.recv() {
        if handle.is_none() {
            match arboard::Clipboard::new() {
                Ok(clipboard) => handle = Some(clipboard),
                Err(e) => {
                    tracing::debug!("clipboard unavailable: {e}");
                    continue;
                }
            }
        }
        if let Some(clipboard) = handle.as_mut() {
            if let Err(e) = clipboard.set_text(text) {
                tracing::debug!("clipboard write failed: {e}");
            }
        }
    }
}

impl Clipboard for SystemClipboard {
    fn write_best_effort(&self, text: &str) {
        if let Ok(tx) = self.tx.lock() {
            let _ = tx.send(text.to_string());
        }
    }
}
