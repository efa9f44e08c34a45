use cliclack::{intro, log, outro, spinner};
use colored::*;
use serde::Serialize;
use std::future::Future;

pub fn print_banner() {
    intro(" TICKTICK TUI ").ok();
    log::remark("Terminal client for TickTick").ok();
}

pub fn print_success(message: &str) {
    log::success(message).ok();
}

pub fn print_error(message: &str) {
    log::error(message).ok();
}

pub fn print_info(message: &str) {
    log::info(message).ok();
}

pub fn print_outro(msg: &str) {
    outro(msg).ok();
}

/// `key = value` line for settings listings.
pub fn print_setting(key: &str, value: &str) {
    if value.is_empty() {
        println!("{} = {}", key.cyan(), "(not set)".dimmed());
    } else {
        println!("{} = {}", key.cyan(), value);
    }
}

/// Pretty JSON on stdout, so data commands stay pipeable.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    println!("{}", text);
    Ok(())
}

pub async fn with_spinner<F, Fut, T, E>(start_msg: &str, success_msg: &str, f: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let s = spinner();
    s.start(start_msg);
    let result = f().await;
    match &result {
        Ok(_) => s.stop(success_msg),
        Err(_) => s.stop("Failed"),
    }
    result
}
