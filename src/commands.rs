//! CLI command handlers (print to stdout).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::mock::MAX_UPLOAD_BYTES;
use crate::api::{ApiError, ChatQuery, PageRequest};
use crate::config::Config;
use crate::format::{file_kind, format_file_size, format_relative_time, validate_upload};
use crate::models::UploadFile;
use crate::store::{AppStore, AsyncState, ToastKind};

/// Turn a settled slice field into its data or a printable error.
fn loaded<T: Clone>(state: &AsyncState<T>, what: &str) -> Result<T> {
    if state.is_loading() {
        bail!("Still waiting to {}", what);
    }
    if let Some(ref err) = state.error {
        return Err(api_failure(err.clone(), what));
    }
    match state.data {
        Some(ref data) => Ok(data.clone()),
        None => bail!("{} not loaded ({})", what, state.status.as_str()),
    }
}

fn api_failure(err: ApiError, what: &str) -> anyhow::Error {
    let hint = if err.code.is_transient() {
        " (temporary, try again)"
    } else {
        ""
    };
    anyhow::Error::new(err).context(format!("Failed to {}{}", what, hint))
}

/// Print and clear pending notifications.
fn flush_toasts(store: &AppStore) {
    for toast in store.ui.snapshot().toasts {
        println!("[{}] {}", toast.kind.as_str(), toast.message);
        store.ui.dismiss_toast(&toast.id);
    }
}

pub async fn whoami(store: &AppStore) -> Result<()> {
    store.auth.load_user().await;
    let user = loaded(&store.auth.snapshot().user, "load current user")?;

    println!();
    println!("Name:        {}", user.name);
    println!("Email:       {}", user.email);
    println!("ID:          {}", user.id);
    println!(
        "Roles:       {}",
        user.roles.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Permissions: {}",
        user.permissions.iter().cloned().collect::<Vec<_>>().join(", ")
    );
    println!(
        "Member since {}",
        format_relative_time(user.created_at, Utc::now())
    );

    Ok(())
}

pub async fn list_chats(
    store: &AppStore,
    search: Option<String>,
    limit: usize,
    cursor: Option<String>,
    all: bool,
) -> Result<()> {
    store.chats.set_search_query(search.as_deref().unwrap_or(""));
    store
        .chats
        .load_chats(ChatQuery {
            search,
            page: PageRequest::new(Some(limit), cursor),
        })
        .await;

    while all && store.chats.snapshot().next_cursor.is_some() {
        store.chats.load_more_chats().await;
    }

    let state = store.chats.snapshot();
    let chats = loaded(&state.list, "load chats")?;

    println!("\nChats:");
    println!("{:-<60}", "");

    if chats.is_empty() {
        println!("  (no chats found)");
        return Ok(());
    }

    let now = Utc::now();
    for chat in &chats {
        println!("{}", chat.title);
        println!("  ID: {}", chat.id);
        println!(
            "  {} messages, updated {}",
            chat.message_count,
            format_relative_time(chat.updated_at, now)
        );
        if let Some(ref preview) = chat.last_message {
            let preview: String = preview.chars().take(80).collect();
            println!("  Last: {}", preview.trim());
        }
        println!();
    }

    if let Some(next) = state.next_cursor {
        println!("More chats available: --cursor {}", next);
    }

    Ok(())
}

pub async fn new_chat(store: &AppStore, title: Option<&str>) -> Result<()> {
    let id = store
        .chats
        .create_new_chat(title)
        .await
        .map_err(|e| api_failure(e, "create chat"))?;
    println!("Created chat {}", id);
    Ok(())
}

pub async fn read_messages(store: &AppStore, chat_id: &str) -> Result<()> {
    store.chats.set_active_chat(Some(chat_id));
    store.chats.load_messages(chat_id).await;

    let state = store.chats.snapshot();
    if let Some(err) = state.messages.get(chat_id).and_then(|h| h.error.clone()) {
        return Err(api_failure(err, "load messages"));
    }
    let messages = state.messages_for(chat_id).unwrap_or_default();

    if messages.is_empty() {
        println!("(no messages)");
        return Ok(());
    }

    let now = Utc::now();
    for msg in messages {
        println!(
            "[{}] {}: {}",
            format_relative_time(msg.created_at, now),
            msg.role.as_str(),
            msg.content
        );
    }

    Ok(())
}

pub async fn send_message(store: &AppStore, chat_id: &str, message: &str) -> Result<()> {
    match store.chats.send_chat_message(chat_id, message).await {
        Ok(reply) => {
            store.ui.show_toast(ToastKind::Success, "Message sent");
            flush_toasts(store);
            println!("{}: {}", reply.role.as_str(), reply.content);
            Ok(())
        }
        Err(e) => {
            store.ui.show_toast(ToastKind::Error, e.message.clone());
            flush_toasts(store);
            Err(api_failure(e, "send message"))
        }
    }
}

pub async fn list_folders(store: &AppStore) -> Result<()> {
    store.files.load_folders().await;
    let folders = loaded(&store.files.snapshot().folders, "load folders")?;

    println!("\nFolders:");
    println!("{:-<60}", "");
    for folder in &folders {
        let access = if folder.can_upload {
            "read/write"
        } else {
            "read-only"
        };
        println!("{}  [{}]", folder.name, access);
        println!("  ID: {}", folder.id);
        println!("  Owner: {}", folder.owner);
        println!();
    }

    Ok(())
}

pub async fn list_files(store: &AppStore, folder_id: &str) -> Result<()> {
    store.files.load_folder_files(folder_id).await;
    let state = store.files.snapshot();
    if let Some(err) = state.files_by_folder.get(folder_id).and_then(|l| l.error.clone()) {
        return Err(api_failure(err, "load files"));
    }
    let files = state.files_in(folder_id).unwrap_or_default();

    if files.is_empty() {
        println!("(empty folder)");
        return Ok(());
    }

    let now = Utc::now();
    for file in files {
        println!(
            "{:<40} {:>10}  {:<12} {:<16} {}",
            file.name,
            format_file_size(file.size),
            file_kind(&file.mime_type),
            file.uploaded_by,
            format_relative_time(file.updated_at, now)
        );
        println!("  ID: {}", file.id);
    }

    Ok(())
}

pub async fn upload(
    store: &AppStore,
    folder_id: &str,
    path: &Path,
    mime: Option<String>,
) -> Result<()> {
    let content = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .context("Upload path has no file name")?;
    let mime = mime.unwrap_or_else(|| {
        mime_guess::from_path(path)
            .first_raw()
            .unwrap_or_default()
            .to_string()
    });

    let file = UploadFile::new(name, mime, content);
    if let Err(reason) = validate_upload(&file, MAX_UPLOAD_BYTES / (1024 * 1024)) {
        bail!("{}: {}", path.display(), reason);
    }

    match store.files.upload_file_to_folder(folder_id, &file).await {
        Ok(item) => {
            store
                .ui
                .show_toast(ToastKind::Success, format!("Uploaded {}", item.name));
            flush_toasts(store);
            println!(
                "{} ({}) -> {}",
                item.id,
                format_file_size(item.size),
                folder_id
            );
            Ok(())
        }
        Err(e) => {
            store.ui.show_toast(ToastKind::Error, e.message.clone());
            flush_toasts(store);
            Err(api_failure(e, "upload file"))
        }
    }
}

pub async fn delete(store: &AppStore, file_id: &str) -> Result<()> {
    store
        .files
        .delete_file(file_id)
        .await
        .map_err(|e| api_failure(e, "delete file"))?;
    println!("Deleted {}", file_id);
    Ok(())
}

pub async fn download(store: &AppStore, file_id: &str, out: Option<PathBuf>) -> Result<()> {
    let bytes = store
        .files
        .download_file(file_id)
        .await
        .map_err(|e| api_failure(e, "download file"))?;
    let out = out.unwrap_or_else(|| PathBuf::from(file_id));
    tokio::fs::write(&out, &bytes)
        .await
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "Saved {} to {}",
        format_file_size(bytes.len() as u64),
        out.display()
    );
    Ok(())
}

/// Print a line whenever the description of a slice's state changes.
fn observe<T, F>(mut rx: watch::Receiver<T>, label: &'static str, describe: F) -> JoinHandle<()>
where
    T: Send + Sync + 'static,
    F: Fn(&T) -> String + Send + 'static,
{
    tokio::spawn(async move {
        let mut last = String::new();
        while rx.changed().await.is_ok() {
            let line = describe(&rx.borrow_and_update());
            if line != last {
                println!("  {}: {}", label, line);
                last = line;
            }
        }
    })
}

/// Walk through a short session, printing each state transition.
pub async fn demo(store: &AppStore) -> Result<()> {
    let observers = [
        observe(store.auth.subscribe(), "auth", |s| {
            s.user.status.as_str().to_string()
        }),
        observe(store.chats.subscribe(), "chats", |s| {
            if s.is_sending() {
                format!("{}, sending", s.list.status.as_str())
            } else {
                s.list.status.as_str().to_string()
            }
        }),
        observe(store.files.subscribe(), "files", |s| {
            if s.is_uploading() {
                format!("{}, uploading", s.folders.status.as_str())
            } else {
                s.folders.status.as_str().to_string()
            }
        }),
        observe(store.ui.subscribe(), "ui", |s| {
            format!("{} toast(s)", s.toasts.len())
        }),
    ];

    whoami(store).await?;
    list_chats(store, None, 5, None, false).await?;

    let id = store
        .chats
        .create_new_chat(Some("Demo conversation"))
        .await
        .map_err(|e| api_failure(e, "create chat"))?;
    send_message(store, &id, "Give me a summary of the latest report").await?;
    read_messages(store, &id).await?;

    store.files.load_folders().await;
    let folders = loaded(&store.files.snapshot().folders, "load folders")?;
    if let Some(folder) = folders.iter().find(|f| f.can_upload) {
        let file = UploadFile::new("demo-notes.txt", "text/plain", b"Demo notes".to_vec());
        match store.files.upload_file_to_folder(&folder.id, &file).await {
            Ok(item) => {
                store
                    .ui
                    .show_toast(ToastKind::Success, format!("Uploaded {}", item.name));
            }
            Err(e) => {
                store.ui.show_toast(ToastKind::Error, e.message.clone());
            }
        }
        flush_toasts(store);
    }

    for observer in observers {
        observer.abort();
    }
    Ok(())
}

pub fn status(config: &Config) -> Result<()> {
    println!(
        "Backend:     {}",
        if config.use_mock_api {
            "mock"
        } else {
            "http"
        }
    );
    println!("Base URL:    {}", config.base_url);
    println!("Timeout:     {} ms", config.timeout_ms);
    if config.use_mock_api {
        println!(
            "Simulation:  latency {}, failure rate {}",
            if config.simulation.latency { "on" } else { "off" },
            config.simulation.failure_rate
        );
        if let Some(seed) = config.mock_seed {
            println!("Seed:        {}", seed);
        }
    }

    match config.auth_token {
        Some(ref token) if token.is_expired() => println!("Token:       expired"),
        Some(_) => println!("Token:       stored"),
        None => println!("Token:       none"),
    }
    println!("Config file: {}", Config::config_path()?.display());

    Ok(())
}
