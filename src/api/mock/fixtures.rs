//! Seed data for the mock backend.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{ChatMessage, ChatSummary, FileItem, Folder, Role, User};

const SEED_CHATS: usize = 15;

/// The most recent chats always get a readable history of 5, 6, 7, 8, 9 messages.
const WELL_STOCKED_CHATS: usize = 5;
const WELL_STOCKED_MIN_MESSAGES: usize = 5;

const SEED_FILE_COUNTS: [(&str, usize); 3] =
    [("folder_001", 12), ("folder_002", 8), ("folder_003", 5)];

const SEED_MIME_TYPES: [(&str, &str); 5] = [
    ("application/pdf", "pdf"),
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("text/plain", "txt"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "docx",
    ),
];

const UPLOADERS: [&str; 3] = ["Juan Pérez", "María González", "Carlos Ruiz"];

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in", "voluptate",
    "velit", "esse", "cillum", "fugiat", "nulla", "pariatur", "excepteur", "sint", "occaecat",
    "cupidatat", "non", "proident", "sunt", "culpa", "qui", "officia", "deserunt", "mollit",
    "anim", "id", "est", "laborum",
];

/// Complete seed data set.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub user: User,
    /// Sorted by `updated_at`, newest first
    pub chats: Vec<ChatSummary>,
    pub messages: HashMap<String, Vec<ChatMessage>>,
    pub folders: Vec<Folder>,
    pub files: HashMap<String, Vec<FileItem>>,
}

impl Fixtures {
    /// Generate a fresh data set with timestamps relative to `now`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>) -> Self {
        let mut chats = chat_summaries(rng, SEED_CHATS, now);
        chats.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let mut messages = HashMap::new();
        for (index, chat) in chats.iter_mut().enumerate() {
            if index < WELL_STOCKED_CHATS {
                chat.message_count = WELL_STOCKED_MIN_MESSAGES + index;
            }
            let history = chat_messages(rng, &chat.id, chat.message_count, chat.updated_at);
            messages.insert(chat.id.clone(), history);
        }

        let folders = seed_folders();
        let files = SEED_FILE_COUNTS
            .iter()
            .map(|(folder_id, count)| {
                (
                    folder_id.to_string(),
                    folder_files(rng, folder_id, *count, now),
                )
            })
            .collect();

        Self {
            user: current_user(),
            chats,
            messages,
            folders,
            files,
        }
    }
}

fn current_user() -> User {
    let roles = ["user", "editor"];
    let permissions = [
        "chats:read",
        "chats:write",
        "files:read",
        "files:upload:folder:folder_001",
        "files:upload:folder:folder_002",
    ];
    User {
        id: "user_001".to_string(),
        name: "Juan Pérez".to_string(),
        email: "juan.perez@example.com".to_string(),
        roles: roles.iter().map(|r| r.to_string()).collect::<BTreeSet<_>>(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        created_at: fixed_time(2024, 1, 15, 10),
    }
}

fn seed_folders() -> Vec<Folder> {
    let folder = |id: &str,
                  name: &str,
                  owner: &str,
                  can_upload: bool,
                  created: DateTime<Utc>,
                  updated: DateTime<Utc>| Folder {
        id: id.to_string(),
        name: name.to_string(),
        owner: owner.to_string(),
        can_upload,
        created_at: created,
        updated_at: updated,
    };
    vec![
        folder(
            "folder_001",
            "General Documents",
            "Juan Pérez",
            true,
            fixed_time(2024, 1, 10, 10),
            fixed_time(2024, 10, 20, 15),
        ),
        folder(
            "folder_002",
            "Shared Resources",
            "María González",
            true,
            fixed_time(2024, 2, 5, 9),
            fixed_time(2024, 10, 25, 11),
        ),
        folder(
            "folder_003",
            "Read-Only Files",
            "Admin",
            false,
            fixed_time(2024, 1, 1, 8),
            fixed_time(2024, 10, 15, 10),
        ),
    ]
}

fn fixed_time(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn chat_summaries<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<ChatSummary> {
    (0..count)
        .map(|i| {
            let updated_at = recent(rng, now, 30);
            let created_at = recent(rng, now, 365).min(updated_at);
            ChatSummary {
                id: format!("chat_{:03}", i + 1),
                title: sentence(rng, 3, 6),
                last_message: Some(sentence(rng, 5, 12)),
                message_count: rng.gen_range(1..=50),
                created_at,
                updated_at,
            }
        })
        .collect()
}

/// Alternating user/assistant history ending no later than `until`, oldest first.
fn chat_messages<R: Rng + ?Sized>(
    rng: &mut R,
    chat_id: &str,
    count: usize,
    until: DateTime<Utc>,
) -> Vec<ChatMessage> {
    let mut messages: Vec<ChatMessage> = (0..count)
        .map(|i| ChatMessage {
            id: format!("msg_{}_{:03}", chat_id, i + 1),
            chat_id: chat_id.to_string(),
            role: if i % 2 == 0 {
                Role::User
            } else {
                Role::Assistant
            },
            content: paragraph(rng, 1, 3),
            created_at: recent(rng, until, 7),
        })
        .collect();
    messages.sort_by_key(|m| m.created_at);
    messages
}

fn folder_files<R: Rng + ?Sized>(
    rng: &mut R,
    folder_id: &str,
    count: usize,
    now: DateTime<Utc>,
) -> Vec<FileItem> {
    (0..count)
        .map(|i| {
            let (mime_type, ext) = *SEED_MIME_TYPES.choose(rng).unwrap_or(&SEED_MIME_TYPES[0]);
            let stem = format!("{}_{}", word(rng), word(rng));
            let updated_at = recent(rng, now, 30);
            FileItem {
                id: format!("file_{}_{:03}", folder_id, i + 1),
                folder_id: folder_id.to_string(),
                name: format!("{}.{}", stem, ext),
                mime_type: mime_type.to_string(),
                size: rng.gen_range(1024..=15 * 1024 * 1024),
                uploaded_by: UPLOADERS.choose(rng).unwrap_or(&UPLOADERS[0]).to_string(),
                created_at: recent(rng, now, 365).min(updated_at),
                updated_at,
            }
        })
        .collect()
}

/// A random instant within the last `days` days before `now`.
fn recent<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - Duration::seconds(rng.gen_range(0..days * 86_400))
}

fn word<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    WORDS.choose(rng).copied().unwrap_or("lorem")
}

fn sentence<R: Rng + ?Sized>(rng: &mut R, min_words: usize, max_words: usize) -> String {
    let count = rng.gen_range(min_words..=max_words);
    let mut text = (0..count).map(|_| word(rng)).collect::<Vec<_>>().join(" ");
    if let Some(first) = text.get(0..1) {
        let upper = first.to_uppercase();
        text.replace_range(0..1, &upper);
    }
    text.push('.');
    text
}

fn paragraph<R: Rng + ?Sized>(rng: &mut R, min_sentences: usize, max_sentences: usize) -> String {
    let count = rng.gen_range(min_sentences..=max_sentences);
    (0..count)
        .map(|_| sentence(rng, 4, 12))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn fixtures(seed: u64) -> Fixtures {
        Fixtures::generate(&mut StdRng::seed_from_u64(seed), Utc::now())
    }

    #[test]
    fn test_seed_shape() {
        let f = fixtures(1);
        assert_eq!(f.chats.len(), SEED_CHATS);
        assert_eq!(f.folders.len(), 3);
        assert_eq!(f.files["folder_001"].len(), 12);
        assert_eq!(f.files["folder_002"].len(), 8);
        assert_eq!(f.files["folder_003"].len(), 5);
        assert_eq!(f.user.id, "user_001");
    }

    #[test]
    fn test_chats_sorted_newest_first() {
        let f = fixtures(2);
        assert!(f
            .chats
            .windows(2)
            .all(|w| w[0].updated_at >= w[1].updated_at));
    }

    #[test]
    fn test_recent_chats_are_well_stocked() {
        let f = fixtures(3);
        for (i, chat) in f.chats.iter().take(WELL_STOCKED_CHATS).enumerate() {
            assert_eq!(chat.message_count, WELL_STOCKED_MIN_MESSAGES + i);
        }
    }

    #[test]
    fn test_message_counts_match_histories() {
        let f = fixtures(4);
        for chat in &f.chats {
            let history = &f.messages[&chat.id];
            assert_eq!(history.len(), chat.message_count, "{}", chat.id);
            assert!(history.windows(2).all(|w| w[0].created_at <= w[1].created_at));
            assert!(history.iter().all(|m| m.chat_id == chat.id));
            assert!(chat.created_at <= chat.updated_at);
        }
    }

    #[test]
    fn test_only_folder_003_is_read_only() {
        let f = fixtures(5);
        let read_only: Vec<_> = f
            .folders
            .iter()
            .filter(|folder| !folder.can_upload)
            .map(|folder| folder.id.as_str())
            .collect();
        assert_eq!(read_only, vec!["folder_003"]);
    }

    #[test]
    fn test_seed_files_within_upload_limits() {
        let f = fixtures(6);
        for file in f.files.values().flatten() {
            assert!(file.size >= 1024 && file.size <= 15 * 1024 * 1024);
            assert!(file.name.contains('.'));
        }
    }

    #[test]
    fn test_sentence_is_capitalized() {
        let mut rng = StdRng::seed_from_u64(9);
        let s = sentence(&mut rng, 3, 6);
        assert!(s.ends_with('.'));
        assert!(s.chars().next().unwrap().is_uppercase());
    }
}
