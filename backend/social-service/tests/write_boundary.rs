//! Source-level checks that side-effect writes stay where the transactions are.

use std::fs;
use std::path::{Path, PathBuf};

fn collect_rs_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        if let Ok(read_dir) = fs::read_dir(&dir) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().map(|e| e == "rs").unwrap_or(false) {
                    files.push(path);
                }
            }
        }
    }
    files
}

fn offenders(needle: &str, allowed: &[&str]) -> Vec<String> {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src");

    collect_rs_files(&src)
        .into_iter()
        .filter(|file| {
            let path = file.to_string_lossy();
            !allowed.iter().any(|a| path.ends_with(a))
        })
        .filter(|file| {
            fs::read_to_string(file)
                .map(|c| c.contains(needle))
                .unwrap_or(false)
        })
        .map(|file| file.display().to_string())
        .collect()
}

#[test]
fn notification_rows_written_only_by_notification_module() {
    let insert = offenders("INSERT INTO notifications", &["src/db/notifications.rs"]);
    assert!(insert.is_empty(), "notification inserts outside db/notifications.rs: {:?}", insert);

    let delete = offenders("DELETE FROM notifications", &["src/db/notifications.rs"]);
    assert!(delete.is_empty(), "notification deletes outside db/notifications.rs: {:?}", delete);
}

#[test]
fn follow_edges_written_only_by_follows_module() {
    let found = offenders("INSERT INTO follows", &["src/db/follows.rs"]);
    assert!(found.is_empty(), "follow inserts outside db/follows.rs: {:?}", found);
}

#[test]
fn notify_called_only_from_transactional_services() {
    let allowed = [
        "src/db/notifications.rs",
        "src/services/interactions.rs",
        "src/services/comments.rs",
    ];
    let found = offenders("notifications::notify(", &allowed);
    assert!(found.is_empty(), "notify() called outside write services: {:?}", found);
}
