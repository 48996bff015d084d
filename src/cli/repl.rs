use std::io::Write as _;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::config::{ConfigPatch, ConfigPersister};
use crate::core::query::GUEST_USER;
use crate::core::transcript::Speaker;
use crate::core::{AskSession, Query, Result};

const BOT_PROMPT: &str = "بسام";

/// Interactive loop: one line in, one answer out. `/user <name>` saves the
/// display name, `exit` or EOF leaves.
pub async fn run(session: &AskSession, initial_user: String) -> Result<()> {
    println!("اسأل بسام أي سؤال. اكتب exit للخروج و /user <name> لحفظ اسمك.");

    let mut user = initial_user;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{user}> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        if line == "exit" || line == "quit" {
            break;
        }
        if let Some(rest) = line.strip_prefix("/user") {
            if rest.is_empty() || rest.starts_with(' ') {
                save_user(session, &mut user, rest);
                continue;
            }
        }

        let Some(handle) = session.submit(Query::new(line, user.clone())) else {
            continue;
        };
        let entry = handle.entry();
        handle.wait().await;

        let transcript = session.transcript();
        let guard = transcript.lock();
        if let Some(text) = guard.text_of(entry) {
            println!("{BOT_PROMPT}> {text}");
        }
    }

    Ok(())
}

fn save_user(session: &AskSession, user: &mut String, raw: &str) {
    let name = raw.trim();
    let name = if name.is_empty() { GUEST_USER } else { name };
    *user = name.to_string();

    if let Some(persister) = ConfigPersister::with_default_path() {
        if let Err(e) = persister.apply_patch(&ConfigPatch::user(name)) {
            tracing::warn!(error = %e, "failed to persist display name");
        }
    }

    let note = format!("تم حفظ الاسم: {name}");
    session.transcript().lock().push(Speaker::System, note.clone());
    println!("{note}");
}
