use anyhow::Result;
use std::process;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use yummy_core::session::SessionLog;

use super::helpers::{exit_not_found, truncate};

pub(crate) fn cmd_session_list(log: &SessionLog, all: bool, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct SessionRow {
        #[tabled(rename = "ID")]
        id: i64,
        #[tabled(rename = "Started")]
        created_at: String,
        #[tabled(rename = "Last active")]
        updated_at: String,
        #[tabled(rename = "Messages")]
        messages: i64,
        #[tabled(rename = "Tokens in")]
        input_tokens: i64,
        #[tabled(rename = "Tokens out")]
        output_tokens: i64,
    }

    let sessions = if all {
        log.all_sessions()?
    } else {
        log.non_empty_sessions()?
    };
    if sessions.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No sessions found");
        }
        process::exit(2);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(sessions.len());
    for s in &sessions {
        let stats = log.session_stats(s.base.id)?;
        rows.push(SessionRow {
            id: s.base.id,
            created_at: truncate(&s.base.created_at, 19),
            updated_at: truncate(&s.base.updated_at, 19),
            messages: stats.message_count,
            input_tokens: stats.total_input_tokens,
            output_tokens: stats.total_output_tokens,
        });
    }

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_session_show(log: &SessionLog, id: i64, json: bool) -> Result<()> {
    let messages = log.session_messages(id)?;
    if messages.is_empty() {
        exit_not_found(&format!("No messages in session {id}"), json);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    let stats = log.session_stats(id)?;
    println!(
        "=== Session {id} ===\n  {} messages  |  {} tokens in  |  {} tokens out\n",
        stats.message_count, stats.total_input_tokens, stats.total_output_tokens
    );
    for msg in &messages {
        let role = msg.role;
        let model = if msg.model_name.is_empty() {
            String::new()
        } else {
            format!(" ({})", msg.model_name)
        };
        println!("[{role}{model}] {}", msg.base.created_at);
        let body = if msg.content.is_empty() {
            &msg.message
        } else {
            &msg.content
        };
        for line in body.lines() {
            println!("  {line}");
        }
        println!();
    }
    Ok(())
}

pub(crate) fn cmd_session_delete(log: &SessionLog, id: i64, json: bool) -> Result<()> {
    match log.delete_session(id) {
        Err(e) if e.is_not_found() => exit_not_found(&e.to_string(), json),
        other => other?,
    }
    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted session {id}");
    }
    Ok(())
}
