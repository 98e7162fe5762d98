//! Comment command handlers.

use std::collections::HashMap;

use console::{Term, style};
use tabled::{Table, Tabled, settings::Style};

use backlog::Comment;

use crate::CommentsAction;
use crate::commands::limits::OutputFormat;
use crate::commands::shared::{self, format_timestamp};
use crate::config::Config;

/// Handle comment commands.
pub(crate) async fn handle_comments(
    action: CommentsAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CommentsAction::List { id, output } => {
            let provider = shared::build_provider(config)?;
            let comments = provider.fetch_comments(id).await?;

            if comments.is_empty() {
                if Term::stdout().is_term() {
                    println!("No comments on work item {}.", id);
                } else {
                    tracing::info!(work_item_id = id, "No comments");
                }
                return Ok(());
            }

            let rows: Vec<CommentRow> = comments.iter().map(CommentRow::from).collect();
            print_rows(rows, output)?;
        }
        CommentsAction::Add { id, text } => {
            let provider = shared::build_provider(config)?;
            let comment = provider.add_comment(id, &text).await?;

            if Term::stdout().is_term() {
                println!(
                    "{} Added comment {} to work item {}",
                    style("✓").green().bold(),
                    comment.id,
                    id
                );
            } else {
                tracing::info!(comment_id = comment.id, work_item_id = id, "Comment added");
            }
        }
        CommentsAction::Batch { ids, output } => {
            let provider = shared::build_provider(config)?;
            let by_item = provider.fetch_comments_for(&ids).await?;

            let rows = batch_rows(&by_item);
            if rows.is_empty() {
                if Term::stdout().is_term() {
                    println!("No comments on the requested work items.");
                } else {
                    tracing::info!("No comments");
                }
                return Ok(());
            }

            print_rows(rows, output)?;
        }
    }

    Ok(())
}

/// Display struct for comment listing.
#[derive(Debug, Clone, serde::Serialize, Tabled)]
struct CommentRow {
    #[tabled(rename = "ID")]
    id: i32,
    #[tabled(rename = "Work Item")]
    work_item_id: i32,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Text")]
    text: String,
}

impl From<&Comment> for CommentRow {
    fn from(comment: &Comment) -> Self {
        Self {
            id: comment.id,
            work_item_id: comment.work_item_id,
            author: comment.author.clone(),
            created_at: format_timestamp(comment.created_at),
            text: comment.text.clone(),
        }
    }
}

/// Flatten a per-item comment map into rows, ordered by work item then
/// comment id so batch output is stable.
fn batch_rows(by_item: &HashMap<i32, Vec<Comment>>) -> Vec<CommentRow> {
    let mut rows: Vec<CommentRow> = by_item.values().flatten().map(CommentRow::from).collect();
    rows.sort_by_key(|row| (row.work_item_id, row.id));
    rows
}

fn print_rows(
    rows: Vec<CommentRow>,
    output: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        OutputFormat::Table => {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
    }

    Ok(())
}
