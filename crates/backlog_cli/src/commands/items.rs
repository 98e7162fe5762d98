//! Work item command handlers.

use console::Term;
use tabled::{Table, Tabled, settings::Style};

use backlog::{QueryFilters, SortOrder, WorkItemQuery, WorkRecord};

use crate::commands::limits::OutputFormat;
use crate::commands::shared::{self, format_timestamp};
use crate::config::Config;
use crate::{ItemsAction, QueryArgs};

/// Handle work item commands.
pub(crate) async fn handle_items(
    action: ItemsAction,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ItemsAction::Get { id, output } => {
            let provider = shared::build_provider(config)?;
            let record = provider
                .fetch_work_item(id)
                .await?
                .ok_or_else(|| format!("Work item {} not found", id))?;

            print_rows(vec![WorkItemRow::from(&record)], output)?;
        }
        ItemsAction::Query { filters, output } => {
            let query = build_query(&filters);
            if query.is_empty() {
                return Err("No filters given. Use at least one of --state, --item-type, \
                     --assigned-to, --area, or --iteration"
                    .into());
            }

            let provider = shared::build_provider(config)?;
            let records = provider.fetch_work_items(&query).await?;

            if records.is_empty() {
                if Term::stdout().is_term() {
                    println!("No matching work items.");
                } else {
                    tracing::info!("No matching work items");
                }
                return Ok(());
            }

            let rows: Vec<WorkItemRow> = records.iter().map(WorkItemRow::from).collect();
            print_rows(rows, output)?;
        }
    }

    Ok(())
}

/// Translate CLI filter flags into a work item query.
fn build_query(args: &QueryArgs) -> WorkItemQuery {
    WorkItemQuery {
        filters: QueryFilters {
            states: args.states.clone(),
            item_types: args.item_types.clone(),
            assigned_to: args.assigned_to.clone(),
            areas: args.areas.clone(),
            iterations: args.iterations.clone(),
        },
        order_by: args.order_by.clone(),
        direction: if args.descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        },
        limit: args.limit,
    }
}

/// Display struct for work item listing.
#[derive(Debug, Clone, serde::Serialize, Tabled)]
struct WorkItemRow {
    #[tabled(rename = "ID")]
    id: i32,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    item_type: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Assignee")]
    assignee: String,
    #[tabled(rename = "Changed")]
    changed_at: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

impl From<&WorkRecord> for WorkItemRow {
    fn from(record: &WorkRecord) -> Self {
        Self {
            id: record.id,
            item_type: record.item_type.clone(),
            state: record.state.clone(),
            title: record.title.clone(),
            assignee: record.assignee.clone().unwrap_or_else(|| "-".to_string()),
            changed_at: format_timestamp(record.changed_at),
            tags: record.tags.join(", "),
        }
    }
}

fn print_rows(
    rows: Vec<WorkItemRow>,
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
