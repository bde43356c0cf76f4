use clap::Args;
use serde_json::Value;

use crate::cli::client::{ChangesClient, ListQuery};
use crate::cli::utils::{output_error, output_success, print_json, version_line};
use crate::cli::OutputFormat;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[arg(long = "type", help = "Only changes to this item type")]
    pub item_type: Option<String>,
    #[arg(long = "id", help = "Only changes to this item id")]
    pub item_id: Option<i64>,
    #[arg(long, help = "Page number (1-based)")]
    pub page: Option<u32>,
    #[arg(long, help = "Changes per page")]
    pub per_page: Option<u32>,
}

pub async fn list(client: &ChangesClient, args: ListArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let query = ListQuery {
        item_type: args.item_type,
        item_id: args.item_id,
        page: args.page,
        per_page: args.per_page,
    };
    let body = client.list(&query).await?;

    if let OutputFormat::Json = output_format {
        return print_json(&body);
    }

    let data = &body["data"];
    let versions = data["versions"].as_array().cloned().unwrap_or_default();
    if versions.is_empty() {
        println!("No changes found");
        return Ok(());
    }
    for version in &versions {
        println!("{}", version_line(version));
    }
    let pagination = &data["pagination"];
    println!(
        "page {} of {} ({} changes)",
        pagination["page"], pagination["total_pages"], pagination["total_count"]
    );
    Ok(())
}

pub async fn show(client: &ChangesClient, id: i64, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = client.show(id).await?;

    if let OutputFormat::Json = output_format {
        return print_json(&body);
    }

    let version = &body["data"];
    println!("{}", version_line(version));
    match version.get("object").filter(|o| !o.is_null()) {
        Some(object) => println!("Previous state:\n{}", serde_json::to_string_pretty(object)?),
        None => println!("No previous state (record was created)"),
    }
    if let Some(item) = version["links"].get("item").and_then(Value::as_str) {
        println!("Record: {}", item);
    }
    Ok(())
}

pub async fn revert(client: &ChangesClient, id: i64, output_format: OutputFormat) -> anyhow::Result<()> {
    let body = client.revert(id).await?;
    let data = body.get("data").cloned();

    if body["success"].as_bool().unwrap_or(false) {
        let notice = body["notice"].as_str().unwrap_or("Reverted");
        output_success(output_format, notice, data)
    } else {
        let error = body["error"].as_str().unwrap_or("Revert failed");
        output_error(output_format, error, data)?;
        anyhow::bail!("change {} was not reverted", id)
    }
}
