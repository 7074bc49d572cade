//! Subcommand handlers
//!
//! Each handler takes the client and the parsed arguments, performs one
//! API operation (or a cursor loop for `list --all`), and writes its result
//! to `out`.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info};

use reader_core::{
    CallContext, Client, CreateDocumentRequest, ListDocumentsOptions, Transport,
    UpdateDocumentRequest,
};

use crate::output::print_json;
use crate::{CreateArgs, DeleteArgs, ListArgs, UpdateArgs};

/// Arguments that parse individually but cannot be used together.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// Replace a `-` argument with the contents of stdin.
fn from_stdin(value: Option<String>, stdin: &mut dyn Read) -> Result<Option<String>> {
    match value.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            stdin
                .read_to_string(&mut buf)
                .context("failed to read from stdin")?;
            Ok(Some(buf))
        }
        _ => Ok(value),
    }
}

/// Save a URL as a new document
pub fn create<T: Transport>(
    client: &Client<T>,
    ctx: &CallContext,
    args: CreateArgs,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<()> {
    if args.notes.as_deref() == Some("-") && args.html.as_deref() == Some("-") {
        return Err(UsageError("--notes and --html cannot both read from stdin".to_string()).into());
    }
    let notes = from_stdin(args.notes, stdin)?;
    let html = from_stdin(args.html, stdin)?;
    let should_clean_html = html.is_some().then_some(true);

    let request = CreateDocumentRequest {
        html,
        title: args.title,
        author: args.author,
        summary: args.summary,
        published_date: args.published_date,
        tags: args.tag,
        location: args.location,
        category: args.category,
        image_url: args.image_url,
        notes,
        should_clean_html,
    };

    let created = client
        .create_document(ctx, &args.url, &request)
        .context("failed to create document")?;
    print_json(out, &created)
}

/// List documents, following cursors when `--all` is set
pub fn list<T: Transport>(
    client: &Client<T>,
    ctx: &CallContext,
    args: ListArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let updated_after = match args.since {
        Some(since) => {
            let since = chrono::Duration::from_std(since).context("--since is out of range")?;
            let updated_after = Utc::now()
                .checked_sub_signed(since)
                .context("--since is out of range")?;
            Some(updated_after)
        }
        None => None,
    };

    let mut options = ListDocumentsOptions {
        id: args.id,
        updated_after,
        location: Some(args.location),
        category: args.category,
        tag: args.tag,
        page_cursor: args.cursor,
        with_html_content: args.html,
    };

    let mut documents = Vec::new();
    loop {
        let page = client
            .list_documents(ctx, &options)
            .context("failed to list documents")?;
        debug!(fetched = page.results.len(), total = page.count, "fetched page");

        let next = page.next_page(&options);
        documents.extend(page.results);
        match next {
            Some(next) if args.all => options = next,
            Some(next) => {
                info!(cursor = next.page_cursor.as_deref(), "more documents available");
                break;
            }
            None => break,
        }
    }

    print_json(out, &documents)
}

/// Change the given fields of a document
pub fn update<T: Transport>(
    client: &Client<T>,
    ctx: &CallContext,
    args: UpdateArgs,
    out: &mut dyn Write,
) -> Result<()> {
    let request = UpdateDocumentRequest {
        title: args.title,
        author: args.author,
        summary: args.summary,
        location: args.location,
        category: args.category,
        image_url: args.image_url,
        published_date: args.published_date,
        notes: args.notes,
        ..Default::default()
    };
    if request.is_empty() {
        return Err(UsageError("at least one field to update is required".to_string()).into());
    }

    let updated = client
        .update_document(ctx, &args.id, &request)
        .context("failed to update document")?;
    print_json(out, &updated)
}

/// Delete a document
pub fn delete<T: Transport>(
    client: &Client<T>,
    ctx: &CallContext,
    args: DeleteArgs,
    out: &mut dyn Write,
) -> Result<()> {
    client
        .delete_document(ctx, &args.id)
        .context("failed to delete document")?;
    writeln!(out, "Document {} deleted successfully", args.id)?;
    Ok(())
}
