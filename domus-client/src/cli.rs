//! Argument parsing for the `domus` binary.
//!
//! ```text
//! domus [--config PATH] [select LEVEL=ID]... list RESOURCE [PAGE] [KEY=VALUE]...
//! ```

use crate::error::ClientError;
use crate::filters::ListFilter;
use crate::resources::ResourceKind;
use domus_core::{EntityId, HierarchyLevel, Pagination, QueryParams};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ListCommand {
    pub selections: Vec<(HierarchyLevel, EntityId)>,
    pub kind: ResourceKind,
    pub filter: ListFilter,
}

pub fn parse_args<I>(args: I) -> Result<ListCommand, ClientError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = strip_config(args).into_iter().peekable();
    let mut selections = Vec::new();

    loop {
        match args.next().as_deref() {
            Some("select") => {
                let pair = args
                    .next()
                    .ok_or_else(|| usage("select needs LEVEL=ID"))?;
                selections.push(parse_selection(&pair)?);
            }
            Some("list") => break,
            Some(other) => return Err(usage(&format!("unexpected argument '{}'", other))),
            None => return Err(usage("missing 'list' command")),
        }
    }

    let kind: ResourceKind = args
        .next()
        .ok_or_else(|| usage("list needs a resource key"))?
        .parse()?;

    let mut pagination = Pagination::default();
    if let Some(page) = args.peek().and_then(|arg| arg.parse::<u32>().ok()) {
        pagination = Pagination::new(page, pagination.page_size)?;
        args.next();
    }

    let mut search = None;
    let mut extra = QueryParams::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| usage(&format!("expected KEY=VALUE, got '{}'", arg)))?;
        match key {
            "search" => search = Some(value.to_string()),
            "page_size" => {
                let size = value
                    .parse::<u32>()
                    .map_err(|_| usage("page_size must be a number"))?;
                pagination = Pagination::new(pagination.page, size)?;
            }
            _ => extra.insert(key, parse_value(value)),
        }
    }

    let mut filter = ListFilter::new().with_page(pagination).with_extra(extra);
    if let Some(search) = search {
        filter = filter.with_search(search);
    }
    Ok(ListCommand {
        selections,
        kind,
        filter,
    })
}

fn strip_config<I>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            args.next();
        } else if !arg.starts_with("--config=") {
            out.push(arg);
        }
    }
    out
}

fn parse_selection(pair: &str) -> Result<(HierarchyLevel, EntityId), ClientError> {
    let (level, id) = pair
        .split_once('=')
        .ok_or_else(|| usage(&format!("expected LEVEL=ID, got '{}'", pair)))?;
    let level: HierarchyLevel = level.parse()?;
    let id = id
        .trim()
        .parse::<EntityId>()
        .map_err(|_| usage(&format!("invalid id '{}'", id)))?;
    Ok((level, id))
}

/// Numbers and booleans keep their JSON type; everything else is a string.
fn parse_value(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

fn usage(message: &str) -> ClientError {
    ClientError::Usage(message.to_string())
}
