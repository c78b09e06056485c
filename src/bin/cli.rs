//! pagekv CLI
//!
//! Drives an in-memory collection: a paging demo, or a JSON-lines script of
//! operations.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use pagekv::{Collection, CollectionConfig, Context, ItemResult, MemoryStore, RawValue, Taggable};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing_subscriber::{fmt, EnvFilter};

/// pagekv CLI
#[derive(Parser, Debug)]
#[command(name = "pagekv-cli")]
#[command(about = "Cursor pagination and retention over an in-memory store")]
#[command(version)]
struct Args {
    /// Index key of the collection
    #[arg(short, long, default_value = "feed")]
    index: String,

    /// Order pages by highest score first
    #[arg(long)]
    desc: bool,

    /// Cap the index at this many entries (enables retention)
    #[arg(long)]
    max_entries: Option<i64>,

    /// Seconds between retention passes
    #[arg(long, default_value = "900")]
    interval_secs: u64,

    /// Payload expiry in seconds
    #[arg(long, default_value = "300")]
    expiry_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seed generated records and print every page
    Demo {
        /// Number of records to write
        #[arg(short, long, default_value = "10")]
        records: u64,

        /// Items per page
        #[arg(short, long, default_value = "3")]
        page_size: i64,
    },

    /// Replay a JSON-lines script of operations
    Script {
        /// Path to the script
        file: String,
    },
}

/// A record written by the CLI
#[derive(Debug, Serialize, Deserialize)]
struct Item {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<f64>,
    #[serde(default)]
    body: Value,
}

impl Taggable for Item {
    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn sort_score(&self) -> Option<f64> {
        self.score
    }
}

/// One script line
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Op {
    Write {
        #[serde(flatten)]
        item: Item,
        #[serde(default)]
        overwrite: bool,
        #[serde(default)]
        only_meta: bool,
    },
    Read {
        #[serde(default)]
        count: i64,
        after: Option<String>,
        #[serde(default)]
        ids: Vec<String>,
        #[serde(default)]
        only_meta: bool,
    },
    Delete {
        ids: Vec<String>,
        #[serde(default)]
        only_meta: bool,
    },
    Advance {
        secs: u64,
    },
    Count,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,pagekv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::info!("pagekv CLI v{}", pagekv::VERSION);

    let store = Arc::new(MemoryStore::new());
    let collection = match build_collection(&args, Arc::clone(&store)) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid collection settings: {}", e);
            std::process::exit(1);
        }
    };

    let outcome = match &args.command {
        Commands::Demo { records, page_size } => run_demo(&collection, *records, *page_size),
        Commands::Script { file } => run_script(&collection, &store, file),
    };

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn build_collection(args: &Args, store: Arc<MemoryStore>) -> pagekv::Result<Collection> {
    let mut builder = CollectionConfig::builder()
        .index_key(&args.index)
        .data_expiry(Duration::from_secs(args.expiry_secs));
    if args.desc {
        builder = builder.descending();
    }
    if let Some(max) = args.max_entries {
        builder = builder.retention(max, Duration::from_secs(args.interval_secs));
    }
    Collection::new(store, builder.build()?)
}

fn run_demo(collection: &Collection, records: u64, page_size: i64) -> Result<(), String> {
    let items: Vec<Item> = (1..=records)
        .map(|n| Item {
            id: format!("item-{}", n),
            score: Some(n as f64),
            body: json!({ "n": n }),
        })
        .collect();
    collection.write().values(&items).exec().map_err(|e| e.to_string())?;

    let mut cursor: Option<String> = None;
    let mut page_no = 1;
    loop {
        let mut reader = collection.read().page(page_size);
        if let Some(last) = &cursor {
            reader = reader.after(last.clone());
        }
        let page = reader.exec().map_err(|e| e.to_string())?;
        let Some(last) = page.last() else {
            break;
        };

        let ids: Vec<&str> = page.iter().map(ItemResult::id).collect();
        println!("page {}: {}", page_no, ids.join(", "));
        cursor = Some(last.id().to_string());
        page_no += 1;
    }
    Ok(())
}

fn run_script(collection: &Collection, store: &MemoryStore, file: &str) -> Result<(), String> {
    let script = std::fs::read_to_string(file).map_err(|e| format!("{}: {}", file, e))?;
    let ctx = Context::background();

    for (line_no, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let op: Op = serde_json::from_str(line)
            .map_err(|e| format!("line {}: {}", line_no + 1, e))?;
        println!("{}", run_op(collection, store, &ctx, op));
    }
    Ok(())
}

fn run_op(collection: &Collection, store: &MemoryStore, ctx: &Context, op: Op) -> Value {
    let outcome = match op {
        Op::Write {
            item,
            overwrite,
            only_meta,
        } => {
            let mut writer = collection.write().with(ctx.clone()).value(&item);
            if only_meta {
                writer = writer.only_meta();
            }
            let written = if overwrite {
                writer.exec_overwrite()
            } else {
                writer.exec()
            };
            written.map(|_| json!({ "ok": true }))
        }
        Op::Read {
            count,
            after,
            ids,
            only_meta,
        } => {
            let mut reader = collection.read().with(ctx.clone()).page(count).ids(ids);
            if let Some(after) = after {
                reader = reader.after(after);
            }
            if only_meta {
                reader = reader.only_meta();
            }
            reader
                .exec()
                .map(|items| Value::Array(items.iter().map(describe).collect()))
        }
        Op::Delete { ids, only_meta } => {
            let mut deleter = collection.delete(ids).with(ctx.clone());
            if only_meta {
                deleter = deleter.only_meta();
            }
            deleter.exec().map(|_| json!({ "ok": true }))
        }
        Op::Advance { secs } => {
            store.advance(Duration::from_secs(secs));
            Ok(json!({ "ok": true }))
        }
        Op::Count => collection.count(ctx).map(|n| json!({ "count": n })),
    };

    outcome.unwrap_or_else(|e| json!({ "error": e.to_string() }))
}

fn describe(item: &ItemResult) -> Value {
    match item.raw() {
        Some(RawValue::Score(score)) => json!({ "id": item.id(), "score": score }),
        Some(RawValue::Data(_)) => match item.scan::<Value>() {
            Ok(value) => json!({ "id": item.id(), "value": value }),
            Err(e) => json!({ "id": item.id(), "error": e.to_string() }),
        },
        None => json!({
            "id": item.id(),
            "error": item.error().map(ToString::to_string),
        }),
    }
}
