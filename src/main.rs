//! Hexnote demo binary
//!
//! Imports an Intel HEX file, builds the comment tree over the document's
//! annotations, and prints the resulting outline using only the public
//! navigation API.

use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hexnote::annotations::{CommentStore, CommentTree, RangeKey};
use hexnote::formats::ihex::load_hex_file;

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hexnote=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = match std::env::args().nth(1) {
        Some(path) => path,
        None => bail!("usage: hexnote <file.hex>"),
    };

    tracing::info!("Hexnote v{}", env!("CARGO_PKG_VERSION"));

    let doc = load_hex_file(&path).with_context(|| format!("Failed to import {}", path))?;

    let mut tree = CommentTree::new();
    let watcher = tree.watch();
    tree.refresh(doc.comments());
    tracing::debug!("Initial refresh published {} events", watcher.drain().len());

    println!("{}", doc.title().unwrap_or("(untitled)"));
    println!(
        "{} bytes, {} mapping segments, {} comments",
        doc.buffer_length(),
        doc.virt_mappings().len(),
        doc.comments().len()
    );

    print_outline(&tree, doc.comments(), None, 0)?;
    Ok(())
}

/// Walk the forest depth-first, printing one row per node
fn print_outline(
    tree: &CommentTree,
    store: &CommentStore,
    parent: Option<&RangeKey>,
    depth: usize,
) -> anyhow::Result<()> {
    for key in tree.children_of(parent)? {
        println!(
            "{}{}  {}",
            "  ".repeat(depth),
            key,
            tree.display_value(store, &key)
        );
        print_outline(tree, store, Some(&key), depth + 1)?;
    }
    Ok(())
}
