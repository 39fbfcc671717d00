//! Kestrel CLI
//!
//! Fetches a document through a session, lays it out and prints the box
//! tree.

use anyhow::Context;
use clap::Parser;
use kestrel_browser::css::{BoxId, BoxKind, BoxTree};
use kestrel_browser::{Content, ContentType, Session, SessionConfig};
use owo_colors::OwoColorize;

/// Kestrel: fetch, style and lay out a document
#[derive(Parser, Debug)]
#[command(name = "kestrel")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Print the layout of a local file
    kestrel ./index.html

    # Lay out a page for a narrow viewport
    kestrel --width 320 https://example.com

    # Dump the box tree as JSON
    kestrel --json 'data:text/html,<p>Hello</p>'
"#)]
struct Cli {
    /// Path or URL of the document
    #[arg(value_name = "FILE|URL")]
    target: String,

    /// Viewport width in pixels
    #[arg(long, default_value_t = kestrel_browser::session::DEFAULT_VIEWPORT_WIDTH)]
    width: i32,

    /// Viewport height in pixels
    #[arg(long, default_value_t = kestrel_browser::session::DEFAULT_VIEWPORT_HEIGHT)]
    height: i32,

    /// Bytes of unused content kept in the memory cache
    #[arg(long, value_name = "BYTES", default_value_t = kestrel_browser::session::DEFAULT_CACHE_MAX_SIZE)]
    cache_size: usize,

    /// Print the box tree as JSON
    #[arg(long)]
    json: bool,

    /// Print the computed style of every box
    #[arg(long)]
    styles: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = SessionConfig {
        viewport_width: cli.width,
        viewport_height: cli.height,
        cache_max_size: cli.cache_size,
    };
    let mut session = Session::blocking(config);

    let id = session
        .load(&cli.target)
        .with_context(|| format!("failed to load '{}'", cli.target))?;
    let content = session
        .content(id)
        .context("content was released while loading")?;

    if cli.json {
        let tree = content
            .handler()
            .box_tree()
            .context("content has no box tree")?;
        println!("{}", serde_json::to_string_pretty(tree)?);
    } else {
        print_summary(content, &config);
        if let Some(tree) = content.handler().box_tree() {
            println!();
            print_box(tree, BoxTree::ROOT, 0, cli.styles);
        }
    }

    session.release(id);
    session.shutdown();
    Ok(())
}

/// Print what was loaded.
fn print_summary(content: &Content, config: &SessionConfig) {
    println!(
        "{} {} ({}, {} bytes)",
        "Loaded".green().bold(),
        content.url(),
        content.content_type(),
        content.size()
    );
    if let Some(title) = content.title() {
        println!("{} {title}", "Title:".bold());
    }
    let handler = content.handler();
    match content.content_type() {
        ContentType::Html | ContentType::TextPlain => println!(
            "{} {}x{}",
            "Viewport:".bold(),
            config.viewport_width,
            config.viewport_height
        ),
        ContentType::Css => {
            let rules = handler.stylesheet().map_or(0, |sheet| sheet.len());
            println!("{} {rules}", "Rules:".bold());
        }
        ContentType::Image => {
            if let Some((width, height)) = handler.image_size() {
                println!("{} {width}x{height}", "Size:".bold());
            }
        }
        ContentType::Other => {
            let bytes = handler.raw_data().map_or(0, <[u8]>::len);
            println!("{} {bytes} bytes kept", "Data:".bold());
        }
    }
}

/// Recursively print a box with its geometry.
fn print_box(tree: &BoxTree, id: BoxId, depth: usize, styles: bool) {
    let indent = "  ".repeat(depth);
    let layout_box = &tree[id];

    let name = match layout_box.kind {
        BoxKind::Float(side) => format!("Float({side:?})"),
        kind => format!("{kind:?}"),
    };
    let text = tree.text(id);
    let label = if text.is_empty() {
        String::new()
    } else {
        let preview: String = text.chars().take(30).collect();
        let suffix = if text.chars().count() > 30 { "..." } else { "" };
        format!(" \"{preview}{suffix}\"")
    };
    let replaced = layout_box
        .replaced
        .map(|(w, h)| format!(" replaced {w}x{h}"))
        .unwrap_or_default();

    println!(
        "{indent}{}{}{} {}",
        name.cyan(),
        label,
        replaced,
        format!(
            "x={} y={} w={} h={}",
            layout_box.x, layout_box.y, layout_box.width, layout_box.height
        )
        .dimmed()
    );
    if !layout_box.col_widths.is_empty() {
        println!("{indent}  columns: {:?}", layout_box.col_widths);
    }
    if !layout_box.float_children.is_empty() {
        println!("{indent}  floats: {:?}", layout_box.float_children);
    }
    if styles {
        println!("{indent}  {:?}", layout_box.style);
    }

    for &child in tree.children(id) {
        print_box(tree, child, depth + 1, styles);
    }
}
