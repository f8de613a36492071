//! spandump - Highlight a Markdown file and dump the resulting spans
//!
//! A small inspection tool for debugging the engine without a GUI host:
//! runs a full highlight pass over a file and prints every block's spans,
//! either human-readable or as JSON.
//!
//! Usage:
//!   spandump [--profile edit|view] [--json] <file.md>

use log::info;
use marklight::{Error, HighlightEngine, ProfileKind, Result};
use std::env;
use std::fs;

const USAGE: &str = "usage: spandump [--profile edit|view] [--json] <file.md>";

struct Options {
    profile: ProfileKind,
    json: bool,
    path: String,
}

fn parse_args(args: &[String]) -> Result<Options> {
    let mut profile = ProfileKind::Editing;
    let mut json = false;
    let mut path = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--profile" => {
                profile = match iter.next().map(String::as_str) {
                    Some("edit") => ProfileKind::Editing,
                    Some("view") => ProfileKind::Viewing,
                    other => {
                        return Err(Error::Application(format!(
                            "unknown profile {:?}\n{}",
                            other, USAGE
                        )))
                    }
                };
            }
            "--json" => json = true,
            other if path.is_none() && !other.starts_with('-') => {
                path = Some(other.to_string());
            }
            other => {
                return Err(Error::Application(format!(
                    "unexpected argument {:?}\n{}",
                    other, USAGE
                )))
            }
        }
    }

    let path = path.ok_or_else(|| Error::Application(USAGE.to_string()))?;
    Ok(Options { profile, json, path })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let options = parse_args(&args)?;

    let text = fs::read_to_string(&options.path)?;
    let lines: Vec<&str> = text.lines().collect();

    info!(
        "Highlighting {} ({} blocks, {:?} profile)",
        options.path,
        lines.len(),
        options.profile
    );

    let engine = HighlightEngine::new(options.profile);
    let blocks = engine.highlight_document(&lines);

    if options.json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }

    for (index, (line, block)) in lines.iter().zip(&blocks).enumerate() {
        println!("{:>4}  {}", index, line);
        for span in &block.spans {
            let background = span
                .background
                .map(|b| format!(" on {:?}", b))
                .unwrap_or_default();
            println!(
                "      {:>4}..{:<4} {:?}{} ({:?})",
                span.start,
                span.start + span.length,
                span.style,
                background,
                span.group
            );
        }
        if block.continues_construct {
            println!("      ~ construct continues");
        }
    }

    Ok(())
}
