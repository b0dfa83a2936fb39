//! Line-oriented front end for the chat engine. Reads commands from stdin
//! and prints the transcript after every action; the background poll keeps
//! running in between.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use client::api::FileSelection;
use client::config::Config;
use client::transcript::{NodeBody, TranscriptNode};
use client::{init_tracing, ChatEngine, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let config = Config::load(&config_path);

    let log_dir = config
        .logging
        .directory
        .clone()
        .unwrap_or_else(|| "logs".to_string());
    let _ = std::fs::create_dir_all(&log_dir);
    init_tracing(Path::new(&log_dir));
    info!("console client starting against {}", config.server.base_url);

    let engine = Arc::new(ChatEngine::new(config));
    let poll = engine.clone().spawn_polling();

    println!(
        "Connected to {}. Type a message, '/upload <path> [caption]', or '/quit'.",
        engine.config().server.base_url
    );
    println!("An empty line refreshes the transcript.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line.trim().to_string(),
            Ok(None) | Err(_) => break,
        };

        if line == "/quit" {
            break;
        } else if let Some(rest) = line.strip_prefix("/upload") {
            upload(&engine, rest.trim()).await;
        } else if !line.is_empty() {
            engine.set_input(line);
            if engine.send_text().await == SubmitOutcome::Rejected {
                println!("(nothing sent: empty message or a submission is still running)");
            }
        } else {
            engine.poll_once().await;
        }

        print_transcript(&engine.nodes());
    }

    poll.cancel();
    info!("console client exiting");
}

async fn upload(engine: &Arc<ChatEngine>, args: &str) {
    let (path, caption) = match args.split_once(' ') {
        Some((path, caption)) => (path, caption.trim()),
        None => (args, ""),
    };
    if path.is_empty() {
        println!("usage: /upload <path> [caption]");
        return;
    }

    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("cannot read {path}: {e}");
            return;
        }
    };
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());

    engine.select_file(FileSelection { name, bytes });
    engine.set_input(caption);
    if engine.upload_image().await == SubmitOutcome::Rejected {
        println!("(upload rejected: a submission is still running)");
    }
}

fn print_transcript(nodes: &[TranscriptNode]) {
    println!("----------------------------------------");
    for node in nodes {
        let label = node.class.as_str();
        match &node.body {
            NodeBody::Text(text) => {
                let source = node
                    .source
                    .as_deref()
                    .map(|s| format!(" ({s})"))
                    .unwrap_or_default();
                println!("[{label}] {text}{source}");
            }
            NodeBody::Image {
                url,
                caption,
                failed,
            } => {
                let status = if *failed { " (failed to load)" } else { "" };
                let caption = caption.as_deref().unwrap_or("");
                println!("[{label}] [image: {url}]{status} {caption}");
            }
            NodeBody::Indicator(text) => println!("... {text}"),
        }
        if let Some(reasoning) = &node.reasoning {
            for line in reasoning.lines() {
                println!("    | {line}");
            }
        }
    }
    println!("----------------------------------------");
}
