use anyhow::Result;
use ponder::config::Config;
use ponder::engine::{engine_installed, list_models};
use ponder::state::{ChatController, MessageKind, TranscriptUpdate};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task;
use tokio_util::sync::CancellationToken;

enum UiUpdate {
    Transcript(TranscriptUpdate),
    TurnComplete,
    Error(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    if !engine_installed(&config).await {
        eprintln!(
            "'{}' was not found on the configured search path; install it or set PONDER_ENGINE_PATH",
            config.engine_bin
        );
        return Ok(());
    }

    let models = match list_models(&config).await {
        Ok(models) => models,
        Err(error) => {
            eprintln!("could not list models: {error}");
            Vec::new()
        }
    };
    let selected = config
        .model
        .clone()
        .or_else(|| models.first().map(|entry| entry.identifier.clone()));
    let Some(model) = selected else {
        eprintln!("no models available; pull one first or set PONDER_MODEL");
        return Ok(());
    };

    if !models.is_empty() {
        println!("installed models:");
        for entry in &models {
            println!("  {}", entry.display);
        }
    }
    println!("using {model} (one prompt per line, /quit to exit)");

    let controller = Arc::new(Mutex::new(ChatController::new()));
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<UiUpdate>();
    let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel::<String>();

    let turn_controller = Arc::clone(&controller);
    let turn_config = config.clone();
    let turn_model = model.clone();
    task::spawn(async move {
        while let Some(prompt) = prompt_rx.recv().await {
            let mut controller = turn_controller.lock().await;
            let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<TranscriptUpdate>();
            let forward_tx = update_tx.clone();
            let forwarder = task::spawn(async move {
                while let Some(update) = delta_rx.recv().await {
                    let _ = forward_tx.send(UiUpdate::Transcript(update));
                }
            });

            let cancel = CancellationToken::new();
            let result = controller
                .send_message(&turn_config, &turn_model, &prompt, cancel, Some(&delta_tx))
                .await;
            drop(controller);
            drop(delta_tx);
            let _ = forwarder.await;

            match result {
                Ok(_) => {
                    let _ = update_tx.send(UiUpdate::TurnComplete);
                }
                Err(error) => {
                    let _ = update_tx.send(UiUpdate::Error(error.to_string()));
                }
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = String::new();
    let mut turn_in_progress = false;
    print_prompt();

    loop {
        tokio::select! {
            maybe_line = lines.next_line() => {
                let Some(line) = maybe_line? else {
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    print_prompt();
                    continue;
                }
                if trimmed == "/quit" {
                    break;
                }
                if turn_in_progress {
                    println!("(a turn is already in progress)");
                    continue;
                }
                turn_in_progress = true;
                printed.clear();
                let _ = prompt_tx.send(trimmed.to_string());
            }
            update = update_rx.recv() => {
                match update {
                    Some(UiUpdate::Transcript(TranscriptUpdate::PlaceholderChanged { text, .. })) => {
                        print_incremental(&mut printed, &text);
                    }
                    Some(UiUpdate::Transcript(TranscriptUpdate::PlaceholderReplaced { messages, .. })) => {
                        println!();
                        if messages.len() > 1 {
                            for message in &messages {
                                match message.kind {
                                    MessageKind::Reasoning => println!("[reasoning] {}", message.text),
                                    MessageKind::Normal => println!("{}", message.text),
                                }
                            }
                        }
                    }
                    Some(UiUpdate::Transcript(TranscriptUpdate::MessageAppended { .. })) => {}
                    Some(UiUpdate::TurnComplete) => {
                        turn_in_progress = false;
                        print_prompt();
                    }
                    Some(UiUpdate::Error(message)) => {
                        eprintln!("error: {message}");
                        turn_in_progress = false;
                        print_prompt();
                    }
                    None => break,
                }
            }
        }
    }

    Ok(())
}

fn print_prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// The live view is cumulative and can be rewritten (markers stripped, a
/// header inserted), so print the suffix when the new text extends what is
/// already on screen and restart the line otherwise.
fn print_incremental(printed: &mut String, latest: &str) {
    if let Some(suffix) = latest.strip_prefix(printed.as_str()) {
        if !suffix.is_empty() {
            print!("{suffix}");
            let _ = std::io::stdout().flush();
            printed.push_str(suffix);
        }
        return;
    }

    println!();
    print!("{latest}");
    let _ = std::io::stdout().flush();
    *printed = latest.to_string();
}
