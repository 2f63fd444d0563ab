//! Line-oriented chat session against a running server.
//!
//! Every message is language-detected as it is sent. The most recent message
//! can then be summarized (long English text only) or translated.

use anyhow::Result;
use colored::Colorize;
use parley_core::provider::SummaryLength;
use parley_core::server::DetectResponse;
use std::io::{self, BufRead, Write};

use crate::client::ParleyClient;

/// Messages at or below this many characters are not worth summarizing.
const SUMMARY_THRESHOLD: usize = 150;

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Message(&'a str),
    Summarize,
    Translate(&'a str),
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Message(line);
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or_default();
    let arg = parts.next().map(str::trim).unwrap_or_default();

    match name {
        "/summarize" => Command::Summarize,
        "/translate" if !arg.is_empty() => Command::Translate(arg),
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

fn can_summarize(text: &str, language: &str) -> bool {
    text.chars().count() > SUMMARY_THRESHOLD && language == "en"
}

struct LastMessage {
    text: String,
    detected: DetectResponse,
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!(
        "  /summarize          summarize the last message (English, over {} chars)",
        SUMMARY_THRESHOLD
    );
    println!("  /translate <code>   translate the last message, e.g. /translate es");
    println!("  /quit               leave the session");
}

/// Runs the session until EOF or `/quit`.
pub fn run(client: &ParleyClient) -> Result<()> {
    println!("{}", "parley chat. Type a message, or /help.".cyan());

    let stdin = io::stdin();
    let mut last: Option<LastMessage> = None;

    loop {
        print!("{} ", ">".green().bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Unknown(name) => {
                println!("{} unknown command {}", "!".yellow(), name);
            }
            Command::Message(text) => match client.detect(text) {
                Ok(detected) => {
                    println!(
                        "  {}",
                        format!("[{} {:.2}]", detected.language, detected.confidence).dimmed()
                    );
                    last = Some(LastMessage {
                        text: text.to_string(),
                        detected,
                    });
                }
                Err(e) => println!("{} {}", "Error:".red(), e),
            },
            Command::Summarize => match &last {
                Some(message) if can_summarize(&message.text, &message.detected.language) => {
                    match client.summarize(&message.text, SummaryLength::Medium) {
                        Ok(summary) => println!("{}\n{}", "Summary:".bold(), summary.summary),
                        Err(e) => println!("{} {}", "Error:".red(), e),
                    }
                }
                Some(_) => println!(
                    "{} only English messages longer than {} characters can be summarized",
                    "!".yellow(),
                    SUMMARY_THRESHOLD
                ),
                None => println!("{} nothing to summarize yet", "!".yellow()),
            },
            Command::Translate(target) => match &last {
                Some(message) => {
                    match client.translate(&message.text, &message.detected.language, target) {
                        Ok(result) => println!(
                            "{} {}",
                            format!("[{} -> {}]", message.detected.language, target).dimmed(),
                            result.translated_text
                        ),
                        Err(e) => println!("{} {}", "Error:".red(), e),
                    }
                }
                None => println!("{} nothing to translate yet", "!".yellow()),
            },
        }
    }

    Ok(())
}
