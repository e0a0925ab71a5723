use anyhow::{anyhow, Result};
use clap::{Arg, ArgAction, Command};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use transcript_qa::chapters::Chapter;
use transcript_qa::llm::{create_llm, ChatMessage};
use transcript_qa::qa::{answer_question, generate_chapters, QaOptions};
use transcript_qa::{Config, LocalStore, TranscriptService};

#[tokio::main]
async fn main() -> Result<()> {
    let matches = Command::new("Transcript QA")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Ask grounded questions about a recording and browse its chapter timeline")
        .arg(
            Arg::new("source")
                .value_name("SOURCE")
                .help("Local transcript file: plain text or a JSON segments array")
                .required(true),
        )
        .arg(
            Arg::new("video")
                .long("video")
                .value_name("URL_OR_ID")
                .help("Associated YouTube URL/ID used for description chapter markers"),
        )
        .arg(
            Arg::new("question")
                .short('q')
                .long("question")
                .value_name("TEXT")
                .help("Single-turn mode; omit to start an interactive chat"),
        )
        .arg(
            Arg::new("chapters")
                .long("chapters")
                .help("Print the chapter timeline instead of chatting")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("top-k")
                .long("top-k")
                .value_name("NUM")
                .help("How many transcript chunks to retrieve per question"),
        )
        .arg(
            Arg::new("chunk-words")
                .long("chunk-words")
                .value_name("NUM")
                .help("Words per retrieval chunk"),
        )
        .arg(
            Arg::new("max-chapters")
                .long("max-chapters")
                .value_name("NUM")
                .help("Upper bound on generated chapters"),
        )
        .arg(
            Arg::new("history-turns")
                .long("history-turns")
                .value_name("NUM")
                .help("Previous Q/A turns to include in prompts"),
        )
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .value_name("URL")
                .help("OpenAI-compatible base URL"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .value_name("NAME")
                .help("Model name for the selected provider"),
        )
        .arg(
            Arg::new("api-token")
                .long("api-token")
                .value_name("TOKEN")
                .help("API token (prefer the env var over this flag)"),
        )
        .arg(
            Arg::new("token-env")
                .long("token-env")
                .value_name("VAR")
                .default_value("LLM_API_TOKEN")
                .help("Environment variable to read the API token from"),
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Local data directory for the transcript cache"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let verbose = matches.get_flag("verbose");
    let filter = if verbose {
        "transcript_qa=debug,info"
    } else {
        "transcript_qa=info,warn"
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });

    if let Some(top_k) = matches.get_one::<String>("top-k") {
        config.retrieval.top_k = top_k.parse()?;
    }
    if let Some(words) = matches.get_one::<String>("chunk-words") {
        config.chunking.words_per_chunk = words.parse()?;
    }
    if let Some(max) = matches.get_one::<String>("max-chapters") {
        config.chapters.max_chapters = max.parse()?;
    }
    if let Some(turns) = matches.get_one::<String>("history-turns") {
        config.retrieval.history_turns = turns.parse()?;
    }
    if let Some(base_url) = matches.get_one::<String>("base-url") {
        config.llm.base_url = base_url.clone();
    }
    if let Some(model) = matches.get_one::<String>("model") {
        config.llm.model = model.clone();
    }
    if let Some(data_dir) = matches.get_one::<String>("data-dir") {
        config.storage.data_dir = PathBuf::from(data_dir);
    }
    config.validate()?;

    let source = matches.get_one::<String>("source").cloned().unwrap_or_default();
    let video = matches.get_one::<String>("video").map(String::as_str);
    let question = matches.get_one::<String>("question");
    let show_chapters = matches.get_flag("chapters");

    let store = LocalStore::new(&config.storage.data_dir).await?;
    let service = TranscriptService::new(config.clone(), store);
    let payload = service.load_or_create(&source, video).await?;

    info!(
        "🎙️ Loaded transcript {} ({} chunks, {} words)",
        payload.source_label,
        payload.chunks.len(),
        payload.total_words
    );

    if show_chapters {
        let chapters = if payload.chapters.is_empty() {
            let token = resolve_api_token(&matches)?;
            config.llm.api_token = Some(token);
            let llm = create_llm(&config.llm)?;
            generate_chapters(llm.as_ref(), &payload.chunks, config.chapters.max_chapters).await?
        } else {
            payload.chapters.clone()
        };

        print_chapters(&chapters);
        return Ok(());
    }

    let token = resolve_api_token(&matches)?;
    config.llm.api_token = Some(token);
    let llm = create_llm(&config.llm)?;
    let options = QaOptions {
        top_k: config.retrieval.top_k,
        history_turns: config.retrieval.history_turns,
    };

    if let Some(question) = question {
        let outcome =
            answer_question(llm.as_ref(), &payload.chunks, question, &[], &options).await?;
        println!("{}", outcome.answer);
        print_citations(&outcome.citations);
        return Ok(());
    }

    run_chat_loop(llm.as_ref(), &payload.chunks, &options).await
}

/// Interactive chat loop over stdin, keeping rolling history.
async fn run_chat_loop(
    llm: &dyn transcript_qa::Llm,
    chunks: &[transcript_qa::TranscriptChunk],
    options: &QaOptions,
) -> Result<()> {
    println!("Interactive mode started. Type your question, or 'exit'/'quit' to stop.");

    let mut history: Vec<ChatMessage> = Vec::new();
    let stdin = std::io::stdin();

    loop {
        print!("\nYou: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!("\nExiting.");
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "exit" | "quit") {
            println!("Exiting.");
            break;
        }

        match answer_question(llm, chunks, question, &history, options).await {
            Ok(outcome) => {
                println!("\nAssistant: {}", outcome.answer);
                print_citations(&outcome.citations);
                history.push(ChatMessage::user(question));
                history.push(ChatMessage::assistant(outcome.answer));
            }
            Err(e) => {
                warn!("Answer failed: {}", e);
                println!("\nAssistant: (request failed: {})", e);
            }
        }
    }

    Ok(())
}

fn print_chapters(chapters: &[Chapter]) {
    if chapters.is_empty() {
        println!("(No chapters available)");
        return;
    }

    for chapter in chapters {
        println!("{}  {}", chapter.start_label, chapter.title);
    }
}

fn print_citations(citations: &[transcript_qa::RankedChunk]) {
    for citation in citations {
        println!(
            "  [chunk-{}] [{}-{}]",
            citation.chunk_id, citation.start_label, citation.end_label
        );
    }
}

/// Resolve the API token: flag, then the configured env var, then
/// OPENAI_API_KEY. Missing tokens fail before any network call.
fn resolve_api_token(matches: &clap::ArgMatches) -> Result<String> {
    if let Some(token) = matches.get_one::<String>("api-token") {
        let token = token.trim();
        if !token.is_empty() {
            return Ok(token.to_string());
        }
    }

    let token_env = matches
        .get_one::<String>("token-env")
        .cloned()
        .unwrap_or_else(|| "LLM_API_TOKEN".to_string());
    if let Ok(token) = std::env::var(&token_env) {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    if let Ok(token) = std::env::var("OPENAI_API_KEY") {
        if !token.trim().is_empty() {
            return Ok(token.trim().to_string());
        }
    }

    Err(anyhow!(
        "Missing API token. Set --api-token, or export {}, or export OPENAI_API_KEY.",
        token_env
    ))
}
