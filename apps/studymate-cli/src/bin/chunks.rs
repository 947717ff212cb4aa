use std::env;
use std::path::PathBuf;

use studymate_answer::PromptStyle;
use studymate_cli::{describe_document, init_tracing, load_file};
use studymate_core::config::Config;
use studymate_session::{ContextPlan, Session};

fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut file = None; let mut limit = None; let mut query = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--limit" | "-n" => { match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) { Some(n) => { limit = Some(n); i += 1; } None => { eprintln!("Error: --limit requires a number"); std::process::exit(1); } } }
        "--query" | "-q" => { match args.get(i + 1) { Some(q) => { query = Some(q.clone()); i += 1; } None => { eprintln!("Error: --query requires text"); std::process::exit(1); } } }
        _ if !args[i].starts_with('-') => file = Some(PathBuf::from(&args[i])), _ => {} } i += 1; }
    let Some(file) = file else {
        eprintln!("Usage: studymate-chunks <file> [--limit N] [--query \"<question>\"]");
        std::process::exit(1);
    };

    let mut session = Session::from_settings(config.settings()?, PromptStyle::default())?;
    let info = load_file(&mut session, &file)?;
    println!("Chunk inspector\n===============");
    println!("{}", describe_document(&info));
    let Some(doc) = session.document() else { return Ok(()) };
    println!("Index: {} ({} vectors)", doc.index().mode_name(), doc.index().count());

    for (pos, chunk) in doc.chunks().iter().enumerate().take(limit.unwrap_or(usize::MAX)) {
        println!("\n[{pos}] {} chars\n{chunk}", chunk.chars().count());
    }

    if let Some(query) = query {
        let context = session.context(&query, ContextPlan::Backends)?;
        println!("\nContext for \"{query}\":\n{context}");
    }
    Ok(())
}
