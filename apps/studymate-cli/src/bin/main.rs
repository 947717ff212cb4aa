use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use studymate_answer::{BackendSelection, PromptStyle};
use studymate_cli::{describe_document, init_tracing, load_file, spinner};
use studymate_core::config::Config;
use studymate_core::types::ComposedAnswer;
use studymate_session::Session;

const USAGE: &str = "Usage:
  studymate status [--json]
  studymate ask <file> \"<question>\" [--backends OpenAI,Gemini,\"Fast AI\"] [--style brief|detailed]
  studymate rubric <file> <7|14> \"<question>\"
  studymate detailed <file> \"<question>\"
  studymate chat <file> [--backends ...] [--style brief|detailed]";

struct Options {
    positional: Vec<String>,
    selection: BackendSelection,
    style: PromptStyle,
    json: bool,
}

fn parse_args() -> (String, Options) {
    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { eprintln!("{USAGE}"); std::process::exit(1); }
    let cmd = args.remove(0);
    let mut opts = Options { positional: Vec::new(), selection: BackendSelection::All, style: PromptStyle::Brief, json: false };
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--backends" | "-b" => {
                let Some(list) = args.get(i + 1) else { eprintln!("Error: --backends requires a list"); std::process::exit(1) };
                opts.selection = BackendSelection::only(list.split(',').map(str::trim).filter(|s| !s.is_empty()));
                i += 1;
            }
            "--style" => {
                opts.style = match args.get(i + 1).map(String::as_str) {
                    Some("brief") => PromptStyle::Brief,
                    Some("detailed") => PromptStyle::Detailed,
                    _ => { eprintln!("Error: --style must be brief or detailed"); std::process::exit(1) }
                };
                i += 1;
            }
            "--json" => opts.json = true,
            "--help" | "-h" => { println!("{USAGE}"); std::process::exit(0) }
            other => opts.positional.push(other.to_string()),
        }
        i += 1;
    }
    (cmd, opts)
}

fn arg(opts: &Options, index: usize, what: &str) -> String {
    opts.positional.get(index).cloned().unwrap_or_else(|| {
        eprintln!("Error: missing {what}\n\n{USAGE}");
        std::process::exit(1)
    })
}

fn print_answer(answer: &ComposedAnswer) {
    println!("{}", answer.text.trim_end());
    let failed: Vec<String> = answer
        .responses
        .iter()
        .filter(|r| !r.success)
        .map(|r| format!("{} ({})", r.model_label, r.error.as_deref().unwrap_or("failed")))
        .collect();
    println!("\n-- answered by: {}", answer.contributors.join(", "));
    if !failed.is_empty() { println!("-- failed: {}", failed.join("; ")); }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let (cmd, opts) = parse_args();
    let mut session = Session::from_settings(settings, opts.style)?;

    match cmd.as_str() {
        "status" => {
            let status = session.status();
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("StudyMate status\n================");
                println!("Embedding: {}", status.embedding);
                println!("Retrieval: {}", if status.embedding_available { "vector search" } else { "fast mode (keyword overlap)" });
                println!("Backends:  {}", status.backends.join(", "));
            }
        }
        "ask" => {
            let file = PathBuf::from(arg(&opts, 0, "<file>"));
            let question = arg(&opts, 1, "<question>");
            let info = load_file(&mut session, &file)?;
            eprintln!("{}", describe_document(&info));
            let pb = spinner("Asking backends");
            let answer = session.ask(&question, &opts.selection).await;
            pb.finish_and_clear();
            print_answer(&answer?);
        }
        "rubric" => {
            let file = PathBuf::from(arg(&opts, 0, "<file>"));
            let marks: u8 = arg(&opts, 1, "<7|14>").parse().map_err(|_| anyhow::anyhow!("marks must be 7 or 14"))?;
            let question = arg(&opts, 2, "<question>");
            load_file(&mut session, &file)?;
            print_answer(&session.ask_rubric_value(&question, marks)?);
        }
        "detailed" => {
            let file = PathBuf::from(arg(&opts, 0, "<file>"));
            let question = arg(&opts, 1, "<question>");
            load_file(&mut session, &file)?;
            print_answer(&session.ask_detailed(&question)?);
        }
        "chat" => {
            let file = PathBuf::from(arg(&opts, 0, "<file>"));
            let info = load_file(&mut session, &file)?;
            println!("Loaded {}", describe_document(&info));
            chat(&mut session, &opts.selection).await?;
        }
        _ => { eprintln!("Unknown command: {}\n\n{USAGE}", cmd); std::process::exit(1); }
    }
    Ok(())
}

const CHAT_HELP: &str = "Type a question, or:
  :7 <question>         7-mark structured answer
  :14 <question>        14-mark comprehensive answer
  :detailed <question>  detailed answer without backends
  :load <file>          replace the loaded document
  :unload               drop the loaded document
  :history  :stats  :clear  :quit";

async fn chat(session: &mut Session, selection: &BackendSelection) -> anyhow::Result<()> {
    println!("{CHAT_HELP}");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let line = line.trim();
        if line.is_empty() { continue; }

        let (command, rest) = line.split_once(' ').map_or((line, ""), |(c, r)| (c, r.trim()));
        let result = match command {
            ":quit" | ":q" => break,
            ":help" => { println!("{CHAT_HELP}"); continue; }
            ":history" => {
                for (i, entry) in session.history().iter().enumerate() {
                    println!("{}. [{}] {} -> {}", i + 1, entry.asked_at.format("%H:%M:%S"), entry.question, entry.contributors.join(", "));
                }
                continue;
            }
            ":stats" => {
                let stats = session.stats();
                println!("Questions asked: {}\nTotal words: {}\nModels used: {}", stats.questions, stats.total_words, stats.distinct_contributors());
                for (label, count) in &stats.usage { println!("  {label}: {count} responses"); }
                continue;
            }
            ":clear" => { session.clear_history(); println!("History cleared."); continue; }
            ":load" => {
                match load_file(session, &PathBuf::from(rest)) {
                    Ok(info) => println!("Loaded {}", describe_document(&info)),
                    Err(e) => println!("Error: {e:#} (previous document kept)"),
                }
                continue;
            }
            ":unload" => {
                match session.unload() {
                    Some(info) => println!("Unloaded {}", info.name),
                    None => println!("No document loaded."),
                }
                continue;
            }
            ":7" => session.ask_rubric_value(rest, 7),
            ":14" => session.ask_rubric_value(rest, 14),
            ":detailed" => session.ask_detailed(rest),
            _ => {
                let pb = spinner("AI models processing your question");
                let answer = session.ask(line, selection).await;
                pb.finish_and_clear();
                answer
            }
        };
        match result {
            Ok(answer) => print_answer(&answer),
            Err(e) => println!("Error: {e}"),
        }
    }
    Ok(())
}
