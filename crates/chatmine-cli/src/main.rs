//! chatmine — find "things to do" candidates in chat exports.

use tracing_subscriber::EnvFilter;

mod run;

fn print_help() {
    println!("chatmine — activity candidate extraction for chat exports");
    println!();
    println!("Usage: chatmine <command>");
    println!();
    println!("Commands:");
    println!("  extract <messages.json> [--config <file>] [--semantic]");
    println!("                           Run extraction, print candidates and batches as JSON");
    println!("  help                     Show this help message");
    println!();
    println!("--semantic embeds messages with the configured provider (needs OPENAI_API_KEY).");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("extract") => {
            let extract_args = match run::parse_extract_args(&args[2..]) {
                Ok(a) => a,
                Err(e) => {
                    eprintln!("{}", e);
                    eprintln!("Usage: chatmine extract <messages.json> [--config <file>] [--semantic]");
                    std::process::exit(1);
                }
            };
            let output = run::extract(&extract_args).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Some("--help" | "-h" | "help") | None => {
            print_help();
            Ok(())
        }
        Some(other) => {
            eprintln!("Unknown command: {}. Use 'chatmine help' for usage.", other);
            std::process::exit(1);
        }
    }
}
