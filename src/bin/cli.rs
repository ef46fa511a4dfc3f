//! Arregmatica CLI
//!
//! Command-line interface for Arregmatica operations:
//! - Writing tools (grammar, paraphrase, dictionary, essay, humanize)
//! - Word-scramble quiz and leaderboard
//! - Group chat
//! - Admin back-office
//!
//! Authenticated commands take a session token from `--token` or the
//! `ARREGMATICA_TOKEN` environment variable; get one with `login`.

use arregmatica::ai::ParaphraseMode;
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write as _};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arregmatica")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI writing tools with a social side")]
#[command(
    long_about = "Arregmatica combines AI writing tools with a word-scramble quiz,\na post feed, group chat and stories."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8088", global = true)]
    pub api_url: String,

    /// Session token (default: ARREGMATICA_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show system status
    Status,

    /// Sign in and print a session token
    Login {
        email: String,
        password: String,
    },

    /// Correct grammar and spelling
    Grammar {
        /// Text to correct
        text: String,
    },

    /// Paraphrase text
    Paraphrase {
        /// Text to rewrite
        text: String,
        /// Register: standard, formal, fluent or creative
        #[arg(short, long, default_value = "standard")]
        mode: String,
    },

    /// Look up a word
    Define {
        word: String,
    },

    /// Check an essay sentence by sentence
    Essay {
        /// Text to check; use --file to read from disk instead
        text: Option<String>,
        /// Read the essay from a file
        #[arg(short = 'F', long)]
        file: Option<PathBuf>,
    },

    /// Rewrite stiff text naturally
    Humanize {
        text: String,
    },

    /// Play a word-scramble round
    Quiz {
        /// Category: easy, medium or hard
        #[arg(short, long, default_value = "easy")]
        category: String,
    },

    /// Show the leaderboard
    Leaderboard,

    /// Show a group's messages
    Chat {
        group: String,
    },

    /// Send a message to a group
    Send {
        group: String,
        text: String,
    },

    /// Back-office operations
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Admin login, prints a token
    Login { name: String, password: String },
    /// List admin accounts
    List,
    /// Delete an admin account
    DeleteAdmin { id: String },
    /// Restrict a user account (read-only)
    Restrict { uid: String },
    /// Lift a user's restriction
    Unrestrict { uid: String },
    /// Delete a user account
    DeleteUser { uid: String },
    /// Show the usage report
    Analytics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let token = cli
        .token
        .clone()
        .or_else(|| std::env::var("ARREGMATICA_TOKEN").ok());

    match cli.command {
        Commands::Status => {
            let response = client.get(format!("{}/health", cli.api_url)).send().await;

            match response {
                Ok(resp) if resp.status().is_success() => {
                    let health: serde_json::Value = resp.json().await?;

                    println!("Arregmatica v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!(
                        "API Status: {}",
                        health["status"].as_str().unwrap_or("unknown")
                    );
                    println!("Store: {}", health["store"].as_str().unwrap_or("unknown"));
                    println!(
                        "Model gateway: {}",
                        health["model"].as_str().unwrap_or("unknown")
                    );
                    if let Some(connections) = health["websocket_connections"].as_u64() {
                        println!("WebSocket connections: {}", connections);
                    }
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime: {}", format_duration(uptime));
                    }
                }
                Ok(resp) => {
                    eprintln!("API returned error: {}", resp.status());
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Cannot connect to Arregmatica API at {}", cli.api_url);
                    eprintln!("Error: {}", e);
                    eprintln!();
                    eprintln!("Make sure the API server is running:");
                    eprintln!("  cargo run --bin arregmatica-api");
                    std::process::exit(1);
                }
            }
        }

        Commands::Login { email, password } => {
            let session = post_json(
                &client,
                &format!("{}/api/v1/auth/login", cli.api_url),
                None,
                serde_json::json!({"email": email, "password": password}),
            )
            .await?;

            println!("Signed in as @{}", session["username"].as_str().unwrap_or("?"));
            println!();
            println!("export ARREGMATICA_TOKEN={}", session["token"].as_str().unwrap_or(""));
        }

        Commands::Grammar { text } => {
            let report = post_json(
                &client,
                &format!("{}/api/v1/tools/grammar", cli.api_url),
                token.as_deref(),
                serde_json::json!({"text": text}),
            )
            .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", report["corrected"].as_str().unwrap_or(""));
                if let Some(issues) = report["issues"].as_array() {
                    for issue in issues {
                        println!(
                            "  - '{}' -> '{}'",
                            issue["original"].as_str().unwrap_or(""),
                            issue["replacement"].as_str().unwrap_or("")
                        );
                    }
                }
            }
        }

        Commands::Paraphrase { text, mode } => {
            // Validate locally so typos fail before the network call
            let mode: ParaphraseMode =
                serde_json::from_value(serde_json::Value::String(mode.to_lowercase()))
                    .map_err(|_| format!("unknown mode '{}'", mode))?;

            let reply = post_json(
                &client,
                &format!("{}/api/v1/tools/paraphrase", cli.api_url),
                token.as_deref(),
                serde_json::json!({"text": text, "mode": mode}),
            )
            .await?;
            println!("{}", reply["text"].as_str().unwrap_or(""));
        }

        Commands::Define { word } => {
            let definition = post_json(
                &client,
                &format!("{}/api/v1/tools/dictionary", cli.api_url),
                token.as_deref(),
                serde_json::json!({"word": word}),
            )
            .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&definition)?);
            } else {
                println!("{}", definition["word"].as_str().unwrap_or(&word));
                if let Some(phonetic) = definition["phonetic"].as_str() {
                    println!("  {}", phonetic);
                }
                for meaning in definition["meanings"].as_array().into_iter().flatten() {
                    println!("  [{}]", meaning["part_of_speech"].as_str().unwrap_or("?"));
                    for def in meaning["definitions"].as_array().into_iter().flatten() {
                        println!("    - {}", def.as_str().unwrap_or(""));
                    }
                }
            }
        }

        Commands::Essay { text, file } => {
            let text = match (text, file) {
                (Some(text), None) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)?,
                _ => {
                    eprintln!("Provide the essay text or --file, not both");
                    std::process::exit(1);
                }
            };

            let report = post_json(
                &client,
                &format!("{}/api/v1/tools/essay", cli.api_url),
                token.as_deref(),
                serde_json::json!({"text": text}),
            )
            .await?;

            if cli.format == "json" {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "{} sentences: {} correct ({}%), {} wrong ({}%)",
                    report["total"],
                    report["correct"],
                    report["correct_percent"],
                    report["wrong"],
                    report["wrong_percent"]
                );
                for sentence in report["sentences"].as_array().into_iter().flatten() {
                    if !sentence["correct"].as_bool().unwrap_or(true) {
                        println!(
                            "  ✗ {} ({})",
                            sentence["text"].as_str().unwrap_or(""),
                            sentence["issue"].as_str().unwrap_or("no detail")
                        );
                    }
                }
            }
        }

        Commands::Humanize { text } => {
            let reply = post_json(
                &client,
                &format!("{}/api/v1/tools/humanize", cli.api_url),
                token.as_deref(),
                serde_json::json!({"text": text}),
            )
            .await?;
            println!("{}", reply["text"].as_str().unwrap_or(""));
        }

        Commands::Quiz { category } => {
            let started = post_json(
                &client,
                &format!("{}/api/v1/quiz/start", cli.api_url),
                token.as_deref(),
                serde_json::json!({"category": category}),
            )
            .await?;

            let session_id = started["session_id"].as_str().unwrap_or("").to_string();
            let mut question = started["question"].clone();

            let stdin = std::io::stdin();
            loop {
                println!(
                    "Question {}/{}: {}",
                    question["index"].as_u64().unwrap_or(0) + 1,
                    question["total"],
                    question["scrambled"].as_str().unwrap_or("")
                );
                print!("> ");
                std::io::stdout().flush()?;

                let mut guess = String::new();
                stdin.lock().read_line(&mut guess)?;

                let outcome = post_json(
                    &client,
                    &format!("{}/api/v1/quiz/{}/answer", cli.api_url, session_id),
                    token.as_deref(),
                    serde_json::json!({"answer": guess.trim()}),
                )
                .await?;

                if outcome["correct"].as_bool().unwrap_or(false) {
                    println!("Correct!");
                } else {
                    println!(
                        "Wrong, it was {}",
                        outcome["expected"].as_str().unwrap_or("?")
                    );
                }

                if outcome["finished"].as_bool().unwrap_or(true) {
                    println!();
                    println!("Final score: {}", outcome["score"]);
                    break;
                }
                question = outcome["next"].clone();
            }
        }

        Commands::Leaderboard => {
            let response = client
                .get(format!("{}/api/v1/leaderboard", cli.api_url))
                .send()
                .await?;

            if !response.status().is_success() {
                eprintln!("Failed to fetch leaderboard: {}", response.status());
                std::process::exit(1);
            }

            let board: Vec<serde_json::Value> = response.json().await?;
            if board.is_empty() {
                println!("Nobody has played yet.");
            } else {
                println!("{:<6} {:<20} {}", "Rank", "Player", "Score");
                println!("{}", "-".repeat(36));
                for entry in board {
                    println!(
                        "{:<6} {:<20} {}",
                        entry["rank"].as_u64().unwrap_or(0),
                        entry["username"].as_str().unwrap_or("-"),
                        entry["total_score"].as_u64().unwrap_or(0)
                    );
                }
            }
        }

        Commands::Chat { group } => {
            let url = format!(
                "{}/api/v1/groups/{}/messages",
                cli.api_url,
                urlencoding::encode(&group)
            );
            let response = client.get(&url).send().await?;

            if !response.status().is_success() {
                eprintln!("Failed to fetch messages: {}", response.status());
                std::process::exit(1);
            }

            let messages: Vec<serde_json::Value> = response.json().await?;
            for message in messages {
                let sender = message["sender"].as_str().unwrap_or("?");
                let text = message["text"].as_str().unwrap_or("");
                if message["system"].as_bool().unwrap_or(false) {
                    println!("* {}", text);
                } else {
                    println!("<{}> {}", sender, text);
                }
            }
        }

        Commands::Send { group, text } => {
            post_json(
                &client,
                &format!(
                    "{}/api/v1/groups/{}/messages",
                    cli.api_url,
                    urlencoding::encode(&group)
                ),
                token.as_deref(),
                serde_json::json!({"text": text}),
            )
            .await?;
            println!("Sent to {}", group);
        }

        Commands::Admin { command } => {
            run_admin(&client, &cli.api_url, token.as_deref(), command).await?;
        }

        Commands::Config { output } => {
            let config = arregmatica::config::generate_default_config();

            match output {
                Some(path) => {
                    // Create parent directory if needed
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn run_admin(
    client: &reqwest::Client,
    api_url: &str,
    token: Option<&str>,
    command: AdminCommands,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        AdminCommands::Login { name, password } => {
            let reply = post_json(
                client,
                &format!("{}/api/v1/admin/login", api_url),
                None,
                serde_json::json!({"name": name, "password": password}),
            )
            .await?;
            println!("export ARREGMATICA_TOKEN={}", reply["token"].as_str().unwrap_or(""));
        }

        AdminCommands::List => {
            let admins = get_json(client, &format!("{}/api/v1/admin/accounts", api_url), token)
                .await?;
            println!("{:<38} {:<20} {}", "ID", "Name", "Restricted");
            println!("{}", "-".repeat(68));
            for admin in admins.as_array().into_iter().flatten() {
                println!(
                    "{:<38} {:<20} {}",
                    admin["id"].as_str().unwrap_or("-"),
                    admin["name"].as_str().unwrap_or("-"),
                    admin["restricted"].as_bool().unwrap_or(false)
                );
            }
        }

        AdminCommands::DeleteAdmin { id } => {
            delete(client, &format!("{}/api/v1/admin/accounts/{}", api_url, id), token).await?;
            println!("Deleted admin {}", id);
        }

        AdminCommands::Restrict { uid } => {
            post_json(
                client,
                &format!("{}/api/v1/admin/users/{}/restrict", api_url, uid),
                token,
                serde_json::json!({"restricted": true}),
            )
            .await?;
            println!("Restricted {}", uid);
        }

        AdminCommands::Unrestrict { uid } => {
            post_json(
                client,
                &format!("{}/api/v1/admin/users/{}/restrict", api_url, uid),
                token,
                serde_json::json!({"restricted": false}),
            )
            .await?;
            println!("Unrestricted {}", uid);
        }

        AdminCommands::DeleteUser { uid } => {
            delete(client, &format!("{}/api/v1/admin/users/{}", api_url, uid), token).await?;
            println!("Deleted account {}", uid);
        }

        AdminCommands::Analytics => {
            let report = get_json(client, &format!("{}/api/v1/admin/analytics", api_url), token)
                .await?;
            println!("Accounts: {}", report["accounts"]);
            println!("Posts: {}", report["posts"]);
            println!("Messages: {}", report["messages"]);
            println!("Stories: {}", report["stories"]);
            println!("Quiz plays: {}", report["quiz_plays"]);
            if let Some(tools) = report["tool_counts"].as_object() {
                println!("Tool usage:");
                for (tool, count) in tools {
                    println!("  {}: {}", tool, count);
                }
            }
            if let Some(top) = report["top_tool"].as_str() {
                println!("Most used tool: {}", top);
            }
        }
    }

    Ok(())
}

/// POST a JSON body, bail with the server's error text on failure
async fn post_json(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
    body: serde_json::Value,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut request = client.post(url).json(&body);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        eprintln!("Request failed ({}): {}", status, text);
        std::process::exit(1);
    }
    Ok(response.json().await?)
}

/// GET a JSON body with optional auth
async fn get_json(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        eprintln!("Request failed ({}): {}", status, text);
        std::process::exit(1);
    }
    Ok(response.json().await?)
}

/// DELETE with optional auth
async fn delete(
    client: &reqwest::Client,
    url: &str,
    token: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = client.delete(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        eprintln!("Request failed ({}): {}", status, text);
        std::process::exit(1);
    }
    Ok(())
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
