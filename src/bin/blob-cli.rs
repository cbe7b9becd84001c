use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "blob-cli")]
#[command(about = "Client CLI for a blobstored server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3179")]
    server: String,

    /// Access password; defaults to BLOBSTORED_PASSWORD.
    #[arg(short, long, env = "BLOBSTORED_PASSWORD")]
    password: String,

    /// Target partition; empty for the main partition.
    #[arg(long, default_value = "")]
    partition: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check which blobs the server has
    Stat { refs: Vec<String> },
    /// Fetch one blob to stdout or a file
    Get {
        blob_ref: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Upload blobs given as <blobref>=<path> pairs
    Upload { blobs: Vec<String> },
    /// List blobs in reference order
    Enumerate {
        #[arg(long)]
        after: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Remove blobs (non-main partitions only)
    Remove { refs: Vec<String> },
}

fn camli_base(server: &str, partition: &str) -> String {
    let server = server.trim_end_matches('/');
    if partition.is_empty() {
        format!("{server}/camli")
    } else {
        format!("{server}/partition-{partition}/camli")
    }
}

fn blob_form(refs: &[String]) -> Vec<(String, String)> {
    let mut form = vec![("camliversion".to_string(), "1".to_string())];
    for (i, r) in refs.iter().enumerate() {
        form.push((format!("blob{}", i + 1), r.clone()));
    }
    form
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = camli_base(&cli.server, &cli.partition);

    match cli.command {
        Commands::Stat { refs } => {
            let res = client
                .post(format!("{base}/stat"))
                .basic_auth("blob-cli", Some(&cli.password))
                .form(&blob_form(&refs))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Get { blob_ref, output } => {
            let res = client.get(format!("{base}/{blob_ref}")).send().await?;
            if !res.status().is_success() {
                eprintln!("Error: server returned status {}", res.status());
                std::process::exit(1);
            }
            let bytes = res.bytes().await?;
            match output {
                Some(path) => std::fs::write(path, &bytes)?,
                None => {
                    use std::io::Write;
                    std::io::stdout().write_all(&bytes)?;
                }
            }
        }
        Commands::Upload { blobs } => {
            let mut form = reqwest::multipart::Form::new();
            for spec in &blobs {
                let Some((blob_ref, path)) = spec.split_once('=') else {
                    eprintln!("Bad upload spec {spec:?}; expected <blobref>=<path>");
                    std::process::exit(1);
                };
                let data = std::fs::read(path)?;
                form = form.part(
                    blob_ref.to_string(),
                    reqwest::multipart::Part::bytes(data),
                );
            }
            let res = client
                .post(format!("{base}/upload"))
                .basic_auth("blob-cli", Some(&cli.password))
                .multipart(form)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Enumerate { after, limit } => {
            let mut query: Vec<(String, String)> = Vec::new();
            if let Some(after) = after {
                query.push(("after".to_string(), after));
            }
            if let Some(limit) = limit {
                query.push(("limit".to_string(), limit.to_string()));
            }
            let res = client
                .get(format!("{base}/enumerate-blobs"))
                .basic_auth("blob-cli", Some(&cli.password))
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Remove { refs } => {
            let res = client
                .post(format!("{base}/remove"))
                .basic_auth("blob-cli", Some(&cli.password))
                .form(&blob_form(&refs))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: server returned status {status}");
        if !text.is_empty() {
            eprintln!("{text}");
        }
        std::process::exit(1);
    }
    match serde_json::from_str::<Value>(&text) {
        Ok(v) => println!("{}", serde_json::to_string_pretty(&v)?),
        Err(_) => println!("{text}"),
    }
    Ok(())
}
