//! Arena Client CLI Tool
//!
//! Minimal line client for playing against a running arena by hand.
//!
//! Usage:
//!   cargo run --bin arena-client -- --name alice
//!   cargo run --bin arena-client -- --host 10.0.0.5 --port 1977 --name bob
//!
//! Everything typed on stdin is sent as-is; server output is printed as it
//! arrives. EOF on stdin closes the connection.

use anyhow::{Context, Result};
use awale_arena::utils::is_valid_name;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[derive(Parser)]
#[command(name = "arena-client")]
#[command(about = "Interactive line client for the Awalé arena")]
struct Cli {
    /// Server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short, long, default_value = "1977")]
    port: u16,

    /// Display name sent as the first line
    #[arg(short, long)]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if !is_valid_name(&cli.name) {
        eprintln!("❌ '{}' is not a valid name (1-31 printable characters, no spaces)", cli.name);
        std::process::exit(1);
    }

    let address = format!("{}:{}", cli.host, cli.port);
    let stream = TcpStream::connect(&address)
        .await
        .with_context(|| format!("Failed to connect to {address}"))?;
    println!("🔌 Connected to {}", address);

    let (read_half, mut write_half) = stream.into_split();
    write_half
        .write_all(format!("{}\n", cli.name).as_bytes())
        .await?;

    let mut server_lines = BufReader::new(read_half).lines();
    let mut input_lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = server_lines.next_line() => match line? {
                Some(line) => println!("{line}"),
                None => {
                    println!("🛑 Server closed the connection");
                    break;
                }
            },
            input = input_lines.next_line() => match input? {
                Some(input) => {
                    write_half.write_all(format!("{input}\n").as_bytes()).await?;
                }
                None => {
                    write_half.shutdown().await?;
                    break;
                }
            },
        }
    }

    Ok(())
}
