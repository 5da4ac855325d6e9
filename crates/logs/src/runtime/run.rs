//! Run — command-line surface and command dispatch.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing::{info, warn};

use super::boot::credentials;
use crate::conf::LogsConfig;
use crate::error::LogError;
use crate::frame::parse_text_frame;
use crate::stream::{LogStreamConnector, SessionEvent, StreamKind};
use crate::tail::{
    AppInstance, LiveTransport, RecentLogsClient, TailReader, TailWindow, DEFAULT_STAGING_POLLS,
};

#[derive(Parser, Debug)]
#[command(name = "cf-logs", version, about = "Stream and tail application logs")]
pub struct Cli {
    /// Configuration file (defaults to $CF_LOGS_CONFIG_FILE or /etc/cf-logs/cf-logs.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Follow live output of an application until interrupted
    Stream {
        app_id: String,
    },

    /// Print the buffered recent output of an application
    Recent {
        app_id: String,
        /// Use the HTTP multipart endpoint instead of the WebSocket dump
        #[arg(long)]
        http: bool,
    },

    /// Read a byte window of an instance file
    File {
        app_id: String,
        instance: u32,
        path: String,
        /// First byte (inclusive); omit to read the last --end bytes
        #[arg(long)]
        start: Option<u64>,
        /// Last byte (inclusive), or suffix length when --start is omitted
        #[arg(long)]
        end: Option<u64>,
    },

    /// Follow staging output until it stops growing
    Staging {
        url: String,
        #[arg(long, default_value_t = DEFAULT_STAGING_POLLS)]
        max_polls: usize,
    },

    /// Print every file in an instance's logs directory
    Logs {
        app_id: String,
        instance: u32,
    },

    /// Decode textual frames, one JSON document per line
    Decode {
        file: PathBuf,
    },
}

pub async fn run(command: Command, config: LogsConfig) -> anyhow::Result<()> {
    match command {
        Command::Stream { app_id } => stream(&config, &app_id).await,
        Command::Recent { app_id, http } => recent(&config, &app_id, http).await,
        Command::File {
            app_id,
            instance,
            path,
            start,
            end,
        } => {
            let window = TailWindow::new(AppInstance::new(app_id, instance), path, start, end)?;
            match tail_reader(&config)?.read(&window).await? {
                Some(content) => print!("{}", content),
                None => info!("No content available for {}", window.file_path()),
            }
            Ok(())
        }
        Command::Staging { url, max_polls } => {
            let lines = tail_reader(&config)?
                .collect_staging_logs(&url, max_polls)
                .await
                .context("reading staging output")?;
            for line in lines {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Logs { app_id, instance } => {
            let logs = tail_reader(&config)?
                .list_logs(&AppInstance::new(app_id, instance))
                .await
                .context("reading instance logs")?;
            for (name, content) in logs {
                println!("==> {} <==", name);
                println!("{}", content);
            }
            Ok(())
        }
        Command::Decode { file } => decode(&file).await,
    }
}

fn tail_reader(config: &LogsConfig) -> anyhow::Result<TailReader<LiveTransport>> {
    let transport = LiveTransport::new(config, credentials(config))?;
    Ok(TailReader::new(
        transport,
        config.controller_url.clone(),
        config.tail_read_timeout(),
    ))
}

async fn stream(config: &LogsConfig, app_id: &str) -> anyhow::Result<()> {
    let connector = LogStreamConnector::new(config, credentials(config))?;
    let (session, mut events) = connector
        .events(app_id, StreamKind::Tail)
        .await
        .with_context(|| format!("opening log stream for {}", app_id))?;

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(SessionEvent::Message(entry)) => println!("{}", entry),
                Some(SessionEvent::Error(LogError::Protocol(e))) => warn!("Skipping malformed frame: {}", e),
                Some(SessionEvent::Error(e)) => return Err(e).context("log stream failed"),
                Some(SessionEvent::Complete) | None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, closing log stream");
                session.cancel();
            }
        }
    }

    let snapshot = session.metrics().snapshot();
    info!(
        "Stream finished: {} entries, {} malformed frames, {} keep-alives",
        snapshot.entries_delivered, snapshot.protocol_errors, snapshot.keep_alive_ticks
    );
    Ok(())
}

async fn recent(config: &LogsConfig, app_id: &str, http: bool) -> anyhow::Result<()> {
    let entries = if http {
        let transport = LiveTransport::new(config, credentials(config))?;
        RecentLogsClient::new(transport, config.logging_http_endpoint())
            .recent(app_id)
            .await
    } else {
        LogStreamConnector::new(config, credentials(config))?
            .recent(app_id)
            .await
    }
    .with_context(|| format!("reading recent logs for {}", app_id))?;

    for entry in entries {
        println!("{}", entry);
    }
    Ok(())
}

async fn decode(file: &Path) -> anyhow::Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    for (number, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_text_frame(line) {
            Ok(entry) => println!("{}", entry),
            Err(e) => warn!("Line {}: {}", number + 1, e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Command {
        Cli::try_parse_from(args).unwrap().command
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_file_window() {
        assert_eq!(
            parse(&["cf-logs", "file", "app-1", "2", "logs/stdout.log", "--start", "5", "--end", "10"]),
            Command::File {
                app_id: "app-1".to_string(),
                instance: 2,
                path: "logs/stdout.log".to_string(),
                start: Some(5),
                end: Some(10),
            }
        );
    }

    #[test]
    fn test_parse_staging_default_polls() {
        assert_eq!(
            parse(&["cf-logs", "staging", "https://stager/log?x=1"]),
            Command::Staging {
                url: "https://stager/log?x=1".to_string(),
                max_polls: DEFAULT_STAGING_POLLS,
            }
        );
    }

    #[test]
    fn test_parse_recent_http_and_config() {
        let cli = Cli::try_parse_from(["cf-logs", "recent", "app-1", "--http", "-c", "/tmp/x.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/x.toml")));
        assert_eq!(
            cli.command,
            Command::Recent {
                app_id: "app-1".to_string(),
                http: true
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_app() {
        assert!(Cli::try_parse_from(["cf-logs", "stream"]).is_err());
    }

    #[tokio::test]
    async fn test_decode_skips_bad_lines() {
        let path = std::env::temp_dir().join(format!("cf-logs-decode-{}.jsonl", std::process::id()));
        let good = r#"{"appId":"a","sourceLabel":"APP","sourceIndex":"0","timestamp":1000000,"messageType":"OUT","message":"hi"}"#;
        std::fs::write(&path, format!("{}\n\nnot json\n", good)).unwrap();

        let result = decode(&path).await;
        std::fs::remove_file(&path).unwrap();
        assert!(result.is_ok());
    }
}
