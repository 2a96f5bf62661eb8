//! calcrpc command-line entry point.
//!
//! `calcrpc serve` runs a server until Ctrl-C; `calcrpc call` performs a
//! single call and prints the result.

use std::time::Duration;

use anyhow::{Context, Result};
use calcrpc::prelude::*;
use calcrpc::DEFAULT_ADDR;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "calcrpc")]
#[command(about = "Framed arithmetic RPC over TCP")]
struct Args {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a server until interrupted
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = DEFAULT_ADDR)]
        bind: String,

        /// Seconds a session may sit idle between requests (0 = forever)
        #[arg(long, default_value_t = 60)]
        idle_timeout: u64,

        /// Seconds allowed for each read or write within a request (0 = forever)
        #[arg(long, default_value_t = 10)]
        io_timeout: u64,
    },

    /// Perform one call and print the result
    Call {
        /// Server address
        #[arg(short, long, default_value = DEFAULT_ADDR)]
        server: String,

        /// Seconds to wait for the whole call (0 = forever)
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Send only the frame bytes instead of a full zero-padded frame
        #[arg(long)]
        no_pad: bool,

        /// add, subtract, multiply or divide
        op: Operation,

        /// First operand
        #[arg(allow_negative_numbers = true)]
        a: i32,

        /// Second operand
        #[arg(allow_negative_numbers = true)]
        b: i32,
    },
}

/// Maps a seconds flag to an optional limit, with 0 meaning none.
fn limit(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match args.command {
        Command::Serve {
            bind,
            idle_timeout,
            io_timeout,
        } => {
            let server = CalcServer::builder()
                .bind(&bind)
                .session_config(SessionConfig {
                    idle_timeout: limit(idle_timeout),
                    io_timeout: limit(io_timeout),
                })
                .build()
                .await
                .with_context(|| format!("failed to start server on {bind}"))?;

            server
                .run_until(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!(error = %e, "failed to listen for Ctrl-C");
                        std::future::pending::<()>().await;
                    }
                })
                .await?;
            tracing::info!("server stopped");
        }

        Command::Call {
            server,
            timeout,
            no_pad,
            op,
            a,
            b,
        } => {
            let client = Client::new(ClientConfig {
                endpoint: server,
                timeout: limit(timeout),
                pad_to_frame: !no_pad,
            });
            let result = client
                .try_call(op, a, b)
                .await
                .with_context(|| format!("{op}({a}, {b}) failed"))?;
            if op == Operation::Divide && result == NOT_APPLICABLE {
                tracing::info!("divide by zero: server returned the not-applicable sentinel");
            }
            println!("{result}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_with_negative_operands() {
        let args = Args::try_parse_from(["calcrpc", "call", "multiply", "-4", "5"]).unwrap();
        match args.command {
            Command::Call { op, a, b, server, .. } => {
                assert_eq!(op, Operation::Multiply);
                assert_eq!((a, b), (-4, 5));
                assert_eq!(server, DEFAULT_ADDR);
            }
            other => panic!("expected Call, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_operation() {
        assert!(Args::try_parse_from(["calcrpc", "call", "modulo", "1", "2"]).is_err());
    }

    #[test]
    fn test_parse_serve_defaults() {
        let args = Args::try_parse_from(["calcrpc", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match args.command {
            Command::Serve {
                bind,
                idle_timeout,
                io_timeout,
            } => {
                assert_eq!(bind, "0.0.0.0:9000");
                assert_eq!(idle_timeout, 60);
                assert_eq!(io_timeout, 10);
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_seconds_means_no_limit() {
        assert_eq!(limit(0), None);
        assert_eq!(limit(3), Some(Duration::from_secs(3)));
    }
}
