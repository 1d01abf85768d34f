use anyhow::Context;
use arpc_client::Client;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Connects to an arpc server and either lists/describes its actors or
/// invokes a method on one of them.
#[derive(Debug, Parser)]
#[clap(name = "arpc-call", version)]
struct Cli {
    /// Server address to connect to.
    #[clap(long, default_value = arpc_server::DEFAULT_ADDR)]
    addr: std::net::SocketAddr,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every actor the server currently has loaded.
    List,
    /// Print an actor's method table.
    Describe {
        actor: String,
    },
    /// Invoke `actor.method(args, kwargs)` and print the JSON result.
    Call {
        actor: String,
        method: String,
        /// Positional arguments, each parsed as JSON (bare words are treated
        /// as JSON strings, e.g. `1`, `true`, `"hi"`, `hi`).
        #[clap(long = "arg")]
        args: Vec<String>,
        /// Keyword arguments as `name=value`, value parsed as JSON the same
        /// way `--arg` is.
        #[clap(long = "kwarg")]
        kwargs: Vec<String>,
    },
}

fn parse_json_arg(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw))
}

fn parse_kwarg(raw: &str) -> anyhow::Result<(String, Value)> {
    let (name, value) = raw.split_once('=').with_context(|| format!("kwarg `{raw}` must be of the form name=value"))?;
    Ok((name.to_string(), parse_json_arg(value)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut client = Client::connect(cli.addr).await.context("failed to connect")?;

    match cli.command {
        Command::List => {
            let mut names: Vec<&String> = client.actors().keys().collect();
            names.sort();
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        Command::Describe { actor } => {
            let proxy = client.actor(&actor).with_context(|| format!("no such actor `{actor}`"))?;
            println!("{}", serde_json::to_string_pretty(proxy.info())?);
        }
        Command::Call { actor, method, args, kwargs } => {
            let args: Vec<Value> = args.iter().map(|a| parse_json_arg(a)).collect();
            let mut kwmap = serde_json::Map::new();
            for raw in &kwargs {
                let (name, value) = parse_kwarg(raw)?;
                kwmap.insert(name, value);
            }

            let mut proxy = client.actor(&actor).with_context(|| format!("no such actor `{actor}`"))?;
            match proxy.call(&method, args, kwmap).await {
                Ok(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                Err(err) => {
                    eprintln!("error: {err}");
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_words_as_strings() {
        assert_eq!(parse_json_arg("hi"), Value::from("hi"));
    }

    #[test]
    fn parses_json_literals() {
        assert_eq!(parse_json_arg("1"), Value::from(1));
        assert_eq!(parse_json_arg("true"), Value::from(true));
        assert_eq!(parse_json_arg("\"hi\""), Value::from("hi"));
    }

    #[test]
    fn kwarg_requires_equals_sign() {
        assert!(parse_kwarg("noequals").is_err());
    }

    #[test]
    fn kwarg_splits_on_first_equals_sign() {
        let (name, value) = parse_kwarg("name=a=b").expect("parses");
        assert_eq!(name, "name");
        assert_eq!(value, Value::from("a=b"));
    }
}
