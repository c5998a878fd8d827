use anyhow::Result;
use clap::{Parser, Subcommand};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "CLI client for the minimal ledger node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long)]
        amount: f64,
    },
    /// Mine a block with the pending transactions
    Mine,
    /// Print the node's chain
    Chain,
    /// Register a peer with the node
    Register {
        /// Peer URL (e.g. http://127.0.0.1:8081)
        #[arg(long)]
        address: String,
        /// Free-form note stored with the peer
        #[arg(long, default_value = "")]
        comment: String,
    },
    /// Ask the node to resolve conflicts against its peers
    Resolve,
}

#[derive(Serialize)]
struct Tx {
    sender: String,
    recipient: String,
    amount: f64,
}

#[derive(Serialize)]
struct NodeIn {
    address: String,
    comment: String,
}

#[derive(Serialize)]
struct Nodes {
    nodes: Vec<NodeIn>,
}

impl Command {
    fn request(self, client: &Client, node: &str) -> RequestBuilder {
        let node = node.trim_end_matches('/');
        match self {
            Command::Submit {
                sender,
                recipient,
                amount,
            } => client
                .post(format!("{node}/transactions/new"))
                .json(&Tx {
                    sender,
                    recipient,
                    amount,
                }),
            Command::Mine => client.get(format!("{node}/mine")),
            Command::Chain => client.get(format!("{node}/chain")),
            Command::Register { address, comment } => client
                .post(format!("{node}/nodes/register"))
                .json(&Nodes {
                    nodes: vec![NodeIn { address, comment }],
                }),
            Command::Resolve => client.get(format!("{node}/nodes/resolve")),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    let client = Client::new();
    let req = cli.cmd.request(&client, &cli.node).build()?;
    debug!(method = %req.method(), url = %req.url(), "sending request");
    let res = client.execute(req).await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {}", status);
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
