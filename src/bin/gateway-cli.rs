use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the Bolt gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and database health
    Health,
    /// Run a Cypher statement
    Query {
        cypher: String,
        /// Parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,
    },
    /// Run a diagnostic probe
    Probe {
        #[arg(value_enum)]
        kind: ProbeKind,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProbeKind {
    Bolt,
    Tls,
    Driver,
}

impl ProbeKind {
    fn path(self) -> &'static str {
        match self {
            ProbeKind::Bolt => "/debug/bolt",
            ProbeKind::Tls => "/debug/tls",
            ProbeKind::Driver => "/debug/driver",
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Query { cypher, params } => {
            let params: Value = match params {
                Some(raw) => serde_json::from_str(&raw)?,
                None => json!({}),
            };
            client
                .post(format!("{}/query", base))
                .json(&json!({ "cypher": cypher, "params": params }))
                .send()
                .await?
        }
        Commands::Probe { kind } => client.get(format!("{}{}", base, kind.path())).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
        Ok(())
    } else {
        eprintln!("Error: gateway returned status {}", status);
        if !body.is_empty() {
            eprintln!("{}", body);
        }
        std::process::exit(1);
    }
}
