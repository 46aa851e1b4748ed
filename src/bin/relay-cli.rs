use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Send requests through a running CORS relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "API_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay a request to TARGET and print the envelope
    Send {
        /// Upstream URL (its host must be whitelisted by the relay)
        target: String,

        /// HTTP method used for both hops
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Upstream header as name=value; sent to the relay as x-target-<name>
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Payload forwarded to the upstream
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Check whether the relay accepts the key
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert("x-api-key", HeaderValue::from_str(&cli.key)?);

    match cli.command {
        Commands::Send { target, method, headers: extra, body } => {
            for pair in &extra {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| format!("header '{}' is not name=value", pair))?;
                headers.insert(
                    HeaderName::from_bytes(format!("x-target-{}", name.trim()).as_bytes())?,
                    HeaderValue::from_str(value.trim())?,
                );
            }

            let mut payload = serde_json::Map::new();
            payload.insert("url".into(), Value::String(target));
            if let Some(body) = body {
                payload.insert("body".into(), Value::String(body));
            }

            let res = client
                .request(Method::from_bytes(method.to_uppercase().as_bytes())?, &cli.url)
                .headers(headers)
                .json(&payload)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Check => {
            let res = client.post(&cli.url).headers(headers).send().await?;
            match res.status().as_u16() {
                401 => println!("Key rejected"),
                400 => println!("Key accepted"),
                other => println!("Unexpected status {}", other),
            }
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: relay returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
