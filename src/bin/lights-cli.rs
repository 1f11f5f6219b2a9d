use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "lights-cli")]
#[command(about = "Command-line client for the lights HTTP API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080", env = "LIGHTS_URL")]
    url: String,

    #[arg(short, long, env = "BEARER_TOKEN")]
    token: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn every light on
    On,
    /// Turn every light off
    Off,
    /// Set a preset colour (red, yellow, orange, dark-red)
    Color { name: String },
    /// Set an RGB colour
    Rgb { r: i64, g: i64, b: i64 },
    /// Set brightness (0-100)
    Brightness { value: i64 },
    /// Set colour temperature in Kelvin (2000-9000)
    Colortemp { kelvin: i64 },
    /// Show per-device state
    Status,
    /// Show service health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // Redirects are part of the API's answer; show them instead of following.
    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.token))?,
    );

    let base = cli.url.trim_end_matches('/');
    let request = match cli.command {
        Commands::On => client.post(format!("{base}/lights/on")),
        Commands::Off => client.post(format!("{base}/lights/off")),
        Commands::Color { name } => client.post(format!("{base}/lights/{name}")),
        Commands::Rgb { r, g, b } => client
            .post(format!("{base}/lights/rgb"))
            .json(&json!({ "r": r, "g": g, "b": b })),
        Commands::Brightness { value } => client
            .post(format!("{base}/lights/brightness"))
            .json(&json!({ "brightness": value })),
        Commands::Colortemp { kelvin } => client
            .post(format!("{base}/lights/colortemp"))
            .json(&json!({ "temperature": kelvin })),
        Commands::Status => client.get(format!("{base}/lights/status")),
        Commands::Health => client.get(format!("{base}/health")),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if status.is_redirection() {
        eprintln!("Error: request rejected (unauthorized or unknown route) [request {request_id}]");
        std::process::exit(1);
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{text}"),
    }

    if !status.is_success() {
        eprintln!("Error: API returned status {status} [request {request_id}]");
        std::process::exit(1);
    }
    Ok(())
}
