use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use secrecy::SecretString;
use serde_json::Value;

use api_gateway::config::TotpConfig;
use api_gateway::security::TotpVerifier;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "TOTP helper for the gated CRUD API", long_about = None)]
struct Cli {
    /// Shared TOTP secret.
    #[arg(short, long, env = "REST_TOTP_SECRET", hide_env_values = true)]
    secret: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current code
    Code,
    /// Call the CRUD API with a fresh code
    Call {
        /// HTTP method (GET, POST, PATCH, DELETE, ...)
        method: String,
        /// Path below the CRUD mount, e.g. /users
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
        #[arg(short, long, default_value = "http://localhost:8080/api/rest")]
        url: String,
        #[arg(long, default_value = "totp")]
        header: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let totp = TotpVerifier::from_config(SecretString::new(cli.secret), &TotpConfig::default());

    match cli.command {
        Commands::Code => {
            println!("{}", totp.generate());
        }
        Commands::Call { method, path, data, url, header } => {
            let method: Method = method.to_uppercase().parse()?;
            let mut headers = HeaderMap::new();
            headers.insert(
                reqwest::header::HeaderName::from_bytes(header.as_bytes())?,
                HeaderValue::from_str(&totp.generate())?,
            );

            let mut request = reqwest::Client::new()
                .request(method, format!("{}/{}", url.trim_end_matches('/'), path.trim_start_matches('/')))
                .headers(headers);
            if let Some(data) = data {
                let body: Value = serde_json::from_str(&data)?;
                request = request
                    .header(CONTENT_TYPE, "application/json")
                    .body(serde_json::to_vec(&body)?);
            }

            print_response(request.send().await?).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
