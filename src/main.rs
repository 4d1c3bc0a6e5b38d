#![deny(missing_docs)]

//! # Route OpenAPI CLI
//!
//! Supported Commands:
//! - `generate`: Writes the OpenAPI document for a route table.
//! - `serve`: Serves the document on the route table's `OpenAPIHandler` routes.

use clap::{Parser, Subcommand};
use route_openapi::server::{build_server, spec_routes};
use route_openapi::{generate, validate, AppError, AppResult, Application, OutputFormat};
use std::fs;
use std::net::TcpListener;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Route table + handler sources -> OpenAPI")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate the OpenAPI document.
    Generate(GenerateArgs),
    /// Serve the OpenAPI document over HTTP.
    Serve(ServeArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// Path to the route table (YAML).
    #[clap(long, env = "ROUTE_OPENAPI_CONFIG")]
    config: PathBuf,

    /// Route table entry whose kwargs provide `info` and `servers`.
    #[clap(long)]
    key: Option<String>,

    /// Output file. Prints to stdout when omitted.
    #[clap(long, short)]
    output: Option<PathBuf>,

    /// Output format.
    #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Fail when the document is not a structurally valid OpenAPI document.
    #[clap(long)]
    strict: bool,
}

#[derive(clap::Args, Debug)]
struct ServeArgs {
    /// Path to the route table (YAML).
    #[clap(long, env = "ROUTE_OPENAPI_CONFIG")]
    config: PathBuf,

    /// Address to bind.
    #[clap(long, env = "ROUTE_OPENAPI_BIND", default_value = "127.0.0.1:8080")]
    bind: String,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_generate(args: &GenerateArgs) -> AppResult<()> {
    let app = Application::load(&args.config)?;
    let document = generate(&app, args.key.as_deref())?;

    if let Err(error) = validate(&document) {
        if args.strict {
            return Err(error);
        }
        warn!(%error, "document does not match the OpenAPI 3.0 schema");
    }

    let rendered = args.format.render(&document)?;
    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            info!(output = %path.display(), "wrote OpenAPI document");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn run_serve(args: &ServeArgs) -> AppResult<()> {
    let app = Application::load(&args.config)?;
    if spec_routes(&app) == 0 {
        return Err(AppError::Config(format!(
            "{} has no OpenAPIHandler route to serve",
            args.config.display()
        )));
    }

    let listener = TcpListener::bind(&args.bind)?;
    actix_web::rt::System::new().block_on(async move {
        let server = build_server(listener, Arc::new(app))?;
        server.await
    })?;
    Ok(())
}

fn main() -> AppResult<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Generate(args) => run_generate(args),
        Commands::Serve(args) => run_serve(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/lib.rs"), "pub fn ping(n: i32) {}\n").unwrap();
        let config = dir.path().join("app.yaml");
        fs::write(
            &config,
            "url:\n  ping: {pattern: /ping, handler: FunctionHandler, kwargs: {function: ping}}\n",
        )
        .unwrap();
        let output = dir.path().join("openapi.yaml");

        let cli = Cli::parse_from([
            "route-openapi",
            "generate",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
            "--format",
            "yaml",
            "--strict",
        ]);
        let Commands::Generate(args) = &cli.command else {
            panic!("expected generate");
        };
        run_generate(args).unwrap();

        let written: serde_json::Value =
            serde_yaml::from_str(&fs::read_to_string(output).unwrap()).unwrap();
        assert_eq!(written["paths"]["/ping"]["get"]["parameters"][0]["name"], "n");
    }

    #[test]
    fn test_serve_requires_openapi_route() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("app.yaml");
        fs::write(&config, "url:\n  ping: {pattern: /ping, handler: FunctionHandler}\n").unwrap();
        let args = ServeArgs {
            config,
            bind: "127.0.0.1:0".to_string(),
        };
        assert!(matches!(run_serve(&args), Err(AppError::Config(_))));
    }
}
