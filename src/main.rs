use std::path::PathBuf;

mod ai;
mod app;
mod config;
mod error;
mod models;
mod render;
mod select;
mod services;

use app::DigestPipeline;
use config::Config;
use error::Result;
use render::{render_html, render_text};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (info and up by default, to stderr)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    // Check for --html <path> (write the HTML email body to a file)
    let html_path = args
        .iter()
        .position(|a| a == "--html")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from);

    // Check for --json (print the digest as JSON instead of text)
    let json_output = args.iter().any(|a| a == "--json");

    // Load configuration
    let config = Config::load()?;

    let pipeline = DigestPipeline::new(&config)?;
    let digest = pipeline.run().await?;

    if let Some(path) = html_path {
        std::fs::write(&path, render_html(&digest))?;
        tracing::info!(path = %path.display(), "wrote HTML digest");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&digest)?);
        return Ok(());
    }

    print!("{}", render_text(&digest));
    Ok(())
}

fn print_usage() {
    println!("karakeep-digest - assemble a reading digest from your Karakeep bookmarks");
    println!();
    println!("Usage: karakeep-digest [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --html <path>   Write the digest as an HTML email body to <path>");
    println!("  --json          Print the digest as JSON on stdout");
    println!("  -h, --help      Show this help");
    println!();
    println!(
        "Configuration is read from {}",
        Config::config_path().display()
    );
}
