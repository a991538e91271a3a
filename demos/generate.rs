//! Generate example
//!
//! This example demonstrates the core functionality of imagegen-dl:
//! - Reading the session token from a `.env` file
//! - Creating a generator instance
//! - Subscribing to events
//! - Generating a batch and saving it as JPEG files
//! - Picking a timed-out job up again by id
//!
//! ```bash
//! echo 'TOKEN=sess-...' > .env
//! cargo run --example generate -- "a peanut butter and jelly sandwich"
//! ```

use imagegen_dl::{
    Config, DownloadOptions, Error, Event, GenerateOptions, ImageGenerator, shutdown_on_signal,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imagegen_dl=info".into()),
        )
        .init();

    dotenvy::dotenv().ok();
    let token = std::env::var("TOKEN").map_err(|_| "TOKEN not set (add it to .env)")?;
    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "a peanut butter and jelly sandwich".to_string());

    let generator = ImageGenerator::new(token, Config::default())?;
    tokio::spawn(shutdown_on_signal(generator.clone()));

    // Subscribe to events
    let mut events = generator.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::Submitted { job_id, .. } => println!("✓ Submitted job {}", job_id),
                Event::AssetConverted { path, .. } => println!("✓ Saved {}", path.display()),
                Event::ConversionFailed { asset_id, error } => {
                    println!("✗ Could not convert {}: {}", asset_id, error)
                }
                _ => {}
            }
        }
    });

    let options = GenerateOptions {
        download: Some(DownloadOptions::new("images").with_prefix("pbj")),
        links_only: true,
        ..Default::default()
    };

    match generator.generate(&prompt, options).await {
        Ok(generation) => {
            println!("{:?}", generation.output);
            if let Some(report) = generation.download
                && !report.is_complete()
            {
                println!("Kept raw files for: {:?}", report.failed_stems());
            }
        }
        Err(Error::PollTimeout { job_id, .. }) => {
            println!("Job {} is still running, trying once more", job_id);
            let result = generator.resume(&job_id, None).await?;
            let report = generator
                .download(&result, std::path::Path::new("images"), Some("pbj"))
                .await?;
            println!("Saved {} files", report.files.len());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
