use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use phimask_cipher::{FieldCipher, MasterKey, SensitiveRecord};
use phimask_cli::cli::{Cli, Command};
use phimask_cli::commands;
use phimask_comprehend::{ComprehendMedicalDetector, DetectorSettings};
use phimask_core::detector::PhiDetector;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Mask { input, threshold } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let text = read_input(input.as_deref())?;
            let result = commands::mask(detector().await?, config, &text, threshold).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Unmask { entities, input } => {
            let json = read_file(&entities)?;
            let (entities, embedded_text) = commands::parse_entities(&json)?;
            let masked_text = match (input, embedded_text) {
                (Some(path), _) => read_file(&path)?,
                (None, Some(text)) => text,
                (None, None) => read_input(None)?,
            };
            let result = commands::unmask(&masked_text, &entities);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Seal {
            record_id,
            output,
            input,
            threshold,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            let cipher = FieldCipher::new(commands::master_key_from_env()?);
            let text = read_input(input.as_deref())?;
            let record =
                commands::seal(detector().await?, config, &cipher, &record_id, &text, threshold)
                    .await?;
            std::fs::write(&output, serde_json::to_string_pretty(&record)?)
                .wrap_err_with(|| format!("failed to write {}", output.display()))?;
        }
        Command::Open { record } => {
            let cipher = FieldCipher::new(commands::master_key_from_env()?);
            let record: SensitiveRecord = serde_json::from_str(&read_file(&record)?)
                .wrap_err("record file is not a sealed record")?;
            let result = commands::open(&cipher, &record)?;
            print!("{}", result.unmasked_text);
        }
        Command::Keygen => {
            println!("{}", MasterKey::generate().to_base64());
        }
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn detector() -> Result<Arc<dyn PhiDetector>> {
    let settings = DetectorSettings::from_env()?;
    Ok(Arc::new(ComprehendMedicalDetector::from_settings(&settings).await))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => read_file(path),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .wrap_err("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}
