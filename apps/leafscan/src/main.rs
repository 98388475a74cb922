use std::{path::PathBuf, process::ExitCode};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::parse_url, load_settings, AnalyzeAction, ClassificationService, ClientSettings,
    FileHandle, LifecycleController, Phase, ViewModel,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "leafscan", about = "Classify potato leaf photographs")]
struct Args {
    /// Classification endpoint, overrides config and environment.
    #[arg(long)]
    endpoint: Option<String>,
    /// Health check URL. Defaults to `/ping` on the `--endpoint` host when
    /// that flag is given.
    #[arg(long)]
    health_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick one image and classify it.
    Classify { path: PathBuf },
    /// Drop one or more images; the first one is classified.
    Drop {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Check that the classification service answers.
    Ping,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref()).context("failed to load settings")?;
    apply_overrides(&mut settings, &args)?;
    info!(
        endpoint = %settings.endpoint,
        health_url = %settings.health_url,
        "using classification endpoint"
    );

    let mut controller =
        LifecycleController::from_settings(&settings).context("failed to build http client")?;

    match args.command {
        Command::Ping => {
            return Ok(match controller.service().ping().await {
                Ok(()) => {
                    println!("service reachable at {}", settings.health_url);
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    println!("service unreachable: {err}");
                    ExitCode::FAILURE
                }
            });
        }
        Command::Classify { path } => {
            let file = FileHandle::load(&path).await?;
            controller.select_from_input(Some(file));
        }
        Command::Drop { paths } => {
            let files = load_dropped(&paths).await;
            if files.is_empty() {
                bail!("none of the dropped files could be read");
            }
            controller.select_from_drop(files);
        }
    }

    print!("{}", render(&controller.view()));
    controller.analyze();
    print!("{}", render(&controller.view()));
    let phase = controller.wait_until_settled().await;
    print!("{}", render(&controller.view()));

    Ok(if phase == Phase::Resulted {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn apply_overrides(settings: &mut ClientSettings, args: &Args) -> Result<()> {
    if let Some(endpoint) = &args.endpoint {
        settings.endpoint = parse_url("--endpoint", endpoint)?;
        if args.health_url.is_none() {
            settings.health_url = settings
                .endpoint
                .join("/ping")
                .context("failed to derive health url from --endpoint")?;
        }
    }
    if let Some(health_url) = &args.health_url {
        settings.health_url = parse_url("--health-url", health_url)?;
    }
    Ok(())
}

/// Reads every dropped path, skipping the ones that fail.
async fn load_dropped(paths: &[PathBuf]) -> Vec<FileHandle> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match FileHandle::load(path).await {
            Ok(file) => files.push(file),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "skipping unreadable file")
            }
        }
    }
    files
}

fn render(view: &ViewModel) -> String {
    let mut out = String::new();
    match &view.preview {
        None => out.push_str("drop an image or pick a file\n"),
        Some(preview) => out.push_str(&format!("preview: {preview}\n")),
    }
    if let Some(error) = &view.error {
        out.push_str(&format!("error: {error}\n"));
    }
    match view.analyze {
        AnalyzeAction::Enabled => out.push_str("[ Analyze Leaf ]\n"),
        AnalyzeAction::Busy => out.push_str("[ Processing... ]\n"),
        AnalyzeAction::Hidden => {}
    }
    if let Some(card) = &view.result {
        out.push_str(&format!(
            "{} {} ({} / {})\nconfidence score: {} [bar {}, {}]\n",
            card.style.icon.name(),
            card.label,
            card.style.background,
            card.style.text,
            card.confidence,
            card.bar_width,
            card.style.bar
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use client_core::{style_for, ResultCard};
    use shared::{domain::DiseaseLabel, protocol::ClassificationResult};

    use super::*;

    fn view(phase: Phase) -> ViewModel {
        ViewModel {
            phase,
            preview: Some("blob:leafscan/1".into()),
            drag_active: false,
            analyze: AnalyzeAction::Hidden,
            error: None,
            result: None,
        }
    }

    #[test]
    fn renders_result_card() {
        let mut view = view(Phase::Resulted);
        view.result = Some(ResultCard::from_result(&ClassificationResult::new(
            DiseaseLabel::EarlyBlight,
            0.5,
        )));

        let out = render(&view);
        assert!(out.contains("alert-triangle Early Blight"));
        assert!(out.contains("confidence score: 50.00%"));
        assert!(out.contains(style_for(&DiseaseLabel::EarlyBlight).bar));
    }

    #[test]
    fn renders_error_with_retry_action() {
        let mut view = view(Phase::Errored);
        view.error = Some("server down".into());
        view.analyze = AnalyzeAction::Enabled;

        let out = render(&view);
        assert!(out.contains("error: server down"));
        assert!(out.contains("Analyze Leaf"));
    }

    #[test]
    fn parses_drop_with_several_paths() {
        let args = Args::parse_from(["leafscan", "drop", "a.jpg", "b.jpg"]);
        let Command::Drop { paths } = args.command else {
            panic!("expected drop");
        };
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn endpoint_flag_moves_the_health_check_to_the_same_host() {
        let args =
            Args::parse_from(["leafscan", "--endpoint", "http://host:9000/predict", "ping"]);
        let mut settings = ClientSettings::default();
        apply_overrides(&mut settings, &args).expect("overrides");

        assert_eq!(settings.endpoint.as_str(), "http://host:9000/predict");
        assert_eq!(settings.health_url.as_str(), "http://host:9000/ping");
    }

    #[test]
    fn health_url_flag_wins_over_the_derived_one() {
        let args = Args::parse_from([
            "leafscan",
            "--endpoint",
            "http://host:9000/predict",
            "--health-url",
            "http://other:8080/health",
            "ping",
        ]);
        let mut settings = ClientSettings::default();
        apply_overrides(&mut settings, &args).expect("overrides");

        assert_eq!(settings.health_url.as_str(), "http://other:8080/health");
    }

    #[test]
    fn settings_are_untouched_without_flags() {
        let args = Args::parse_from(["leafscan", "ping"]);
        let mut settings = ClientSettings::default();
        apply_overrides(&mut settings, &args).expect("overrides");

        let defaults = ClientSettings::default();
        assert_eq!(settings.endpoint, defaults.endpoint);
        assert_eq!(settings.health_url, defaults.health_url);
    }

    #[tokio::test]
    async fn unreadable_dropped_files_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("leaf1.jpg");
        std::fs::write(&good, b"jpeg").expect("write");
        let paths = vec![dir.path().join("missing.png"), good, dir.path().join("gone.jpg")];

        let files = load_dropped(&paths).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name(), "leaf1.jpg");
        assert!(load_dropped(&paths[2..]).await.is_empty());
    }
}
