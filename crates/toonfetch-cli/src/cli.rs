use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use toonfetch_core::{
    ChromiumDriver, ConfigFile, Harvester, RequestFilter, ResolveStrategy, RunSummary,
    TargetConfig,
};

/// Crawl a cartoon listing page and download every episode's video.
#[derive(Debug, Parser)]
#[command(name = "toonfetch")]
#[command(about = "toonfetch: crawl a cartoon listing and download each episode's video", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<CliCommand>,

    /// TOML config file with one target or a `[[target]]` array.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Listing page to crawl (replaces the configured one).
    #[arg(long, global = true)]
    pub listing_url: Option<String>,

    /// Directory videos are written to.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// How the player's source is extracted.
    #[arg(long, value_enum, global = true)]
    pub strategy: Option<StrategyArg>,

    /// Run the browser without a window.
    #[arg(long, global = true)]
    pub headless: bool,

    /// Print the run summary as JSON on stdout.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the effective config as TOML and exit.
    PrintConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    FramePolling,
    PlayAndWatch,
}

impl From<StrategyArg> for ResolveStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::FramePolling => ResolveStrategy::FramePolling,
            StrategyArg::PlayAndWatch => ResolveStrategy::PlayAndWatch,
        }
    }
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let targets = self.targets()?;

        match self.command {
            Some(CliCommand::PrintConfig) => {
                let file = ConfigFile { target: targets };
                let text = toml::to_string_pretty(&file).context("failed to render config")?;
                print!("{}", text);
            }
            None => {
                let mut summaries = Vec::with_capacity(targets.len());
                for target in targets {
                    summaries.push(harvest(target).await?);
                }
                if self.json {
                    let json = serde_json::to_string_pretty(&summaries)
                        .context("failed to serialize run summary")?;
                    println!("{}", json);
                } else {
                    for summary in &summaries {
                        print_summary(summary);
                    }
                }
            }
        }
        Ok(())
    }

    /// Load the configured targets and apply command-line overrides.
    pub fn targets(&self) -> Result<Vec<TargetConfig>> {
        let mut targets = match &self.config {
            Some(path) => {
                ConfigFile::load(path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
                    .target
            }
            None => vec![TargetConfig::default()],
        };

        if self.listing_url.is_some() && targets.len() > 1 {
            bail!("--listing-url cannot be used with a config holding several targets");
        }

        for target in &mut targets {
            self.apply_overrides(target);
            target.validate().context("invalid target config")?;
        }
        Ok(targets)
    }

    fn apply_overrides(&self, target: &mut TargetConfig) {
        if let Some(url) = &self.listing_url {
            target.listing_url = url.clone();
        }
        if let Some(dir) = &self.output_dir {
            target.output_dir = dir.clone();
        }
        if let Some(strategy) = self.strategy {
            target.resolver.strategy = strategy.into();
        }
        if self.headless {
            target.browser.headless = true;
        }
    }
}

/// One browser per target, shut down even when the run fails.
async fn harvest(target: TargetConfig) -> Result<RunSummary> {
    let listing_url = target.listing_url.clone();
    let filter = RequestFilter::new(&target.request_filter);
    let driver = ChromiumDriver::launch(&target.browser, filter)
        .await
        .context("failed to launch browser")?;

    let harvester = Harvester::new(driver, target).context("failed to set up harvester")?;
    let result = harvester.run().await;

    if let Err(e) = harvester.into_driver().shutdown().await {
        tracing::warn!("browser shutdown failed: {}", e);
    }

    result.with_context(|| format!("failed to crawl {}", listing_url))
}

fn print_summary(summary: &RunSummary) {
    println!("{}", summary.listing_url);
    println!(
        "  {} episodes, {} downloaded ({} bytes), {} skipped",
        summary.episodes_found,
        summary.downloaded.len(),
        summary.total_bytes(),
        summary.skipped.len()
    );
    for file in &summary.downloaded {
        println!("  saved   {}", file.path.display());
    }
    for skipped in &summary.skipped {
        println!("  skipped {} ({:?})", skipped.link.url, skipped.reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_config() {
        let cli = Cli::try_parse_from(["toonfetch"]).unwrap();
        let targets = cli.targets().unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].listing_url, TargetConfig::default().listing_url);
        assert!(!targets[0].browser.headless);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_overrides_are_applied() {
        let cli = Cli::try_parse_from([
            "toonfetch",
            "--listing-url",
            "https://toons.example/serie/x/",
            "--output-dir",
            "out",
            "--strategy",
            "play-and-watch",
            "--headless",
            "--json",
        ])
        .unwrap();
        let targets = cli.targets().unwrap();

        assert_eq!(targets[0].listing_url, "https://toons.example/serie/x/");
        assert_eq!(targets[0].output_dir, PathBuf::from("out"));
        assert_eq!(targets[0].resolver.strategy, ResolveStrategy::PlayAndWatch);
        assert!(targets[0].browser.headless);
        assert!(cli.json);
    }

    #[test]
    fn test_invalid_listing_url_is_rejected() {
        let cli = Cli::try_parse_from(["toonfetch", "--listing-url", "not a url"]).unwrap();
        assert!(cli.targets().is_err());
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["toonfetch", "--strategy", "guess"]).is_err());
    }

    #[test]
    fn test_print_config_subcommand() {
        let cli = Cli::try_parse_from(["toonfetch", "print-config", "--headless"]).unwrap();
        assert!(matches!(cli.command, Some(CliCommand::PrintConfig)));
        assert!(cli.targets().unwrap()[0].browser.headless);
    }

    #[test]
    fn test_config_file_targets() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[target]]
            listing_url = "https://a.example/list/"

            [[target]]
            listing_url = "https://b.example/list/"
            output_dir = "b-videos"
            "#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::try_parse_from(["toonfetch", "--config", &path, "--output-dir", "all"]).unwrap();
        let targets = cli.targets().unwrap();
        assert_eq!(targets.len(), 2);
        assert!(targets.iter().all(|t| t.output_dir == PathBuf::from("all")));

        let cli = Cli::try_parse_from([
            "toonfetch",
            "--config",
            &path,
            "--listing-url",
            "https://c.example/",
        ])
        .unwrap();
        assert!(cli.targets().is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli::try_parse_from(["toonfetch", "--config", "/nonexistent/toonfetch.toml"]).unwrap();
        let err = cli.targets().unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load config"));
    }
}
