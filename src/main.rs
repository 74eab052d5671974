use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use doibib::config::{
    default_config_path, find_config_file, get_config, load_config, ApiKeys, Config,
    LoggingConfig,
};
use doibib::lookup::resolve_input;
use doibib::models::parse_bibtex;
use doibib::ui::{
    has_stored_preference, initial_theme, Appearance, ArticleView, Controller, CopyOutcome,
    EnvAppearance, Renderer, Spinner, Status, SubmitOutcome, Theme, Timings,
};
use doibib::utils::{FilePreferenceStore, SystemClipboard};
use doibib::Lookup;
use std::io::{IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// doibib - BibTeX records and abstracts for any DOI
#[derive(Parser, Debug)]
#[command(name = "doibib")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fetch the BibTeX record and abstract for a DOI", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (can be used multiple times for more verbosity: -v, -vv)
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Show all environment variables
    #[arg(long)]
    env: bool,

    /// Runs the interactive shell when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Fetch the BibTeX record and abstract for a DOI
    #[command(alias = "f")]
    Fetch {
        /// Text containing a DOI, such as a bare DOI or a doi.org link
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,

        /// Copy the BibTeX record to the clipboard
        #[arg(long, short)]
        copy: bool,

        /// Print only the BibTeX record
        #[arg(long, conflicts_with = "json")]
        raw: bool,

        /// Print the record, parsed fields and abstract as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the DOI found in some text
    #[command(alias = "x")]
    Extract {
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,
    },

    /// Summarise a local BibTeX file without network access
    Parse {
        /// BibTeX file, or `-` for stdin
        file: PathBuf,

        /// Print parsed fields and summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or change the display theme
    Theme {
        #[command(subcommand)]
        action: ThemeCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Interactive session: enter DOIs, copy records, switch themes
    #[command(alias = "repl")]
    Shell,
}

#[derive(Subcommand, Debug)]
enum ThemeCommands {
    /// Show the active theme and where it comes from
    Show,

    /// Switch between light and dark and remember the choice
    Toggle,

    /// Forget the stored choice and follow the environment
    Reset,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Target path (default: the user config directory)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long, short)]
        force: bool,
    },
}

/// Print all available environment variables
fn print_env_vars() {
    println!("doibib - Environment Variables");
    println!();
    println!("API Keys:");
    println!("  SEMANTIC_SCHOLAR_API_KEY          API key for Semantic Scholar (higher rate limits)");
    println!();
    println!("Configuration (nested keys use a double underscore):");
    println!("  DOIBIB_ENDPOINTS__DOI_BASE               BibTeX endpoint (default: https://doi.org)");
    println!("  DOIBIB_ENDPOINTS__SEMANTIC_SCHOLAR_BASE  Semantic Scholar Graph API base");
    println!("  DOIBIB_ENDPOINTS__CROSSREF_BASE          Crossref REST API base");
    println!("  DOIBIB_HTTP__TIMEOUT_SECS                Request timeout (default: 30)");
    println!("  DOIBIB_HTTP__MAILTO                      Contact address sent in the User-Agent");
    println!("  DOIBIB_UI__COOLDOWN_SECS                 Shell cooldown after a fetch (default: 10)");
    println!("  DOIBIB_LOGGING__LEVEL                    Log level (default: info)");
    println!("  DOIBIB_LOGGING__JSON                     Emit JSON logs (default: false)");
    println!();
    println!("Appearance:");
    println!("  DOIBIB_COLOR_SCHEME               Preferred theme: dark or light");
    println!("  COLORFGBG                         Terminal colors, used when the above is unset");
    println!();
    println!("Other Settings:");
    println!("  RUST_LOG                          Rust logging level (e.g., debug, info, warn, error)");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.env {
        print_env_vars();
        return Ok(());
    }

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let mut config = match &config_path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => get_config()?,
    };
    if let Some(timeout) = cli.timeout {
        config.http.timeout_secs = timeout;
    }

    init_tracing(cli.verbose, cli.quiet, &config.logging);
    if let Some(path) = &config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match cli.command.unwrap_or(Commands::Shell) {
        Commands::Fetch {
            input,
            copy,
            raw,
            json,
        } => fetch(&config, &input.join(" "), copy, raw, json, cli.quiet).await,
        Commands::Extract { input } => {
            let doi = resolve_input(&input.join(" "))?;
            println!("{}", doi);
            Ok(())
        }
        Commands::Parse { file, json } => parse(&file, json),
        Commands::Theme { action } => theme(&config, action),
        Commands::Config { action } => config_command(&config, config_path.as_deref(), action),
        Commands::Shell => shell(&config).await,
    }
}

fn init_tracing(verbose: u8, quiet: bool, logging: &LoggingConfig) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("doibib={}", level)));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout can be piped
    if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_controller(config: &Config) -> Result<Controller> {
    let lookup = Lookup::from_config(config)?;
    Ok(Controller::new(
        lookup,
        Box::new(SystemClipboard::new()),
        Box::new(FilePreferenceStore::new()),
        EnvAppearance.prefers_dark(),
        Timings::from_config(&config.ui),
    ))
}

fn spinner(quiet: bool, msg: &str) -> Spinner {
    if quiet || !std::io::stderr().is_terminal() {
        Spinner::hidden()
    } else {
        Spinner::new(msg)
    }
}

async fn fetch(
    config: &Config,
    input: &str,
    copy: bool,
    raw: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    let mut controller = build_controller(config)?;

    let progress = spinner(quiet, "Fetching BibTeX...");
    let outcome = controller.submit(input).await;
    progress.clear();

    let result = match outcome {
        SubmitOutcome::Fetched(result) => result,
        SubmitOutcome::Rejected(e) => return Err(e.into()),
        SubmitOutcome::Failed(e) => return Err(e.into()),
        SubmitOutcome::Busy => bail!("Fetching is cooling down, try again shortly"),
    };

    let copied = if copy {
        Some(controller.copy_output())
    } else {
        None
    };

    if json || raw {
        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("{}", result.record.bibtex.trim_end());
        }
        // stdout carries data only; the copy status goes to stderr
        if let (Some(outcome), false) = (&copied, quiet) {
            let status = match outcome {
                CopyOutcome::Copied => Status::Success,
                _ => Status::Error,
            };
            let renderer = Renderer::new(controller.theme(), std::io::stderr().is_terminal());
            eprintln!("{}", renderer.status(status, &controller.surface().copy.status));
        }
    } else {
        let renderer = Renderer::for_stdout(controller.theme());
        println!("{}", renderer.results(&controller.surface()));
    }

    if matches!(copied, Some(CopyOutcome::Copied)) {
        hold_clipboard(&mut controller, quiet)?;
    }
    Ok(())
}

/// Stay alive until another program owns the copied BibTeX, where
/// the platform drops clipboard contents with their owner
fn hold_clipboard(controller: &mut Controller, quiet: bool) -> Result<()> {
    if !controller.needs_clipboard_handoff() {
        return Ok(());
    }
    if !quiet {
        let renderer = Renderer::new(controller.theme(), std::io::stderr().is_terminal());
        eprintln!(
            "{}",
            renderer.status(
                Status::Info,
                "Keeping the BibTeX on the clipboard until it is replaced (Ctrl-C to stop)"
            )
        );
    }
    tokio::task::block_in_place(|| controller.wait_for_clipboard_handoff())?;
    Ok(())
}

fn read_input(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
    }
}

fn parse(file: &Path, json: bool) -> Result<()> {
    let fields = parse_bibtex(&read_input(file)?);
    let summary = fields.summary();

    if json {
        let value = serde_json::json!({
            "fields": fields,
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        let prefs = FilePreferenceStore::new();
        let theme = initial_theme(&prefs, EnvAppearance.prefers_dark());
        let renderer = Renderer::for_stdout(theme);
        println!("{}", renderer.article(&ArticleView::from_summary(&summary)));
    }
    Ok(())
}

fn theme(config: &Config, action: ThemeCommands) -> Result<()> {
    let mut controller = build_controller(config)?;
    let theme = match action {
        ThemeCommands::Show => {
            let origin = if has_stored_preference(&FilePreferenceStore::new()) {
                "stored preference"
            } else {
                "environment"
            };
            println!("{} ({})", controller.theme(), origin);
            return Ok(());
        }
        ThemeCommands::Toggle => controller.toggle_theme()?,
        ThemeCommands::Reset => controller.reset_theme(EnvAppearance.prefers_dark())?,
    };
    let renderer = Renderer::for_stdout(theme);
    println!("{}", renderer.status(Status::Success, &format!("Theme: {}", theme)));
    Ok(())
}

fn config_command(config: &Config, loaded_from: Option<&Path>, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let mut shown = config.clone();
            if shown.api_keys.semantic_scholar.is_some() {
                shown.api_keys.semantic_scholar = Some("********".to_string());
            }
            match loaded_from {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# Defaults and environment"),
            }
            print!("{}", toml::to_string_pretty(&shown)?);
        }
        ConfigCommands::Init { path, force } => {
            let target = match path.or_else(default_config_path) {
                Some(target) => target,
                None => bail!("No configuration directory available; pass a path"),
            };
            if target.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    target.display()
                );
            }
            // Keys stay in the environment, not on disk
            let defaults = Config {
                api_keys: ApiKeys {
                    semantic_scholar: None,
                },
                ..Config::default()
            };
            defaults.save(&target)?;
            let renderer = Renderer::for_stdout(Theme::Light);
            println!(
                "{}",
                renderer.status(Status::Success, &format!("Wrote {}", target.display()))
            );
        }
    }
    Ok(())
}

const SHELL_HELP: &str = "Enter a DOI or any text containing one. \
Commands: :copy, :theme, :show, :help, :quit";

async fn shell(config: &Config) -> Result<()> {
    let mut controller = build_controller(config)?;
    let interactive = std::io::stdin().is_terminal();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    if interactive {
        println!("{}", SHELL_HELP);
    }

    loop {
        if interactive {
            print!("doibib> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            ":q" | ":quit" | ":exit" => break,
            ":h" | ":help" => {
                println!("{}", SHELL_HELP);
                continue;
            }
            ":show" => {}
            ":c" | ":copy" => {
                controller.copy_output();
            }
            ":t" | ":theme" => {
                if let Err(e) = controller.toggle_theme() {
                    tracing::warn!(error = %e, "failed to save theme preference");
                }
            }
            input => {
                let progress = spinner(!interactive, "Fetching BibTeX...");
                let outcome = controller.submit(input).await;
                progress.clear();
                if let SubmitOutcome::Busy = outcome {
                    let renderer = Renderer::for_stdout(controller.theme());
                    let label = controller.surface().trigger.label;
                    println!("{}", renderer.status(Status::Warning, &label));
                    continue;
                }
            }
        }

        let renderer = Renderer::for_stdout(controller.theme());
        println!("{}\n", renderer.surface(&controller.surface()));
    }
    hold_clipboard(&mut controller, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::parse_from(["doibib"]);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        assert!(cli.config.is_none());
        assert!(cli.timeout.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::parse_from(["doibib", "-v"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["doibib", "-vv"]);
        assert_eq!(cli.verbose, 2);

        let cli = Cli::parse_from(["doibib", "--verbose"]);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_cli_quiet_flag() {
        let cli = Cli::parse_from(["doibib", "-q"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_cli_config_and_timeout() {
        let cli = Cli::parse_from([
            "doibib",
            "--config",
            "/path/to/config.toml",
            "--timeout",
            "5",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.toml")));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_cli_fetch_joins_words() {
        let cli = Cli::parse_from(["doibib", "fetch", "see", "10.1000/xyz123", "--copy"]);
        match cli.command {
            Some(Commands::Fetch {
                input,
                copy,
                raw,
                json,
            }) => {
                assert_eq!(input.join(" "), "see 10.1000/xyz123");
                assert!(copy);
                assert!(!raw);
                assert!(!json);
            }
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_fetch_alias_and_json() {
        let cli = Cli::parse_from(["doibib", "f", "10.1000/xyz123", "--json"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Fetch { json: true, .. })
        ));
    }

    #[test]
    fn test_cli_fetch_raw_conflicts_with_json() {
        let result = Cli::try_parse_from(["doibib", "fetch", "10.1000/x", "--raw", "--json"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_fetch_requires_input() {
        assert!(Cli::try_parse_from(["doibib", "fetch"]).is_err());
    }

    #[test]
    fn test_cli_parse_command() {
        let cli = Cli::parse_from(["doibib", "parse", "-", "--json"]);
        match cli.command {
            Some(Commands::Parse { file, json }) => {
                assert_eq!(file, PathBuf::from("-"));
                assert!(json);
            }
            _ => panic!("Expected Parse command"),
        }
    }

    #[test]
    fn test_cli_theme_commands() {
        let cli = Cli::parse_from(["doibib", "theme", "toggle"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Theme {
                action: ThemeCommands::Toggle
            })
        ));

        let cli = Cli::parse_from(["doibib", "theme", "reset"]);
        assert!(matches!(
            cli.command,
            Some(Commands::Theme {
                action: ThemeCommands::Reset
            })
        ));
    }

    #[test]
    fn test_cli_config_init() {
        let cli = Cli::parse_from(["doibib", "config", "init", "/tmp/doibib.toml", "--force"]);
        match cli.command {
            Some(Commands::Config {
                action: ConfigCommands::Init { path, force },
            }) => {
                assert_eq!(path, Some(PathBuf::from("/tmp/doibib.toml")));
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_shell_alias() {
        let cli = Cli::parse_from(["doibib", "repl"]);
        assert!(matches!(cli.command, Some(Commands::Shell)));
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.bib");
        std::fs::write(&path, "@article{x, title = {Foo}}").unwrap();
        assert_eq!(read_input(&path).unwrap(), "@article{x, title = {Foo}}");
        assert!(read_input(&dir.path().join("missing.bib")).is_err());
    }
}
