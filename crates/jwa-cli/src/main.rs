//! jwa: JOSE symmetric encryption CLI
//!
//! Commands:
//!   algorithms                      - list symmetric algorithms and whether they are enabled
//!   encrypt [--alg ID] [INPUT]      - encrypt a file (or stdin) and print a JSON envelope
//!   decrypt [ENVELOPE]              - decrypt a JSON envelope and write the plaintext
//!   config show                     - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use jwa_core::config::JwaConfig;
use jwa_core::EncodedAead;
use jwa_crypto::{SuiteRegistry, SymmetricAlgorithm};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "jwa",
    version,
    about = "JOSE symmetric AEAD toolkit",
    long_about = "jwa: encrypt and decrypt with A*CBC-HS* and A*GCM through the suite registry"
)]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "JWA_CONFIG", default_value = "/etc/jwa/config.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "JWA_LOG")]
    log: Option<String>,

    /// Log format; overrides the config file
    #[arg(long, env = "JWA_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, PartialEq, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List symmetric algorithms
    Algorithms,

    /// Encrypt a file under a freshly generated key
    ///
    /// Prints a JSON envelope {alg, ciphertext, iv, key, tag} with base64url fields.
    Encrypt {
        /// Algorithm identifier (default: suite.default_algorithm)
        #[arg(long, short = 'a')]
        alg: Option<String>,
        /// Additional authenticated data (UTF-8)
        #[arg(long, default_value = "")]
        aad: String,
        /// Plaintext file (default: stdin)
        input: Option<PathBuf>,
        /// Envelope output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Decrypt a JSON envelope produced by `encrypt`
    Decrypt {
        /// Additional authenticated data (UTF-8), must match the one used to encrypt
        #[arg(long, default_value = "")]
        aad: String,
        /// Envelope file (default: stdin)
        input: Option<PathBuf>,
        /// Plaintext output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let (config, from_file) = load_config(&cli.config)?;

    init_logging(&cli, &config);
    if !from_file {
        warn!(
            "config file not found: {}  (using defaults)",
            cli.config.display()
        );
    }

    match cli.command {
        Commands::Algorithms => cmd_algorithms(&config),
        Commands::Encrypt { alg, aad, input, output } => {
            cmd_encrypt(&config, alg.as_deref(), &aad, input.as_deref(), output.as_deref())
        }
        Commands::Decrypt { aad, input, output } => {
            cmd_decrypt(&config, &aad, input.as_deref(), output.as_deref())
        }
        Commands::Config { action: ConfigAction::Show } => {
            cmd_config_show(&config, &cli.config, from_file)
        }
    }
}

/// Returns the config and whether it came from a file.
fn load_config(path: &Path) -> Result<(JwaConfig, bool)> {
    if path.exists() {
        let config = JwaConfig::from_file(path)
            .with_context(|| format!("loading config: {}", path.display()))?;
        Ok((config, true))
    } else {
        Ok((JwaConfig::default(), false))
    }
}

fn init_logging(cli: &Cli, config: &JwaConfig) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = cli.log.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let format = log_format(cli.log_format.clone(), &config.logging.format);

    // stdout carries envelopes and plaintext, so logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// The flag wins; otherwise the configured name, falling back to text when unrecognised.
fn log_format(flag: Option<LogFormat>, configured: &str) -> LogFormat {
    flag.unwrap_or_else(|| LogFormat::from_str(configured, true).unwrap_or(LogFormat::Text))
}

// ── I/O helpers ───────────────────────────────────────────────────────────────

fn read_input(input: Option<&Path>) -> Result<Vec<u8>> {
    match input {
        Some(path) => {
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(output: Option<&Path>, data: &[u8]) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, data).with_context(|| format!("writing {}", path.display()))
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(data).context("writing stdout")?;
            stdout.flush().context("flushing stdout")
        }
    }
}

fn render_envelope(envelope: &EncodedAead, pretty: bool) -> Result<String> {
    let mut json = if pretty {
        serde_json::to_string_pretty(envelope)
    } else {
        serde_json::to_string(envelope)
    }
    .context("serializing envelope")?;
    json.push('\n');
    Ok(json)
}

// ── `jwa algorithms` ──────────────────────────────────────────────────────────

fn cmd_algorithms(config: &JwaConfig) -> Result<()> {
    print!("{}", algorithms_table(config)?);
    Ok(())
}

fn algorithms_table(config: &JwaConfig) -> Result<String> {
    use std::fmt::Write as _;

    let registry = SuiteRegistry::from_config(&config.suite)?;
    let enabled = registry.symmetric_algorithms();

    let mut table = format!("{:<15} {:>4} {:>3} {:>4}  STATUS\n", "ALGORITHM", "KEY", "IV", "TAG");
    for alg in SymmetricAlgorithm::ALL {
        let status = if enabled.contains(&alg.as_str()) {
            "enabled"
        } else {
            "disabled"
        };
        writeln!(
            table,
            "{:<15} {:>4} {:>3} {:>4}  {status}",
            alg.as_str(),
            alg.key_len(),
            alg.iv_bits() / 8,
            alg.tag_len(),
        )?;
    }
    Ok(table)
}

// ── `jwa encrypt` ─────────────────────────────────────────────────────────────

fn cmd_encrypt(
    config: &JwaConfig,
    alg: Option<&str>,
    aad: &str,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let alg: SymmetricAlgorithm = alg
        .unwrap_or(&config.suite.default_algorithm)
        .parse()
        .context("choosing algorithm")?;
    let registry = SuiteRegistry::from_config(&config.suite)?;
    let encrypter = registry.symmetric(alg.as_str())?;

    let plaintext = read_input(input)?;
    let result = encrypter
        .encrypt(&plaintext, aad.as_bytes())
        .with_context(|| format!("{alg} encryption failed"))?;
    info!(alg = %alg, bytes = plaintext.len(), "encrypted");

    let envelope = result.encode(alg.as_str());
    write_output(output, render_envelope(&envelope, config.output.pretty)?.as_bytes())
}

// ── `jwa decrypt` ─────────────────────────────────────────────────────────────

fn cmd_decrypt(
    config: &JwaConfig,
    aad: &str,
    input: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let raw = read_input(input)?;
    let envelope: EncodedAead = serde_json::from_slice(&raw).context("parsing envelope JSON")?;
    let decoded = envelope.decode()?;

    let registry = SuiteRegistry::from_config(&config.suite)?;
    let decrypter = registry.symmetric(&decoded.alg)?;
    let plaintext = decrypter
        .decrypt(
            &decoded.ciphertext,
            aad.as_bytes(),
            &decoded.iv,
            &decoded.key,
            &decoded.tag,
        )
        .with_context(|| format!("{} decryption failed", decoded.alg))?;
    info!(alg = %decoded.alg, bytes = plaintext.len(), "decrypted");

    write_output(output, &plaintext)
}

// ── `jwa config show` ─────────────────────────────────────────────────────────

fn cmd_config_show(config: &JwaConfig, config_path: &Path, from_file: bool) -> Result<()> {
    print!("{}", config_report(config, config_path, from_file)?);
    Ok(())
}

fn config_report(config: &JwaConfig, config_path: &Path, from_file: bool) -> Result<String> {
    let header = if from_file {
        format!("# Configuration from: {}", config_path.display())
    } else {
        format!("# Configuration: defaults (no file at {})", config_path.display())
    };
    let rendered = config.to_toml().context("serializing config to TOML")?;
    Ok(format!("{header}\n\n{rendered}"))
}
