//! relsign CLI application.
//!
//! Thin command-line front end over the relsign library: generate and rotate
//! release keys, sign release payloads, and verify signed release archives.

use clap::{Parser, Subcommand, ValueEnum};
use relsign::config::Settings;
use relsign::error::Result;
use relsign::protect::ProtectorBackend;
use relsign::release::{generate_release_keys, sign_release, verify_release, RotationPolicy};
use relsign::storage::keystore::CURRENT_KEY_NAME;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for a well-formed archive whose signature does not match.
const EXIT_VERIFICATION_FAILED: u8 = 2;

#[derive(Parser)]
#[command(name = "relsign")]
#[command(about = "Release signing toolkit: sign and verify release payloads with rotating Ed25519 keys", long_about = None)]
struct Cli {
    /// Directory holding protected private keys
    #[arg(long, global = true, env = "RELSIGN_KEY_DIR")]
    key_dir: Option<PathBuf>,

    /// How private keys are protected at rest
    #[arg(long, global = true, env = "RELSIGN_BACKEND", value_enum)]
    backend: Option<BackendArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    /// OS keyring secret plus optional password (Windows, macOS)
    Keyring,
    /// Password only, available everywhere
    Password,
}

impl From<BackendArg> for ProtectorBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Keyring => ProtectorBackend::Keyring,
            BackendArg::Password => ProtectorBackend::Password,
        }
    }
}

#[derive(clap::Args)]
struct PasswordArgs {
    /// Password protecting the private key
    #[arg(short, long, env = "RELSIGN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Prompt for the password instead of passing it on the command line
    #[arg(long, conflicts_with = "password")]
    ask_password: bool,
}

impl PasswordArgs {
    fn resolve(self, prompt: &str) -> Result<Option<String>> {
        if self.ask_password {
            return Ok(Some(rpassword::prompt_password(prompt)?));
        }
        Ok(self.password)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new keypair for the next release
    #[command(name = "generatekeys")]
    GenerateKeys {
        #[command(flatten)]
        password: PasswordArgs,

        /// Version of the previous release; its private key is archived under this name
        #[arg(short, long, value_name = "VERSION")]
        move_old: Option<String>,

        /// Discard the current private key instead of archiving it
        #[arg(long, conflicts_with = "move_old")]
        ignore_move_old: bool,

        /// Output file for the public key
        #[arg(short, long, value_name = "PUBKEY_PATH")]
        output: PathBuf,
    },

    /// Sign a payload and package it with its signature
    Sign {
        /// Payload file to sign
        #[arg(short, long)]
        input: PathBuf,

        /// Output release archive
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        password: PasswordArgs,

        /// Sign with an archived key instead of the current one
        #[arg(long, value_name = "VERSION")]
        private_key: Option<String>,
    },

    /// Verify a release archive against a public key
    Verify {
        /// Public key file
        #[arg(short, long, visible_alias = "public-key", value_name = "PUBKEY_PATH")]
        output: PathBuf,

        /// Release archive to verify
        archive: PathBuf,
    },

    /// List stored private keys
    #[command(name = "listkeys")]
    ListKeys,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` directives when set and valid, `warn` otherwise.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = Settings::resolve(cli.key_dir, cli.backend.map(Into::into));

    match cli.command {
        Commands::GenerateKeys {
            password,
            move_old,
            ignore_move_old,
            output,
        } => {
            // Decide the rotation before touching anything
            let policy = RotationPolicy::from_flags(move_old, ignore_move_old)?;
            let password = password.resolve("Enter password to protect the new key: ")?;
            handle_generate(&settings, password.as_deref(), &policy, output)
        }
        Commands::Sign {
            input,
            output,
            password,
            private_key,
        } => {
            let password = password.resolve("Enter password to unlock the key: ")?;
            handle_sign(&settings, password.as_deref(), input, output, private_key)
        }
        Commands::Verify { output, archive } => handle_verify(output, archive),
        Commands::ListKeys => handle_list(&settings),
    }
}

fn handle_generate(
    settings: &Settings,
    password: Option<&str>,
    policy: &RotationPolicy,
    output: PathBuf,
) -> Result<ExitCode> {
    let store = settings.keystore();
    let protector = settings.protector()?;

    let generated = generate_release_keys(&store, protector.as_ref(), password, policy, &output)?;

    println!("Generated new pair. New private key is now current.");
    println!(
        "Password was {}set.",
        if password.is_some() { "" } else { "not " }
    );
    if let Some(archived_as) = &generated.archived_as {
        println!("Old private key moved as {}", archived_as);
    }
    println!("New public key written to {}", output.display());
    println!("Public key: {}", hex::encode(generated.public_key));

    Ok(ExitCode::SUCCESS)
}

fn handle_sign(
    settings: &Settings,
    password: Option<&str>,
    input: PathBuf,
    output: PathBuf,
    private_key: Option<String>,
) -> Result<ExitCode> {
    let store = settings.keystore();
    let protector = settings.protector()?;

    let key_name = private_key.as_deref().unwrap_or(CURRENT_KEY_NAME);
    if private_key.is_some() {
        println!("Using archived private key (version {})", key_name);
    }

    let signed = sign_release(
        &store,
        protector.as_ref(),
        password,
        &input,
        &output,
        key_name,
    )?;

    if let Some(backup) = &signed.backup {
        println!("Moved {} to {}", output.display(), backup.display());
    }
    println!("Signed: {} ({} bytes)", signed.output.display(), signed.size);

    Ok(ExitCode::SUCCESS)
}

fn handle_verify(public_key: PathBuf, archive: PathBuf) -> Result<ExitCode> {
    if verify_release(&archive, &public_key)? {
        println!("Signature verified.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("Signature verification failed.");
        Ok(ExitCode::from(EXIT_VERIFICATION_FAILED))
    }
}

fn handle_list(settings: &Settings) -> Result<ExitCode> {
    let keys = settings.keystore().list()?;

    if keys.is_empty() {
        println!("No keys found in {}", settings.key_dir.display());
        return Ok(ExitCode::SUCCESS);
    }

    println!("Keys in {}:", settings.key_dir.display());
    println!("{:<20} {:<8} Modified", "Name", "Active");
    println!("{}", "-".repeat(50));

    for key_info in keys {
        let modified = key_info
            .modified
            .map(|time| {
                chrono::DateTime::<chrono::Local>::from(time)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_else(|| "Unknown".to_string());

        println!(
            "{:<20} {:<8} {}",
            key_info.name,
            if key_info.is_current { "yes" } else { "" },
            modified
        );
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn test_log_filter_defaults_to_warn() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(
            log_filter(Some(String::new())).max_level_hint(),
            Some(LevelFilter::WARN)
        );
    }

    #[test]
    fn test_log_filter_honours_rust_log() {
        assert_eq!(
            log_filter(Some("debug".to_string())).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
        assert_eq!(
            log_filter(Some("relsign=trace".to_string())).max_level_hint(),
            Some(LevelFilter::TRACE)
        );
    }
}
