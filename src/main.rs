use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
mod auth;
use directories::ProjectDirs;
use hushdrop::crypto::{keys, sealed};
use hushdrop::{KeyPair, SealedArtifact, ShareSecret, Storage, validate_message};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HUSHDROP_LOG";

#[derive(Debug, Parser)]
#[command(name = "hushdrop")]
#[command(
    version,
    about = "Send one message, end-to-end encrypted, with nothing left behind."
)]
struct Cli {
    /// Path to your key-pair file
    #[arg(long, global = true, value_name = "PATH", env = "HUSHDROP_KEY")]
    key: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Creates a key pair and writes it to the key file
    Keygen {
        /// Derive the key pair from a passphrase (at least 12 characters)
        #[arg(long, default_value_t = false)]
        passphrase: bool,

        /// Replace an existing key file
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Copy the public key to the clipboard
        #[arg(long, default_value_t = false)]
        copy: bool,
    },

    /// Prints the public key of the key file
    Pubkey {
        /// Copy the public key to the clipboard
        #[arg(long, default_value_t = false)]
        copy: bool,
    },

    /// Encrypts a message to a recipient's public key
    #[command(arg_required_else_help = true)]
    Encrypt {
        /// Recipient's public key (base64)
        #[arg(long, value_name = "PUBLIC_KEY")]
        to: String,

        /// Write the encrypted message here instead of stdout
        #[arg(long, value_name = "PATH")]
        out: Option<PathBuf>,

        /// Replace an existing output file
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Message text; read from stdin when omitted
        message: Option<String>,
    },

    /// Decrypts an encrypted message file with your key file
    #[command(arg_required_else_help = true)]
    Decrypt { artifact: PathBuf },

    /// Generates a random share code for a stored message
    Code {
        /// Copy the code to the clipboard and clear it afterwards
        #[arg(long, default_value_t = false)]
        copy: bool,

        /// Seconds before the clipboard is cleared
        #[arg(long, value_name = "SECS", default_value_t = 30)]
        clear_after: u64,
    },
}

fn default_key_path() -> Result<PathBuf> {
    let project_dirs =
        ProjectDirs::from("", "", "hushdrop").context("could not determine platform directories")?;

    Ok(project_dirs.data_dir().join("private_key.json"))
}

fn resolve_key_storage(path: Option<PathBuf>) -> Result<Storage> {
    match path {
        Some(p) => Ok(Storage::new(p)),
        None => default_key_path().map(Storage::new),
    }
}

fn load_key_pair(storage: &Storage) -> Result<KeyPair> {
    if !storage.exists() {
        anyhow::bail!(
            "key file {} does not exist; run `hushdrop keygen` first",
            storage.path().display()
        );
    }
    let text = zeroize::Zeroizing::new(storage.load()?);
    KeyPair::deserialize(&text).context("invalid or corrupted key file")
}

fn copy_to_clipboard(text: &str) -> Result<arboard::Clipboard> {
    let mut clipboard = arboard::Clipboard::new().context("clipboard unavailable")?;
    clipboard
        .set_text(text)
        .context("failed to copy to clipboard")?;
    Ok(clipboard)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Cli::parse();
    match args.command {
        Commands::Keygen {
            passphrase,
            force,
            copy,
        } => {
            let storage = resolve_key_storage(args.key)?;
            let pair = if passphrase {
                let passphrase = auth::read_new_passphrase()?;
                keys::derive_from_passphrase(&passphrase)?
            } else {
                keys::generate()?
            };

            let text = pair.serialize()?;
            storage.save(text.as_bytes(), force)?;

            let public = pair.public_key_base64();
            println!("key pair saved to {}", storage.path().display());
            println!("public key: {public}");
            if copy {
                copy_to_clipboard(&public)?;
                println!("public key copied to clipboard");
            }
        }
        Commands::Pubkey { copy } => {
            let storage = resolve_key_storage(args.key)?;
            let public = load_key_pair(&storage)?.public_key_base64();
            println!("{public}");
            if copy {
                copy_to_clipboard(&public)?;
            }
        }
        Commands::Encrypt {
            to,
            out,
            force,
            message,
        } => {
            let recipient = keys::parse_public_key(&to)?;
            let message = auth::read_message(message)?;
            validate_message(&message)?;

            let json = sealed::encrypt(&recipient, &message)?.to_json()?;
            match out {
                Some(path) => {
                    let storage = Storage::new(path);
                    storage.save(json.as_bytes(), force)?;
                    println!("encrypted message saved to {}", storage.path().display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Decrypt { artifact } => {
            let pair = load_key_pair(&resolve_key_storage(args.key)?)?;
            let artifact = SealedArtifact::from_json(&Storage::new(artifact).load()?)?;
            let plaintext = sealed::decrypt(&pair, &artifact)?;
            println!("{}", plaintext.as_str());
        }
        Commands::Code { copy, clear_after } => {
            let code = ShareSecret::generate_code()?.reveal();
            println!("{}", code.as_str());

            if copy {
                let mut clipboard = copy_to_clipboard(&code)?;
                eprintln!("code copied; clipboard clears in {clear_after}s or on Ctrl-C");

                let (tx, rx) = mpsc::channel();
                ctrlc::set_handler(move || {
                    let _ = tx.send(());
                })
                .context("failed to install Ctrl-C handler")?;
                let _ = rx.recv_timeout(Duration::from_secs(clear_after));

                clipboard.clear().context("failed to clear clipboard")?;
            }
        }
    }

    Ok(())
}
