use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use payreq::application::factory::RequestFactory;
use payreq::infrastructure::crypto::{CipherMode, Envelope, EnvelopeCodec};
use payreq::infrastructure::keys;
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use the deprecated RC4 compatibility cipher instead of AES-256-GCM.
    #[arg(long, global = true)]
    legacy_rc4: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a plaintext request (markup or query string) and print a summary.
    Parse {
        /// Input request file
        input: PathBuf,
    },
    /// Parse, build and encrypt a request for a recipient public key.
    Seal {
        /// Input request file
        input: PathBuf,

        /// Recipient public key (PEM)
        #[arg(long)]
        public_key: PathBuf,

        /// Write the wrapped key here instead of stdout
        #[arg(long)]
        out_key: Option<PathBuf>,

        /// Write the sealed payload here instead of stdout
        #[arg(long)]
        out_data: Option<PathBuf>,
    },
    /// Decrypt an envelope and print the recovered request document.
    Open {
        /// Private key (PEM)
        #[arg(long)]
        private_key: PathBuf,

        /// Passphrase for an encrypted private key
        #[arg(long)]
        passphrase: Option<String>,

        /// File holding the base64 wrapped key
        #[arg(long)]
        env_key: PathBuf,

        /// File holding the base64 sealed payload
        #[arg(long)]
        data: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mode = if cli.legacy_rc4 {
        CipherMode::LegacyRc4
    } else {
        CipherMode::Aes256Gcm
    };
    let factory = RequestFactory::new(EnvelopeCodec::new(mode));

    match cli.command {
        Command::Parse { input } => {
            let raw = fs::read(&input).into_diagnostic()?;
            let request = factory.from_wire_bytes(&raw).into_diagnostic()?;
            print_summary(&request);
        }
        Command::Seal {
            input,
            public_key,
            out_key,
            out_data,
        } => {
            let raw = fs::read(&input).into_diagnostic()?;
            let public_key = keys::load_public_key(&public_key).into_diagnostic()?;
            let mut request = factory.from_wire_bytes(&raw).into_diagnostic()?;
            let envelope = request
                .encrypt_for(&public_key, factory.codec())
                .into_diagnostic()?;

            match (&out_key, &out_data) {
                (Some(key_path), Some(data_path)) => {
                    fs::write(key_path, &envelope.wrapped_key).into_diagnostic()?;
                    fs::write(data_path, &envelope.sealed_payload).into_diagnostic()?;
                    println!("sealed order {} for recipient", request.order_id());
                }
                _ => {
                    println!("env_key: {}", envelope.wrapped_key);
                    println!("data: {}", envelope.sealed_payload);
                }
            }
        }
        Command::Open {
            private_key,
            passphrase,
            env_key,
            data,
        } => {
            let private_key =
                keys::load_private_key(&private_key, passphrase.as_deref()).into_diagnostic()?;
            let envelope = Envelope::new(
                fs::read_to_string(&data).into_diagnostic()?.trim(),
                fs::read_to_string(&env_key).into_diagnostic()?.trim(),
            );
            let request = factory
                .from_encrypted(&envelope, &private_key)
                .into_diagnostic()?;

            if let Some(info) = request.request_info() {
                println!("{}", String::from_utf8_lossy(&info.raw));
            }
        }
    }

    Ok(())
}

fn print_summary(request: &payreq::domain::request::PaymentRequest) {
    println!("kind: {}", request.kind().discriminator());
    println!("order id: {}", request.order_id());
    println!("signature: {}", request.signature());
    println!("request identifier: {}", request.request_identifier());
    if let Some(url) = request.return_url() {
        println!("return url: {url}");
    }
    if let Some(url) = request.confirm_url() {
        println!("confirm url: {url}");
    }
    if let Some(url) = request.cancel_url() {
        println!("cancel url: {url}");
    }
    for (name, value) in request.params() {
        println!("param {name}: {value}");
    }
    if request.notify().is_some() {
        println!("notification: present");
    }
}
