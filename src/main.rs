use anyhow::{bail, Context, Result};
use bankgate_keyring::{FileKeyring, KeyInfo, Keyring};
use bankgate_log::LogFormat;
use bankgate_server::GatewayConfig;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "bankgate",
    about = "REST gateway that builds, signs and broadcasts bank transfers",
    version,
    author
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Home directory for configuration and keys (default ~/.bankgate)"
    )]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Start the REST gateway")]
    Start {
        #[arg(long, value_name = "FILE", help = "Configuration file path")]
        config: Option<PathBuf>,

        #[arg(long, value_name = "ADDR", help = "Listen address, e.g. 127.0.0.1:1317")]
        listen: Option<String>,

        #[arg(long, value_name = "URL", help = "Tendermint RPC endpoint")]
        node: Option<String>,

        #[arg(long, value_name = "LEVEL", help = "Log filter (trace, debug, info, warn, error)")]
        log_level: Option<String>,

        #[arg(
            long,
            value_name = "FORMAT",
            default_value = "json",
            help = "Log format (json, text)"
        )]
        log_format: LogFormat,
    },

    #[command(about = "Key management; passwords and mnemonics are read from stdin")]
    Keys {
        #[command(subcommand)]
        command: KeysCommands,
    },

    #[command(about = "Configuration management")]
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    #[command(about = "Display version information")]
    Version,
}

#[derive(Subcommand)]
enum KeysCommands {
    #[command(about = "Add a new key")]
    Add {
        #[arg(value_name = "NAME", help = "Key name")]
        name: String,

        #[arg(long, help = "Recover key from a mnemonic given after the password")]
        recover: bool,
    },

    #[command(about = "List all keys")]
    List,

    #[command(about = "Show key details")]
    Show {
        #[arg(value_name = "NAME", help = "Key name")]
        name: String,
    },

    #[command(about = "Delete a key")]
    Delete {
        #[arg(value_name = "NAME", help = "Key name")]
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    #[command(about = "Write the default configuration file")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },

    #[command(about = "Show current configuration")]
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let home = cli.home.unwrap_or_else(GatewayConfig::default_home);

    match cli.command {
        Commands::Start {
            config,
            listen,
            node,
            log_level,
            log_format,
        } => start_command(&home, config, listen, node, log_level, log_format).await,
        Commands::Keys { command } => keys_command(&home, command).await,
        Commands::Config { command } => config_command(&home, command),
        Commands::Version => version_command(),
    }
}

async fn start_command(
    home: &Path,
    config_path: Option<PathBuf>,
    listen: Option<String>,
    node: Option<String>,
    log_level: Option<String>,
    log_format: LogFormat,
) -> Result<()> {
    let level = log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    bankgate_log::init_tracing_with_level(&level, log_format)
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to initialize logging")?;

    let config_path = config_path.unwrap_or_else(|| home.join("config.toml"));
    let mut config = GatewayConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    if let Some(listen) = listen {
        config.server.listen_address = listen;
    }
    if let Some(node) = node {
        config.node.rpc_url = node;
    }

    tracing::info!(
        home = %home.display(),
        config = %config_path.display(),
        "starting bankgate"
    );
    bankgate_server::run(config, home).await?;
    Ok(())
}

fn load_config(home: &Path) -> Result<GatewayConfig> {
    let path = home.join("config.toml");
    GatewayConfig::load_or_default(&path)
        .with_context(|| format!("failed to load {}", path.display()))
}

async fn open_file_keyring(home: &Path) -> Result<(FileKeyring, GatewayConfig)> {
    let config = load_config(home)?;
    let keyring = FileKeyring::new(config.keyring_dir(home)).await?;
    Ok((keyring, config))
}

fn read_stdin_line(stdin: &mut impl BufRead, what: &str) -> Result<String> {
    let mut line = String::new();
    stdin
        .read_line(&mut line)
        .with_context(|| format!("failed to read {what} from stdin"))?;
    let line = line.trim_end_matches(['\r', '\n']).to_string();
    if line.is_empty() {
        bail!("{what} must not be empty");
    }
    Ok(line)
}

fn display_address(info: &KeyInfo, config: &GatewayConfig) -> Result<String> {
    Ok(info.address.to_bech32(&config.chain.bech32_prefix)?)
}

async fn keys_command(home: &Path, command: KeysCommands) -> Result<()> {
    let (mut keyring, config) = open_file_keyring(home).await?;
    let mut stdin = std::io::stdin().lock();

    match command {
        KeysCommands::Add { name, recover } => {
            let password = read_stdin_line(&mut stdin, "password")?;
            if recover {
                let mnemonic = read_stdin_line(&mut stdin, "mnemonic")?;
                let info = keyring.import_key(&name, &mnemonic, &password).await?;
                println!("{}\t{}", info.name, display_address(&info, &config)?);
            } else {
                let (info, mnemonic) = keyring.create_key(&name, &password).await?;
                println!("{}\t{}", info.name, display_address(&info, &config)?);
                println!();
                println!("Write this mnemonic phrase down; it is the only way to recover the key:");
                println!("{mnemonic}");
            }
        }
        KeysCommands::List => {
            println!("NAME\tTYPE\tADDRESS");
            for info in keyring.list_keys().await? {
                println!(
                    "{}\t{}\t{}",
                    info.name,
                    info.pubkey.key_type(),
                    display_address(&info, &config)?
                );
            }
        }
        KeysCommands::Show { name } => {
            let info = keyring.get_key(&name).await?;
            let output = serde_json::json!({
                "name": info.name,
                "type": info.pubkey.key_type().to_string(),
                "address": display_address(&info, &config)?,
                "pubkey": info.pubkey,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        KeysCommands::Delete { name } => {
            let password = read_stdin_line(&mut stdin, "password")?;
            keyring.delete_key(&name, &password).await?;
            println!("Key {name} deleted");
        }
    }
    Ok(())
}

fn config_command(home: &Path, command: ConfigCommands) -> Result<()> {
    let path = home.join("config.toml");
    match command {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                bail!("{} already exists; use --force to overwrite", path.display());
            }
            GatewayConfig::default().save_to_file(&path)?;
            println!("Wrote {}", path.display());
        }
        ConfigCommands::Show => {
            let config = load_config(home)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn version_command() -> Result<()> {
    println!("bankgate {}", env!("CARGO_PKG_VERSION"));
    println!("build: {}", env!("CARGO_PKG_NAME"));
    Ok(())
}
