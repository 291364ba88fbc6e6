use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, bail, Context, Result};
use bls_bundle::{
    aggregate,
    registry::{
        AddressRegistryAbi, BlsPublicKeyRegistryAbi, ExpanderDelegatorAbi,
        OnchainRegistryContract, RegistrySnapshot,
    },
    AddressRegistry, BlsPublicKeyRegistry, BlsSigner, BundleCompressor, CompressorContext,
    ContractAddresses, ExpanderRegistry, NetworkConfig, PrivateKey, Registry,
};
use bls_bundle_types::{Bundle, Operation};
use clap::{Args, Parser, Subcommand};
use ethers::providers::{Http, Provider};
use log::info;
use serde::{de::DeserializeOwned, Serialize};

/// Sign, aggregate, verify and (de)compress BLS operation bundles.
///
/// Bundles and operations are read and written in the relay JSON form. Compression needs the
/// registries, read either from a snapshot file or from the chain.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Network config JSON: chain id, BLS domain and contract addresses.
    #[arg(long, env = "NETWORK_CONFIG", default_value = "network.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RegistrySource {
    /// Registry snapshot JSON (`blsPublicKeys`, `addresses`, `expanders`).
    #[arg(long, env = "REGISTRY_SNAPSHOT", conflicts_with = "rpc_url")]
    registry: Option<PathBuf>,

    /// RPC URL used to read the on-chain registries.
    #[arg(long, env = "RPC_URL", conflicts_with = "registry")]
    rpc_url: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the public key of a BLS private key.
    PublicKey {
        /// Private key (hex string, 0x...).
        #[arg(long, env = "BLS_PRIVATE_KEY")]
        private_key: String,
    },
    /// Sign an operation, producing a single-operation bundle.
    Sign {
        #[arg(long, env = "BLS_PRIVATE_KEY")]
        private_key: String,
        /// Operation JSON file.
        operation: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Aggregate bundles into one.
    Aggregate {
        #[arg(required = true)]
        bundles: Vec<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Verify a bundle's aggregate signature. Exits non-zero when invalid.
    Verify { bundle: PathBuf },
    /// Compress a bundle into expander calldata, printed as hex.
    Compress {
        bundle: PathBuf,
        #[command(flatten)]
        registries: RegistrySource,
    },
    /// Expand compressed calldata back into a bundle.
    Decompress {
        /// Compressed payload (hex string, 0x...).
        #[arg(long)]
        hex: String,
        #[command(flatten)]
        registries: RegistrySource,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::PublicKey { private_key } => {
            let key = parse_private_key(&private_key)?;
            write_json(&key.public_key(), None)
        }
        Command::Sign {
            private_key,
            operation,
            out,
        } => {
            let signer = BlsSigner::from_config(&load_config(&cli.config)?);
            let key = parse_private_key(&private_key)?;
            let operation: Operation = read_json(&operation)?;
            write_json(&signer.sign(&operation, &key), out.as_deref())
        }
        Command::Aggregate { bundles, out } => {
            let bundles = bundles
                .iter()
                .map(|path| read_json::<Bundle>(path))
                .collect::<Result<Vec<_>>>()?;
            let aggregated = aggregate(&bundles).context("failed aggregating signatures")?;
            info!(
                "aggregated {} bundles into {} operations",
                bundles.len(),
                aggregated.len()
            );
            write_json(&aggregated, out.as_deref())
        }
        Command::Verify { bundle } => {
            let signer = BlsSigner::from_config(&load_config(&cli.config)?);
            let bundle: Bundle = read_json(&bundle)?;
            if !signer.verify(&bundle) {
                bail!("bundle signature does not verify");
            }
            println!("valid ({} operations)", bundle.len());
            Ok(())
        }
        Command::Compress { bundle, registries } => {
            let config = load_config(&cli.config)?;
            let bundle: Bundle = read_json(&bundle)?;
            let compressor = bundle_compressor(&config, &registries).await?;
            let bytes = compressor
                .compress(&bundle)
                .await
                .context("failed compressing bundle")?;
            info!(
                "compressed {} operations into {} bytes",
                bundle.len(),
                bytes.len()
            );
            println!("0x{}", hex::encode(bytes));
            Ok(())
        }
        Command::Decompress {
            hex: payload,
            registries,
            out,
        } => {
            let config = load_config(&cli.config)?;
            let bytes = decode_hex(&payload)?;
            let compressor = bundle_compressor(&config, &registries).await?;
            let bundle = compressor
                .decompress(&bytes)
                .await
                .context("failed decompressing payload")?;
            write_json(&bundle, out.as_deref())
        }
    }
}

fn load_config(path: &Path) -> Result<NetworkConfig> {
    NetworkConfig::from_file(path).context("failed loading network config")
}

fn parse_private_key(text: &str) -> Result<PrivateKey> {
    PrivateKey::from_hex(text).context("invalid BLS private key")
}

fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    hex::decode(text.strip_prefix("0x").unwrap_or(text)).context("payload is not valid hex")
}

async fn bundle_compressor(
    config: &NetworkConfig,
    source: &RegistrySource,
) -> Result<BundleCompressor> {
    let (keys, addresses, expanders) = match (&source.registry, &source.rpc_url) {
        (Some(path), _) => read_json::<RegistrySnapshot>(path)?.into_registries(),
        (None, Some(url)) => onchain_registries(url, &config.addresses)?,
        (None, None) => {
            return Err(anyhow!(
                "missing registries: provide --registry or --rpc-url (or set REGISTRY_SNAPSHOT/RPC_URL)"
            ))
        }
    };
    let ctx = CompressorContext::new(keys, addresses, config.addresses.clone());
    BundleCompressor::with_default_compressors(expanders, ctx)
        .await
        .context("failed resolving expander indices")
}

fn onchain_registries(
    url: &str,
    addresses: &ContractAddresses,
) -> Result<(BlsPublicKeyRegistry, AddressRegistry, ExpanderRegistry)> {
    let provider = Arc::new(
        Provider::<Http>::try_from(url).with_context(|| format!("invalid RPC URL {url}"))?,
    );
    Ok((
        Registry::new(OnchainRegistryContract::<_, BlsPublicKeyRegistryAbi>::new(
            provider.clone(),
            addresses.bls_public_key_registry,
        )),
        Registry::new(OnchainRegistryContract::<_, AddressRegistryAbi>::new(
            provider.clone(),
            addresses.address_registry,
        )),
        Registry::new(OnchainRegistryContract::<_, ExpanderDelegatorAbi>::new(
            provider,
            addresses.expander_delegator,
        )),
    ))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed parsing JSON in {}", path.display()))
}

/// Print `value` as pretty JSON, or write it to `out` atomically.
fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let serialised = serde_json::to_string_pretty(value).context("failed serialising JSON")?;
    let Some(path) = out else {
        println!("{serialised}");
        return Ok(());
    };

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    if !parent.as_os_str().is_empty() && !parent.exists() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed creating directory {}", parent.display()))?;
    }
    let tmp_path = tmp_path_for(path);
    fs::write(&tmp_path, serialised.as_bytes())
        .with_context(|| format!("failed writing temp file {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("failed replacing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn registry_sources_conflict() {
        let parsed = Cli::try_parse_from([
            "bundle-tool",
            "compress",
            "bundle.json",
            "--registry",
            "snapshot.json",
            "--rpc-url",
            "http://localhost:8545",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn hex_payloads_accept_optional_prefix() {
        assert_eq!(decode_hex("0x0102").unwrap(), vec![1, 2]);
        assert_eq!(decode_hex(" 0102\n").unwrap(), vec![1, 2]);
        assert!(decode_hex("0xzz").is_err());
    }

    #[test]
    fn temp_path_sits_next_to_target() {
        assert_eq!(
            tmp_path_for(Path::new("out/bundle.json")),
            PathBuf::from("out/bundle.json.tmp")
        );
    }
}
