//! Token management commands.
//!
//! `signet token mint` - Mint and sign a new token.
//! `signet token verify` - Verify a token and print its claims.
//! `signet token inspect` - Decode a token without verifying it.
//!
//! Tokens are exchanged as standard base64 text, either inline or in a file.

use crate::config::{SignetConfig, parse_duration};
use anyhow::Context as _;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use clap::Args;
use signet::{
    Claims, Context, KeyPair, PayloadBuilder, PublicKey, StaticKeyResolver, ValidationOption,
    Validator, inspect_unverified,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Default)]
pub struct MintArgs {
    /// Private key: path to a hex key file, or the hex key itself
    #[arg(long, env = "SIGNET_PRIVATE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    /// Signing key id stamped on the token
    #[arg(long)]
    pub kid: Option<String>,

    #[arg(long)]
    pub subject: Option<String>,

    #[arg(long)]
    pub audience: Option<String>,

    /// Granted role (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Custom claim as key=value (repeatable)
    #[arg(long = "claim")]
    pub claims: Vec<String>,

    /// Hex-encoded session id; makes the token stateful
    #[arg(long)]
    pub session_id: Option<String>,

    /// Token lifetime, e.g. 15m, 1h, 7d
    #[arg(long)]
    pub expires: Option<String>,

    /// Write the base64 token to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Token file path or base64 literal
    pub token: String,

    /// Public key: path to a hex key file, or the hex key itself.
    /// Without it, keys come from the config keyring.
    #[arg(long, env = "SIGNET_PUBLIC_KEY")]
    pub key: Option<String>,

    /// Required audience (defaults to the config audience)
    #[arg(long)]
    pub audience: Option<String>,

    /// Required role (repeatable)
    #[arg(long = "require-role")]
    pub require_roles: Vec<String>,

    #[arg(long)]
    pub skip_expiration: bool,

    #[arg(long)]
    pub skip_issued_at: bool,
}

/// Resolve a private key from either a file path or a hex-encoded string,
/// falling back to the config file.
fn resolve_private_key(
    key: Option<String>,
    config: Option<&SignetConfig>,
) -> anyhow::Result<KeyPair> {
    let key_str = match key {
        Some(key) => key,
        None => config
            .map(SignetConfig::resolve_private_key)
            .transpose()?
            .flatten()
            .context(
                "Private key not provided. Pass --key <path>, set SIGNET_PRIVATE_KEY, \
                 or configure private_key_env/private_key_file",
            )?,
    };

    let path = Path::new(&key_str);
    if path.exists() {
        return KeyPair::load_from_file(path)
            .with_context(|| format!("Failed to load private key from file: {}", path.display()));
    }

    KeyPair::from_private_key_hex(key_str.trim())
        .context("Failed to parse private key. Expected hex-encoded Ed25519 private key")
}

/// Resolve a public key from either a file path or a hex-encoded string.
fn resolve_public_key(key: &str) -> anyhow::Result<PublicKey> {
    let path = Path::new(key);
    if path.exists() {
        return signet_crypto::load_public_key_file(path)
            .with_context(|| format!("Failed to load public key from file: {}", path.display()));
    }

    signet_crypto::load_public_key_hex(key.trim())
        .context("Failed to parse public key. Expected hex-encoded Ed25519 public key")
}

/// Read a token from a file or decode it from a base64 literal.
pub fn read_token(token: &str) -> anyhow::Result<Vec<u8>> {
    let encoded = if Path::new(token).exists() {
        fs::read_to_string(token)
            .with_context(|| format!("Failed to read token file: {token}"))?
    } else {
        token.to_string()
    };

    STANDARD
        .decode(encoded.trim())
        .context("Token is neither a readable file nor valid base64")
}

fn parse_custom_claim(pair: &str) -> anyhow::Result<(String, String)> {
    let (key, value) = pair
        .split_once('=')
        .with_context(|| format!("Invalid claim '{pair}'. Expected key=value"))?;
    let key = key.trim();
    anyhow::ensure!(!key.is_empty(), "Invalid claim '{pair}'. Key must not be empty");
    Ok((key.to_string(), value.to_string()))
}

/// Mint a new token and return its wire bytes.
pub fn mint(args: MintArgs, config: Option<&SignetConfig>) -> anyhow::Result<Vec<u8>> {
    let keypair = resolve_private_key(args.key, config)?;

    let mut builder = PayloadBuilder::new();
    if let Some(subject) = &args.subject {
        builder = builder.with_subject(subject);
    }
    if let Some(audience) = args
        .audience
        .as_deref()
        .or_else(|| config.and_then(|c| c.audience.as_deref()))
    {
        builder = builder.with_audience(audience);
    }
    if let Some(kid) = args
        .kid
        .as_deref()
        .or_else(|| config.and_then(|c| c.default_kid.as_deref()))
    {
        builder = builder.with_key_id(kid);
    }
    for role in &args.roles {
        builder = builder.with_role(role);
    }
    for pair in &args.claims {
        let (key, value) = parse_custom_claim(pair)?;
        builder = builder.with_custom_claim(key, value);
    }
    if let Some(session_id) = &args.session_id {
        let bytes = hex::decode(session_id.trim()).context("Session id must be hex-encoded")?;
        builder = builder.with_session_id(bytes);
    }

    let lifetime = match &args.expires {
        Some(expires) => Some(parse_duration(expires)?),
        None => config.map(SignetConfig::default_lifetime).transpose()?.flatten(),
    };
    if let Some(lifetime) = lifetime {
        builder = builder.with_lifetime(lifetime);
    }

    let claims = builder.build()?;
    let token = builder.sign(keypair.private_key_bytes())?;
    let encoded = STANDARD.encode(&token);

    if let Some(output_path) = &args.output {
        fs::write(output_path, &encoded)?;
        println!("✔ Token written to: {}", output_path.display());
        if !claims.subject.is_empty() {
            println!("  Subject: {}", claims.subject);
        }
        if !claims.key_id.is_empty() {
            println!("  Key id: {}", claims.key_id);
        }
        if let Some(expires_at) = claims.expires_at_utc() {
            println!("  Expires: {}", expires_at.to_rfc3339());
        }
        println!("  Size: {} bytes", token.len());
    } else {
        println!("{encoded}");
    }

    Ok(token)
}

/// Verify a token and print its claims as JSON.
///
/// Returns an error naming the failure reason when the token is rejected.
pub fn verify(args: VerifyArgs, config: Option<&SignetConfig>) -> anyhow::Result<Claims> {
    let token = read_token(&args.token)?;

    let validator = match (&args.key, config) {
        (Some(key), _) => Validator::new(StaticKeyResolver::new(resolve_public_key(key)?)),
        (None, Some(config)) => {
            let ring = config.key_ring()?;
            anyhow::ensure!(!ring.is_empty(), "No verification keys configured");
            Validator::new(ring)
        }
        (None, None) => anyhow::bail!(
            "Public key not provided. Pass --key <path>, set SIGNET_PUBLIC_KEY, \
             or configure keys in signet.yaml"
        ),
    };

    let mut options = Vec::new();
    if let Some(audience) = args
        .audience
        .or_else(|| config.and_then(|c| c.audience.clone()))
    {
        options.push(ValidationOption::expected_audience(audience));
    }
    if !args.require_roles.is_empty() {
        options.push(ValidationOption::require_roles(args.require_roles));
    }
    if args.skip_expiration {
        options.push(ValidationOption::skip_expiration_check());
    }
    if args.skip_issued_at {
        options.push(ValidationOption::skip_issued_at_check());
    }
    let validator = validator.with_options(options);

    match validator.parse(&Context::new(), &token) {
        Ok(claims) => {
            println!("✔ Token is valid");
            println!("{}", serde_json::to_string_pretty(&claims)?);
            Ok(claims)
        }
        Err(err) => {
            let reason = err.reason();
            Err(anyhow::Error::new(err).context(format!("Token rejected ({reason})")))
        }
    }
}

/// Decode a token without verification and print its claims as JSON.
pub fn inspect(token: &str) -> anyhow::Result<Claims> {
    let bytes = read_token(token)?;
    let claims = inspect_unverified(&bytes)?;

    eprintln!("⚠️  Signature NOT verified. Do not trust these claims.");
    println!("{}", serde_json::to_string_pretty(&claims)?);
    if !claims.is_stateful() {
        println!("Type: stateless");
    } else {
        println!("Type: stateful");
    }

    Ok(claims)
}
