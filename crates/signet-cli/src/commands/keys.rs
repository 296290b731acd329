//! Key management commands.
//!
//! `signet keys generate` - Generate a new Ed25519 signing keypair.

use signet::KeyPair;
use std::fs;
use std::path::PathBuf;

/// Generate a new signing keypair.
pub fn generate(output: Option<PathBuf>, kid: Option<String>) -> anyhow::Result<()> {
    let keypair = KeyPair::generate();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let (private_name, public_name) = match &kid {
            Some(kid) => (format!("{kid}.key"), format!("{kid}.pub")),
            None => ("private.key".to_string(), "public.key".to_string()),
        };
        let private_path = output_dir.join(private_name);
        let public_path = output_dir.join(public_name);

        keypair.save_to_files(&private_path, &public_path)?;
        tracing::debug!(path = %private_path.display(), "wrote private key");

        println!("✔ Generated Ed25519 keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
        println!();
        println!("Set as environment variables:");
        println!(
            "  export SIGNET_PRIVATE_KEY=$(cat {})",
            private_path.display()
        );
        println!(
            "  export SIGNET_PUBLIC_KEY=$(cat {})",
            public_path.display()
        );
        if let Some(kid) = &kid {
            println!();
            println!("Add to signet.yaml:");
            println!("  keys:");
            println!("    {kid}:");
            println!("      file: {}", public_path.display());
        }
    } else {
        println!("Private key (keep secure!):");
        println!("{}", keypair.private_key_hex());
        println!();
        println!("Public key:");
        println!("{}", keypair.public_key_hex());
        println!();
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_keys_to_files() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().to_path_buf()), None).unwrap();

        let private_hex = fs::read_to_string(dir.path().join("private.key")).unwrap();
        let public_hex = fs::read_to_string(dir.path().join("public.key")).unwrap();

        // 32-byte keys, hex encoded
        assert_eq!(private_hex.len(), 64);
        assert_eq!(public_hex.len(), 64);

        let keypair = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(keypair.public_key_hex(), public_hex);
    }

    #[test]
    fn test_generate_named_keys() {
        let dir = tempdir().unwrap();
        generate(Some(dir.path().to_path_buf()), Some("v2".to_string())).unwrap();

        assert!(dir.path().join("v2.key").exists());
        assert!(dir.path().join("v2.pub").exists());
    }
}
