//! Fingerprints the storefront stylesheet.
//!
//! `static/css/main.css` is copied to `static/css/derived/main.<hash>.css`
//! and the hash is exported as `CSS_HASH` so `base.html` can link the
//! fingerprinted file and `/static` can be cached forever.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set"));
    let css_dir = manifest_dir.join("static/css");
    let source = css_dir.join("main.css");

    println!("cargo:rerun-if-changed={}", source.display());

    let Ok(content) = fs::read(&source) else {
        println!("cargo:warning=main.css not found, stylesheet will not be fingerprinted");
        println!("cargo:rustc-env=CSS_HASH=");
        return;
    };

    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest);
    println!("cargo:rustc-env=CSS_HASH={hash}");

    if let Err(e) = write_derived(&css_dir.join("derived"), &source, hash) {
        panic!("Failed to write fingerprinted stylesheet: {e}");
    }
}

/// Copy `source` to `main.<hash>.css` and drop copies left by older builds.
fn write_derived(derived_dir: &Path, source: &Path, hash: &str) -> io::Result<()> {
    fs::create_dir_all(derived_dir)?;
    let target_name = format!("main.{hash}.css");

    for entry in fs::read_dir(derived_dir)? {
        let path = entry?.path();
        let stale = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                name.starts_with("main.") && name.ends_with(".css") && name != target_name
            });
        if stale {
            fs::remove_file(&path)?;
        }
    }

    fs::copy(source, derived_dir.join(target_name))?;
    Ok(())
}
