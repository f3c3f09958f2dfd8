//! Certificate chain example.
//!
//! This example builds a full validation report and prints the presented
//! chain ordered from the leaf up to the root by issuer name.
//!
//! Run with: cargo run --example chain_details

use tlsnamecheck::{IssuerOrdered, Validator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Certificate Chain Details ===\n");

    let mut validator = Validator::new("https://github.com")?;
    let report = validator.report(&IssuerOrdered)?;

    println!("┌─ {}", report.url);
    println!("├─ Hostname: {}", report.hostname);
    println!("├─ Port: {}", report.port);
    println!("├─ Valid for hostname: {}", report.valid_for_hostname);
    println!("├─ Trusted: {} ({})", report.trusted, report.verify_result);
    println!("│");

    println!("├─ Certificate Chain ({} certificates):", report.chain.len());
    for (i, cert) in report.chain.iter().enumerate() {
        let prefix = if i == report.chain.len() - 1 { "└─" } else { "├─" };
        println!("│  {} Certificate #{}", prefix, i + 1);
        println!("│     ├─ Subject: {}", cert.subject);
        println!("│     ├─ Issuer: {}", cert.issuer);
        println!("│     ├─ Names: {}", cert.valid_host_names.join(", "));
        println!("│     └─ Valid Until: {}", cert.not_after.as_deref().unwrap_or("unknown"));
    }
    println!("│");

    match &report.cipher {
        Some(cipher) => {
            println!("└─ TLS Connection:");
            println!("   ├─ Cipher Suite: {}", cipher.name);
            println!("   └─ Protocol Version: {}", cipher.version);
        }
        None => println!("└─ TLS Connection: no cipher negotiated"),
    }

    Ok(())
}
