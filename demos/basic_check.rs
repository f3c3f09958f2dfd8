//! Basic hostname check example.
//!
//! This example connects to a single HTTPS URL and reports whether the
//! certificate it serves is valid for the URL's hostname.
//!
//! Run with: cargo run --example basic_check

use tlsnamecheck::Validator;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Basic Hostname Check ===\n");

    let mut validator = Validator::new("https://www.rust-lang.org")?;
    let valid = validator.is_certificate_valid_for_url_hostname()?;
    let cert = validator.server_certificate()?;

    println!("URL: {}", validator.endpoint().url());
    println!("Hostname: {}", validator.endpoint().host());
    println!("Valid for hostname: {}", valid);
    println!();

    println!("Subject CN: {}", cert.subject_cn);
    println!("Issuer CN: {}", cert.issuer_cn);
    println!("Days remaining: {}", cert.validity_days);
    println!("Is expired: {}", cert.is_expired);
    println!();

    println!("Names covered by the certificate:");
    for name in &cert.valid_host_names {
        println!("  - {}", name);
    }

    Ok(())
}
