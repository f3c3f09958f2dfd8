//! Handshakes against a local OpenSSL server; no external network access.

mod common;

use common::{chain, Issued};
use openssl::ssl::{SslAcceptor, SslMethod};
use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::thread;
use tempfile::NamedTempFile;
use tlsnamecheck::{Connector, OpenSslConnector, TLSValidationError, Validator};

/// Serves `leaf` plus `intermediate` to a single client and returns the port.
fn serve_once(leaf: &Issued, intermediate: &Issued) -> u16 {
    let mut acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls()).unwrap();
    acceptor.set_private_key(&leaf.key).unwrap();
    acceptor.set_certificate(&leaf.cert).unwrap();
    acceptor
        .add_extra_chain_cert(intermediate.cert.clone())
        .unwrap();
    let acceptor = acceptor.build();

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            if let Ok(mut tls) = acceptor.accept(stream) {
                let _ = tls.shutdown();
            }
        }
    });
    port
}

#[test]
fn test_handshake_captures_presented_chain() {
    let (leaf, intermediate, _) = chain("127.0.0.1", &[]);
    let port = serve_once(&leaf, &intermediate);

    let url = format!("https://127.0.0.1:{}", port);
    let mut validator = Validator::new(&url).unwrap();
    assert!(validator.is_certificate_valid_for_url_hostname().unwrap());

    let session = validator.session().unwrap();
    assert_eq!(session.peer_certificates.len(), 2);
    assert!(session.cipher.is_some());
    assert!(!session.trusted);

    let chain = validator.server_certificate_chain().unwrap();
    assert_eq!(chain.leaf().unwrap().subject_cn, "127.0.0.1");
    assert_eq!(chain.root().unwrap().subject_cn, "Test Intermediate CA");
}

#[test]
fn test_trusted_ca_file_marks_session_trusted() {
    let (leaf, intermediate, root) = chain("127.0.0.1", &[]);
    let port = serve_once(&leaf, &intermediate);

    let mut ca_file = NamedTempFile::new().unwrap();
    ca_file.write_all(root.pem().as_bytes()).unwrap();

    let url = format!("https://127.0.0.1:{}", port);
    let mut validator = Validator::new(&url).unwrap();
    validator.set_trusted_ca_file(ca_file.path());

    let session = validator.connect().unwrap();
    assert!(session.trusted, "verify result: {}", session.verify_result);
}

#[test]
fn test_hostname_mismatch_on_live_handshake() {
    let (leaf, intermediate, _) = chain("www.example.com", &["*.example.com"]);
    let port = serve_once(&leaf, &intermediate);

    let url = format!("https://127.0.0.1:{}", port);
    let mut validator = Validator::new(&url).unwrap();
    assert!(!validator.is_certificate_valid_for_url_hostname().unwrap());
}

#[test]
fn test_refused_connection() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = OpenSslConnector::default()
        .handshake("127.0.0.1", port, None)
        .unwrap_err();
    assert!(matches!(err, TLSValidationError::ConnectionFailed { .. }));
}

#[test]
fn test_unreadable_ca_file() {
    let err = OpenSslConnector::default()
        .handshake(
            "127.0.0.1",
            443,
            Some(Path::new("/definitely/not/here/ca.pem")),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TLSValidationError::InvalidInput { ref field, .. } if field == "trusted_ca_file"
    ));
}
