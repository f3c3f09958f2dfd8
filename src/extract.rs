//! Splitting of combined peer-output dumps into certificate blocks.
//!
//! A dump holds consecutive sections separated by a line of exactly `---`,
//! the layout produced by `openssl s_client -showcerts`. Malformed blocks are
//! passed through untouched and rejected later by [`Certificate::parse`].
//!
//! [`Certificate::parse`]: crate::certificate::Certificate::parse

/// Line separating consecutive sections of a peer-output dump.
pub const SECTION_DELIMITER: &str = "\n---\n";

const PEM_BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const PEM_END: &str = "-----END CERTIFICATE-----";

/// Splits `text` on `---` delimiter lines, trimming each block and keeping
/// their relative order. Text without a delimiter is a single block.
///
/// Empty sections stay in place as empty strings, so block positions line up
/// with the sections of the dump.
pub fn extract_certificates(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");
    if !normalized.contains(SECTION_DELIMITER) {
        return vec![normalized.trim().to_string()];
    }

    normalized
        .split(SECTION_DELIMITER)
        .map(|block| block.trim().to_string())
        .collect()
}

/// Returns every `BEGIN CERTIFICATE` armored block found in `text`, in order.
///
/// A single dump section can carry a whole chain, each certificate preceded
/// by a descriptive line.
pub fn pem_certificates(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(PEM_BEGIN) {
        let candidate = &rest[start..];
        match candidate.find(PEM_END) {
            Some(end) => {
                let stop = end + PEM_END.len();
                found.push(format!("{}\n", &candidate[..stop]));
                rest = &candidate[stop..];
            }
            None => break,
        }
    }
    found
}

/// Renders PEM blocks back into the delimited dump layout.
pub fn join_certificates<S: AsRef<str>>(blocks: &[S]) -> String {
    blocks
        .iter()
        .map(|block| block.as_ref().trim())
        .collect::<Vec<_>>()
        .join(SECTION_DELIMITER)
}
