use md5::{Digest, Md5};

/// Digest response for the connect challenge.
///
/// `A1 = md5(destId:realm:password)` in lowercase hex, then
/// `md5(A1:nonce)` uppercased.
pub fn auth_response(dest_id: &str, realm: &str, password: &str, nonce: &str) -> String {
    let a1 = md5_hex(&format!("{dest_id}:{realm}:{password}"));
    md5_hex(&format!("{a1}:{nonce}")).to_uppercase()
}

fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
