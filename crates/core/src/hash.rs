use md5::Md5;
use sha1::{Digest, Sha1};

/// SHA-1 of the raw bytes as lowercase hex; the key draft storage dedups on.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// MD5 hex of a username, sent to the relay instead of the name itself.
pub fn owner_hash(username: &str) -> String {
    hex::encode(Md5::digest(username.as_bytes()))
}
