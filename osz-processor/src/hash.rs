//! Content fingerprints and the storage keys derived from them

/// Lower-case hex BLAKE3 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// `<prefix>/<first two hash chars>/<hash>[.<ext>]`, keeping any single
/// directory from growing too large.
pub(crate) fn sharded_key(prefix: &str, hash: &str, extension: Option<&str>) -> String {
    let shard = hash.get(..2).unwrap_or(hash);
    match extension {
        Some(ext) if !ext.is_empty() => format!("{}/{}/{}.{}", prefix, shard, hash, ext),
        _ => format!("{}/{}/{}", prefix, shard, hash),
    }
}
