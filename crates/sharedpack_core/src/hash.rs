use xxhash_rust::xxh3::xxh3_64;

/// Stable identifier hashing.
///
/// Speed matters less than stability: these values become item identifiers
/// and hashed bundle file names, both of which end up in persisted build
/// configuration and must not change across runs, machines or versions.
pub fn hash_string(s: String) -> String {
  hash_bytes(s.as_bytes())
}

pub fn hash_bytes(s: &[u8]) -> String {
  let res = xxh3_64(s);
  format!("{:016x}", res)
}
