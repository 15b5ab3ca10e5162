use alloy_primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::secret::{Secret, SecretHash};

/// Largest fill count whose `count - 1` still fits the 16-bit prefix of a multi-fill lock
pub const MAX_SECRETS: u32 = 1 << 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashLockError {
    #[error("at least one secret is required")]
    ZeroSecrets,

    #[error("{count} secrets requested, at most {max} are supported")]
    TooManySecrets { count: u32, max: u32 },

    #[error("secret generation failed: {0}")]
    Randomness(String),
}

/// On-chain commitment to one or more secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HashLock {
    /// keccak256 of the single secret
    SingleFill(B256),
    /// Merkle root of the secret leaves, top 16 bits replaced by `count - 1`
    MultiFill(B256),
}

impl HashLock {
    pub fn for_single_fill(secret: &Secret) -> Self {
        HashLock::SingleFill(secret.hash())
    }

    /// Build the multi-fill lock from ordered secret hashes
    pub fn for_multiple_fills(secret_hashes: &[SecretHash]) -> Result<Self, HashLockError> {
        let count = check_count(secret_hashes.len())?;
        let leaves = merkle_leaves(secret_hashes);
        let root = merkle_root(&leaves).ok_or(HashLockError::ZeroSecrets)?;

        let mut bytes = root.0;
        // check_count bounds count to 1..=MAX_SECRETS, so count - 1 fits in u16
        let parts = (count - 1) as u16;
        bytes[..2].copy_from_slice(&parts.to_be_bytes());
        Ok(HashLock::MultiFill(B256::from(bytes)))
    }

    pub fn value(&self) -> B256 {
        match self {
            HashLock::SingleFill(v) | HashLock::MultiFill(v) => *v,
        }
    }

    pub fn is_multi_fill(&self) -> bool {
        matches!(self, HashLock::MultiFill(_))
    }

    /// Number of fills a multi-fill lock commits to
    pub fn fill_count(&self) -> u32 {
        match self {
            HashLock::SingleFill(_) => 1,
            HashLock::MultiFill(v) => u32::from(u16::from_be_bytes([v[0], v[1]])) + 1,
        }
    }
}

fn check_count(count: usize) -> Result<u32, HashLockError> {
    if count == 0 {
        return Err(HashLockError::ZeroSecrets);
    }
    let count = u32::try_from(count).unwrap_or(u32::MAX);
    if count > MAX_SECRETS {
        return Err(HashLockError::TooManySecrets {
            count,
            max: MAX_SECRETS,
        });
    }
    Ok(count)
}

/// Leaf `i` is keccak256(uint64_be(i) || secret_hash_i)
pub fn merkle_leaf(idx: u64, secret_hash: &SecretHash) -> B256 {
    let mut buf = [0u8; 40];
    buf[..8].copy_from_slice(&idx.to_be_bytes());
    buf[8..].copy_from_slice(secret_hash.as_slice());
    keccak256(buf)
}

pub fn merkle_leaves(secret_hashes: &[SecretHash]) -> Vec<B256> {
    secret_hashes
        .iter()
        .enumerate()
        .map(|(i, h)| merkle_leaf(i as u64, h))
        .collect()
}

fn hash_pair(a: &B256, b: &B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    keccak256(buf)
}

/// Root of a complete binary tree over the sorted leaves with sorted-pair hashing.
///
/// Layout matches the common Solidity tooling: sorted leaves fill the tail of a
/// `2n - 1` slot array in reverse, each node `i` hashes children `2i + 1` and
/// `2i + 2`, the root sits at slot 0.
pub fn merkle_root(leaves: &[B256]) -> Option<B256> {
    if leaves.is_empty() {
        return None;
    }

    let mut sorted = leaves.to_vec();
    sorted.sort();

    let n = sorted.len();
    let len = 2 * n - 1;
    let mut tree = vec![B256::ZERO; len];
    for (i, leaf) in sorted.into_iter().enumerate() {
        tree[len - 1 - i] = leaf;
    }
    for i in (0..len - n).rev() {
        tree[i] = hash_pair(&tree[2 * i + 1], &tree[2 * i + 2]);
    }

    Some(tree[0])
}

/// Secrets plus everything derived from them for a single order
#[derive(Debug, Clone)]
pub struct Commitment {
    pub secrets: Vec<Secret>,
    pub secret_hashes: Vec<SecretHash>,
    pub hash_lock: HashLock,
}

impl Commitment {
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }

    pub fn secret(&self, idx: u32) -> Option<&Secret> {
        self.secrets.get(idx as usize)
    }
}

/// Produces fresh secrets and the matching hash-lock
pub struct HashLockBuilder;

impl HashLockBuilder {
    /// Generate `count` random secrets and commit to them
    pub fn build(count: u32) -> Result<Commitment, HashLockError> {
        check_count(count as usize)?;
        let secrets = (0..count)
            .map(|_| Secret::random().map_err(|e| HashLockError::Randomness(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_secrets(secrets)
    }

    /// Commit to caller-provided secrets, index order preserved
    pub fn from_secrets(secrets: Vec<Secret>) -> Result<Commitment, HashLockError> {
        check_count(secrets.len())?;
        let secret_hashes: Vec<SecretHash> = secrets.iter().map(Secret::hash).collect();

        let hash_lock = if secrets.len() == 1 {
            HashLock::for_single_fill(&secrets[0])
        } else {
            HashLock::for_multiple_fills(&secret_hashes)?
        };

        Ok(Commitment {
            secrets,
            secret_hashes,
            hash_lock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_secrets(count: u8) -> Vec<Secret> {
        (0..count).map(|i| Secret::from_bytes([i + 1; 32])).collect()
    }

    #[test]
    fn test_single_fill_is_secret_hash() {
        let secrets = fixed_secrets(1);
        let expected = secrets[0].hash();
        let commitment = HashLockBuilder::from_secrets(secrets).unwrap();

        assert_eq!(commitment.hash_lock, HashLock::SingleFill(expected));
        assert_eq!(commitment.secret_hashes, vec![expected]);
        assert_eq!(commitment.hash_lock.fill_count(), 1);
    }

    #[test]
    fn test_multi_fill_encodes_count() {
        let commitment = HashLockBuilder::from_secrets(fixed_secrets(5)).unwrap();
        let lock = commitment.hash_lock;

        assert!(lock.is_multi_fill());
        assert_eq!(lock.fill_count(), 5);
        assert_eq!(&lock.value()[..2], &[0x00u8, 0x04]);
        assert_eq!(commitment.secret_hashes.len(), 5);
    }

    #[test]
    fn test_multi_fill_keeps_low_bits_of_root() {
        let secrets = fixed_secrets(3);
        let hashes: Vec<_> = secrets.iter().map(Secret::hash).collect();
        let root = merkle_root(&merkle_leaves(&hashes)).unwrap();
        let lock = HashLock::for_multiple_fills(&hashes).unwrap();

        assert_eq!(&lock.value()[2..], &root[2..]);
        assert_eq!(&lock.value()[..2], &[0x00u8, 0x02]);
    }

    #[test]
    fn test_two_leaf_root_is_sorted_pair_hash() {
        let a = B256::repeat_byte(0x01);
        let b = B256::repeat_byte(0x02);
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(a.as_slice());
        buf[32..].copy_from_slice(b.as_slice());

        assert_eq!(merkle_root(&[a, b]), Some(keccak256(buf)));
        assert_eq!(merkle_root(&[b, a]), Some(keccak256(buf)));
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let leaf = B256::repeat_byte(0x07);
        assert_eq!(merkle_root(&[leaf]), Some(leaf));
        assert_eq!(merkle_root(&[]), None);
    }

    #[test]
    fn test_leaf_binds_index() {
        let h = B256::repeat_byte(0x09);
        assert_ne!(merkle_leaf(0, &h), merkle_leaf(1, &h));

        let mut buf = [0u8; 40];
        buf[7] = 3;
        buf[8..].copy_from_slice(h.as_slice());
        assert_eq!(merkle_leaf(3, &h), keccak256(buf));
    }

    #[test]
    fn test_secret_order_changes_lock() {
        let forward = HashLockBuilder::from_secrets(fixed_secrets(4)).unwrap();
        let mut reversed = fixed_secrets(4);
        reversed.reverse();
        let reversed = HashLockBuilder::from_secrets(reversed).unwrap();

        assert_ne!(forward.hash_lock, reversed.hash_lock);
    }

    #[test]
    fn test_count_bounds() {
        assert_eq!(
            HashLockBuilder::build(0).unwrap_err(),
            HashLockError::ZeroSecrets
        );
        assert_eq!(
            HashLockBuilder::build(MAX_SECRETS + 1).unwrap_err(),
            HashLockError::TooManySecrets {
                count: MAX_SECRETS + 1,
                max: MAX_SECRETS,
            }
        );
        assert!(HashLock::for_multiple_fills(&[]).is_err());
    }

    #[test]
    fn test_build_generates_distinct_secrets() {
        let commitment = HashLockBuilder::build(8).unwrap();
        assert_eq!(commitment.len(), 8);

        let mut hashes = commitment.secret_hashes.clone();
        hashes.sort();
        hashes.dedup();
        assert_eq!(hashes.len(), 8);
        assert_eq!(commitment.secret(7).map(Secret::hash), Some(commitment.secret_hashes[7]));
        assert!(commitment.secret(8).is_none());
    }
}
