//! Token pair identity and the canonical pool key

use crate::error::{AmmError, AmmResult};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use web3::types::{Address, H256};

/// Canonical key for a pool: `keccak256(lower_token ++ higher_token)`
///
/// Identical for `(a, b)` and `(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PoolKey(H256);

impl PoolKey {
    pub fn for_tokens(token_x: Address, token_y: Address) -> Self {
        let (lo, hi) = if token_x <= token_y {
            (token_x, token_y)
        } else {
            (token_y, token_x)
        };
        let mut hasher = Keccak256::new();
        hasher.update(lo.as_bytes());
        hasher.update(hi.as_bytes());
        Self(H256::from_slice(&hasher.finalize()))
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Which side of the pair an address refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// The two assets of a pool, in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenPair {
    token_a: Address,
    token_b: Address,
}

impl TokenPair {
    pub fn new(token_a: Address, token_b: Address) -> AmmResult<Self> {
        if token_a == token_b {
            return Err(AmmError::IdenticalAddresses);
        }
        if token_a.is_zero() || token_b.is_zero() {
            return Err(AmmError::ZeroAddress);
        }
        Ok(Self { token_a, token_b })
    }

    pub fn token_a(&self) -> Address {
        self.token_a
    }

    pub fn token_b(&self) -> Address {
        self.token_b
    }

    pub fn key(&self) -> PoolKey {
        PoolKey::for_tokens(self.token_a, self.token_b)
    }

    pub fn side_of(&self, token: &Address) -> Option<Side> {
        if *token == self.token_a {
            Some(Side::A)
        } else if *token == self.token_b {
            Some(Side::B)
        } else {
            None
        }
    }

    /// Resolve a caller-ordered `(x, y)` against the pair.
    ///
    /// Returns `Ok(false)` when `(x, y) == (a, b)`, `Ok(true)` when reversed.
    pub fn orientation(&self, token_x: &Address, token_y: &Address) -> AmmResult<bool> {
        match (self.side_of(token_x), self.side_of(token_y)) {
            (Some(Side::A), Some(Side::B)) => Ok(false),
            (Some(Side::B), Some(Side::A)) => Ok(true),
            _ => Err(AmmError::InvalidPath),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::repeat_byte(byte)
    }

    #[test]
    fn test_pair_validation() {
        assert_eq!(
            TokenPair::new(addr(1), addr(1)),
            Err(AmmError::IdenticalAddresses)
        );
        assert_eq!(
            TokenPair::new(Address::zero(), addr(1)),
            Err(AmmError::ZeroAddress)
        );
        assert!(TokenPair::new(addr(1), addr(2)).is_ok());
    }

    #[test]
    fn test_pool_key_is_order_independent() {
        assert_eq!(
            PoolKey::for_tokens(addr(1), addr(2)),
            PoolKey::for_tokens(addr(2), addr(1))
        );
        assert_ne!(
            PoolKey::for_tokens(addr(1), addr(2)),
            PoolKey::for_tokens(addr(1), addr(3))
        );
    }

    #[test]
    fn test_orientation() {
        let pair = TokenPair::new(addr(1), addr(2)).unwrap();
        assert_eq!(pair.orientation(&addr(1), &addr(2)), Ok(false));
        assert_eq!(pair.orientation(&addr(2), &addr(1)), Ok(true));
        assert_eq!(
            pair.orientation(&addr(1), &addr(1)),
            Err(AmmError::InvalidPath)
        );
        assert_eq!(
            pair.orientation(&addr(1), &addr(9)),
            Err(AmmError::InvalidPath)
        );
    }
}
