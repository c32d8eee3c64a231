//! Key material for the tessera wallet engine.
//!
//! - **BIP39** mnemonics and seed derivation
//! - **BIP32** hierarchical derivation along BIP44/BIP84 paths
//! - **secp256k1** recoverable signing for Ethereum (k256), segwit keys via `bitcoin`
//! - **Keccak-256** hashing and EIP-55 checksummed addresses
//!
//! Secret bytes are returned wrapped in [`zeroize::Zeroizing`] so they are wiped
//! when the caller drops them.

pub mod address;
pub mod btc;
pub mod error;
pub mod eth;
pub mod hash;
pub mod keys;
pub mod mnemonic;
pub mod seed;
pub mod sign;

pub use address::{is_valid_btc_address, is_valid_eth_address};
pub use error::CryptoError;
pub use hash::{keccak256, keccak256_multi};
pub use keys::{derivation_path, derive_account, derive_private_key, DerivedAccount, PrivateKeyBytes};
pub use mnemonic::{derive_seed, generate_mnemonic, is_valid_word_count, validate_mnemonic, VALID_WORD_COUNTS};
pub use seed::Seed;
pub use sign::{recover_eth_address, sign_recoverable, RecoverableSignature};
