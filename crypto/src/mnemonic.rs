//! BIP39 mnemonic generation, validation and seed derivation.
//!
//! Mnemonics use the English wordlist. Entropy comes from the OS RNG; the word
//! count fixes the entropy size (12 words = 128 bits ... 24 words = 256 bits).

use bip39::Mnemonic;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::{CryptoError, Seed};

/// Word counts that carry a whole number of checksum bits.
pub const VALID_WORD_COUNTS: [usize; 5] = [12, 15, 18, 21, 24];

pub fn is_valid_word_count(words: usize) -> bool {
    VALID_WORD_COUNTS.contains(&words)
}

/// Generate a fresh mnemonic of `word_count` words.
pub fn generate_mnemonic(word_count: usize) -> Result<Zeroizing<String>, CryptoError> {
    if !is_valid_word_count(word_count) {
        return Err(CryptoError::InvalidWordCount(word_count));
    }
    let mut entropy = Zeroizing::new([0u8; 32]);
    let len = word_count / 3 * 4;
    rand::rngs::OsRng.fill_bytes(&mut entropy[..len]);
    let mnemonic = Mnemonic::from_entropy(&entropy[..len])
        .map_err(|e| CryptoError::Derivation(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_string()))
}

/// True iff every word is in the wordlist and the checksum matches.
pub fn validate_mnemonic(phrase: &str) -> bool {
    parse(phrase).is_ok()
}

/// Derive the 64-byte seed (PBKDF2-HMAC-SHA512, 2048 rounds).
pub fn derive_seed(phrase: &str, passphrase: Option<&str>) -> Result<Seed, CryptoError> {
    let mnemonic = parse(phrase)?;
    Ok(Seed::from_bytes(
        mnemonic.to_seed_normalized(passphrase.unwrap_or("")),
    ))
}

fn parse(phrase: &str) -> Result<Mnemonic, CryptoError> {
    let words = phrase.split_whitespace().count();
    if !is_valid_word_count(words) {
        return Err(CryptoError::InvalidWordCount(words));
    }
    Mnemonic::parse_normalized(phrase).map_err(|e| CryptoError::InvalidMnemonic(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generates_every_valid_length() {
        for words in VALID_WORD_COUNTS {
            let phrase = generate_mnemonic(words).unwrap();
            assert_eq!(phrase.split_whitespace().count(), words);
            assert!(validate_mnemonic(&phrase));
        }
    }

    #[test]
    fn rejects_invalid_lengths() {
        for words in [0, 11, 13, 25] {
            assert_eq!(generate_mnemonic(words), Err(CryptoError::InvalidWordCount(words)));
        }
    }

    #[test]
    fn generated_mnemonics_differ() {
        assert_ne!(*generate_mnemonic(12).unwrap(), *generate_mnemonic(12).unwrap());
    }

    #[test]
    fn validation_checks_checksum() {
        assert!(validate_mnemonic(ABANDON_ABOUT));
        let bad = ABANDON_ABOUT.replace("about", "abandon");
        assert!(!validate_mnemonic(&bad));
        assert!(!validate_mnemonic("not a valid mnemonic phrase"));
        assert!(!validate_mnemonic(""));
    }

    #[test]
    fn seed_golden_vectors() {
        let seed = derive_seed(ABANDON_ABOUT, None).unwrap();
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc19a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
        let seed = derive_seed(ABANDON_ABOUT, Some("TREZOR")).unwrap();
        assert_eq!(
            hex::encode(seed.as_bytes()),
            "c55257c360c07c72029aebc1b53c05ed0362ada38ead3e3e9efa3708e53495531f09a6987599d18264c1e1c92f2cf141630c7a3c4ab7c81b2f001698e7463b04"
        );
    }

    #[test]
    fn seed_is_deterministic_and_passphrase_sensitive() {
        let phrase = generate_mnemonic(24).unwrap();
        assert_eq!(derive_seed(&phrase, None).unwrap(), derive_seed(&phrase, Some("")).unwrap());
        assert_ne!(derive_seed(&phrase, None).unwrap(), derive_seed(&phrase, Some("x")).unwrap());
    }
}
