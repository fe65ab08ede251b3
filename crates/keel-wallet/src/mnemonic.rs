//! BIP-39 phrase generation, validation, and seed derivation.
//!
//! Wordlists and the phrase→seed function are the bip39 collaborator's;
//! this module only decides entropy sizes and which languages count as
//! supported.

use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::WalletError;

/// Languages a phrase may be written in.
///
/// Validation checks each in turn, so `is_valid_phrase` costs one
/// checksum verification per language in the worst case.
pub const LANGUAGES: &[Language] = &[
    Language::Czech,
    Language::English,
    Language::French,
    Language::Italian,
    Language::Japanese,
    Language::Korean,
    Language::Portuguese,
    Language::SimplifiedChinese,
    Language::Spanish,
    Language::TraditionalChinese,
];

/// Supported phrase lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PhraseLength {
    #[default]
    Words12,
    Words15,
    Words18,
    Words21,
    Words24,
}

impl PhraseLength {
    /// Entropy bytes backing a phrase of this length.
    fn entropy_bytes(self) -> usize {
        match self {
            PhraseLength::Words12 => 16,
            PhraseLength::Words15 => 20,
            PhraseLength::Words18 => 24,
            PhraseLength::Words21 => 28,
            PhraseLength::Words24 => 32,
        }
    }
}

/// Generate a fresh phrase from OS-sourced entropy.
pub fn generate_phrase(language: Language, length: PhraseLength) -> String {
    let mut entropy = Zeroizing::new(vec![0u8; length.entropy_bytes()]);
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(language, &entropy)
        .expect("entropy sizes map to valid word counts");
    mnemonic.to_string()
}

/// Whether `phrase` checksums correctly in any supported language.
///
/// No false negatives within the supported languages.
pub fn is_valid_phrase(phrase: &str) -> bool {
    parse_phrase(phrase).is_some()
}

/// Deterministic 64-byte BIP-39 seed of a phrase (empty passphrase).
///
/// Pure function of the phrase bytes.
pub fn phrase_to_seed(phrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = parse_phrase(phrase)
        .ok_or_else(|| WalletError::Encoding("invalid mnemonic phrase".into()))?;
    Ok(Zeroizing::new(mnemonic.to_seed("")))
}

fn parse_phrase(phrase: &str) -> Option<Mnemonic> {
    let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    LANGUAGES
        .iter()
        .find_map(|language| Mnemonic::parse_in(*language, &normalized).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE_PHRASE: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn generated_phrase_is_valid() {
        for length in [
            PhraseLength::Words12,
            PhraseLength::Words15,
            PhraseLength::Words18,
            PhraseLength::Words21,
            PhraseLength::Words24,
        ] {
            let phrase = generate_phrase(Language::English, length);
            assert!(is_valid_phrase(&phrase), "phrase was: {phrase}");
        }
    }

    #[test]
    fn generated_word_count_matches_length() {
        let phrase = generate_phrase(Language::English, PhraseLength::Words24);
        assert_eq!(phrase.split_whitespace().count(), 24);
        let phrase = generate_phrase(Language::English, PhraseLength::Words12);
        assert_eq!(phrase.split_whitespace().count(), 12);
    }

    #[test]
    fn generated_phrases_are_unique() {
        let a = generate_phrase(Language::English, PhraseLength::Words12);
        let b = generate_phrase(Language::English, PhraseLength::Words12);
        assert_ne!(a, b);
    }

    #[test]
    fn non_english_phrase_validates() {
        let phrase = generate_phrase(Language::Spanish, PhraseLength::Words12);
        assert!(is_valid_phrase(&phrase));
    }

    #[test]
    fn bad_checksum_rejected() {
        // Valid words, wrong final checksum word.
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon";
        assert!(!is_valid_phrase(phrase));
    }

    #[test]
    fn unknown_word_rejected() {
        assert!(!is_valid_phrase("definitely not a mnemonic phrase at all"));
    }

    #[test]
    fn reference_seed_vector() {
        let seed = phrase_to_seed(REFERENCE_PHRASE).unwrap();
        assert_eq!(
            hex::encode(&seed[..]),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn seed_is_deterministic() {
        let a = phrase_to_seed(REFERENCE_PHRASE).unwrap();
        let b = phrase_to_seed(REFERENCE_PHRASE).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn seed_normalizes_whitespace() {
        let messy = REFERENCE_PHRASE.replace(' ', "   ");
        let a = phrase_to_seed(&messy).unwrap();
        let b = phrase_to_seed(REFERENCE_PHRASE).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn seed_of_invalid_phrase_fails() {
        let err = phrase_to_seed("not a phrase").unwrap_err();
        assert!(matches!(err, WalletError::Encoding(_)));
    }
}
