use bip32::{DerivationPath, Language, Mnemonic, XPrv};
use ethereum_types::{Address, H256, U256};
use secp256k1::{PublicKey, SECP256K1, SecretKey};
use sha3::{Digest, Keccak256};

/// BIP-44 path of the first Ethereum account, as used by wallets and Hardhat.
pub const ETH_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

/// Wei per native unit (1e18).
pub const WEI_PER_UNIT: u64 = 1_000_000_000_000_000_000;

pub fn keccak(data: impl AsRef<[u8]>) -> H256 {
    H256(Keccak256::digest(data.as_ref()).into())
}

/// Converts a whole number of native units into wei.
pub fn units_to_wei(units: u64) -> U256 {
    U256::from(units).saturating_mul(U256::from(WEI_PER_UNIT))
}

pub fn get_address_from_secret_key(secret_key: &SecretKey) -> Address {
    let public_key = PublicKey::from_secret_key(SECP256K1, secret_key);
    // Skip the 0x04 prefix of the uncompressed encoding.
    let hash = keccak(&public_key.serialize_uncompressed()[1..]);
    Address::from_slice(&hash.as_bytes()[12..])
}

/// EIP-55 mixed-case checksum encoding of an address, `0x` prefixed.
pub fn to_checksum_address(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = (hash.as_bytes()[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn parse_hex(s: &str) -> Result<bytes::Bytes, hex::FromHexError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map(Into::into)
}

pub fn parse_private_key(s: &str) -> eyre::Result<SecretKey> {
    Ok(SecretKey::from_slice(&parse_hex(s)?)?)
}

/// Derives the key of the first account of a BIP-39 English mnemonic, with
/// an empty passphrase.
pub fn derive_key_from_mnemonic(phrase: &str) -> eyre::Result<SecretKey> {
    let words = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    let mnemonic = Mnemonic::new(words, Language::English)
        .map_err(|err| eyre::eyre!("invalid mnemonic: {err}"))?;
    let path: DerivationPath = ETH_DERIVATION_PATH
        .parse()
        .map_err(|err| eyre::eyre!("invalid derivation path: {err}"))?;
    let seed = mnemonic.to_seed("");
    let xprv = XPrv::derive_from_path(seed.as_bytes(), &path)
        .map_err(|err| eyre::eyre!("key derivation failed: {err}"))?;
    Ok(SecretKey::from_slice(&xprv.to_bytes())?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::str::FromStr;

    #[test]
    fn checksum_matches_eip55_vectors() {
        let vectors = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];
        for expected in vectors {
            let address = Address::from_str(&expected[2..]).unwrap();
            assert_eq!(to_checksum_address(&address), expected);
        }
    }

    #[test]
    fn derives_hardhat_dev_account() {
        let key = parse_private_key(
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        assert_eq!(
            to_checksum_address(&get_address_from_secret_key(&key)),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn derives_first_account_of_the_dev_mnemonic() {
        let key = derive_key_from_mnemonic(
            "test test test test test test test test test test test junk",
        )
        .unwrap();

        assert_eq!(
            key,
            parse_private_key(
                "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
            )
            .unwrap()
        );
        assert_eq!(
            to_checksum_address(&get_address_from_secret_key(&key)),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }

    #[test]
    fn rejects_phrases_with_a_bad_checksum() {
        let abandon = ["abandon"; 12].join(" ");
        assert!(derive_key_from_mnemonic(&abandon).is_err());
        assert!(derive_key_from_mnemonic("not a mnemonic").is_err());
    }

    #[test]
    fn one_unit_is_1e18_wei() {
        assert_eq!(units_to_wei(1), U256::exp10(18));
        assert_eq!(units_to_wei(100), U256::exp10(20));
    }
}
