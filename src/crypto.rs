// src/crypto.rs
//! Crypto payment-method classification and canonical block ordering.
//!
//! "Jeton" and "Binance Pay" superficially resemble crypto rails but are
//! standalone visible methods; they must never be classified into the crypto
//! block.

/// Canonical ticker ordering inside the crypto block, matching the frontend
pub const CRYPTO_TICKER_ORDER: &[&str] = &[
    "USDTT", "LTC", "ETH", "TRX", "BTC", "SOL", "XRP", "USDTE", "DOGE", "ADA", "USDC", "BCH",
    "TON",
];

/// Name substrings that mark a method as a crypto rail
const CRYPTO_NAME_TOKENS: &[&str] = &[
    "coinspaid", "crypto", "tether", "bitcoin", "ethereum", "litecoin", "ripple", "tron", "usdc",
    "usdt", "doge", "cardano", "solana", "toncoin",
];

/// Title prefixes for individual crypto sub-methods
const CRYPTO_TITLE_PREFIXES: &[&str] = &[
    "btc", "eth", "ltc", "xrp", "trx", "usdt", "usdc", "sol", "ada", "bch", "ton", "doge",
];

/// Rank of a title within the crypto block: "Crypto" itself first, then the
/// canonical ticker order, then unrecognized crypto tokens.
pub fn crypto_index(title: &str) -> usize {
    if title == "Crypto" {
        return 0;
    }
    let upper = title.to_ascii_uppercase();
    for (i, ticker) in CRYPTO_TICKER_ORDER.iter().enumerate() {
        if upper.starts_with(ticker) {
            return i + 1;
        }
    }
    999
}

/// Whether a title belongs to the crypto block at sort time
pub fn is_crypto_title(title: &str) -> bool {
    if is_excluded(title, "") {
        return false;
    }
    title == "Crypto" || crypto_index(title) < 999
}

/// Whether a (title, name) pair is an individual crypto sub-method that a
/// crypto-grouping site consolidates away
pub fn is_crypto_method(title: &str, name: &str) -> bool {
    if is_excluded(title, name) {
        return false;
    }

    let name_lower = name.to_ascii_lowercase();
    if CRYPTO_NAME_TOKENS.iter().any(|t| name_lower.contains(t)) {
        return true;
    }

    let title_lower = title.trim().to_ascii_lowercase();
    if title_lower == "crypto" {
        return true;
    }

    CRYPTO_TITLE_PREFIXES
        .iter()
        .any(|p| title_lower.starts_with(p))
}

fn is_excluded(title: &str, name: &str) -> bool {
    let title_lower = title.trim().to_ascii_lowercase();
    if title_lower == "jeton" || title_lower == "binance pay" {
        return true;
    }
    name.to_ascii_lowercase().contains("binance")
}
