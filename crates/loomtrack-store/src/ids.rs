// SPDX-License-Identifier: Apache-2.0

use chrono::Utc;
use rand::Rng;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `{TYPE}-{SIZE}-{timestamp36}-{random}`, uppercased. Uniqueness is not
/// pre-checked; a collision fails the insert's UNIQUE constraint and is
/// surfaced as a conflict.
#[must_use]
pub fn generate_product_id(category: &str, size: &str) -> String {
    let prefix: String = category.chars().take(3).collect();
    let timestamp = to_base36(Utc::now().timestamp_millis().unsigned_abs());
    format!("{prefix}-{size}-{timestamp}-{}", random_suffix(5)).to_uppercase()
}

/// `TXN-YYYYMMDD-<tail>`. The tail carries millisecond time plus a random
/// suffix; a short numeric tail alone collides too easily under concurrent
/// scanning.
#[must_use]
pub fn generate_transaction_id() -> String {
    let now = Utc::now();
    let date = now.format("%Y%m%d");
    let tail = to_base36(now.timestamp_millis().unsigned_abs());
    format!("TXN-{date}-{tail}{}", random_suffix(6)).to_uppercase()
}

/// `{CAT}-{S}-{CO}-{random}`, used when a product is created without an
/// explicit SKU.
#[must_use]
pub fn generate_sku(category: &str, size: &str, color: Option<&str>) -> String {
    let cat: String = category.chars().take(3).collect();
    let size_code: String = size.chars().take(1).collect();
    let color_code: String = color.unwrap_or("xx").chars().take(2).collect();
    format!("{cat}-{size_code}-{color_code}-{}", random_suffix(4)).to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_carries_category_and_size_prefix() {
        let id = generate_product_id("Shirt", "M");
        assert!(id.starts_with("SHI-M-"), "unexpected id: {id}");
        assert_eq!(id, id.to_uppercase());
        assert_eq!(id.split('-').count(), 4);
    }

    #[test]
    fn transaction_id_is_dated() {
        let id = generate_transaction_id();
        let date = Utc::now().format("%Y%m%d").to_string();
        assert!(id.starts_with(&format!("TXN-{date}-")), "unexpected id: {id}");
    }

    #[test]
    fn generated_ids_do_not_repeat_within_a_batch() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            assert!(seen.insert(generate_transaction_id()));
        }
    }

    #[test]
    fn sku_defaults_color_code() {
        let sku = generate_sku("Shirt", "M", None);
        assert!(sku.starts_with("SHI-M-XX-"), "unexpected sku: {sku}");
    }
}
