use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// Numeric advertising account id. Parsing accepts the dashed form
/// (`123-456-7890`); display is the plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountId(u64);

impl AccountId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    /// `123-456-7890` style rendering, used in human-facing messages.
    pub fn dashed(&self) -> String {
        let digits = self.0.to_string();
        if digits.len() != 10 {
            return digits;
        }
        format!("{}-{}-{}", &digits[..3], &digits[3..6], &digits[6..])
    }
}

impl From<u64> for AccountId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AccountId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '-').collect();
        if cleaned.is_empty() {
            anyhow::bail!("empty account id");
        }
        cleaned
            .parse::<u64>()
            .map(Self)
            .map_err(|_| anyhow::anyhow!("invalid account id {s:?}"))
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AccountIdVisitor;

        impl Visitor<'_> for AccountIdVisitor {
            type Value = AccountId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an account id as integer or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<AccountId, E> {
                Ok(AccountId(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<AccountId, E> {
                u64::try_from(v)
                    .map(AccountId)
                    .map_err(|_| E::custom(format!("negative account id {v}")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<AccountId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(AccountIdVisitor)
    }
}

// ---------------------------------------------------------------------------
// Account id files
// ---------------------------------------------------------------------------

/// Parse an account id list: one id per line, blank lines and `#` comments
/// skipped, duplicates collapsed keeping first-seen order.
pub fn parse_account_ids(text: &str) -> anyhow::Result<Vec<AccountId>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let id: AccountId = line
            .parse()
            .map_err(|e| anyhow::anyhow!("line {}: {e}", lineno + 1))?;
        if seen.insert(id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Read and parse an account id file.
pub fn load_account_ids(path: impl AsRef<Path>) -> anyhow::Result<Vec<AccountId>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    parse_account_ids(&content).map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))
}

/// Merge several id lists, dropping duplicates and keeping first-seen order.
pub fn merge_account_ids<'a>(lists: impl IntoIterator<Item = &'a [AccountId]>) -> Vec<AccountId> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for list in lists {
        for id in list {
            if seen.insert(*id) {
                out.push(*id);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_strips_dashes() {
        let id: AccountId = "123-456-7890".parse().unwrap();
        assert_eq!(id.get(), 1234567890);
        assert_eq!(id.to_string(), "1234567890");
        assert_eq!(id.dashed(), "123-456-7890");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("abc".parse::<AccountId>().is_err());
        assert!("---".parse::<AccountId>().is_err());
    }

    #[test]
    fn file_parsing_skips_comments_and_duplicates() {
        let text = "# production accounts\n123-456-7890\n\n9876543210\n1234567890\n";
        let ids = parse_account_ids(text).unwrap();
        assert_eq!(ids, vec![AccountId::new(1234567890), AccountId::new(9876543210)]);
    }

    #[test]
    fn file_parsing_names_bad_line() {
        let err = parse_account_ids("1234567890\nnot-an-id\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"), "{err}");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.txt");
        std::fs::write(&path, "111-222-3333\n").unwrap();
        assert_eq!(load_account_ids(&path).unwrap(), vec![AccountId::new(1112223333)]);
    }

    #[test]
    fn merge_keeps_order() {
        let a = [AccountId::new(3), AccountId::new(1)];
        let b = [AccountId::new(1), AccountId::new(2)];
        let merged = merge_account_ids([&a[..], &b[..]]);
        assert_eq!(merged, vec![AccountId::new(3), AccountId::new(1), AccountId::new(2)]);
    }

    #[test]
    fn deserialize_int_or_string() {
        let ids: Vec<AccountId> = serde_json::from_str(r#"[1234567890, "987-654-3210"]"#).unwrap();
        assert_eq!(ids, vec![AccountId::new(1234567890), AccountId::new(9876543210)]);
    }
}
