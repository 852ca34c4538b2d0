//! Reference tables for Vietnamese banks, carriers, relationships and units.
//!
//! The defaults describe the data returned by the VSS lookup portal. Every table
//! is plain data so deployments can replace it through the JSON config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A known bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Short code as printed on portal pages (e.g. "VCB").
    pub code: String,
    /// Official Vietnamese name.
    pub full_name: String,
    /// Brand spellings that identify the bank on their own (uppercase).
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A unit keyword that scales an income amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMultiplier {
    /// Lowercase keyword, matched as a whole token.
    pub keyword: String,
    /// Factor applied to the parsed amount.
    pub factor: u64,
}

/// Lookup data injected into normalizers and validators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LookupTables {
    /// Known banks, in matching priority order.
    pub banks: Vec<BankEntry>,

    /// Three-digit mobile prefix to carrier name.
    pub phone_prefixes: BTreeMap<String, String>,

    /// Lowercase relationship spelling to canonical label.
    pub relationships: BTreeMap<String, String>,

    /// Relationship words recognized inside free text.
    pub relationship_keywords: Vec<String>,

    /// Income unit keywords, checked in order.
    pub unit_multipliers: Vec<UnitMultiplier>,
}

impl Default for LookupTables {
    fn default() -> Self {
        Self {
            banks: default_banks(),
            phone_prefixes: default_phone_prefixes(),
            relationships: default_relationships(),
            relationship_keywords: [
                "Vợ", "Chồng", "Con trai", "Con gái", "Con", "Cha", "Bố", "Mẹ", "Anh", "Chị",
                "Em", "Ông", "Bà", "Cháu", "Chú", "Cô", "Bác", "Dì", "Dượng", "Wife", "Husband",
                "Son", "Daughter", "Father", "Mother",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            unit_multipliers: [
                ("triệu", 1_000_000),
                ("million", 1_000_000),
                ("tr", 1_000_000),
                ("nghìn", 1_000),
                ("ngàn", 1_000),
                ("thousand", 1_000),
                ("k", 1_000),
                ("tỷ", 1_000_000_000),
                ("billion", 1_000_000_000),
            ]
            .iter()
            .map(|(keyword, factor)| UnitMultiplier {
                keyword: keyword.to_string(),
                factor: *factor,
            })
            .collect(),
        }
    }
}

impl LookupTables {
    /// Canonical label for a relationship spelling, if known.
    ///
    /// Tries the whole phrase first, then its first word ("Con trai" → "Con").
    pub fn canonical_relationship(&self, raw: &str) -> Option<&str> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        if let Some(label) = self.relationships.get(&key) {
            return Some(label.as_str());
        }
        let first = key.split_whitespace().next()?;
        self.relationships.get(first).map(String::as_str)
    }

    /// Whether a label is one of the canonical relationship values.
    pub fn is_canonical_relationship(&self, label: &str) -> bool {
        self.relationships.values().any(|v| v == label)
    }

    /// Carrier for the first three digits of a normalized phone number.
    pub fn carrier(&self, phone: &str) -> Option<&str> {
        phone
            .get(..3)
            .and_then(|prefix| self.phone_prefixes.get(prefix))
            .map(String::as_str)
    }

    /// Bank entry by exact code.
    pub fn bank_by_code(&self, code: &str) -> Option<&BankEntry> {
        self.banks.iter().find(|b| b.code.eq_ignore_ascii_case(code))
    }
}

fn default_banks() -> Vec<BankEntry> {
    let bank = |code: &str, full_name: &str, aliases: &[&str]| BankEntry {
        code: code.to_string(),
        full_name: full_name.to_string(),
        aliases: aliases.iter().map(|a| a.to_string()).collect(),
    };

    vec![
        bank("ACB", "Ngân hàng TMCP Á Châu (ACB)", &[]),
        bank("VCB", "Ngân hàng TMCP Ngoại thương Việt Nam (Vietcombank)", &["VIETCOMBANK"]),
        bank("TCB", "Ngân hàng TMCP Kỹ thương Việt Nam (Techcombank)", &["TECHCOMBANK"]),
        bank("CTG", "Ngân hàng TMCP Công thương Việt Nam (VietinBank)", &["VIETINBANK"]),
        bank("MBB", "Ngân hàng TMCP Quân đội (MB Bank)", &["MB BANK", "MBBANK"]),
        bank("VPB", "Ngân hàng TMCP Việt Nam Thịnh vượng (VPBank)", &["VPBANK"]),
        bank("SHB", "Ngân hàng TMCP Sài Gòn - Hà Nội (SHB)", &[]),
        bank("EIB", "Ngân hàng TMCP Xuất Nhập khẩu Việt Nam (Eximbank)", &["EXIMBANK"]),
        bank("OCB", "Ngân hàng TMCP Phương Đông (OCB)", &[]),
        bank("TPB", "Ngân hàng TMCP Tiên Phong (TPBank)", &["TPBANK"]),
        bank("HDB", "Ngân hàng TMCP Phát triển nhà TPHCM (HDBank)", &["HDBANK"]),
        bank("BID", "Ngân hàng TMCP Đầu tư và Phát triển Việt Nam (BIDV)", &["BIDV"]),
        bank("VIB", "Ngân hàng TMCP Quốc tế Việt Nam (VIB)", &[]),
        bank("SEA", "Ngân hàng TMCP Đông Nam Á (SeABank)", &["SEABANK"]),
        bank("STB", "Ngân hàng TMCP Sài Gòn Thương Tín (Sacombank)", &["SACOMBANK"]),
        bank("VBA", "Ngân hàng Nông nghiệp và Phát triển Nông thôn Việt Nam (Agribank)", &["AGRIBANK"]),
    ]
}

fn default_phone_prefixes() -> BTreeMap<String, String> {
    let carriers: [(&str, &[&str]); 6] = [
        ("Viettel", &["032", "033", "034", "035", "036", "037", "038", "039", "086", "096", "097", "098"]),
        ("Mobifone", &["070", "076", "077", "078", "079", "089", "090", "093"]),
        ("Vinaphone", &["081", "082", "083", "084", "085", "088", "091", "094"]),
        ("Vietnamobile", &["052", "056", "058", "092"]),
        ("Gmobile", &["059", "099"]),
        ("Itelecom", &["087"]),
    ];

    carriers
        .iter()
        .flat_map(|(carrier, prefixes)| {
            prefixes
                .iter()
                .map(move |p| (p.to_string(), carrier.to_string()))
        })
        .collect()
}

fn default_relationships() -> BTreeMap<String, String> {
    let groups: [(&str, &[&str]); 17] = [
        ("Con", &["con", "con trai", "con gái", "con nuôi", "son", "daughter", "child"]),
        ("Vợ", &["vợ", "vo", "wife"]),
        ("Chồng", &["chồng", "chong", "husband"]),
        ("Cha", &["cha", "bố", "bo", "father"]),
        ("Mẹ", &["mẹ", "me", "má", "mother"]),
        ("Anh", &["anh", "anh trai", "brother"]),
        ("Chị", &["chị", "chi", "chị gái", "sister"]),
        ("Em", &["em", "em trai", "em gái"]),
        ("Ông", &["ông", "ong", "grandfather"]),
        ("Bà", &["bà", "ba", "grandmother"]),
        ("Cháu", &["cháu", "chau", "grandchild"]),
        ("Chú", &["chú", "chu"]),
        ("Cô", &["cô", "co"]),
        ("Bác", &["bác", "bac"]),
        ("Dì", &["dì", "di"]),
        ("Dượng", &["dượng", "duong"]),
        ("Chủ hộ", &["chủ hộ", "chu ho", "head"]),
    ];

    groups
        .iter()
        .flat_map(|(label, spellings)| {
            spellings
                .iter()
                .map(move |s| (s.to_string(), label.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_canonical_relationship() {
        let tables = LookupTables::default();
        assert_eq!(tables.canonical_relationship("vo"), Some("Vợ"));
        assert_eq!(tables.canonical_relationship(" Con trai "), Some("Con"));
        assert_eq!(tables.canonical_relationship("CHỒNG"), Some("Chồng"));
        assert_eq!(tables.canonical_relationship("Con rể"), Some("Con"));
        assert_eq!(tables.canonical_relationship("hàng xóm"), None);
        assert_eq!(tables.canonical_relationship(""), None);
    }

    #[test]
    fn test_carrier_lookup() {
        let tables = LookupTables::default();
        assert_eq!(tables.carrier("0912345678"), Some("Vinaphone"));
        assert_eq!(tables.carrier("0987654321"), Some("Viettel"));
        assert_eq!(tables.carrier("0123456789"), None);
        assert_eq!(tables.carrier("09"), None);
    }

    #[test]
    fn test_bank_by_code() {
        let tables = LookupTables::default();
        let bank = tables.bank_by_code("vcb").unwrap();
        assert!(bank.full_name.contains("Vietcombank"));
        assert!(tables.bank_by_code("XYZ").is_none());
    }
}
