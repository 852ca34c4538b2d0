//! Default patterns for the VSS lookup portal.
//!
//! Patterns are ordered from most to least specific. Regexes are compiled
//! case-insensitively, so parts that depend on letter case are wrapped in
//! `(?-i:...)`.

use super::{FieldPatterns, BANK, HOUSEHOLD_CODE, INCOME, MEMBERS, PHONE};
use crate::fields::{NormalizerKind, ValidationRule};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(super) fn default_patterns() -> Vec<(&'static str, FieldPatterns)> {
    vec![
        (PHONE, phone()),
        (INCOME, income()),
        (BANK, bank()),
        (HOUSEHOLD_CODE, household_code()),
        (MEMBERS, members()),
    ]
}

fn phone() -> FieldPatterns {
    FieldPatterns {
        selectors: strings(&[
            r#"td:contains("Điện thoại") + td"#,
            r#"td:contains("SĐT") + td"#,
            r#"td:contains("Phone") + td"#,
            r#"span[class*="phone"]"#,
            r#"div[class*="contact"] .phone"#,
            r#".field-phone .value"#,
            r#"[data-field="phone"]"#,
            r#"input[name*="phone"]"#,
        ]),
        regexes: strings(&[
            r"\b(?:Điện\s*thoại|SĐT|Phone|Mobile|Tel)[:\s]*([0-9+\-\s()]{9,15})",
            r"(?:\+84|84|0)[1-9][0-9\s\-.]{7,10}",
            r"\b(0[1-9][0-9]{8,9})\b",
            r"(\+84[1-9][0-9]{8,9})\b",
            r"\b(?:DT|Contact)[:\s]*([0-9\-\s+]{9,15})",
        ]),
        context_keywords: strings(&["điện thoại", "sđt", "phone", "mobile", "hotline"]),
        paths: strings(&[
            r#"//td[contains(text(),"Điện thoại")]/following-sibling::td[1]"#,
            r#"//td[contains(text(),"SĐT")]/following-sibling::td[1]"#,
            r#"//span[@class and contains(@class,"phone")]/text()"#,
            r#"//input[@name and contains(@name,"phone")]/@value"#,
        ]),
        fallbacks: strings(&[r"\b0[1-9][0-9]{8,9}\b", r"\+?84[1-9][0-9]{8,9}\b"]),
        validation_rules: vec![ValidationRule::PhoneFormat, ValidationRule::PhonePrefix],
        normalizer: NormalizerKind::Phone,
        reference_keys: strings(&["phone", "so_dien_thoai", "sdt", "dien_thoai"]),
        ..Default::default()
    }
}

fn income() -> FieldPatterns {
    FieldPatterns {
        selectors: strings(&[
            r#"td:contains("Thu nhập") + td"#,
            r#"td:contains("Lương") + td"#,
            r#"td:contains("Income") + td"#,
            r#"span[class*="salary"]"#,
            r#"div[class*="income"] .amount"#,
            r#".field-salary .value"#,
            r#"[data-field="income"]"#,
            r#"input[name*="salary"]"#,
            r#"input[name*="income"]"#,
        ]),
        regexes: strings(&[
            r"(?:Thu\s*nhập|Lương|Income|Salary)[:\s]*([0-9][0-9,.]*)\s*(?:VND|VNĐ|đồng)",
            r"(?:Mức\s*lương|Tiền\s*lương)[:\s]*([0-9][0-9,.]*(?:\s*(?:triệu|tr|nghìn|k)\b)?)",
            r"\b([0-9]{1,3}(?:[,.][0-9]{3})+)\s*(?:VND|VNĐ|đồng)",
            r"\b(?:Income|Salary)[:\s]*([0-9][0-9,.]*)",
            r"\b([0-9]+(?:[,.][0-9]+)?\s*(?:triệu|million))",
        ]),
        context_keywords: strings(&[
            "thu nhập", "lương", "income", "salary", "mức lương", "tiền lương",
        ]),
        paths: strings(&[
            r#"//td[contains(text(),"Thu nhập")]/following-sibling::td[1]"#,
            r#"//td[contains(text(),"Lương")]/following-sibling::td[1]"#,
            r#"//span[@class and contains(@class,"salary")]/text()"#,
        ]),
        fallbacks: strings(&[r"[0-9][0-9.,]*\s*(?:VND|VNĐ|đồng|triệu)"]),
        validation_rules: vec![ValidationRule::IncomeParsed, ValidationRule::IncomeRange],
        normalizer: NormalizerKind::Income,
        reference_keys: strings(&["income", "thu_nhap", "salary", "luong"]),
        ..Default::default()
    }
}

fn bank() -> FieldPatterns {
    FieldPatterns {
        selectors: strings(&[
            r#"td:contains("Ngân hàng") + td"#,
            r#"td:contains("Bank") + td"#,
            r#"span[class*="bank-name"]"#,
            r#"div[class*="banking"] .name"#,
            r#".field-bank .value"#,
            r#"[data-field="bank"]"#,
            r#"select[name*="bank"] option[selected]"#,
            r#"span[class*="bank"]"#,
        ]),
        regexes: strings(&[
            r"(?:Ngân\s*hàng|Bank)\s*:\s*(\p{L}[\p{L} ]{2,49})",
            r"(?-i:\b(ACB|VCB|TCB|CTG|MBB|VPB|VTB|SHB|EIB|OCB|TPB|HDB|LPB|VAB|PGB|NVB|KLB|MSB|SEA|STB|VIB|VBA|BID|BIDV)\b)",
            r"\b(?:NH|Bank)\s*:\s*(\p{L}[\p{L} ]{1,29})",
            r"Bank\s*Code[:\s]*((?-i:[A-Z]{3,10}))",
            r"\b(Vietcombank|Techcombank|VietinBank|Agribank|Sacombank|Eximbank|HDBank|TPBank|VPBank|SeABank|MB\s*Bank)\b",
        ]),
        context_keywords: strings(&["ngân hàng", "bank", "banking", "tài khoản", "account"]),
        paths: strings(&[
            r#"//td[contains(text(),"Ngân hàng")]/following-sibling::td[1]"#,
            r#"//td[contains(text(),"Bank")]/following-sibling::td[1]"#,
            r#"//span[@class and contains(@class,"bank")]/text()"#,
            r#"//select[@name and contains(@name,"bank")]//option[@selected]/text()"#,
        ]),
        fallbacks: strings(&[
            r"\b(?:Vietcombank|Techcombank|VietinBank|Agribank|Sacombank|Eximbank|HDBank|TPBank|VPBank|SeABank|MB ?Bank|BIDV)\b",
        ]),
        validation_rules: vec![ValidationRule::KnownBank],
        normalizer: NormalizerKind::Bank,
        reference_keys: strings(&["bank", "ngan_hang", "bank_name", "bank_code"]),
        ..Default::default()
    }
}

fn household_code() -> FieldPatterns {
    FieldPatterns {
        selectors: strings(&[
            r#"td:contains("Mã hộ") + td"#,
            r#"td:contains("Hộ gia đình") + td"#,
            r#"td:contains("Household") + td"#,
            r#"span[class*="household"]"#,
            r#"div[class*="family"] .code"#,
            r#"div[class*="hgd"] .code"#,
            r#".field-household .value"#,
            r#"[data-field="household_code"]"#,
        ]),
        regexes: strings(&[
            r"Mã\s*HG[ĐD][:\s]*((?-i:[A-Z0-9]{8,15}))\b",
            r"(?:Mã\s*hộ(?:\s*gia\s*đình)?|Hộ\s*gia\s*đình|Household(?:\s*Code)?|HH\s*Code)[:\s]*((?-i:[A-Z0-9]{8,15}))\b",
            r"\b(HGD[0-9A-Z]{5,12})\b",
            r"HGD[:\s]*([A-Z0-9]{8,15})\b",
            r"(?-i:\b([A-Z]{2,3}[0-9]{6,12})\b)",
        ]),
        context_keywords: strings(&["mã hộ", "hộ gia đình", "household", "mã hgđ", "hgd"]),
        paths: strings(&[
            r#"//td[contains(text(),"Mã hộ")]/following-sibling::td[1]"#,
            r#"//td[contains(text(),"Hộ gia đình")]/following-sibling::td[1]"#,
            r#"//span[@class and contains(@class,"household")]/text()"#,
            r#"//div[contains(@class,"family")]//text()[string-length(.) >= 8]"#,
        ]),
        fallbacks: strings(&[r"\b[A-Z]{2,4}[0-9]{6,12}\b"]),
        validation_rules: vec![ValidationRule::HouseholdFormat],
        normalizer: NormalizerKind::HouseholdCode,
        reference_keys: strings(&["household_code", "ma_ho", "ma_ho_gia_dinh", "household_id"]),
        ..Default::default()
    }
}

fn members() -> FieldPatterns {
    FieldPatterns {
        selectors: strings(&[
            r#"table:contains("Thành viên") tbody tr"#,
            r#"table:contains("Hộ gia đình") tbody tr"#,
            r#"div[class*="members"] .member"#,
            r#".family-members .member-row"#,
            r#"[data-section="family_members"] tr"#,
            r#"table.family-table tbody tr"#,
            r#"table:contains("Quan hệ") tbody tr"#,
            r#"div:contains("Thành viên") .member"#,
            r#"div:contains("gia đình") div[class*="member"]"#,
            r#".members p"#,
            r#"div.members div"#,
            r#".family-text"#,
            r#"script[type="application/json"]"#,
        ]),
        regexes: strings(&[
            r"(?:Thành\s*viên|Gia\s*đình)\s*:\s*([^\n\r<]+)",
            r#""family_members"\s*:\s*(\[[^\]]*\])"#,
            r"<tr[^>]*>\s*<td[^>]*>[^<]+</td>\s*<td[^>]*>[^<]+</td>\s*<td[^>]*>[^<]+</td>\s*</tr>",
            r"(?-i:\p{Lu}\p{L}*(?:[ \t]+\p{Lu}\p{L}*)*\s*-\s*(?:Vợ|Chồng|Con|Cha|Mẹ|Anh|Chị|Em)\s*-\s*\d{4})",
        ]),
        context_keywords: strings(&["thành viên", "quan hệ", "family members", "gia đình"]),
        paths: strings(&[
            r#"//table[contains(.,"Thành viên")]//tbody//tr"#,
            r#"//div[@class and contains(@class,"members")]//div[@class and contains(@class,"member")]"#,
            r#"//p[contains(.,"Gia đình")]//text()"#,
        ]),
        fallbacks: strings(&[
            r"(?:Vợ|Chồng|Con|Cha|Mẹ)\s*:\s*[^,\n<>]+",
            r"\p{Lu}\p{L}*(?:[ \t]+\p{Lu}\p{L}*)*\s*[-:]\s*(?:Vợ|Chồng|Con|Cha|Mẹ)",
        ]),
        validation_rules: vec![
            ValidationRule::MembersPresent,
            ValidationRule::MemberCompleteness,
            ValidationRule::BirthYearRange,
        ],
        normalizer: NormalizerKind::Members,
        multi_valued: true,
        reference_keys: strings(&[
            "members",
            "thanh_vien",
            "family_members",
            "thong_tin_thanh_vien",
        ]),
        header_tokens: strings(&[
            "họ tên",
            "họ và tên",
            "quan hệ",
            "năm sinh",
            "name",
            "relationship",
            "birth year",
        ]),
    }
}
