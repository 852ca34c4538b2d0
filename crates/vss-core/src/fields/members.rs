//! Household member list parsing.
//!
//! Member text arrives in many shapes: table rows, embedded JSON, inline
//! "Name - Relationship - Year" lines, labelled paragraphs. Each shape is
//! handled by one [`MemberStage`]; the [`MemberCascade`] runs them in order
//! and keeps the output of the first stage that recognizes anyone.

use std::collections::HashMap;
use std::sync::Arc;

use regex::Regex;
use tracing::trace;

use super::patterns::{BIRTH_YEAR, HTML_CELL, HTML_ROW, HTML_TAG, KEY_VALUE_MEMBER, SEGMENT_SPLIT, YEAR_CELL};
use super::Normalized;
use crate::document::text::{cells, collapse_whitespace};
use crate::error::{ExtractionError, Result};
use crate::models::{LookupTables, Member, NormalizedValue};

/// Capitalized words, e.g. "Nguyễn Thị Lan" or "NGUYỄN VĂN ANH".
const NAME: &str = r"\p{Lu}\p{L}*(?:[ \t]+\p{Lu}\p{L}*)*";

/// One way of reading members out of text.
pub trait MemberStage: Send + Sync {
    /// Stable name recorded in normalization steps.
    fn name(&self) -> &'static str;

    /// Members found in `text`, possibly none.
    fn parse(&self, text: &str) -> Vec<Member>;
}

/// Relationship vocabulary shared by the stages.
pub struct Relationships {
    tables: Arc<LookupTables>,
    /// Escaped keyword alternation, longest first.
    alternation: String,
    keyword: Regex,
}

impl Relationships {
    pub fn new(tables: Arc<LookupTables>) -> Result<Self> {
        let mut keywords: Vec<&str> = if tables.relationship_keywords.is_empty() {
            tables.relationships.keys().map(String::as_str).collect()
        } else {
            tables.relationship_keywords.iter().map(String::as_str).collect()
        };
        keywords.retain(|k| !k.trim().is_empty());
        if keywords.is_empty() {
            return Err(ExtractionError::Normalizer {
                name: "members".to_string(),
                reason: "no relationship keywords configured".to_string(),
            }
            .into());
        }
        keywords.sort_by_key(|k| std::cmp::Reverse(k.chars().count()));
        keywords.dedup();

        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");
        let keyword = compile(&format!(r"\b(?i:{})\b", alternation))?;

        Ok(Self {
            tables,
            alternation,
            keyword,
        })
    }

    /// Canonical label, or the whitespace-collapsed input when unknown.
    pub fn canonical(&self, raw: &str) -> String {
        match self.tables.canonical_relationship(raw) {
            Some(label) => label.to_string(),
            None => collapse_whitespace(raw),
        }
    }

    /// Whether the whole cell is a known relationship spelling.
    fn is_exact(&self, cell: &str) -> bool {
        self.tables
            .relationships
            .contains_key(&cell.trim().to_lowercase())
    }

    fn is_known(&self, cell: &str) -> bool {
        self.tables.canonical_relationship(cell).is_some()
    }

    /// Compile a stage template, substituting `{NAME}` and `{REL}`.
    fn pattern(&self, template: &str) -> Result<Regex> {
        let rel = format!("(?i:{})", self.alternation);
        compile(&template.replace("{NAME}", NAME).replace("{REL}", &rel))
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        ExtractionError::Normalizer {
            name: "members".to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

fn year(text: Option<&str>) -> Option<u16> {
    text.and_then(|y| y.trim().parse().ok())
}

/// Tab-separated or `<tr><td>` rows with name, relationship and year cells.
pub struct RowStage {
    rel: Arc<Relationships>,
}

impl RowStage {
    fn rows(text: &str) -> Vec<Vec<String>> {
        if HTML_ROW.is_match(text) {
            return HTML_ROW
                .captures_iter(text)
                .map(|row| {
                    HTML_CELL
                        .captures_iter(&row[1])
                        .map(|cell| collapse_whitespace(&HTML_TAG.replace_all(&cell[1], " ")))
                        .collect()
                })
                .collect();
        }
        text.split(['|', '\n'])
            .filter(|line| line.contains('\t'))
            .map(|line| cells(line).into_iter().map(str::to_string).collect())
            .collect()
    }
}

impl MemberStage for RowStage {
    fn name(&self) -> &'static str {
        "structured_rows"
    }

    fn parse(&self, text: &str) -> Vec<Member> {
        let mut members = Vec::new();
        for row in Self::rows(text) {
            if row.len() < 2 {
                continue;
            }
            let position = row
                .iter()
                .position(|c| self.rel.is_exact(c))
                .or_else(|| row.iter().skip(1).position(|c| self.rel.is_known(c)).map(|i| i + 1));
            let Some(rel_idx) = position else {
                continue;
            };

            let name = if rel_idx > 0 {
                row[rel_idx - 1].clone()
            } else {
                row.iter()
                    .skip(1)
                    .find(|c| !YEAR_CELL.is_match(c))
                    .cloned()
                    .unwrap_or_default()
            };
            let birth_year = row
                .iter()
                .find(|c| YEAR_CELL.is_match(c))
                .and_then(|c| year(Some(c.as_str())));

            members.push(Member::new(name, self.rel.canonical(&row[rel_idx]), birth_year));
        }
        members
    }
}

/// `"name": "...", "relation": "...", "birth_year": "..."` objects.
pub struct KeyValueStage {
    rel: Arc<Relationships>,
}

impl MemberStage for KeyValueStage {
    fn name(&self) -> &'static str {
        "key_value"
    }

    fn parse(&self, text: &str) -> Vec<Member> {
        KEY_VALUE_MEMBER
            .captures_iter(text)
            .map(|caps| {
                Member::new(
                    caps["name"].trim(),
                    self.rel.canonical(&caps["rel"]),
                    year(caps.name("year").map(|m| m.as_str())),
                )
            })
            .collect()
    }
}

/// Stage driven by one regex with `name`, `rel` and optional `year` groups.
pub struct InlineStage {
    name: &'static str,
    pattern: Regex,
    rel: Arc<Relationships>,
    /// Look for a birth year after the match when the pattern has none.
    nearby_year: bool,
}

impl InlineStage {
    fn new(name: &'static str, template: &str, rel: Arc<Relationships>, nearby_year: bool) -> Result<Self> {
        Ok(Self {
            name,
            pattern: rel.pattern(template)?,
            rel,
            nearby_year,
        })
    }
}

impl MemberStage for InlineStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn parse(&self, text: &str) -> Vec<Member> {
        self.pattern
            .captures_iter(text)
            .map(|caps| {
                let mut birth_year = year(caps.name("year").map(|m| m.as_str()));
                if birth_year.is_none() && self.nearby_year {
                    let end = caps.get(0).map_or(text.len(), |m| m.end());
                    let tail = &text[end..];
                    let segment = tail.split(['|', '\n', ';']).next().unwrap_or("");
                    birth_year = BIRTH_YEAR
                        .captures(segment)
                        .and_then(|c| year(c.get(1).map(|m| m.as_str())));
                }
                Member::new(caps["name"].trim(), self.rel.canonical(&caps["rel"]), birth_year)
            })
            .collect()
    }
}

/// Last resort: split into segments and keep those naming a relationship.
pub struct SegmentStage {
    rel: Arc<Relationships>,
}

impl MemberStage for SegmentStage {
    fn name(&self) -> &'static str {
        "segments"
    }

    fn parse(&self, text: &str) -> Vec<Member> {
        let segments: Vec<&str> = if text.contains('|') {
            text.split('|').collect()
        } else {
            SEGMENT_SPLIT.split(text).collect()
        };

        let mut members = Vec::new();
        for segment in segments {
            let segment = segment.trim();
            if segment.chars().count() < 5 {
                continue;
            }
            let Some(keyword) = self.rel.keyword.find(segment) else {
                continue;
            };
            let birth_year = BIRTH_YEAR
                .captures(segment)
                .and_then(|c| year(c.get(1).map(|m| m.as_str())));

            let mut rest = String::with_capacity(segment.len());
            rest.push_str(&segment[..keyword.start()]);
            rest.push(' ');
            rest.push_str(&segment[keyword.end()..]);
            let rest = BIRTH_YEAR.replace_all(&rest, " ");
            let name = collapse_whitespace(
                &rest.replace(|c: char| matches!(c, '-' | '–' | ':' | '(' | ')' | '[' | ']'), " "),
            );

            members.push(Member::new(name, self.rel.canonical(keyword.as_str()), birth_year));
        }
        members
    }
}

/// Ordered chain of member stages; the first stage that finds anyone wins.
pub struct MemberCascade {
    stages: Vec<Box<dyn MemberStage>>,
}

impl MemberCascade {
    pub fn new(stages: Vec<Box<dyn MemberStage>>) -> Self {
        Self { stages }
    }

    /// The standard chain for Vietnamese portal pages.
    pub fn standard(tables: Arc<LookupTables>) -> Result<Self> {
        let rel = Arc::new(Relationships::new(tables)?);

        let stages: Vec<Box<dyn MemberStage>> = vec![
            Box::new(RowStage { rel: rel.clone() }),
            Box::new(KeyValueStage { rel: rel.clone() }),
            Box::new(InlineStage::new(
                "name_relationship_year",
                r"(?P<name>{NAME})\s*[-–]\s*(?P<rel>{REL})\s*[-–]\s*(?P<year>\d{4})\b",
                rel.clone(),
                false,
            )?),
            Box::new(InlineStage::new(
                "relationship_name",
                r"\b(?P<rel>{REL})\s*[:\-–]\s*(?P<name>{NAME})(?:\s*\(\s*(?P<year>\d{4})\s*\))?",
                rel.clone(),
                false,
            )?),
            Box::new(InlineStage::new(
                "name_relationship",
                r"(?P<name>{NAME})\s*:\s*(?P<rel>{REL})\b",
                rel.clone(),
                true,
            )?),
            Box::new(InlineStage::new(
                "name_parenthetical",
                r"(?P<name>{NAME})\s*\(\s*(?P<rel>{REL})\s*(?:[,;]\s*(?P<year>\d{4})\s*)?\)",
                rel.clone(),
                false,
            )?),
            Box::new(SegmentStage { rel }),
        ];

        Ok(Self::new(stages))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Members from the first stage that yields any, with that stage's name.
    pub fn parse(&self, text: &str) -> Option<(&'static str, Vec<Member>)> {
        self.stages.iter().find_map(|stage| {
            let members = stage.parse(text);
            trace!("Member stage {} found {} records", stage.name(), members.len());
            (!members.is_empty()).then(|| (stage.name(), members))
        })
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let mut steps = Normalized::trace(raw);

        let members = match self.parse(raw) {
            Some((stage, members)) => {
                steps.push(format!("members_parsed:{}", stage));
                let found = members.len();
                let members = dedup_members(members);
                if members.len() < found {
                    steps.push(format!("duplicates_removed:{}", found - members.len()));
                }
                members
            }
            None => {
                steps.push("normalization_failed: no members recognized".to_string());
                Vec::new()
            }
        };

        Normalized {
            value: NormalizedValue::MemberList(members),
            steps,
        }
    }
}

/// Drop repeated (name, relationship) pairs, case-insensitively.
///
/// The first occurrence is kept; a missing birth year is filled from a later
/// duplicate.
pub fn dedup_members(members: Vec<Member>) -> Vec<Member> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut unique: Vec<Member> = Vec::with_capacity(members.len());

    for member in members {
        match index.get(&member.key()) {
            Some(&i) => {
                if unique[i].birth_year.is_none() {
                    unique[i].birth_year = member.birth_year;
                }
            }
            None => {
                index.insert(member.key(), unique.len());
                unique.push(member);
            }
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cascade() -> MemberCascade {
        MemberCascade::standard(Arc::new(LookupTables::default())).unwrap()
    }

    fn parse(text: &str) -> (&'static str, Vec<Member>) {
        cascade().parse(text).expect("members expected")
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(
            cascade().stage_names(),
            vec![
                "structured_rows",
                "key_value",
                "name_relationship_year",
                "relationship_name",
                "name_relationship",
                "name_parenthetical",
                "segments",
            ]
        );
    }

    #[test]
    fn test_tab_rows() {
        let (stage, members) =
            parse("Trần Thị Bình\tVợ\t1987 | Nguyễn Văn Cường\tCon\t2015 | Nguyễn Thị Dung\tCon\t2018");
        assert_eq!(stage, "structured_rows");
        assert_eq!(
            members,
            vec![
                Member::new("Trần Thị Bình", "Vợ", Some(1987)),
                Member::new("Nguyễn Văn Cường", "Con", Some(2015)),
                Member::new("Nguyễn Thị Dung", "Con", Some(2018)),
            ]
        );
    }

    #[test]
    fn test_html_rows_skip_header() {
        let (stage, members) = parse(
            "<tr><th>Họ tên</th><th>Quan hệ</th><th>Năm sinh</th></tr>\
             <tr><td>Trần Thị Bình</td><td>Vợ</td><td>1987</td></tr>",
        );
        assert_eq!(stage, "structured_rows");
        assert_eq!(members, vec![Member::new("Trần Thị Bình", "Vợ", Some(1987))]);
    }

    #[test]
    fn test_key_value_objects() {
        let (stage, members) = parse(
            r#"[{"name": "Nguyễn Thị Lan", "relation": "Vợ", "birth_year": "1990"},
                {"name": "Hoàng Văn Quang", "relation": "con trai"}]"#,
        );
        assert_eq!(stage, "key_value");
        assert_eq!(
            members,
            vec![
                Member::new("Nguyễn Thị Lan", "Vợ", Some(1990)),
                Member::new("Hoàng Văn Quang", "Con", None),
            ]
        );
    }

    #[test]
    fn test_name_relationship_year() {
        let (stage, members) = parse("Phạm Văn Nam - Chồng - 1983 | Lê Văn Minh - Con - 2012");
        assert_eq!(stage, "name_relationship_year");
        assert_eq!(
            members,
            vec![
                Member::new("Phạm Văn Nam", "Chồng", Some(1983)),
                Member::new("Lê Văn Minh", "Con", Some(2012)),
            ]
        );
    }

    #[test]
    fn test_relationship_name() {
        let (stage, members) = parse("Vợ: Nguyễn Thị Lan (1990) | Con: Hoàng Văn Quang (2016)");
        assert_eq!(stage, "relationship_name");
        assert_eq!(
            members,
            vec![
                Member::new("Nguyễn Thị Lan", "Vợ", Some(1990)),
                Member::new("Hoàng Văn Quang", "Con", Some(2016)),
            ]
        );
    }

    #[test]
    fn test_name_relationship_with_nearby_year() {
        let (stage, members) = parse("Nguyễn Thị Lan: vợ, sinh năm 1990\nHoàng Văn Quang: Con");
        assert_eq!(stage, "name_relationship");
        assert_eq!(
            members,
            vec![
                Member::new("Nguyễn Thị Lan", "Vợ", Some(1990)),
                Member::new("Hoàng Văn Quang", "Con", None),
            ]
        );
    }

    #[test]
    fn test_parenthetical() {
        let (stage, members) = parse(
            "Thành viên: Lê Văn Tuấn (Chồng, 1982), Phan Thị Oanh (Con, 2014), Phan Văn Tùng (Con, 2017)",
        );
        assert_eq!(stage, "name_parenthetical");
        assert_eq!(
            members,
            vec![
                Member::new("Lê Văn Tuấn", "Chồng", Some(1982)),
                Member::new("Phan Thị Oanh", "Con", Some(2014)),
                Member::new("Phan Văn Tùng", "Con", Some(2017)),
            ]
        );
    }

    #[test]
    fn test_segments_last_resort() {
        let (stage, members) = parse("bà nội sinh 1950; em trai út");
        assert_eq!(stage, "segments");
        assert_eq!(
            members,
            vec![
                Member::new("nội sinh", "Bà", Some(1950)),
                Member::new("trai út", "Em", None),
            ]
        );
    }

    #[test]
    fn test_no_members() {
        assert!(cascade().parse("0912345678").is_none());

        let normalized = cascade().normalize("0912345678");
        assert_eq!(normalized.value, NormalizedValue::MemberList(vec![]));
        assert_eq!(normalized.steps[0], "raw_candidate=0912345678");
    }

    #[test]
    fn test_overlapping_stage_outputs_are_deduplicated() {
        let cascade = cascade();
        let relationship_first = cascade.stages[3].parse("Vợ: Nguyễn Thị Lan (1990)");
        let name_first = cascade.stages[4].parse("NGUYỄN THỊ LAN: Vợ\nHoàng Văn Quang: Con");
        assert_eq!(relationship_first.len(), 1);
        assert_eq!(name_first.len(), 2);

        let combined: Vec<Member> = relationship_first.into_iter().chain(name_first).collect();
        let unique = dedup_members(combined);
        assert_eq!(
            unique,
            vec![
                Member::new("Nguyễn Thị Lan", "Vợ", Some(1990)),
                Member::new("Hoàng Văn Quang", "Con", None),
            ]
        );
    }

    #[test]
    fn test_normalize_records_duplicates() {
        let normalized = cascade().normalize("Phạm Văn Nam - Chồng - 1983 | PHẠM VĂN NAM - chồng - 1983");
        assert_eq!(
            normalized.value,
            NormalizedValue::MemberList(vec![Member::new("Phạm Văn Nam", "Chồng", Some(1983))])
        );
        assert!(normalized.steps.contains(&"duplicates_removed:1".to_string()));
    }

    #[test]
    fn test_dedup_fills_missing_year() {
        let unique = dedup_members(vec![
            Member::new("Lê Văn Minh", "Con", None),
            Member::new("LÊ VĂN MINH", "con", Some(2012)),
        ]);
        assert_eq!(unique, vec![Member::new("Lê Văn Minh", "Con", Some(2012))]);
    }
}
