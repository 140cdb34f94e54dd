use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/**
 * Lookup tables translating stored codes into display labels.
 *
 * Loaded from the `[catalog]` section of the configuration file. Any table left out of the
 * configuration uses the built-in defaults. Unknown codes are displayed as they were stored.
 */
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Catalog {
    /**
     * Gender code to label.
     */
    pub gender: BTreeMap<String, String>,
    /**
     * Living type (welfare eligibility category) code to label.
     */
    pub living_type: BTreeMap<String, String>,
    /**
     * Program code to program name.
     */
    pub programs: BTreeMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog { gender: default_genders(), living_type: default_living_types(), programs: default_programs() }
    }
}

impl Catalog {
    pub fn gender_label<'a>(&'a self, code: &'a str) -> &'a str {
        lookup(&self.gender, code)
    }

    pub fn living_type_label<'a>(&'a self, code: &'a str) -> &'a str {
        lookup(&self.living_type, code)
    }

    pub fn program_label<'a>(&'a self, code: &'a str) -> &'a str {
        lookup(&self.programs, code)
    }
}

fn lookup<'a>(table: &'a BTreeMap<String, String>, code: &'a str) -> &'a str {
    table.get(code).map_or(code, String::as_str)
}

fn to_table(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries.iter().map(|(code, label)| ((*code).to_string(), (*label).to_string())).collect()
}

fn default_genders() -> BTreeMap<String, String> {
    to_table(&[("male", "남성"), ("female", "여성")])
}

fn default_living_types() -> BTreeMap<String, String> {
    to_table(&[("general", "일반"), ("basic", "기초생활수급"), ("lowIncome", "차상위"), ("veteran", "국가유공자"), ("other", "기타")])
}

fn default_programs() -> BTreeMap<String, String> {
    to_table(&[
        ("ballet", "유아발레교실"),
        ("kpop-a", "아동K-POP 댄스(A반)"),
        ("kpop-b", "아동K-POP 댄스(B반)"),
        ("piano", "피아노교실"),
        ("art", "미술교실"),
        ("taekwondo", "태권도교실"),
        ("english", "영어교실"),
        ("coding", "코딩교실"),
        ("soccer", "축구교실"),
        ("basketball", "농구교실"),
        ("yoga", "요가"),
        ("pilates", "필라테스"),
        ("gym", "헬스"),
        ("swimming", "수영"),
        ("tennis", "테니스"),
        ("badminton", "배드민턴"),
        ("table-tennis", "탁구"),
        ("belly-dance", "밸리댄스"),
    ])
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_labels() {
        let catalog = Catalog::default();
        assert_eq!(catalog.gender_label("male"), "남성");
        assert_eq!(catalog.gender_label("female"), "여성");
        assert_eq!(catalog.living_type_label("lowIncome"), "차상위");
        assert_eq!(catalog.program_label("kpop-b"), "아동K-POP 댄스(B반)");
        assert_eq!(catalog.programs.len(), 18);
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        let catalog = Catalog::default();
        assert_eq!(catalog.gender_label("unknown"), "unknown");
        assert_eq!(catalog.living_type_label(""), "");
        assert_eq!(catalog.program_label("성인요가"), "성인요가");
    }

    #[test]
    fn test_partial_configuration_keeps_defaults() {
        let catalog: Catalog = toml::from_str(
            r#"
            [programs]
            guitar = "성인 통기타"
            "#,
        )
        .unwrap();
        assert_eq!(catalog.program_label("guitar"), "성인 통기타");
        assert_eq!(catalog.program_label("yoga"), "yoga");
        assert_eq!(catalog.living_type_label("veteran"), "국가유공자");
    }
}
