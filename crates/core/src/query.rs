//! # Query Engine
//!
//! Multi-facet search over a catalog snapshot. Every predicate is optional;
//! a parameter is returned when it satisfies all of the given ones.
//!
//! | Field       | Match                                                   |
//! |-------------|---------------------------------------------------------|
//! | `service`   | case-insensitive membership in `services`               |
//! | `level`     | case-insensitive equality                               |
//! | `param_type`| case-insensitive equality                               |
//! | `name`      | shell glob (`*`, `?`, `[...]`) over the whole name      |
//! | `full_text` | case-insensitive substring of any text field            |
//!
//! A name without glob metacharacters is an exact lookup: the scan stops at
//! the first hit since names are unique.
//!
//! Malformed input never fails a query. Unknown sort keys fall back to the
//! defaults and an unparsable glob matches nothing.

use crate::catalog::Catalog;
use crate::model::ParameterInfo;
use glob::Pattern;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

const GLOB_META: &[char] = &['*', '?', '['];

/// Field to sort results by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Name,
    Type,
    Level,
    /// First listed service
    Service,
}

impl SortField {
    /// Parse leniently; anything unrecognized is `Name`
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    fn key<'a>(&self, param: &'a ParameterInfo) -> &'a str {
        match self {
            SortField::Name => param.name.as_str(),
            SortField::Type => param.param_type.as_str(),
            SortField::Level => param.level.as_str(),
            SortField::Service => param.primary_service(),
        }
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "type" => Ok(SortField::Type),
            "level" => Ok(SortField::Level),
            "service" => Ok(SortField::Service),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for SortField {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| SortField::parse_or_default(&s))
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Parse leniently; anything unrecognized is `Asc`
    pub fn parse_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(|s| SortOrder::parse_or_default(&s))
    }
}

/// Search predicates plus ordering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Query {
    pub service: Option<String>,
    pub level: Option<String>,
    #[serde(rename = "type")]
    pub param_type: Option<String>,
    pub name: Option<String>,
    pub full_text: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn service(mut self, service: &str) -> Self {
        self.service = Some(service.to_string());
        self
    }

    pub fn level(mut self, level: &str) -> Self {
        self.level = Some(level.to_string());
        self
    }

    pub fn param_type(mut self, param_type: &str) -> Self {
        self.param_type = Some(param_type.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn full_text(mut self, text: &str) -> Self {
        self.full_text = Some(text.to_string());
        self
    }

    pub fn sort_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = field;
        self.order = order;
        self
    }
}

/// How the name predicate is applied
enum NameFilter {
    Any,
    Exact(String),
    Glob(Pattern),
    /// Unparsable pattern: matches nothing
    Never,
}

impl NameFilter {
    fn from_query(name: Option<&str>) -> Self {
        match name {
            None => NameFilter::Any,
            Some(n) if !n.contains(GLOB_META) => NameFilter::Exact(n.to_string()),
            Some(n) => match Pattern::new(n) {
                Ok(pattern) => NameFilter::Glob(pattern),
                Err(e) => {
                    tracing::debug!(pattern = %n, error = %e, "Invalid name pattern, matching nothing");
                    NameFilter::Never
                }
            },
        }
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            NameFilter::Any => true,
            NameFilter::Exact(exact) => name == exact.as_str(),
            NameFilter::Glob(pattern) => pattern.matches(name),
            NameFilter::Never => false,
        }
    }
}

/// Treat empty predicate strings as absent
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Case-insensitive membership of `service` in the parameter's services
pub fn matches_service(param: &ParameterInfo, service: Option<&str>) -> bool {
    match service {
        None => true,
        Some(service) => param.services.iter().any(|s| s.eq_ignore_ascii_case(service)),
    }
}

pub fn matches_level(param: &ParameterInfo, level: Option<&str>) -> bool {
    level.map_or(true, |level| param.level.eq_ignore_ascii_case(level))
}

pub fn matches_type(param: &ParameterInfo, param_type: Option<&str>) -> bool {
    param_type.map_or(true, |t| param.param_type.eq_ignore_ascii_case(t))
}

/// Whole-name glob match; a name without metacharacters must match exactly
pub fn matches_name(param: &ParameterInfo, pattern: Option<&str>) -> bool {
    NameFilter::from_query(pattern).matches(&param.name)
}

/// Substring match across every text field. `needle` must be lowercase.
pub fn matches_full_text(param: &ParameterInfo, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(needle);

    hit(&param.name)
        || hit(&param.param_type)
        || hit(&param.level)
        || hit(&param.description)
        || hit(&param.long_description)
        || hit(&param.default.to_string())
        || hit(&param.daemon_default.to_string())
        || param.tags.iter().any(|t| hit(t))
        || param.services.iter().any(|s| hit(s))
}

/// Evaluate `query` against a snapshot
pub fn search(catalog: &Catalog, query: &Query) -> Vec<ParameterInfo> {
    let service = present(&query.service);
    let level = present(&query.level);
    let param_type = present(&query.param_type);
    let name = NameFilter::from_query(present(&query.name));
    let needle = present(&query.full_text).map(str::to_lowercase);

    let accepts = |param: &ParameterInfo| {
        matches_service(param, service)
            && matches_level(param, level)
            && matches_type(param, param_type)
            && matches_full_text(param, needle.as_deref().unwrap_or(""))
    };

    let mut results: Vec<ParameterInfo> = match &name {
        // Names are unique: at most one hit
        NameFilter::Exact(exact) => catalog
            .get(exact)
            .filter(|p| accepts(*p))
            .cloned()
            .into_iter()
            .collect(),
        _ => catalog
            .iter()
            .filter(|p| name.matches(&p.name) && accepts(*p))
            .cloned()
            .collect(),
    };

    sort_results(&mut results, query.sort, query.order);
    results
}

/// Stable sort on the chosen field's text; equal keys keep snapshot order
pub fn sort_results(results: &mut [ParameterInfo], field: SortField, order: SortOrder) {
    results.sort_by(|a, b| {
        let ordering: Ordering = field.key(a).cmp(field.key(b));
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::load_baseline;
    use crate::model::ScalarValue;

    fn shipped() -> Catalog {
        load_baseline(include_bytes!("../data/config-index.json")).unwrap()
    }

    fn names(results: &[ParameterInfo]) -> Vec<&str> {
        results.iter().map(|p| p.name.as_str()).collect()
    }

    fn named(name: &str) -> ParameterInfo {
        ParameterInfo::new(name, "str")
    }

    #[test]
    fn test_matches_service() {
        let osd = ParameterInfo::new("p", "int").with_services(&["osd"]);
        let upper = ParameterInfo::new("p", "int").with_services(&["OSD"]);
        let mon = ParameterInfo::new("p", "int").with_services(&["mon"]);
        let many = ParameterInfo::new("p", "int").with_services(&["mon", "osd", "mgr"]);

        assert!(matches_service(&osd, None));
        assert!(matches_service(&osd, Some("osd")));
        assert!(matches_service(&upper, Some("osd")));
        assert!(!matches_service(&mon, Some("osd")));
        assert!(matches_service(&many, Some("osd")));
        assert!(!matches_service(&many, Some("custom")));
    }

    #[test]
    fn test_matches_name() {
        let cases = [
            ("osd.0", None, true),
            ("osd.0", Some("osd.0"), true),
            ("osd.0", Some("osd*"), true),
            ("osd.0", Some("*.0"), true),
            ("osd.0", Some("osd.*"), true),
            ("osd.0.cache", Some("osd.*"), true),
            ("osd.0", Some("mon*"), false),
            ("osd.0.cache", Some("osd.*.cache"), true),
            ("osd.1", Some("osd.?"), true),
            ("osd.12", Some("osd.?"), false),
            ("osd.3", Some("osd.[0-3]"), true),
            ("osd.7", Some("osd.[0-3]"), false),
            ("osd.0", Some("osd"), false),
            ("osd.0", Some("osd.[0"), false),
        ];

        for (name, pattern, expected) in cases {
            assert_eq!(
                matches_name(&named(name), pattern),
                expected,
                "{} vs {:?}",
                name,
                pattern
            );
        }
    }

    #[test]
    fn test_matches_full_text() {
        let mut info = named("osd.0");
        assert!(matches_full_text(&info, ""));
        assert!(matches_full_text(&info, "osd"));
        assert!(!matches_full_text(&info, "mon"));

        info.description = "OSD description".to_string();
        assert!(matches_full_text(&info, "description"));

        info.long_description = "Detailed OSD description".to_string();
        assert!(matches_full_text(&info, "detailed"));

        let mut tagged = named("x");
        tagged.tags = vec!["performance".into(), "cache".into()];
        assert!(matches_full_text(&tagged, "cache"));

        let served = named("x").with_services(&["osd", "mon"]);
        assert!(matches_full_text(&served, "mon"));

        let mut defaulted = named("x");
        defaulted.default = ScalarValue::Text("cache_size=1G".into());
        assert!(matches_full_text(&defaulted, "cache"));

        let mut daemon = named("x");
        daemon.daemon_default = ScalarValue::Number(4096.into());
        assert!(matches_full_text(&daemon, "409"));

        assert!(matches_full_text(&named("OSD.0"), "osd"));
        assert!(!matches_full_text(&named("x"), "nil"));
    }

    #[test]
    fn test_matches_type_and_level() {
        let info = ParameterInfo::new("p", "INT").with_level("Advanced");
        assert!(matches_type(&info, None));
        assert!(matches_type(&info, Some("int")));
        assert!(!matches_type(&info, Some("str")));
        assert!(matches_level(&info, Some("advanced")));
        assert!(!matches_level(&info, Some("basic")));
    }

    #[test]
    fn test_sort_parsing_falls_back() {
        assert_eq!(SortField::parse_or_default("TYPE"), SortField::Type);
        assert_eq!(SortField::parse_or_default("bogus"), SortField::Name);
        assert_eq!(SortOrder::parse_or_default("descending"), SortOrder::Desc);
        assert_eq!(SortOrder::parse_or_default(""), SortOrder::Asc);
    }

    #[test]
    fn test_search_filters_shipped_catalog() {
        let catalog = shipped();

        let mon = search(&catalog, &Query::new().name("mon_*"));
        assert!(!mon.is_empty());
        assert!(mon.iter().all(|p| p.name.starts_with("mon_")));

        let basic = search(&catalog, &Query::new().level("BASIC"));
        assert!(!basic.is_empty());
        assert!(basic.iter().all(|p| p.level.eq_ignore_ascii_case("basic")));

        let osd_int = search(&catalog, &Query::new().service("osd").param_type("int"));
        assert!(!osd_int.is_empty());
        for p in &osd_int {
            assert!(p.services.iter().any(|s| s.eq_ignore_ascii_case("osd")), "{}", p.name);
            assert!(p.param_type.eq_ignore_ascii_case("int"), "{}", p.name);
        }
        let expected = catalog
            .iter()
            .filter(|p| p.param_type == "int" && p.services.iter().any(|s| s == "osd"))
            .count();
        assert_eq!(osd_int.len(), expected);

        let scoped = search(&catalog, &Query::new().name("osd_*").service("osd"));
        assert!(scoped.iter().all(|p| p.name.starts_with("osd_")));

        let none = search(&catalog, &Query::new().name("this_param_does_not_exist"));
        assert!(none.is_empty());

        let network = search(&catalog, &Query::new().full_text("NETWORK"));
        assert!(names(&network).contains(&"public_network"));
        assert!(names(&network).contains(&"mon_host"));
    }

    #[test]
    fn test_exact_name_returns_single_match() {
        let catalog = shipped();
        let hits = search(&catalog, &Query::new().name("fsid"));
        assert_eq!(names(&hits), vec!["fsid"]);

        // Other predicates still apply to the exact hit
        let miss = search(&catalog, &Query::new().name("fsid").service("osd"));
        assert!(miss.is_empty());
    }

    #[test]
    fn test_empty_predicates_are_ignored() {
        let catalog = shipped();
        let all = search(&catalog, &Query::new().name("").service("").full_text(""));
        assert_eq!(all.len(), catalog.len());
    }

    #[test]
    fn test_sort_monotonic() {
        let catalog = shipped();
        for field in [SortField::Name, SortField::Type, SortField::Level, SortField::Service] {
            let asc = search(&catalog, &Query::new().sort_by(field, SortOrder::Asc));
            assert!(asc.windows(2).all(|w| field.key(&w[0]) <= field.key(&w[1])));

            let desc = search(&catalog, &Query::new().sort_by(field, SortOrder::Desc));
            assert!(desc.windows(2).all(|w| field.key(&w[0]) >= field.key(&w[1])));
            assert_eq!(desc.len(), catalog.len());
        }
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let catalog = Catalog::from_records(vec![
            ParameterInfo::new("a", "int"),
            ParameterInfo::new("b", "bool"),
            ParameterInfo::new("c", "int"),
            ParameterInfo::new("d", "bool"),
        ])
        .unwrap();

        let asc = search(&catalog, &Query::new().sort_by(SortField::Type, SortOrder::Asc));
        assert_eq!(names(&asc), vec!["b", "d", "a", "c"]);

        let desc = search(&catalog, &Query::new().sort_by(SortField::Type, SortOrder::Desc));
        assert_eq!(names(&desc), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_service_sort_uses_first_service() {
        let catalog = Catalog::from_records(vec![
            ParameterInfo::new("a", "int").with_services(&["rgw"]),
            ParameterInfo::new("b", "int"),
            ParameterInfo::new("c", "int").with_services(&["mon", "osd"]),
        ])
        .unwrap();

        let asc = search(&catalog, &Query::new().sort_by(SortField::Service, SortOrder::Asc));
        assert_eq!(names(&asc), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_sort_values_decode_leniently() {
        let cases = [
            (r#"{"sort": "bogus"}"#, SortField::Name, SortOrder::Asc),
            (r#"{"sort": "Type"}"#, SortField::Type, SortOrder::Asc),
            (r#"{"order": "descending"}"#, SortField::Name, SortOrder::Desc),
            (r#"{"sort": "SERVICE", "order": "sideways"}"#, SortField::Service, SortOrder::Asc),
        ];

        for (raw, sort, order) in cases {
            let query: Query = serde_json::from_str(raw).unwrap();
            assert_eq!((query.sort, query.order), (sort, order), "{}", raw);
        }
    }

    #[test]
    fn test_dev_level_is_searchable() {
        let catalog = shipped();
        let dev = search(&catalog, &Query::new().level("dev"));
        assert!(!dev.is_empty());
        assert!(dev.iter().all(|p| p.level == "dev"));
    }

    #[test]
    fn test_query_deserializes_with_defaults() {
        let query: Query =
            serde_json::from_str(r#"{"service": "osd", "type": "int", "order": "desc"}"#).unwrap();
        assert_eq!(query.service.as_deref(), Some("osd"));
        assert_eq!(query.param_type.as_deref(), Some("int"));
        assert_eq!(query.sort, SortField::Name);
        assert_eq!(query.order, SortOrder::Desc);
    }
}
