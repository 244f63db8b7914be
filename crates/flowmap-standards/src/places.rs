//! Location gazetteer.
//!
//! Elementary flows are often regionalized by appending a location code to
//! the name after a comma (`"Ammonia, NL"`). The codes recognized here are
//! ISO 3166-1 alpha-2 countries, ecoinvent-style regions, and the
//! subnational codes that show up in regionalized inventories.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, StandardsError};

#[rustfmt::skip]
pub static LOCATION_CODES: &[&str] = &[
    // ISO 3166-1 alpha-2
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX",
    "AZ", "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ",
    "BR", "BS", "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK",
    "CL", "CM", "CN", "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM",
    "DO", "DZ", "EC", "EE", "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR",
    "GA", "GB", "GD", "GE", "GF", "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS",
    "GT", "GU", "GW", "GY", "HK", "HM", "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN",
    "IO", "IQ", "IR", "IS", "IT", "JE", "JM", "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN",
    "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC", "LI", "LK", "LR", "LS", "LT", "LU", "LV",
    "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK", "ML", "MM", "MN", "MO", "MP", "MQ",
    "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA", "NC", "NE", "NF", "NG", "NI",
    "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG", "PH", "PK", "PL", "PM",
    "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW", "SA", "SB", "SC",
    "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS", "ST", "SV",
    "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO", "TR",
    "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "XK", "YE", "YT", "ZA", "ZM", "ZW",
    // regions
    "GLO", "RoW", "RER", "RAS", "RAF", "RLA", "RME", "RNA", "WEU", "OCE", "UCTE",
    "UCTE without Germany", "ENTSO-E", "NORDEL", "CENTREL", "Europe without Switzerland",
    "Europe without Austria", "Europe, without Russia and Turkey", "RER w/o CH+DE",
    "RER w/o DE+NL+RU", "EU27", "EU28", "EU-27", "WECC", "NPCC", "SERC", "RFC", "MRO", "TRE",
    "FRCC", "SPP", "HICC", "ASCC", "IAI Area, Africa", "IAI Area, Asia, without China and GCC",
    "IAI Area, EU27 & EFTA", "IAI Area, North America", "IAI Area, South America",
    "IAI Area, Gulf Cooperation Council", "IAI Area, Russia & RER w/o EU27 & EFTA",
    "Canada without Quebec", "North America without Quebec", "US-PJM", "US-MRO", "US-NPCC",
    "US-SERC", "US-WECC", "US-TRE", "US-RFC", "US-ASCC", "US-HICC", "US-FRCC", "US-SPP",
    // US states
    "US-AL", "US-AK", "US-AZ", "US-AR", "US-CA", "US-CO", "US-CT", "US-DE", "US-FL", "US-GA",
    "US-HI", "US-ID", "US-IL", "US-IN", "US-IA", "US-KS", "US-KY", "US-LA", "US-ME", "US-MD",
    "US-MA", "US-MI", "US-MN", "US-MS", "US-MO", "US-MT", "US-NE", "US-NV", "US-NH", "US-NJ",
    "US-NM", "US-NY", "US-NC", "US-ND", "US-OH", "US-OK", "US-OR", "US-PA", "US-RI", "US-SC",
    "US-SD", "US-TN", "US-TX", "US-UT", "US-VT", "US-VA", "US-WA", "US-WV", "US-WI", "US-WY",
    // Canadian provinces and territories
    "CA-AB", "CA-BC", "CA-MB", "CA-NB", "CA-NL", "CA-NS", "CA-NT", "CA-NU", "CA-ON", "CA-PE",
    "CA-QC", "CA-SK", "CA-YT",
    // Chinese provinces
    "CN-AH", "CN-BJ", "CN-CQ", "CN-FJ", "CN-GD", "CN-GS", "CN-GX", "CN-GZ", "CN-HA", "CN-HB",
    "CN-HE", "CN-HI", "CN-HL", "CN-HN", "CN-JL", "CN-JS", "CN-JX", "CN-LN", "CN-NM", "CN-NX",
    "CN-QH", "CN-SA", "CN-SC", "CN-SD", "CN-SH", "CN-SX", "CN-TJ", "CN-XJ", "CN-XZ", "CN-YN",
    "CN-ZJ", "CN-CSG", "CN-SGCC",
    // Australian states
    "AU-ACT", "AU-NSW", "AU-NT", "AU-QLD", "AU-SA", "AU-TAS", "AU-VIC", "AU-WA",
    // Indian and Brazilian regions
    "IN-AP", "IN-GJ", "IN-KA", "IN-MH", "IN-TN", "IN-UP", "IN-Eastern grid",
    "IN-Northern grid", "IN-Southern grid", "IN-Western grid", "BR-Mid-western grid",
    "BR-North-eastern grid", "BR-Northern grid", "BR-South-eastern grid", "BR-Southern grid",
];

static LOCATION_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    let mut codes: Vec<&str> = LOCATION_CODES.to_vec();
    // Longest first so "US-CA" wins over "US" and "CA".
    codes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = codes
        .iter()
        .map(|code| regex::escape(code))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r",[ \t\r\f]+(?P<code>{alternation})$"))
        .expect("Invalid location suffix regex")
});

/// Splits a trailing `", <location>"` off a name.
///
/// Codes are matched case-sensitively, so `"Tin, Sn"` keeps its name.
/// Returns the name unchanged and `None` when no recognized code ends it.
pub fn split_location_suffix(name: &str) -> (String, Option<String>) {
    match LOCATION_SUFFIX.captures(name) {
        Some(captures) => {
            let whole = captures.get(0).map_or(name.len(), |m| m.start());
            let code = captures.name("code").map(|m| m.as_str().to_string());
            (name[..whole].to_string(), code)
        }
        None => (name.to_string(), None),
    }
}

/// Replaces the location code at the end of `name` with `location`.
pub fn replace_location_suffix(name: &str, location: &str) -> Result<String> {
    let code = LOCATION_SUFFIX
        .captures(name)
        .and_then(|captures| captures.name("code"))
        .ok_or_else(|| StandardsError::MissingLocationSuffix {
            name: name.to_string(),
        })?;
    Ok(format!(
        "{}{}{}",
        &name[..code.start()],
        location,
        &name[code.end()..]
    ))
}

pub fn is_location_code(value: &str) -> bool {
    LOCATION_CODES.contains(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_country_suffix() {
        assert_eq!(
            split_location_suffix("Ammonia, NL"),
            ("Ammonia".to_string(), Some("NL".to_string()))
        );
    }

    #[test]
    fn prefers_longest_code() {
        assert_eq!(
            split_location_suffix("Water, US-CA"),
            ("Water".to_string(), Some("US-CA".to_string()))
        );
    }

    #[test]
    fn requires_comma_and_whitespace() {
        assert_eq!(split_location_suffix("AmmoniaNL").1, None);
        assert_eq!(split_location_suffix("Ammonia,NL").1, None);
        assert_eq!(split_location_suffix("Carbon dioxide, fossil").1, None);
    }

    #[test]
    fn codes_are_case_sensitive() {
        assert_eq!(
            split_location_suffix("Water, RoW"),
            ("Water".to_string(), Some("RoW".to_string()))
        );
        assert_eq!(split_location_suffix("Water, row").1, None);
        assert_eq!(split_location_suffix("Tin, Sn").1, None);
        assert_eq!(split_location_suffix("Carbon dioxide, in").1, None);
        assert_eq!(split_location_suffix("Tin, SN").1.as_deref(), Some("SN"));
    }

    #[test]
    fn multi_word_regions() {
        assert_eq!(
            split_location_suffix("Aluminium, IAI Area, EU27 & EFTA"),
            (
                "Aluminium".to_string(),
                Some("IAI Area, EU27 & EFTA".to_string())
            )
        );
    }

    #[test]
    fn replaces_suffix() {
        assert_eq!(
            replace_location_suffix("Ammonia, FR", "NL").unwrap(),
            "Ammonia, NL"
        );
        assert!(matches!(
            replace_location_suffix("Ammonia", "NL"),
            Err(StandardsError::MissingLocationSuffix { .. })
        ));
    }

    #[test]
    fn recognizes_codes() {
        assert!(is_location_code("GLO"));
        assert!(!is_location_code("glo"));
        assert!(!is_location_code("fossil"));
    }
}
