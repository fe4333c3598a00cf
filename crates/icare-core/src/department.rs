//! Canonical hospital department names.

/// Default department for clinics whose type cannot be mapped.
pub const GENERAL_CLINIC: &str = "일반의원";

const TYPE_MAPPING: &[(&str, &str)] = &[
    ("종합병원", "종합병원"),
    ("내과의원", "내과"),
    ("내과", "내과"),
    ("소아청소년과의원", "소아청소년과"),
    ("소아과의원", "소아청소년과"),
    ("소아청소년과", "소아청소년과"),
    ("가정의학과의원", "가정의학과"),
    ("가정의학과", "가정의학과"),
    ("이비인후과의원", "이비인후과"),
    ("이비인후과", "이비인후과"),
    ("정형외과의원", "정형외과"),
    ("정형외과", "정형외과"),
    ("피부과의원", "피부과"),
    ("피부과", "피부과"),
    ("안과의원", "안과"),
    ("안과", "안과"),
    ("치과의원", "치과"),
    ("치과", "치과"),
    ("한의원", "한방병원"),
    ("한방병원", "한방병원"),
    ("산부인과의원", "산부인과"),
    ("산부인과", "산부인과"),
    ("정신건강의학과의원", "정신건강의학과"),
    ("정신건강의학과", "정신건강의학과"),
    ("성형외과의원", "성형외과"),
    ("성형외과", "성형외과"),
    ("신경외과의원", "신경외과"),
    ("신경외과", "신경외과"),
];

/// Colloquial names people type in chat, checked longest first.
const ALIASES: &[(&str, &str)] = &[
    ("정신건강의학과", "정신건강의학과"),
    ("소아청소년과", "소아청소년과"),
    ("가정의학과", "가정의학과"),
    ("이비인후과", "이비인후과"),
    ("정형외과", "정형외과"),
    ("성형외과", "성형외과"),
    ("신경외과", "신경외과"),
    ("산부인과", "산부인과"),
    ("종합병원", "종합병원"),
    ("한방병원", "한방병원"),
    ("소아과", "소아청소년과"),
    ("한의원", "한방병원"),
    ("피부과", "피부과"),
    ("내과", "내과"),
    ("안과", "안과"),
    ("치과", "치과"),
];

/// Maps a raw department label to its canonical name.
///
/// Labels of the form `"<anything> - <department>"` are reduced to the part
/// after the dash. Unknown labels map to [`GENERAL_CLINIC`].
#[must_use]
pub fn normalize_hospital_type(raw: &str) -> &'static str {
    let lowered = raw.trim().to_lowercase();
    let label = lowered
        .split_once(" - ")
        .map_or(lowered.as_str(), |(_, dept)| dept.trim());

    TYPE_MAPPING
        .iter()
        .find(|(from, _)| *from == label)
        .map_or(GENERAL_CLINIC, |(_, to)| to)
}

/// Finds the first department mentioned anywhere in free text.
#[must_use]
pub fn find_department(text: &str) -> Option<&'static str> {
    ALIASES
        .iter()
        .find(|(alias, _)| text.contains(alias))
        .map(|(_, canonical)| *canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_clinic_suffixes() {
        assert_eq!(normalize_hospital_type("소아과의원"), "소아청소년과");
        assert_eq!(normalize_hospital_type(" 이비인후과의원 "), "이비인후과");
        assert_eq!(normalize_hospital_type("한의원"), "한방병원");
    }

    #[test]
    fn takes_part_after_dash() {
        assert_eq!(normalize_hospital_type("의원 - 피부과"), "피부과");
    }

    #[test]
    fn unknown_is_general_clinic() {
        assert_eq!(normalize_hospital_type("비뇨의학과"), GENERAL_CLINIC);
        assert_eq!(normalize_hospital_type(""), GENERAL_CLINIC);
    }

    #[test]
    fn finds_department_in_sentence() {
        assert_eq!(find_department("근처 소아과 알려줘"), Some("소아청소년과"));
        assert_eq!(find_department("정형외과 늦게까지 하는 곳"), Some("정형외과"));
        assert_eq!(find_department("약국 찾아줘"), None);
    }
}
