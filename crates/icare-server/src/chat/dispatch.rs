//! Rule-based intent routing for chat messages.
//!
//! Maps free text onto one of the two search tools, the sort order and the
//! time phrase to evaluate, without a language model in the loop.

use std::sync::LazyLock;

use icare_core::department::find_department;
use icare_core::envelope::{ToolRequest, HOSPITAL_BUTTON_MESSAGE, PHARMACY_BUTTON_MESSAGE};
use icare_core::hours::target_time::has_time_marker;
use icare_core::{FacilityKind, SortOrder};
use regex::Regex;

const PHARMACY_KEYWORDS: &[&str] = &["약국", "pharmacy", "drugstore"];
const HOSPITAL_KEYWORDS: &[&str] = &["병원", "의원", "진료", "hospital", "clinic"];

static EARLIEST_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:일찍|빨리)\s*(?:문\s*)?(?:여는|열)|earliest").expect("valid sort regex")
});
static LATEST_CLOSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)늦게\s*(?:까지)?\s*(?:하는|닫는|여는)?|latest").expect("valid sort regex")
});

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Run the search tool for `kind`. Coordinates are filled in later.
    Search {
        kind: FacilityKind,
        request: ToolRequest,
    },
    OffTopic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub intent: Intent,
    /// Set for the quick-reply button phrases, which answer in two parts.
    pub acknowledgement: Option<&'static str>,
}

#[must_use]
pub fn dispatch(message: &str) -> Dispatch {
    let text = message.trim();

    let acknowledgement = match text {
        PHARMACY_BUTTON_MESSAGE => Some("근처 약국을 찾아볼게요!"),
        HOSPITAL_BUTTON_MESSAGE => Some("근처 병원을 찾아볼게요!"),
        _ => None,
    };

    Dispatch {
        intent: classify(text),
        acknowledgement,
    }
}

fn classify(text: &str) -> Intent {
    let lowered = text.to_lowercase();
    let department = find_department(text);

    let kind = if department.is_some() {
        FacilityKind::Hospital
    } else if PHARMACY_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        FacilityKind::Pharmacy
    } else if HOSPITAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        FacilityKind::Hospital
    } else {
        return Intent::OffTopic;
    };

    let (sort_by, remainder) = if let Some(m) = EARLIEST_OPEN.find(text) {
        (Some(SortOrder::EarliestOpen), strip(text, m.range()))
    } else if let Some(m) = LATEST_CLOSE.find(text) {
        (Some(SortOrder::LatestClose), strip(text, m.range()))
    } else {
        (None, text.to_string())
    };

    // "일찍" doubles as a morning marker; only the rest of the sentence
    // decides whether a specific time was asked for.
    let target_time = has_time_marker(&remainder).then(|| text.to_string());

    Intent::Search {
        kind,
        request: ToolRequest {
            query: match kind {
                FacilityKind::Hospital => department.map(str::to_string),
                FacilityKind::Pharmacy => None,
            },
            latitude: None,
            longitude: None,
            target_time,
            sort_by: sort_by.map(|s| s.as_str().to_string()),
        },
    }
}

fn strip(text: &str, range: std::ops::Range<usize>) -> String {
    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..range.start]);
    out.push(' ');
    out.push_str(&text[range.end..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(message: &str) -> (FacilityKind, ToolRequest) {
        match dispatch(message).intent {
            Intent::Search { kind, request } => (kind, request),
            Intent::OffTopic => panic!("expected a search for {message:?}"),
        }
    }

    #[test]
    fn pharmacy_keyword_routes_to_pharmacy_tool() {
        let (kind, request) = search("근처 약국 알려줘");
        assert_eq!(kind, FacilityKind::Pharmacy);
        assert_eq!(request.query, None);
        assert_eq!(request.sort_by, None);
        assert_eq!(request.target_time, None);
    }

    #[test]
    fn department_routes_to_hospital_with_canonical_query() {
        let (kind, request) = search("근처 소아과 알려줘");
        assert_eq!(kind, FacilityKind::Hospital);
        assert_eq!(request.query.as_deref(), Some("소아청소년과"));
    }

    #[test]
    fn generic_hospital_has_no_query() {
        let (kind, request) = search("병원 어디 있어?");
        assert_eq!(kind, FacilityKind::Hospital);
        assert_eq!(request.query, None);
    }

    #[test]
    fn earliest_open_phrase_sets_sort_without_time() {
        let (_, request) = search("일찍 여는 약국");
        assert_eq!(request.sort_by.as_deref(), Some("earliest_open"));
        assert_eq!(request.target_time, None);
    }

    #[test]
    fn latest_close_phrase_sets_sort() {
        let (kind, request) = search("늦게까지 하는 이비인후과");
        assert_eq!(kind, FacilityKind::Hospital);
        assert_eq!(request.sort_by.as_deref(), Some("latest_close"));
    }

    #[test]
    fn time_marker_passes_message_as_target_time() {
        let (_, request) = search("내일 오전 10시에 여는 약국");
        assert_eq!(request.target_time.as_deref(), Some("내일 오전 10시에 여는 약국"));
    }

    #[test]
    fn unrelated_message_is_off_topic() {
        assert_eq!(dispatch("오늘 날씨 어때?").intent, Intent::OffTopic);
    }

    #[test]
    fn button_phrases_carry_acknowledgement() {
        let d = dispatch(PHARMACY_BUTTON_MESSAGE);
        assert!(d.acknowledgement.is_some());
        assert!(matches!(
            d.intent,
            Intent::Search {
                kind: FacilityKind::Pharmacy,
                ..
            }
        ));

        let d = dispatch(HOSPITAL_BUTTON_MESSAGE);
        assert!(d.acknowledgement.is_some());
        assert!(dispatch("근처 약국 알려줘").acknowledgement.is_none());
    }
}
