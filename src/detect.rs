use std::fmt;

/// Source platform recorded on reservations and used as import config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Platform {
    #[serde(rename = "AIRBNB")]
    Airbnb,
    #[serde(rename = "BOOKING")]
    Booking,
    #[serde(rename = "VRBO")]
    Vrbo,
    #[serde(rename = "DIRECT")]
    Direct,
    #[serde(rename = "OTHER")]
    Other,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Airbnb => "AIRBNB",
            Platform::Booking => "BOOKING",
            Platform::Vrbo => "VRBO",
            Platform::Direct => "DIRECT",
            Platform::Other => "OTHER",
        };
        write!(f, "{s}")
    }
}

/// Header-based classification result. Unknown routes to manual mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detected {
    Airbnb,
    Booking,
    Unknown,
}

const AIRBNB_KEYWORDS: &[&str] = &[
    "confirmation code",
    "guest name",
    "start date",
    "end date",
    "# of nights",
    "listing",
    "earnings",
    "c\u{f3}digo de confirmaci\u{f3}n",
    "hu\u{e9}sped",
    "fecha de inicio",
    "ganancias",
];

const BOOKING_KEYWORDS: &[&str] = &[
    "book number",
    "booked by",
    "guest name(s)",
    "check-in",
    "check-out",
    "commission",
    "price",
    "payment status",
    "n\u{fa}mero de reserva",
    "llegada",
    "salida",
    "comisi\u{f3}n",
];

fn score(haystack: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| haystack.contains(*k)).count()
}

/// Classify a header row by keyword hits. Airbnb is checked first, so a
/// row scoring >= 2 on both lists classifies as Airbnb. Fewer than 2 hits
/// on either list degrades to Unknown; never guesses.
pub fn detect_platform(headers: &[String]) -> Detected {
    let joined = headers.join(" ").to_lowercase();
    if score(&joined, AIRBNB_KEYWORDS) >= 2 {
        Detected::Airbnb
    } else if score(&joined, BOOKING_KEYWORDS) >= 2 {
        Detected::Booking
    } else {
        Detected::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(h: &[&str]) -> Vec<String> {
        h.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_detect_airbnb() {
        let h = headers(&["Confirmation code", "Guest name", "Start date", "End date", "Earnings"]);
        assert_eq!(detect_platform(&h), Detected::Airbnb);
    }

    #[test]
    fn test_detect_booking() {
        let h = headers(&["Book number", "Guest name(s)", "Check-in", "Check-out", "Price"]);
        assert_eq!(detect_platform(&h), Detected::Booking);
    }

    #[test]
    fn test_detect_unknown_below_threshold() {
        let h = headers(&["Name", "From", "To", "Total"]);
        assert_eq!(detect_platform(&h), Detected::Unknown);
    }

    #[test]
    fn test_single_keyword_is_not_enough() {
        let h = headers(&["Listing", "From", "To", "Total"]);
        assert_eq!(detect_platform(&h), Detected::Unknown);
    }

    #[test]
    fn test_airbnb_wins_ties() {
        // Scores >= 2 on both vocabularies; Airbnb is checked first.
        let h = headers(&["Confirmation code", "Start date", "Check-in", "Check-out"]);
        assert_eq!(detect_platform(&h), Detected::Airbnb);
    }

    #[test]
    fn test_adding_keywords_is_monotone() {
        let mut h = headers(&["Confirmation code", "Start date"]);
        assert_eq!(detect_platform(&h), Detected::Airbnb);
        h.push("Listing".to_string());
        h.push("Earnings".to_string());
        assert_eq!(detect_platform(&h), Detected::Airbnb);
    }

    #[test]
    fn test_case_insensitive() {
        let h = headers(&["CONFIRMATION CODE", "GUEST NAME", "START DATE"]);
        assert_eq!(detect_platform(&h), Detected::Airbnb);
    }

    #[test]
    fn test_platform_display_matches_stored_form() {
        assert_eq!(Platform::Airbnb.to_string(), "AIRBNB");
        assert_eq!(Platform::Vrbo.to_string(), "VRBO");
    }
}
