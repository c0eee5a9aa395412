use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Region {
    Haryana,
    Punjab,
    Default,
}

impl Region {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Haryana => "Haryana",
            Self::Punjab => "Punjab",
            Self::Default => "Default",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order; the first region with a hit wins.
const REGION_KEYWORDS: [(Region, &[&str]); 2] = [
    (
        Region::Haryana,
        &[
            "करनाल",
            "हिसार",
            "रोहतक",
            "पानीपत",
            "कुरुक्षेत्र",
            "हरियाणा",
            "karnal",
            "hisar",
            "haryana",
        ],
    ),
    (
        Region::Punjab,
        &[
            "फतेहाबाद",
            "लुधियाना",
            "अमृतसर",
            "पटियाला",
            "जालंधर",
            "पंजाब",
            "fatehabad",
            "ludhiana",
            "punjab",
        ],
    ),
];

pub fn detect_region(raw_text: &str) -> Region {
    let lowered = raw_text.to_lowercase();
    REGION_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|keyword| lowered.contains(*keyword)))
        .map(|(region, _)| *region)
        .unwrap_or(Region::Default)
}

#[cfg(test)]
mod tests {
    use super::{Region, detect_region};

    #[test]
    fn karnal_is_haryana() {
        assert_eq!(detect_region("तहसील करनाल जमाबंदी 2019"), Region::Haryana);
    }

    #[test]
    fn fatehabad_is_punjab() {
        assert_eq!(detect_region("जिला फतेहाबाद"), Region::Punjab);
    }

    #[test]
    fn unrelated_text_is_default() {
        assert_eq!(detect_region("खाता संख्या 101 रामलाल"), Region::Default);
        assert_eq!(detect_region(""), Region::Default);
    }

    #[test]
    fn latin_keywords_are_case_insensitive() {
        assert_eq!(detect_region("District KARNAL"), Region::Haryana);
        assert_eq!(detect_region("Ludhiana tehsil"), Region::Punjab);
    }

    #[test]
    fn haryana_takes_priority_when_both_match() {
        assert_eq!(detect_region("फतेहाबाद करनाल"), Region::Haryana);
        assert_eq!(Region::Haryana.to_string(), "Haryana");
    }
}
