//! Language variants and how a single representative value is picked.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    English,
    Urdu,
    RomanUrdu,
    Hindi,
}

impl Language {
    pub const ALL: [Self; 4] = [Self::English, Self::Urdu, Self::RomanUrdu, Self::Hindi];

    /// Field prefix used by records, e.g. `romanUrdu` in `romanUrduTitle`.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::English => "english",
            Self::Urdu => "urdu",
            Self::RomanUrdu => "romanUrdu",
            Self::Hindi => "hindi",
        }
    }

    /// Record key for a variant field, e.g. `Language::Urdu.key("Title")`
    /// is `urduTitle`.
    #[must_use]
    pub fn key(self, stem: &str) -> String {
        format!("{}{stem}", self.prefix())
    }
}

/// Order in which language variants are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precedence([Language; 4]);

impl Precedence {
    /// English, Urdu, Roman Urdu, Hindi.
    pub const DEFAULT: Self = Self(Language::ALL);

    /// Urdu first, used where the audience reads Urdu by default (home page
    /// previews).
    pub const URDU_FIRST: Self = Self([
        Language::Urdu,
        Language::English,
        Language::RomanUrdu,
        Language::Hindi,
    ]);

    #[must_use]
    pub const fn new(order: [Language; 4]) -> Self {
        Self(order)
    }

    #[must_use]
    pub const fn order(&self) -> &[Language; 4] {
        &self.0
    }
}

impl Default for Precedence {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Up to four parallel variants of the same field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Localized<T> {
    pub english: Option<T>,
    pub urdu: Option<T>,
    pub roman_urdu: Option<T>,
    pub hindi: Option<T>,
}

impl<T> Localized<T> {
    /// Builds variants by looking up one key per language.
    pub fn from_fn<F>(mut lookup: F) -> Self
    where
        F: FnMut(Language) -> Option<T>,
    {
        let mut localized = Self {
            english: None,
            urdu: None,
            roman_urdu: None,
            hindi: None,
        };
        for language in Language::ALL {
            localized.set(language, lookup(language));
        }
        localized
    }

    #[must_use]
    pub fn get(&self, language: Language) -> Option<&T> {
        match language {
            Language::English => self.english.as_ref(),
            Language::Urdu => self.urdu.as_ref(),
            Language::RomanUrdu => self.roman_urdu.as_ref(),
            Language::Hindi => self.hindi.as_ref(),
        }
    }

    pub fn set(&mut self, language: Language, value: Option<T>) {
        match language {
            Language::English => self.english = value,
            Language::Urdu => self.urdu = value,
            Language::RomanUrdu => self.roman_urdu = value,
            Language::Hindi => self.hindi = value,
        }
    }
}

impl<T: AsRef<str>> Localized<T> {
    /// Variants as string slices in `precedence` order, absent ones skipped.
    pub fn ordered(&self, precedence: Precedence) -> Vec<&str> {
        precedence
            .order()
            .iter()
            .filter_map(|language| self.get(*language))
            .map(AsRef::as_ref)
            .collect()
    }

    /// First variant with non-blank content, with the language it came from.
    pub fn pick(&self, precedence: Precedence) -> Option<(Language, &str)> {
        precedence.order().iter().find_map(|language| {
            self.get(*language)
                .map(AsRef::as_ref)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (*language, value))
        })
    }

    /// True when every variant is absent or blank.
    pub fn is_blank(&self) -> bool {
        self.pick(Precedence::DEFAULT).is_none()
    }
}

/// First candidate whose trimmed value is non-empty.
pub fn first_non_empty<'a, I>(candidates: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    candidates
        .into_iter()
        .find(|candidate| !candidate.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

const fn is_arabic_script(ch: char) -> bool {
    matches!(
        ch,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

/// RTL as soon as any character is in one of the Arabic script blocks.
#[must_use]
pub fn detect_direction(text: &str) -> TextDirection {
    if text.chars().any(is_arabic_script) {
        TextDirection::Rtl
    } else {
        TextDirection::Ltr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_non_empty_skips_blank_candidates() {
        assert_eq!(
            first_non_empty(["", "  ", "Urdu Text", "Hindi"]),
            Some("Urdu Text")
        );
        assert_eq!(first_non_empty(["", " \t"]), None);
        assert_eq!(first_non_empty(Vec::<&str>::new()), None);
    }

    #[test]
    fn pick_follows_default_precedence() {
        let titles = Localized {
            english: Some(""),
            urdu: Some("اردو"),
            roman_urdu: Some("Roman"),
            hindi: None,
        };
        assert_eq!(
            titles.pick(Precedence::DEFAULT),
            Some((Language::Urdu, "اردو"))
        );
    }

    #[test]
    fn pick_honours_override() {
        let titles = Localized {
            english: Some("English"),
            urdu: Some("اردو"),
            roman_urdu: None,
            hindi: Some("हिंदी"),
        };
        assert_eq!(
            titles.pick(Precedence::URDU_FIRST),
            Some((Language::Urdu, "اردو"))
        );

        let hindi_first = Precedence::new([
            Language::Hindi,
            Language::English,
            Language::Urdu,
            Language::RomanUrdu,
        ]);
        assert_eq!(titles.pick(hindi_first), Some((Language::Hindi, "हिंदी")));
    }

    #[test]
    fn blank_variants() {
        let none: Localized<&str> = Localized::default();
        assert!(none.is_blank());
        assert_eq!(none.pick(Precedence::DEFAULT), None);

        let spaces = Localized {
            english: Some("   "),
            urdu: None,
            roman_urdu: Some(""),
            hindi: None,
        };
        assert!(spaces.is_blank());
    }

    #[test]
    fn from_fn_and_ordered() {
        let localized = Localized::from_fn(|language| match language {
            Language::English => Some("en".to_string()),
            Language::Hindi => Some("hi".to_string()),
            _ => None,
        });
        assert_eq!(localized.ordered(Precedence::DEFAULT), vec!["en", "hi"]);
    }

    #[test]
    fn keys_use_record_prefixes() {
        assert_eq!(Language::RomanUrdu.key("Title"), "romanUrduTitle");
        assert_eq!(Language::English.key("Description"), "englishDescription");
    }

    #[test]
    fn direction_detection() {
        assert_eq!(detect_direction("نماز کا طریقہ"), TextDirection::Rtl);
        assert_eq!(detect_direction("Mixed نماز text"), TextDirection::Rtl);
        assert_eq!(detect_direction("Namaz ka tareeqa"), TextDirection::Ltr);
        assert_eq!(detect_direction("नमाज़"), TextDirection::Ltr);
        assert_eq!(detect_direction(""), TextDirection::Ltr);
        assert_eq!(TextDirection::Rtl.as_str(), "rtl");
    }
}
