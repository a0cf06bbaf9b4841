use serde::{Deserialize, Serialize};

use crate::errors::InputError;

const HEBREW_ALEF: char = '\u{05D0}';
const HEBREW_TAV: char = '\u{05EA}';

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WordPolicy {
    #[default]
    Any,
    Hebrew,
}

impl WordPolicy {
    /// Trims `text` and checks it against the policy, returning the word to explain.
    pub fn normalize<'a>(&self, text: &'a str) -> Result<&'a str, InputError> {
        let word = text.trim();
        if word.is_empty() {
            return Err(InputError::Empty);
        }

        match self {
            Self::Any => Ok(word),
            Self::Hebrew => {
                if word.chars().all(|ch| (HEBREW_ALEF..=HEBREW_TAV).contains(&ch)) {
                    Ok(word)
                } else {
                    Err(InputError::Rejected(
                        "please send a single Hebrew word (letters only, no vowel points)"
                            .to_owned(),
                    ))
                }
            }
        }
    }
}

impl std::str::FromStr for WordPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "hebrew" => Ok(Self::Hebrew),
            other => Err(format!("unsupported word policy `{other}` (expected any|hebrew)")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WordPolicy;
    use crate::errors::InputError;

    #[test]
    fn any_policy_trims_and_rejects_blank_text() {
        assert_eq!(WordPolicy::Any.normalize("  serendipity \n"), Ok("serendipity"));
        assert_eq!(WordPolicy::Any.normalize(" \t "), Err(InputError::Empty));
    }

    #[test]
    fn hebrew_policy_accepts_plain_letters_only() {
        assert_eq!(WordPolicy::Hebrew.normalize(" מכין "), Ok("מכין"));
        // final letters sit inside the alef..tav block
        assert_eq!(WordPolicy::Hebrew.normalize("שלום"), Ok("שלום"));

        assert!(matches!(WordPolicy::Hebrew.normalize("hello"), Err(InputError::Rejected(_))));
        assert!(matches!(WordPolicy::Hebrew.normalize("שָׁלוֹם"), Err(InputError::Rejected(_))));
        assert!(matches!(WordPolicy::Hebrew.normalize("מכין שלום"), Err(InputError::Rejected(_))));
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("Hebrew".parse::<WordPolicy>(), Ok(WordPolicy::Hebrew));
        assert_eq!("any".parse::<WordPolicy>(), Ok(WordPolicy::Any));
        assert!("latin".parse::<WordPolicy>().is_err());
    }
}
