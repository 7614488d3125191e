//! Porter stemmer
//!
//! Suffix-stripping stemmer following Porter's algorithm with the NLTK
//! extensions (the NLTK `PorterStemmer` default mode). Persisted bundles were
//! trained on text stemmed this way, so the rules here have to match it
//! exactly, including the quirks:
//!
//! - a small pool of irregular forms is mapped directly
//! - words of two letters or fewer are returned unchanged
//! - `ies`/`ied` on four letter words keep the `e` ("ties" -> "tie")
//! - step 1c only rewrites `y` after a consonant that is not the first letter
//! - step 2 uses `bli`, `alli`, `fulli` and `logi` instead of the published `abli`

const IRREGULAR_FORMS: &[(&str, &str)] = &[
    ("sky", "sky"),
    ("skies", "sky"),
    ("dying", "die"),
    ("lying", "lie"),
    ("tying", "tie"),
    ("news", "news"),
    ("innings", "inning"),
    ("inning", "inning"),
    ("outings", "outing"),
    ("outing", "outing"),
    ("cannings", "canning"),
    ("canning", "canning"),
    ("howe", "howe"),
    ("proceed", "proceed"),
    ("exceed", "exceed"),
    ("succeed", "succeed"),
];

/// Suffix, replacement and an optional condition on the remaining stem.
///
/// The first rule whose suffix matches decides the outcome, even when its
/// condition rejects the stem. The pseudo-suffix `*d` matches any word ending
/// in a double consonant.
type Rule<'a> = (&'a str, &'a str, Option<&'a dyn Fn(&str) -> bool>);

/// Stateless Porter stemmer
#[derive(Debug, Clone, Copy, Default)]
pub struct PorterStemmer;

impl PorterStemmer {
    pub fn new() -> Self {
        Self
    }

    /// Reduce a word to its stem.
    ///
    /// Input is lowercased first. Words containing anything other than ASCII
    /// letters are returned lowercased but otherwise untouched.
    pub fn stem(&self, word: &str) -> String {
        let word = word.to_lowercase();

        if let Some((_, base)) = IRREGULAR_FORMS.iter().find(|(form, _)| *form == word) {
            return (*base).to_string();
        }

        if word.len() <= 2 || !word.bytes().all(|b| b.is_ascii_lowercase()) {
            return word;
        }

        let word = step1a(&word);
        let word = step1b(&word);
        let word = step1c(&word);
        let word = step2(&word);
        let word = step3(&word);
        let word = step4(&word);
        let word = step5a(&word);
        step5b(&word)
    }
}

fn is_consonant(word: &[u8], i: usize) -> bool {
    match word[i] {
        b'a' | b'e' | b'i' | b'o' | b'u' => false,
        b'y' => i == 0 || !is_consonant(word, i - 1),
        _ => true,
    }
}

/// Number of vowel-consonant sequences (Porter's `m`)
fn measure(stem: &str) -> usize {
    let bytes = stem.as_bytes();
    let mut m = 0;
    let mut previous_vowel = false;
    for i in 0..bytes.len() {
        let consonant = is_consonant(bytes, i);
        if consonant && previous_vowel {
            m += 1;
        }
        previous_vowel = !consonant;
    }
    m
}

fn has_positive_measure(stem: &str) -> bool {
    measure(stem) > 0
}

fn contains_vowel(stem: &str) -> bool {
    let bytes = stem.as_bytes();
    (0..bytes.len()).any(|i| !is_consonant(bytes, i))
}

fn ends_double_consonant(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    n >= 2 && bytes[n - 1] == bytes[n - 2] && is_consonant(bytes, n - 1)
}

fn ends_cvc(word: &str) -> bool {
    let bytes = word.as_bytes();
    let n = bytes.len();
    (n >= 3
        && is_consonant(bytes, n - 3)
        && !is_consonant(bytes, n - 2)
        && is_consonant(bytes, n - 1)
        && !matches!(bytes[n - 1], b'w' | b'x' | b'y'))
        || (n == 2 && !is_consonant(bytes, 0) && is_consonant(bytes, 1))
}

fn apply_rules(word: &str, rules: &[Rule<'_>]) -> String {
    for &(suffix, replacement, condition) in rules {
        let stem = if suffix == "*d" {
            if !ends_double_consonant(word) {
                continue;
            }
            &word[..word.len() - 2]
        } else {
            match word.strip_suffix(suffix) {
                Some(stem) => stem,
                None => continue,
            }
        };

        return match condition {
            Some(accept) if !accept(stem) => word.to_string(),
            _ => format!("{stem}{replacement}"),
        };
    }
    word.to_string()
}

fn step1a(word: &str) -> String {
    if word.len() == 4 {
        if let Some(stem) = word.strip_suffix("ies") {
            return format!("{stem}ie");
        }
    }
    apply_rules(
        word,
        &[("sses", "ss", None), ("ies", "i", None), ("ss", "ss", None), ("s", "", None)],
    )
}

fn step1b(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("ied") {
        let replacement = if word.len() == 4 { "ie" } else { "i" };
        return format!("{stem}{replacement}");
    }

    if let Some(stem) = word.strip_suffix("eed") {
        return if measure(stem) > 0 {
            format!("{stem}ee")
        } else {
            word.to_string()
        };
    }

    let intermediate = ["ed", "ing"]
        .iter()
        .filter_map(|suffix| word.strip_suffix(*suffix))
        .find(|stem| contains_vowel(stem));

    let Some(intermediate) = intermediate else {
        return word.to_string();
    };

    let last = &intermediate[intermediate.len() - 1..];
    let keep_double = |_: &str| !matches!(last, "l" | "s" | "z");
    let short_cvc = |stem: &str| measure(stem) == 1 && ends_cvc(stem);

    apply_rules(
        intermediate,
        &[
            ("at", "ate", None),
            ("bl", "ble", None),
            ("iz", "ize", None),
            ("*d", last, Some(&keep_double)),
            ("", "e", Some(&short_cvc)),
        ],
    )
}

fn step1c(word: &str) -> String {
    let after_consonant =
        |stem: &str| stem.len() > 1 && is_consonant(stem.as_bytes(), stem.len() - 1);
    apply_rules(word, &[("y", "i", Some(&after_consonant))])
}

fn step2(word: &str) -> String {
    if let Some(stem) = word.strip_suffix("alli") {
        if has_positive_measure(stem) {
            return step2(&format!("{stem}al"));
        }
    }

    let positive: &dyn Fn(&str) -> bool = &has_positive_measure;
    // The `l` of `logi` stays with the stem so short stems like "geo" qualify.
    let logi = |_: &str| has_positive_measure(&word[..word.len() - 3]);

    apply_rules(
        word,
        &[
            ("ational", "ate", Some(positive)),
            ("tional", "tion", Some(positive)),
            ("enci", "ence", Some(positive)),
            ("anci", "ance", Some(positive)),
            ("izer", "ize", Some(positive)),
            ("bli", "ble", Some(positive)),
            ("alli", "al", Some(positive)),
            ("entli", "ent", Some(positive)),
            ("eli", "e", Some(positive)),
            ("ousli", "ous", Some(positive)),
            ("ization", "ize", Some(positive)),
            ("ation", "ate", Some(positive)),
            ("ator", "ate", Some(positive)),
            ("alism", "al", Some(positive)),
            ("iveness", "ive", Some(positive)),
            ("fulness", "ful", Some(positive)),
            ("ousness", "ous", Some(positive)),
            ("aliti", "al", Some(positive)),
            ("iviti", "ive", Some(positive)),
            ("biliti", "ble", Some(positive)),
            ("fulli", "ful", Some(positive)),
            ("logi", "log", Some(&logi)),
        ],
    )
}

fn step3(word: &str) -> String {
    let positive: &dyn Fn(&str) -> bool = &has_positive_measure;
    apply_rules(
        word,
        &[
            ("icate", "ic", Some(positive)),
            ("ative", "", Some(positive)),
            ("alize", "al", Some(positive)),
            ("iciti", "ic", Some(positive)),
            ("ical", "ic", Some(positive)),
            ("ful", "", Some(positive)),
            ("ness", "", Some(positive)),
        ],
    )
}

fn step4(word: &str) -> String {
    let gt1 = |stem: &str| measure(stem) > 1;
    let ion = |stem: &str| measure(stem) > 1 && (stem.ends_with('s') || stem.ends_with('t'));
    let gt1: &dyn Fn(&str) -> bool = &gt1;

    apply_rules(
        word,
        &[
            ("al", "", Some(gt1)),
            ("ance", "", Some(gt1)),
            ("ence", "", Some(gt1)),
            ("er", "", Some(gt1)),
            ("ic", "", Some(gt1)),
            ("able", "", Some(gt1)),
            ("ible", "", Some(gt1)),
            ("ant", "", Some(gt1)),
            ("ement", "", Some(gt1)),
            ("ment", "", Some(gt1)),
            ("ent", "", Some(gt1)),
            ("ion", "", Some(&ion)),
            ("ou", "", Some(gt1)),
            ("ism", "", Some(gt1)),
            ("ate", "", Some(gt1)),
            ("iti", "", Some(gt1)),
            ("ous", "", Some(gt1)),
            ("ive", "", Some(gt1)),
            ("ize", "", Some(gt1)),
        ],
    )
}

fn step5a(word: &str) -> String {
    if let Some(stem) = word.strip_suffix('e') {
        let m = measure(stem);
        if m > 1 || (m == 1 && !ends_cvc(stem)) {
            return stem.to_string();
        }
    }
    word.to_string()
}

fn step5b(word: &str) -> String {
    let long = |_: &str| measure(&word[..word.len() - 1]) > 1;
    apply_rules(word, &[("ll", "l", Some(&long))])
}
