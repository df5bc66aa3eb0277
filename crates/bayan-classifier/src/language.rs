// SPDX-FileCopyrightText: 2026 Bayan Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Script-based language detection.
//!
//! Counts Arabic-script versus Latin-script letters. No model call, no
//! network, no latency. Mixed input goes to whichever script dominates.

use bayan_core::Language;

/// Detect the language of an utterance from its script.
///
/// Returns `Unknown` for input without any letters (empty, whitespace,
/// digits/punctuation only).
pub fn detect_language(text: &str) -> Language {
    let mut arabic = 0usize;
    let mut latin = 0usize;

    for c in text.chars() {
        if is_arabic_letter(c) {
            arabic += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    if arabic == 0 && latin == 0 {
        Language::Unknown
    } else if arabic >= latin {
        Language::Arabic
    } else {
        Language::English
    }
}

/// True for characters in the Arabic script blocks (base, supplement,
/// extended-A, and presentation forms).
fn is_arabic_letter(c: char) -> bool {
    matches!(
        c,
        '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}'
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_english() {
        assert_eq!(detect_language("What was our revenue last quarter?"), Language::English);
        assert_eq!(detect_language("hello"), Language::English);
    }

    #[test]
    fn detects_arabic() {
        assert_eq!(detect_language("هل يمكنك أن تروي لي نكتة؟"), Language::Arabic);
        assert_eq!(detect_language("كم كانت الإيرادات؟"), Language::Arabic);
    }

    #[test]
    fn empty_and_symbol_input_is_unknown() {
        assert_eq!(detect_language(""), Language::Unknown);
        assert_eq!(detect_language("   "), Language::Unknown);
        assert_eq!(detect_language("123 ?!"), Language::Unknown);
    }

    #[test]
    fn mixed_input_goes_to_dominant_script() {
        // Mostly Arabic with one Latin token.
        assert_eq!(detect_language("كم كانت إيرادات Q2؟"), Language::Arabic);
        // Mostly English with one Arabic token.
        assert_eq!(detect_language("what is the revenue for منطقة?"), Language::English);
    }
}
