//! Answer-language policy.
//!
//! The response language is chosen per question with a majority count over
//! the question text alone: Hangul syllables versus basic Latin letters.
//! Conversation history and document contents never influence the choice,
//! and nothing is sticky across turns.

/// Target language for a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerLanguage {
    Korean,
    English,
}

/// Classify the target response language for a question.
///
/// Counts characters in the Hangul syllable block (U+AC00..=U+D7A3)
/// against ASCII letters. More Hangul than Latin means Korean; any Latin
/// otherwise means English; input with neither (numbers, symbols) falls
/// back to Korean.
pub fn detect_answer_language(question: &str) -> AnswerLanguage {
    let mut hangul = 0usize;
    let mut latin = 0usize;

    for c in question.chars() {
        if ('\u{AC00}'..='\u{D7A3}').contains(&c) {
            hangul += 1;
        } else if c.is_ascii_alphabetic() {
            latin += 1;
        }
    }

    if hangul > latin {
        AnswerLanguage::Korean
    } else if latin > 0 {
        AnswerLanguage::English
    } else {
        AnswerLanguage::Korean
    }
}
