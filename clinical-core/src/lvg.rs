//! # Normalização Lexical (LVG)
//!
//! Atribui a cada token de palavra uma forma canônica: minúscula e com a
//! morfologia flexional do inglês removida ("pains" → "pain", "vomiting" →
//! "vomit", "diagnosed" → "diagnose"). A busca no dicionário e os
//! classificadores de asserção comparam formas canônicas, o que torna as
//! listas de gatilhos independentes de flexão.

use std::collections::HashMap;

use crate::cas::{Cas, TokenKind};
use crate::engine::Annotator;
use crate::error::Result;

/// Formas irregulares comuns em notas clínicas.
const IRREGULAR: &[(&str, &str)] = &[
    ("was", "be"),
    ("were", "be"),
    ("is", "be"),
    ("are", "be"),
    ("been", "be"),
    ("has", "have"),
    ("had", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("went", "go"),
    ("gone", "go"),
    ("took", "take"),
    ("taken", "take"),
    ("felt", "feel"),
    ("gave", "give"),
    ("given", "give"),
    ("children", "child"),
    ("women", "woman"),
    ("men", "man"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("n't", "not"),
];

/// Palavras terminadas em "s"/"ed"/"ing" que não devem ser reduzidas.
const PROTECTED: &[&str] = &[
    "diabetes", "lupus", "status", "sepsis", "psoriasis", "pertussis", "herpes", "mumps",
    "measles", "tetanus", "virus", "always", "previous", "various", "nausea", "bed", "red",
    "bleed", "need", "feed", "seed", "speed", "ring", "during", "morning", "evening", "nothing",
    "something", "anything", "thing", "bring", "sibling", "swelling", "bleeding", "this", "his",
    "has", "was", "gas", "yes", "plus", "thus", "less", "unless", "abscess", "illness",
    "weakness", "stenosis", "thrombosis", "osteoporosis", "cirrhosis", "analysis", "diagnosis",
    "prognosis", "mellitus", "pancreatitis", "arthritis", "bronchitis", "hepatitis",
    "meningitis", "appendicitis", "dermatitis", "gastritis", "colitis", "sinusitis", "tonsillitis",
    "as", "us", "is", "its", "hcs",
];

/// Anotador de normalização lexical.
#[derive(Debug, Clone)]
pub struct LvgAnnotator {
    irregular: HashMap<&'static str, &'static str>,
}

impl LvgAnnotator {
    pub fn new() -> Self {
        Self {
            irregular: IRREGULAR.iter().copied().collect(),
        }
    }

    /// Forma canônica de uma palavra.
    pub fn canonical_form(&self, word: &str) -> String {
        let lower = word.to_lowercase().replace('\u{2019}', "'");
        if let Some(base) = self.irregular.get(lower.as_str()) {
            return (*base).to_string();
        }
        if PROTECTED.contains(&lower.as_str()) || !lower.chars().all(char::is_alphabetic) {
            return lower;
        }
        lemmatize(&lower)
    }
}

impl Default for LvgAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for LvgAnnotator {
    fn name(&self) -> &str {
        "LvgAnnotator"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let forms: Vec<Option<String>> = cas
            .tokens
            .iter()
            .map(|t| match t.kind {
                TokenKind::Word | TokenKind::Contraction => {
                    Some(self.canonical_form(cas.covered_text(t.span)))
                }
                _ => None,
            })
            .collect();

        for (token, form) in cas.tokens.iter_mut().zip(forms) {
            token.canonical_form = form;
        }
        Ok(())
    }
}

/// Redução de sufixos flexionais do inglês.
fn lemmatize(lower: &str) -> String {
    let len = lower.len();

    if lower.ends_with("ies") && len > 4 {
        return format!("{}y", &lower[..len - 3]);
    }
    if lower.ends_with("es") && len > 3 {
        let stem = &lower[..len - 2];
        if stem.ends_with("ss") || stem.ends_with("sh") || stem.ends_with("ch") || stem.ends_with('x') {
            return stem.to_string();
        }
    }
    if lower.ends_with('s') && len > 3 && !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is") {
        return lower[..len - 1].to_string();
    }
    if lower.ends_with("ing") && len > 5 {
        return undouble(&lower[..len - 3]);
    }
    if lower.ends_with("ied") && len > 4 {
        return format!("{}y", &lower[..len - 3]);
    }
    if lower.ends_with("ed") && len > 4 {
        let stem = &lower[..len - 2];
        // "diagnosed" → "diagnose", "denied" tratado acima
        if stem.ends_with("os") || stem.ends_with("at") || stem.ends_with("iz") || stem.ends_with("uc") {
            return format!("{stem}e");
        }
        return undouble(stem);
    }

    lower.to_string()
}

/// Remove consoante dobrada final ("stopp" → "stop").
fn undouble(stem: &str) -> String {
    let chars: Vec<char> = stem.chars().collect();
    let n = chars.len();
    if n >= 2 && chars[n - 1] == chars[n - 2] && !matches!(chars[n - 1], 'l' | 's' | 'z') {
        return chars[..n - 1].iter().collect();
    }
    stem.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_forms() {
        let lvg = LvgAnnotator::new();
        assert_eq!(lvg.canonical_form("Pains"), "pain");
        assert_eq!(lvg.canonical_form("vomiting"), "vomit");
        assert_eq!(lvg.canonical_form("denies"), "deny");
        assert_eq!(lvg.canonical_form("denied"), "deny");
        assert_eq!(lvg.canonical_form("diagnosed"), "diagnose");
        assert_eq!(lvg.canonical_form("stopped"), "stop");
        assert_eq!(lvg.canonical_form("was"), "be");
        assert_eq!(lvg.canonical_form("n't"), "not");
    }

    #[test]
    fn test_protected_words_untouched() {
        let lvg = LvgAnnotator::new();
        assert_eq!(lvg.canonical_form("Diabetes"), "diabetes");
        assert_eq!(lvg.canonical_form("status"), "status");
        assert_eq!(lvg.canonical_form("bleeding"), "bleeding");
        assert_eq!(lvg.canonical_form("COVID-19"), "covid-19");
    }
}
