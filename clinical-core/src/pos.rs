//! # Etiquetador Morfossintático (POS)
//!
//! Atribui tags do Penn Treebank a cada token. A decisão combina três fontes,
//! nesta ordem de precedência:
//!
//! 1. **Léxico fechado**: determinantes, preposições, pronomes, auxiliares e
//!    verbos clínicos frequentes ("denies", "reports", "presents").
//! 2. **Classe do token**: números → `CD`, pontuação → a própria pontuação.
//! 3. **Heurísticas de sufixo** (`-tion` → `NN`, `-ly` → `RB`, `-ed` → `VBD`...)
//!    e uma regra de contexto: após determinante ou adjetivo, formas ambíguas
//!    são nominais ("the swelling", "a history").

use std::collections::HashMap;

use crate::cas::{Cas, TokenKind};
use crate::engine::Annotator;
use crate::error::Result;

const LEXICON: &[(&str, &str)] = &[
    // determinantes
    ("a", "DT"), ("an", "DT"), ("the", "DT"), ("this", "DT"), ("that", "DT"), ("these", "DT"),
    ("those", "DT"), ("no", "DT"), ("any", "DT"), ("some", "DT"), ("each", "DT"), ("every", "DT"),
    ("all", "DT"), ("both", "DT"), ("another", "DT"),
    // possessivos
    ("his", "PRP$"), ("her", "PRP$"), ("their", "PRP$"), ("its", "PRP$"), ("my", "PRP$"),
    ("your", "PRP$"), ("our", "PRP$"),
    // pronomes
    ("he", "PRP"), ("she", "PRP"), ("they", "PRP"), ("it", "PRP"), ("i", "PRP"), ("we", "PRP"),
    ("you", "PRP"), ("him", "PRP"), ("them", "PRP"), ("me", "PRP"), ("us", "PRP"),
    // preposições e subordinação
    ("of", "IN"), ("in", "IN"), ("on", "IN"), ("at", "IN"), ("for", "IN"), ("with", "IN"),
    ("without", "IN"), ("from", "IN"), ("by", "IN"), ("about", "IN"), ("after", "IN"),
    ("before", "IN"), ("during", "IN"), ("since", "IN"), ("into", "IN"), ("over", "IN"),
    ("under", "IN"), ("per", "IN"), ("because", "IN"), ("if", "IN"), ("than", "IN"),
    ("until", "IN"), ("unless", "IN"), ("as", "IN"), ("upon", "IN"), ("via", "IN"),
    ("to", "TO"),
    // conjunções
    ("and", "CC"), ("or", "CC"), ("but", "CC"), ("nor", "CC"),
    // advérbios e partículas
    ("not", "RB"), ("n't", "RB"), ("never", "RB"), ("also", "RB"), ("now", "RB"),
    ("currently", "RB"), ("previously", "RB"), ("today", "NN"), ("yesterday", "NN"),
    ("very", "RB"), ("then", "RB"), ("again", "RB"), ("still", "RB"), ("there", "EX"),
    // modais e auxiliares
    ("may", "MD"), ("might", "MD"), ("could", "MD"), ("should", "MD"), ("would", "MD"),
    ("will", "MD"), ("can", "MD"), ("must", "MD"), ("shall", "MD"),
    ("is", "VBZ"), ("are", "VBP"), ("was", "VBD"), ("were", "VBD"), ("be", "VB"),
    ("been", "VBN"), ("being", "VBG"), ("has", "VBZ"), ("have", "VBP"), ("had", "VBD"),
    ("does", "VBZ"), ("do", "VBP"), ("did", "VBD"), ("'s", "POS"),
    // verbos clínicos
    ("denies", "VBZ"), ("denied", "VBD"), ("deny", "VBP"), ("reports", "VBZ"),
    ("reported", "VBD"), ("presents", "VBZ"), ("presented", "VBD"), ("complains", "VBZ"),
    ("complained", "VBD"), ("states", "VBZ"), ("stated", "VBD"), ("notes", "VBZ"),
    ("takes", "VBZ"), ("take", "VB"), ("took", "VBD"), ("shows", "VBZ"), ("showed", "VBD"),
    ("revealed", "VBD"), ("reveals", "VBZ"), ("suggests", "VBZ"), ("suggest", "VBP"),
    ("return", "VB"), ("call", "VB"), ("continue", "VB"), ("start", "VB"), ("started", "VBD"),
    ("stopped", "VBD"), ("admitted", "VBN"), ("diagnosed", "VBN"), ("treated", "VBN"),
    ("underwent", "VBD"), ("had", "VBD"), ("developed", "VBD"), ("experienced", "VBD"),
    ("ruled", "VBN"), ("rule", "VB"), ("develops", "VBZ"), ("worsens", "VBZ"),
    // nomes clínicos ambíguos com sufixo verbal
    ("swelling", "NN"), ("bleeding", "NN"), ("vomiting", "NN"), ("wheezing", "NN"),
    ("hearing", "NN"), ("breathing", "NN"), ("screening", "NN"), ("feeling", "NN"),
    ("history", "NN"), ("pain", "NN"), ("breath", "NN"), ("shortness", "NN"), ("need", "NN"),
    ("patient", "NN"), ("mother", "NN"), ("father", "NN"), ("sister", "NN"), ("brother", "NN"),
    ("family", "NN"), ("status", "NN"), ("cancer", "NN"), ("fever", "NN"), ("chest", "NN"),
    ("daily", "RB"), ("chronic", "JJ"), ("acute", "JJ"), ("negative", "JJ"), ("positive", "JJ"),
    ("possible", "JJ"), ("probable", "JJ"), ("likely", "JJ"), ("mild", "JJ"), ("severe", "JJ"),
    ("new", "JJ"), ("prior", "JJ"), ("recent", "JJ"), ("left", "JJ"), ("right", "JJ"),
];

/// Etiquetador baseado em léxico e sufixos.
#[derive(Debug, Clone)]
pub struct PosTagger {
    lexicon: HashMap<&'static str, &'static str>,
}

impl PosTagger {
    pub fn new() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
        }
    }

    /// Etiqueta uma sequência de palavras (uma sentença).
    pub fn tag(&self, words: &[(&str, TokenKind)]) -> Vec<String> {
        let mut tags: Vec<String> = Vec::with_capacity(words.len());
        for (i, (word, kind)) in words.iter().enumerate() {
            let prev = if i > 0 { Some(tags[i - 1].as_str()) } else { None };
            let tag = self.tag_word(word, *kind, prev, i == 0);
            tags.push(tag);
        }
        tags
    }

    fn tag_word(&self, word: &str, kind: TokenKind, prev: Option<&str>, sentence_start: bool) -> String {
        match kind {
            TokenKind::Number => return "CD".to_string(),
            TokenKind::Punctuation => return punctuation_tag(word).to_string(),
            TokenKind::Symbol => return "SYM".to_string(),
            TokenKind::Word | TokenKind::Contraction => {}
        }

        let lower = word.to_lowercase();
        let nominal_context = matches!(prev, Some("DT" | "PRP$" | "JJ" | "POS" | "CD"));

        if let Some(tag) = self.lexicon.get(lower.as_str()) {
            // "a return visit": forma verbal base em contexto nominal
            if nominal_context && tag.starts_with("VB") && !matches!(*tag, "VBZ" | "VBD") {
                return "NN".to_string();
            }
            return (*tag).to_string();
        }

        if !sentence_start && word.chars().next().map(char::is_uppercase).unwrap_or(false) {
            // siglas ("CT", "MRI", "COPD") e nomes próprios
            return if word.len() > 1 && word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit()) {
                "NN".to_string()
            } else {
                "NNP".to_string()
            };
        }
        if word.len() > 1 && word.chars().all(|c| c.is_uppercase() || c.is_ascii_digit() || c == '-') {
            return "NN".to_string();
        }

        suffix_tag(&lower, prev, nominal_context).to_string()
    }
}

impl Default for PosTagger {
    fn default() -> Self {
        Self::new()
    }
}

fn punctuation_tag(p: &str) -> &'static str {
    match p {
        "." | "?" | "!" => ".",
        "," => ",",
        ":" | ";" | "-" | "--" => ":",
        "(" | "[" | "{" => "-LRB-",
        ")" | "]" | "}" => "-RRB-",
        "\"" | "'" => "''",
        _ => "SYM",
    }
}

fn suffix_tag(lower: &str, prev: Option<&str>, nominal_context: bool) -> &'static str {
    let noun_suffixes = [
        "tion", "sion", "ment", "ness", "ity", "ism", "itis", "osis", "emia", "algia", "ectomy",
        "otomy", "scopy", "graphy", "gram", "pathy", "plasty", "ure", "ance", "ence", "ist",
    ];
    let adj_suffixes = [
        "al", "ic", "ous", "ive", "ful", "less", "able", "ible", "ary", "oid", "ular", "ory",
    ];

    if noun_suffixes.iter().any(|s| lower.ends_with(s)) {
        return if lower.ends_with('s') && !lower.ends_with("sis") && !lower.ends_with("ss") {
            "NNS"
        } else {
            "NN"
        };
    }
    if lower.ends_with("ly") && lower.len() > 4 {
        return "RB";
    }
    if adj_suffixes.iter().any(|s| lower.ends_with(s)) && lower.len() > 4 {
        return "JJ";
    }
    if lower.ends_with("ing") && lower.len() > 4 {
        return if nominal_context { "NN" } else { "VBG" };
    }
    if lower.ends_with("ed") && lower.len() > 3 {
        return if nominal_context {
            "JJ"
        } else if matches!(prev, Some("VBZ" | "VBP" | "VBD")) {
            "VBN"
        } else {
            "VBD"
        };
    }
    if prev == Some("TO") || prev == Some("MD") {
        return "VB";
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && !lower.ends_with("is") && lower.len() > 3 {
        return "NNS";
    }
    "NN"
}

impl Annotator for PosTagger {
    fn name(&self) -> &str {
        "POSTagger"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<_> = cas.sentences.iter().map(|s| s.span).collect();
        for sentence in sentences {
            let positions = cas.tokens.positions_covered_by(sentence);
            let words: Vec<(&str, TokenKind)> = positions
                .iter()
                .filter_map(|&p| cas.tokens.get(p))
                .map(|t| (cas.covered_text(t.span), t.kind))
                .collect();
            let tags = self.tag(&words);
            for (pos, tag) in positions.into_iter().zip(tags) {
                if let Some(token) = cas.tokens.get_mut(pos) {
                    token.part_of_speech = Some(tag);
                }
            }
        }
        Ok(())
    }
}
