//! # Tokenizador estilo Penn Treebank para textos clínicos
//!
//! Divide cada sentença em tokens preservando os offsets originais (em bytes),
//! para que entidades possam ser serializadas com `begin`/`end` exatos.
//!
//! ## Esquema de Tokenização
//!
//! - Palavras e números são sequências alfanuméricas (hífens internos são mantidos:
//!   `follow-up`, `COVID-19`).
//! - Números decimais ficam juntos (`0.5`, `1,000`).
//! - Abreviações clínicas mantêm o ponto (`Dr.`, `b.i.d.`, `p.o.`).
//! - Contrações são separadas como no Penn Treebank: `don't` → `do`, `n't`;
//!   `patient's` → `patient`, `'s`.
//! - Qualquer outro caractere não-espaço vira um token próprio (pontuação/símbolo).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use clinical_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Pt doesn't take aspirin 81 mg.");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["Pt", "does", "n't", "take", "aspirin", "81", "mg", "."]);
//! ```

use serde::{Deserialize, Serialize};

use crate::cas::{BaseToken, Cas, Span, TokenKind};
use crate::engine::Annotator;
use crate::error::Result;

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    pub kind: TokenKind,
}

/// Abreviações clínicas cujo ponto final não encerra o token.
pub(crate) const ABBREVIATIONS: &[&str] = &[
    "Dr", "Mr", "Mrs", "Ms", "Pt", "pt", "vs", "approx", "e.g", "i.e", "etc", "b.i.d", "t.i.d",
    "q.i.d", "q.d", "p.o", "p.r.n", "h.s", "a.m", "p.m", "Fig", "St",
];

/// Tokeniza `text` (offsets relativos a `text`).
pub fn tokenize(text: &str) -> Vec<Token> {
    let raw = tokenize_standard(text);
    split_contractions(raw)
}

fn tokenize_standard(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current_start = 0;
    let mut current_text = String::new();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;

    while i < chars.len() {
        let (byte_pos, ch) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if ch.is_alphanumeric() {
            if current_text.is_empty() {
                current_start = byte_pos;
            }
            current_text.push(ch);
        } else if ch == '-' && !current_text.is_empty() && next.map(char::is_alphanumeric).unwrap_or(false) {
            // hífen interno: "follow-up", "COVID-19"
            current_text.push(ch);
        } else if (ch == '.' || ch == ',') && !current_text.is_empty() {
            let current_is_num = current_text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',');
            let next_is_digit = next.map(|c| c.is_ascii_digit()).unwrap_or(false);
            // "b.i.d": letra isolada seguida de ponto e outra letra
            let dotted_abbrev = ch == '.'
                && current_text.chars().last().map(char::is_alphabetic).unwrap_or(false)
                && next.map(char::is_alphabetic).unwrap_or(false)
                && chars.get(i + 2).map(|(_, c)| *c == '.').unwrap_or(false);

            if current_is_num && next_is_digit {
                current_text.push(ch);
            } else if dotted_abbrev {
                current_text.push(ch);
            } else if ch == '.' && ABBREVIATIONS.contains(&current_text.as_str()) && !is_sentence_final(&chars, i) {
                current_text.push(ch);
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos + 1);
            } else {
                flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
                push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + 1);
            }
        } else if ch == '\'' || ch == '\u{2019}' {
            if current_text.is_empty() {
                // apóstrofo inicial é pontuação
                push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
            } else {
                current_text.push(ch);
            }
        } else if ch.is_whitespace() {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
        } else {
            flush_token(&mut tokens, &mut current_text, current_start, byte_pos);
            push_token(&mut tokens, ch.to_string(), byte_pos, byte_pos + ch.len_utf8());
        }
        i += 1;
    }

    flush_token(&mut tokens, &mut current_text, current_start, text.len());
    tokens
}

/// O ponto em `i` é o último caractere não-espaço do texto?
fn is_sentence_final(chars: &[(usize, char)], i: usize) -> bool {
    chars[i + 1..].iter().all(|(_, c)| c.is_whitespace())
}

/// Clíticos separados após o apóstrofo ("'s", "'re", "'ve"...).
const CLITICS: &[&str] = &["s", "re", "ve", "ll", "d", "m"];

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

/// Offset (em bytes de `text`) onde começa o último clítico, se houver.
/// Em `n't` o corte fica antes do `n`; a base nunca fica vazia.
fn clitic_start(text: &str) -> Option<usize> {
    let apos = text.rfind(is_apostrophe)?;
    let tail = &text[apos..];
    let tail = &tail[tail.chars().next()?.len_utf8()..];

    if tail.eq_ignore_ascii_case("t") {
        let base = &text[..apos];
        return (base.len() > 1 && base.ends_with(|c: char| c == 'n' || c == 'N')).then(|| apos - 1);
    }
    (apos > 0 && CLITICS.iter().any(|c| tail.eq_ignore_ascii_case(c))).then_some(apos)
}

/// Separa contrações no estilo Penn Treebank, inclusive encadeadas
/// ("wouldn't've" → `would`, `n't`, `'ve`).
fn split_contractions(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        let mut clitics = Vec::new();
        let mut base_end = token.text.len();
        while let Some(split) = clitic_start(&token.text[..base_end]) {
            clitics.push(split..base_end);
            base_end = split;
        }

        if clitics.is_empty() {
            out.push(token);
            continue;
        }

        let base = &token.text[..base_end];
        out.push(Token {
            text: base.to_string(),
            start: token.start,
            end: token.start + base_end,
            kind: classify(base),
        });
        for range in clitics.into_iter().rev() {
            out.push(Token {
                text: token.text[range.clone()].to_string(),
                start: token.start + range.start,
                end: token.start + range.end,
                kind: TokenKind::Contraction,
            });
        }
    }
    out
}

fn classify(text: &str) -> TokenKind {
    let mut chars = text.chars();
    match chars.next() {
        None => TokenKind::Symbol,
        Some(c) if c.is_ascii_digit() && text.chars().all(|c| c.is_ascii_digit() || c == '.' || c == ',') => {
            TokenKind::Number
        }
        Some(c) if c.is_alphanumeric() => TokenKind::Word,
        Some(c) if c.is_ascii_punctuation() && c != '$' && c != '%' && c != '+' && c != '=' => {
            TokenKind::Punctuation
        }
        Some(_) => TokenKind::Symbol,
    }
}

/// Fecha o token acumulado e adiciona à lista (se não vazio)
fn flush_token(tokens: &mut Vec<Token>, text: &mut String, start: usize, end: usize) {
    if !text.is_empty() {
        tokens.push(Token {
            kind: classify(text),
            text: text.clone(),
            start,
            end,
        });
        text.clear();
    }
}

/// Adiciona um token de pontuação diretamente
fn push_token(tokens: &mut Vec<Token>, text: String, start: usize, end: usize) {
    tokens.push(Token {
        kind: classify(&text),
        text,
        start,
        end,
    });
}

/// Tokeniza cada sentença do documento e registra os `BaseToken`s.
#[derive(Debug, Clone, Default)]
pub struct TokenizerAnnotatorPtb;

impl Annotator for TokenizerAnnotatorPtb {
    fn name(&self) -> &str {
        "TokenizerAnnotatorPTB"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        let mut token_number = 0;
        let mut new_tokens = Vec::new();

        for sentence in sentences {
            let text = cas.covered_text(sentence);
            for token in tokenize(text) {
                new_tokens.push(BaseToken {
                    span: Span::new(sentence.begin + token.start, sentence.begin + token.end),
                    token_number,
                    kind: token.kind,
                    part_of_speech: None,
                    canonical_form: None,
                });
                token_number += 1;
            }
        }

        tracing::debug!("{} tokens gerados", new_tokens.len());
        cas.tokens.replace_all(new_tokens);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(text: &str) -> Vec<String> {
        tokenize(text).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(texts("No chest pain."), vec!["No", "chest", "pain", "."]);
    }

    #[test]
    fn test_decimal_and_hyphen() {
        assert_eq!(
            texts("Take 0.5 mg for follow-up, COVID-19 negative."),
            vec!["Take", "0.5", "mg", "for", "follow-up", ",", "COVID-19", "negative", "."]
        );
    }

    #[test]
    fn test_clinical_abbreviations() {
        let t = texts("Dr. Smith prescribed metformin b.i.d. daily.");
        assert_eq!(t[0], "Dr.");
        assert!(t.contains(&"b.i.d.".to_string()));
    }

    #[test]
    fn test_contractions() {
        assert_eq!(texts("She doesn't smoke"), vec!["She", "does", "n't", "smoke"]);
        let tokens = tokenize("patient's mother");
        assert_eq!(tokens[0].text, "patient");
        assert_eq!(tokens[1].text, "'s");
        assert_eq!(tokens[1].kind, TokenKind::Contraction);
        assert_eq!(tokens[1].start, 7);
    }

    #[test]
    fn test_chained_typographic_contractions() {
        assert_eq!(texts("She wouldn’t’ve had fever."), vec!["She", "would", "n’t", "’ve", "had", "fever", "."]);
        assert_eq!(texts("I’d’ve denied chest pain."), vec!["I", "’d", "’ve", "denied", "chest", "pain", "."]);
        assert_eq!(texts("O’Brien’s mother"), vec!["O’Brien", "’s", "mother"]);

        for text in ["She wouldn’t’ve had fever.", "I’d’ve denied chest pain.", "O’Brien’s mother"] {
            for token in tokenize(text) {
                assert_eq!(&text[token.start..token.end], token.text);
            }
        }
    }

    #[test]
    fn test_bare_clitic_not_split() {
        assert_eq!(texts("n't"), vec!["n't"]);
        assert_eq!(texts("can't"), vec!["ca", "n't"]);
    }

    #[test]
    fn test_offsets_preserved() {
        let text = "BP 120/80 today";
        for token in tokenize(text) {
            assert_eq!(&text[token.start..token.end], token.text);
        }
    }

    #[test]
    fn test_kinds() {
        let tokens = tokenize("Temp 38 % ;");
        assert_eq!(tokens[0].kind, TokenKind::Word);
        assert_eq!(tokens[1].kind, TokenKind::Number);
        assert_eq!(tokens[2].kind, TokenKind::Symbol);
        assert_eq!(tokens[3].kind, TokenKind::Punctuation);
    }
}
