//! # Chunker e Ajustador de Chunks
//!
//! O [`Chunker`] agrupa tokens etiquetados em sintagmas rasos:
//!
//! | Tipo   | Padrão (tags POS)                          | Exemplo                  |
//! |--------|--------------------------------------------|--------------------------|
//! | NP     | `(DT|PRP$)? (JJ|CD|NN*)* NN*` ou `PRP`     | "a severe headache"      |
//! | VP     | `MD? RB? VB+`                              | "should return"          |
//! | PP     | `IN` / `TO`                                | "of"                     |
//! | SBAR   | `IN` subordinativo                         | "if", "because"          |
//! | ADJP   | `JJ+` sem núcleo nominal                   | "negative"               |
//! | ADVP   | `RB+`                                      | "currently"              |
//!
//! Tokens fora de qualquer padrão (pontuação, símbolos) não geram chunk.
//!
//! O [`ChunkAdjuster`] estende chunks de acordo com sequências de tipos: com o
//! padrão `NP PP NP` e índice 2, "[history] [of] [hypertension]" vira um NP
//! único cobrindo os três, o que permite que a janela de busca inclua o
//! modificador preposicional.

use crate::cas::{Cas, Chunk, Span};
use crate::engine::Annotator;
use crate::error::{PipelineError, Result};

const SUBORDINATORS: &[&str] = &["if", "because", "unless", "until", "since", "while", "although", "whether"];

fn is_noun(tag: &str) -> bool {
    tag.starts_with("NN")
}

fn is_np_modifier(tag: &str) -> bool {
    is_noun(tag) || matches!(tag, "JJ" | "JJR" | "JJS" | "CD" | "VBN" | "VBG")
}

/// Chunker por padrões de tags.
#[derive(Debug, Clone, Default)]
pub struct Chunker;

impl Chunker {
    /// Chunks de uma sentença: `(tipo, índice inicial, índice final exclusivo)`.
    pub fn chunk(&self, words: &[(&str, &str)]) -> Vec<(String, usize, usize)> {
        let mut chunks = Vec::new();
        let mut i = 0;

        while i < words.len() {
            let (word, tag) = words[i];

            if tag == "PRP" || tag == "EX" {
                chunks.push(("NP".to_string(), i, i + 1));
                i += 1;
                continue;
            }

            if matches!(tag, "DT" | "PRP$") || is_np_modifier(tag) {
                // NP começa em determinante, adjetivo, número ou nome
                let start = i;
                let mut j = if matches!(tag, "DT" | "PRP$") { i + 1 } else { i };
                let mut last_noun = None;
                while j < words.len() && (is_np_modifier(words[j].1) || words[j].1 == "POS") {
                    if is_noun(words[j].1) || words[j].1 == "CD" {
                        last_noun = Some(j);
                    }
                    // particípio só é modificador se vier antes de um nome
                    if matches!(words[j].1, "VBN" | "VBG") && !words.get(j + 1).map(|w| is_noun(w.1)).unwrap_or(false) {
                        break;
                    }
                    j += 1;
                }
                match last_noun {
                    Some(end) => {
                        chunks.push(("NP".to_string(), start, end + 1));
                        i = end + 1;
                    }
                    None if j > start && words[start..j].iter().all(|w| w.1.starts_with("JJ")) => {
                        chunks.push(("ADJP".to_string(), start, j));
                        i = j;
                    }
                    None => {
                        // determinante isolado ("no" em "no, thanks")
                        i = start + 1;
                    }
                }
                continue;
            }

            if tag == "MD" || tag.starts_with("VB") {
                let start = i;
                let mut j = i + 1;
                while j < words.len() && (words[j].1.starts_with("VB") || (words[j].1 == "RB" && words.get(j + 1).map(|w| w.1.starts_with("VB")).unwrap_or(false))) {
                    j += 1;
                }
                chunks.push(("VP".to_string(), start, j));
                i = j;
                continue;
            }

            if tag == "IN" || tag == "TO" {
                let kind = if SUBORDINATORS.contains(&word.to_lowercase().as_str()) { "SBAR" } else { "PP" };
                chunks.push((kind.to_string(), i, i + 1));
                i += 1;
                continue;
            }

            if tag == "RB" {
                let start = i;
                let mut j = i + 1;
                while j < words.len() && words[j].1 == "RB" {
                    j += 1;
                }
                chunks.push(("ADVP".to_string(), start, j));
                i = j;
                continue;
            }

            i += 1;
        }

        chunks
    }
}

impl Annotator for Chunker {
    fn name(&self) -> &str {
        "Chunker"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        let mut new_chunks = Vec::new();

        for sentence in sentences {
            let tokens: Vec<_> = cas.tokens.covered_by(sentence).collect();
            let words: Vec<(&str, &str)> = tokens
                .iter()
                .map(|t| (cas.covered_text(t.span), t.part_of_speech.as_deref().unwrap_or("NN")))
                .collect();

            for (chunk_type, start, end) in self.chunk(&words) {
                new_chunks.push(Chunk {
                    span: Span::new(tokens[start].span.begin, tokens[end - 1].span.end),
                    chunk_type,
                });
            }
        }

        tracing::debug!("{} chunks gerados", new_chunks.len());
        for chunk in new_chunks {
            cas.chunks.add(chunk);
        }
        Ok(())
    }
}

/// Estende o primeiro chunk de cada sequência que casa com `pattern` até o fim
/// do chunk na posição `index_of_chunk_to_include`.
#[derive(Debug, Clone)]
pub struct ChunkAdjuster {
    pattern: Vec<String>,
    index_of_chunk_to_include: usize,
}

impl ChunkAdjuster {
    pub fn new(pattern: &[&str], index_of_chunk_to_include: usize) -> Result<Self> {
        if pattern.is_empty() || index_of_chunk_to_include >= pattern.len() {
            return Err(PipelineError::init(
                "ChunkAdjuster",
                format!(
                    "índice {} fora do padrão {:?}",
                    index_of_chunk_to_include, pattern
                ),
            ));
        }
        Ok(Self {
            pattern: pattern.iter().map(|s| s.to_string()).collect(),
            index_of_chunk_to_include,
        })
    }

    /// Aplica o ajuste sobre uma lista de chunks de uma sentença, em ordem.
    pub fn adjust(&self, chunks: &mut [Chunk]) {
        let n = self.pattern.len();
        if chunks.len() < n {
            return;
        }
        for i in 0..=chunks.len() - n {
            let matches = self
                .pattern
                .iter()
                .zip(&chunks[i..i + n])
                .all(|(p, c)| *p == c.chunk_type);
            if matches {
                let new_end = chunks[i + self.index_of_chunk_to_include].span.end;
                if new_end > chunks[i].span.end {
                    chunks[i].span.end = new_end;
                }
            }
        }
    }
}

impl Annotator for ChunkAdjuster {
    fn name(&self) -> &str {
        "ChunkAdjuster"
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("ChunkPattern".to_string(), self.pattern.join(" ")),
            ("IndexOfTokenToInclude".to_string(), self.index_of_chunk_to_include.to_string()),
        ]
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        let mut adjusted = Vec::with_capacity(cas.chunks.len());

        for sentence in sentences {
            let mut chunks: Vec<Chunk> = cas.chunks.covered_by(sentence).cloned().collect();
            // ajusta sobre a sequência linear (sem chunks envolvidos por outros)
            chunks.sort_by_key(|c| (c.span.begin, c.span.end));
            self.adjust(&mut chunks);
            adjusted.extend(chunks);
        }

        cas.chunks.replace_all(adjusted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(span: (usize, usize), t: &str) -> Chunk {
        Chunk {
            span: Span::new(span.0, span.1),
            chunk_type: t.to_string(),
        }
    }

    #[test]
    fn test_chunk_patterns() {
        let words = [
            ("He", "PRP"),
            ("has", "VBZ"),
            ("a", "DT"),
            ("history", "NN"),
            ("of", "IN"),
            ("chronic", "JJ"),
            ("hypertension", "NN"),
            (".", "."),
        ];
        let chunks = Chunker.chunk(&words);
        let types: Vec<(&str, usize, usize)> = chunks.iter().map(|(t, s, e)| (t.as_str(), *s, *e)).collect();
        assert_eq!(
            types,
            vec![("NP", 0, 1), ("VP", 1, 2), ("NP", 2, 4), ("PP", 4, 5), ("NP", 5, 7)]
        );
    }

    #[test]
    fn test_modal_verb_and_subordinator() {
        let words = [("should", "MD"), ("return", "VB"), ("if", "IN"), ("fever", "NN"), ("develops", "VBZ")];
        let chunks = Chunker.chunk(&words);
        assert_eq!(chunks[0], ("VP".to_string(), 0, 2));
        assert_eq!(chunks[1], ("SBAR".to_string(), 2, 3));
        assert_eq!(chunks[2], ("NP".to_string(), 3, 4));
    }

    #[test]
    fn test_adjective_phrase() {
        let chunks = Chunker.chunk(&[("is", "VBZ"), ("negative", "JJ"), (".", ".")]);
        assert_eq!(chunks[1], ("ADJP".to_string(), 1, 2));
    }

    #[test]
    fn test_adjuster_np_pp_np() {
        let adjuster = ChunkAdjuster::new(&["NP", "PP", "NP"], 2).unwrap();
        let mut chunks = vec![chunk((0, 9), "NP"), chunk((10, 12), "PP"), chunk((13, 25), "NP")];
        adjuster.adjust(&mut chunks);
        assert_eq!(chunks[0].span, Span::new(0, 25));
        assert_eq!(chunks[2].span, Span::new(13, 25));
    }

    #[test]
    fn test_adjuster_np_np_chains() {
        let adjuster = ChunkAdjuster::new(&["NP", "NP"], 1).unwrap();
        let mut chunks = vec![chunk((0, 3), "NP"), chunk((4, 8), "NP"), chunk((9, 12), "NP")];
        adjuster.adjust(&mut chunks);
        assert_eq!(chunks[0].span, Span::new(0, 8));
        assert_eq!(chunks[1].span, Span::new(4, 12));
    }

    #[test]
    fn test_adjuster_rejects_bad_index() {
        assert!(ChunkAdjuster::new(&["NP", "NP"], 2).is_err());
    }
}
