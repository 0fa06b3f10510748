//! # Segmentos e Sentenças
//!
//! Os dois primeiros estágios de todo pipeline:
//!
//! 1. [`SimpleSegmentAnnotator`]: o documento inteiro vira um único segmento.
//! 2. [`SentenceDetector`]: cada segmento é dividido em sentenças.
//!
//! Notas clínicas são fortemente orientadas a linhas (listas de medicamentos,
//! sinais vitais, cabeçalhos de seção), então toda quebra de linha encerra uma
//! sentença. Dentro de cada linha usamos as fronteiras de sentença do Unicode
//! (UAX #29), desfazendo as quebras que caem logo após uma abreviação ("Dr. Smith").

use unicode_segmentation::UnicodeSegmentation;

use crate::cas::{Cas, Segment, Sentence, Span};
use crate::engine::Annotator;
use crate::error::Result;
use crate::tokenizer::ABBREVIATIONS;

pub const SIMPLE_SEGMENT_ID: &str = "SIMPLE_SEGMENT";

/// Cria um segmento cobrindo todo o texto.
#[derive(Debug, Clone)]
pub struct SimpleSegmentAnnotator {
    segment_id: String,
}

impl SimpleSegmentAnnotator {
    pub fn new() -> Self {
        Self {
            segment_id: SIMPLE_SEGMENT_ID.to_string(),
        }
    }

    pub fn with_segment_id(segment_id: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
        }
    }
}

impl Default for SimpleSegmentAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl Annotator for SimpleSegmentAnnotator {
    fn name(&self) -> &str {
        "SimpleSegmentAnnotator"
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![("SegmentID".to_string(), self.segment_id.clone())]
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let span = Span::new(0, cas.text().len());
        cas.segments.add(Segment {
            span,
            id: self.segment_id.clone(),
        });
        Ok(())
    }
}

/// Divide segmentos em sentenças.
#[derive(Debug, Clone, Default)]
pub struct SentenceDetector;

impl Annotator for SentenceDetector {
    fn name(&self) -> &str {
        "SentenceDetector"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let segments: Vec<Span> = cas.segments.iter().map(|s| s.span).collect();
        let mut number = cas.sentences.len();

        for segment in segments {
            let text = cas.covered_text(segment);
            let bounds = sentence_bounds(text);
            for (b, e) in bounds {
                cas.sentences.add(Sentence {
                    span: Span::new(segment.begin + b, segment.begin + e),
                    sentence_number: number,
                });
                number += 1;
            }
        }

        tracing::debug!("{} sentenças detectadas", cas.sentences.len());
        Ok(())
    }
}

/// Fronteiras `(begin, end)` das sentenças de `text`, sem espaços nas bordas.
pub fn sentence_bounds(text: &str) -> Vec<(usize, usize)> {
    let mut bounds = Vec::new();
    let mut line_start = 0;

    for line in text.split_inclusive('\n') {
        let mut pending: Option<(usize, usize)> = None;
        for (offset, piece) in line.split_sentence_bound_indices() {
            let Some((b, e)) = trim_bounds(piece, line_start + offset) else {
                continue;
            };
            pending = match pending {
                Some((pb, pe)) if ends_with_abbreviation(&text[pb..pe]) => Some((pb, e)),
                Some(prev) => {
                    bounds.push(prev);
                    Some((b, e))
                }
                None => Some((b, e)),
            };
        }
        if let Some(last) = pending {
            bounds.push(last);
        }
        line_start += line.len();
    }

    bounds
}

fn trim_bounds(piece: &str, offset: usize) -> Option<(usize, usize)> {
    let trimmed_start = piece.len() - piece.trim_start().len();
    let trimmed = piece.trim();
    if trimmed.is_empty() {
        return None;
    }
    let b = offset + trimmed_start;
    Some((b, b + trimmed.len()))
}

fn ends_with_abbreviation(sentence: &str) -> bool {
    let Some(stripped) = sentence.strip_suffix('.') else {
        return false;
    };
    let last_word = stripped
        .rsplit(|c: char| c.is_whitespace())
        .next()
        .unwrap_or("");
    ABBREVIATIONS.contains(&last_word)
}
