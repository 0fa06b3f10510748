//! # Tokens Dependentes de Contexto
//!
//! Algumas unidades só fazem sentido como sequência de tokens: datas
//! (`03/14/2021`), horários (`10:30 am`), medidas (`81 mg`), frações (`120/80`)
//! e intervalos (`2-3`). Este estágio as reconhece com expressões regulares
//! dentro de cada sentença.
//!
//! Os padrões são aplicados em ordem de prioridade; um trecho já anotado não
//! pode ser reivindicado por um padrão posterior (uma data não vira fração).

use regex::Regex;

use crate::cas::{Cas, ContextAnnotation, ContextKind, Span};
use crate::engine::Annotator;
use crate::error::{PipelineError, Result};

const MONTHS: &str = r"(?:Jan(?:uary)?|Feb(?:ruary)?|Mar(?:ch)?|Apr(?:il)?|May|June?|July?|Aug(?:ust)?|Sep(?:t(?:ember)?)?|Oct(?:ober)?|Nov(?:ember)?|Dec(?:ember)?)";

pub struct ContextDependentTokenizer {
    patterns: Vec<(ContextKind, Regex)>,
}

impl ContextDependentTokenizer {
    pub fn new() -> Result<Self> {
        let specs = [
            (ContextKind::Date, r"\b\d{1,2}/\d{1,2}/\d{2,4}\b".to_string()),
            (ContextKind::Date, r"\b\d{4}-\d{2}-\d{2}\b".to_string()),
            (ContextKind::Date, format!(r"\b{MONTHS}\.?\s+\d{{1,2}}(?:,?\s+\d{{4}})?\b")),
            (ContextKind::Time, r"(?i)\b\d{1,2}:\d{2}(?:\s*[ap]\.?m\b\.?)?".to_string()),
            (
                ContextKind::Measurement,
                r"(?i)\b\d+(?:\.\d+)?\s*(?:mcg|mg|kg|g|ml|cc|l|cm|mm|units?|mmhg|bpm|meq)\b".to_string(),
            ),
            (ContextKind::Range, r"\b\d+(?:\.\d+)?\s*(?:-|to)\s*\d+(?:\.\d+)?\b".to_string()),
            (ContextKind::Fraction, r"\b\d+/\d+\b".to_string()),
        ];

        let mut patterns = Vec::with_capacity(specs.len());
        for (kind, pattern) in specs {
            let re = Regex::new(&pattern)
                .map_err(|e| PipelineError::init("ContextDependentTokenizer", e.to_string()))?;
            patterns.push((kind, re));
        }
        Ok(Self { patterns })
    }

    /// Reconhece as unidades de `text`; offsets relativos a `text`.
    pub fn find(&self, text: &str) -> Vec<(ContextKind, Span)> {
        let mut found: Vec<(ContextKind, Span)> = Vec::new();
        for (kind, re) in &self.patterns {
            for m in re.find_iter(text) {
                let span = Span::new(m.start(), m.end());
                if found.iter().any(|(_, s)| s.overlaps(&span)) {
                    continue;
                }
                found.push((*kind, span));
            }
        }
        found.sort_by_key(|(_, s)| s.index_key());
        found
    }
}

impl Annotator for ContextDependentTokenizer {
    fn name(&self) -> &str {
        "ContextDependentTokenizerAnnotator"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        for sentence in sentences {
            let found = self.find(cas.covered_text(sentence));
            for (kind, span) in found {
                cas.context_annotations.add(ContextAnnotation {
                    span: Span::new(sentence.begin + span.begin, sentence.begin + span.end),
                    kind,
                });
            }
        }
        Ok(())
    }
}
