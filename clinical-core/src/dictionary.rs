//! # Busca em Dicionário
//!
//! Reconhece menções clínicas comparando o texto de cada janela com um
//! dicionário de termos `CUI|TUI|termo` (formato BSV, uma entrada por linha).
//!
//! ## Casamento
//!
//! - Autômato Aho-Corasick sobre todos os termos, insensível a caixa (ASCII).
//! - Só valem casamentos alinhados a tokens: o início coincide com o início de
//!   um token e o fim com o fim de um token ("pain" não casa em "painful").
//! - Em cada posição fica o termo mais longo; casamentos sobrepostos a um já
//!   aceito são descartados ("chest pain" vence "chest" e "pain").
//!
//! O grupo semântico da entidade vem do TUI do conceito. Conceitos do mesmo
//! grupo no mesmo span são reunidos numa única entidade.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use aho_corasick::{AhoCorasick, MatchKind};
use tracing::{debug, info, warn};

use crate::cas::{Cas, IdentifiedAnnotation, SemanticGroup, Span, UmlsConcept};
use crate::engine::Annotator;
use crate::error::{PipelineError, Result};

/// Dicionário embutido no binário.
pub const BUNDLED_DICTIONARY: &str = include_str!("../resources/dictionary.bsv");

/// Esquema de codificação atribuído aos conceitos do dicionário.
pub const CODING_SCHEME: &str = "UMLS";

/// Termos e conceitos indexados para busca.
pub struct Dictionary {
    automaton: AhoCorasick,
    /// Índice do padrão → conceitos associados ao termo.
    concepts: Vec<Vec<UmlsConcept>>,
    source: String,
}

impl Dictionary {
    /// Constrói a partir de conteúdo BSV. Termos com menos de `min_term_length`
    /// caracteres são ignorados.
    pub fn from_bsv(content: &str, min_term_length: usize, source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let mut term_index: HashMap<String, usize> = HashMap::new();
        let mut terms: Vec<String> = Vec::new();
        let mut concepts: Vec<Vec<UmlsConcept>> = Vec::new();
        let mut preferred: HashMap<String, String> = HashMap::new();

        for (n, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split('|').map(str::trim).collect();
            if fields.len() < 3 || fields[0].is_empty() || fields[2].is_empty() {
                return Err(PipelineError::init(
                    "DictionaryLookup",
                    format!("{}: linha {} inválida: '{}'", source, n + 1, line),
                ));
            }
            let (cui, tui, term) = (fields[0], fields[1], fields[2]);
            if term.chars().count() < min_term_length {
                continue;
            }

            let preferred_text = preferred
                .entry(cui.to_string())
                .or_insert_with(|| term.to_string())
                .clone();
            let concept = UmlsConcept {
                cui: cui.to_string(),
                tui: (!tui.is_empty()).then(|| tui.to_string()),
                preferred_text,
                coding_scheme: CODING_SCHEME.to_string(),
            };

            let key = term.to_ascii_lowercase();
            let idx = *term_index.entry(key.clone()).or_insert_with(|| {
                terms.push(key);
                concepts.push(Vec::new());
                terms.len() - 1
            });
            if !concepts[idx].contains(&concept) {
                concepts[idx].push(concept);
            }
        }

        // Standard é o único modo que permite iterar casamentos sobrepostos
        let automaton = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(&terms)
            .map_err(|e| PipelineError::init("DictionaryLookup", e.to_string()))?;

        info!("dicionário '{}' carregado: {} termos", source, terms.len());
        Ok(Self {
            automaton,
            concepts,
            source,
        })
    }

    /// Dicionário embutido.
    pub fn bundled(min_term_length: usize) -> Result<Self> {
        Self::from_bsv(BUNDLED_DICTIONARY, min_term_length, "embutido")
    }

    /// Carrega um arquivo BSV. Arquivo ausente é erro de inicialização.
    pub fn load(path: &Path, min_term_length: usize) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::init(
                "DictionaryLookup",
                format!("não foi possível ler {}: {}", path.display(), e),
            )
        })?;
        Self::from_bsv(&content, min_term_length, path.display().to_string())
    }

    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Todos os casamentos (inclusive sobrepostos) em `text`, com offsets relativos.
    pub fn candidates(&self, text: &str) -> Vec<(Span, usize)> {
        self.automaton
            .find_overlapping_iter(text)
            .map(|m| (Span::new(m.start(), m.end()), m.pattern().as_usize()))
            .collect()
    }

    pub fn concepts(&self, pattern: usize) -> &[UmlsConcept] {
        self.concepts.get(pattern).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Escolhe, entre os candidatos, os casamentos alinhados a tokens: o mais longo
/// em cada início, sem sobreposição, da esquerda para a direita.
pub fn select_aligned(
    mut candidates: Vec<(Span, usize)>,
    token_begins: &HashSet<usize>,
    token_ends: &HashSet<usize>,
) -> Vec<(Span, usize)> {
    candidates.retain(|(s, _)| token_begins.contains(&s.begin) && token_ends.contains(&s.end));
    candidates.sort_by_key(|(s, _)| s.index_key());

    let mut selected: Vec<(Span, usize)> = Vec::new();
    for (span, pattern) in candidates {
        if selected.last().map(|(last, _)| last.overlaps(&span)).unwrap_or(false) {
            continue;
        }
        selected.push((span, pattern));
    }
    selected
}

/// Quais janelas delimitam a busca.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupWindowKind {
    /// Janelas de busca (NPs ajustados).
    LookupWindows,
    /// Sentenças inteiras.
    Sentences,
}

impl LookupWindowKind {
    fn type_name(&self) -> &'static str {
        match self {
            LookupWindowKind::LookupWindows => "LookupWindowAnnotation",
            LookupWindowKind::Sentences => "Sentence",
        }
    }
}

/// Anotador de busca em dicionário.
pub struct DictionaryLookup {
    dictionary: Arc<Dictionary>,
    window: LookupWindowKind,
}

impl DictionaryLookup {
    pub fn new(dictionary: Arc<Dictionary>, window: LookupWindowKind) -> Self {
        Self { dictionary, window }
    }
}

impl Annotator for DictionaryLookup {
    fn name(&self) -> &str {
        "DictionaryLookupAnnotator"
    }

    fn parameters(&self) -> Vec<(String, String)> {
        vec![
            ("windowAnnotations".to_string(), self.window.type_name().to_string()),
            ("dictionary".to_string(), self.dictionary.source().to_string()),
        ]
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let windows: Vec<Span> = match self.window {
            LookupWindowKind::LookupWindows => cas.lookup_windows.iter().map(|w| w.span).collect(),
            LookupWindowKind::Sentences => cas.sentences.iter().map(|s| s.span).collect(),
        };
        if windows.is_empty() {
            warn!("nenhuma janela de busca ({})", self.window.type_name());
        }

        let token_begins: HashSet<usize> = cas.tokens.iter().map(|t| t.span.begin).collect();
        let token_ends: HashSet<usize> = cas.tokens.iter().map(|t| t.span.end).collect();
        let mut seen: HashSet<(Span, SemanticGroup)> =
            cas.entities.iter().map(|e| (e.span, e.group)).collect();
        let mut found = Vec::new();

        for window in windows {
            let text = cas.covered_text(window);
            let candidates = self
                .dictionary
                .candidates(text)
                .into_iter()
                .map(|(s, p)| (Span::new(window.begin + s.begin, window.begin + s.end), p))
                .collect();

            for (span, pattern) in select_aligned(candidates, &token_begins, &token_ends) {
                let mut by_group: Vec<(SemanticGroup, Vec<UmlsConcept>)> = Vec::new();
                for concept in self.dictionary.concepts(pattern) {
                    let Some(group) = concept.tui.as_deref().and_then(SemanticGroup::from_tui) else {
                        debug!("conceito {} sem grupo semântico conhecido", concept.cui);
                        continue;
                    };
                    match by_group.iter_mut().find(|(g, _)| *g == group) {
                        Some((_, list)) => list.push(concept.clone()),
                        None => by_group.push((group, vec![concept.clone()])),
                    }
                }

                for (group, concepts) in by_group {
                    if !seen.insert((span, group)) {
                        continue;
                    }
                    let mut entity = IdentifiedAnnotation::new(span, cas.covered_text(span), group);
                    entity.concepts = concepts;
                    found.push(entity);
                }
            }
        }

        debug!("{} entidades encontradas no dicionário", found.len());
        for entity in found {
            cas.entities.add(entity);
        }
        Ok(())
    }
}
