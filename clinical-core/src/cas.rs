//! # CAS — Documento e Índice de Anotações
//!
//! O `Cas` (Common Analysis Structure) guarda o texto do documento e um índice
//! tipado para cada tipo de anotação produzido pelo pipeline. Os anotadores
//! leem anotações de estágios anteriores e adicionam as suas.
//!
//! ## Ordem do Índice
//!
//! Todo índice é mantido na ordem canônica de anotações:
//! - `begin` crescente;
//! - em empate, `end` **decrescente** (o span que envolve vem antes dos envolvidos).
//!
//! Essa ordem é a que os anotadores de janelas de busca assumem: ao percorrer
//! as janelas, uma janela só pode estar contida na sua predecessora imediata.

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

/// Valores de atributos de entidades, compatíveis com o sistema de tipos clínico.
pub mod constants {
    /// Entidade afirmada (não negada).
    pub const NE_POLARITY_NEGATION_ABSENT: i32 = 1;
    /// Entidade negada ("nega dor torácica").
    pub const NE_POLARITY_NEGATION_PRESENT: i32 = -1;
    pub const NE_UNCERTAINTY_PRESENT: i32 = 1;
    pub const NE_UNCERTAINTY_ABSENT: i32 = 0;
    pub const NE_HISTORY_OF_PRESENT: i32 = 1;
    pub const NE_HISTORY_OF_ABSENT: i32 = 0;
    pub const NE_GENERIC_TRUE: bool = true;
    pub const NE_CONDITIONAL_TRUE: bool = true;

    pub const ATTR_SUBJECT_PATIENT: &str = "patient";
    pub const ATTR_SUBJECT_FAMILY_MEMBER: &str = "family_member";
    pub const ATTR_SUBJECT_DONOR_FAMILY_MEMBER: &str = "donor_family_member";
    pub const ATTR_SUBJECT_DONOR_OTHER: &str = "donor_other";
    pub const ATTR_SUBJECT_OTHER: &str = "other";

    /// Identificadores numéricos de grupo semântico (`typeID`).
    pub const NE_TYPE_ID_UNKNOWN: u8 = 0;
    pub const NE_TYPE_ID_DRUG: u8 = 1;
    pub const NE_TYPE_ID_DISORDER: u8 = 2;
    pub const NE_TYPE_ID_FINDING: u8 = 3;
    pub const NE_TYPE_ID_PROCEDURE: u8 = 5;
    pub const NE_TYPE_ID_ANATOMICAL_SITE: u8 = 6;
}

/// Intervalo de bytes `[begin, end)` no texto do documento.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.begin
    }

    /// `true` se `other` está inteiramente dentro deste span (bordas inclusivas).
    pub fn encloses(&self, other: &Span) -> bool {
        self.begin <= other.begin && self.end >= other.end
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.begin < other.end && other.begin < self.end
    }

    /// Chave de ordenação canônica do índice.
    pub fn index_key(&self) -> (usize, Reverse<usize>) {
        (self.begin, Reverse(self.end))
    }
}

/// Qualquer anotação com posição no texto.
pub trait Annotation {
    fn span(&self) -> Span;

    fn begin(&self) -> usize {
        self.span().begin
    }

    fn end(&self) -> usize {
        self.span().end
    }
}

impl Annotation for Span {
    fn span(&self) -> Span {
        *self
    }
}

/// Índice ordenado de anotações de um único tipo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationIndex<T> {
    items: Vec<T>,
}

impl<T> Default for AnnotationIndex<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Annotation> AnnotationIndex<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insere mantendo a ordem canônica. Anotações com a mesma chave ficam
    /// na ordem de inserção.
    pub fn add(&mut self, item: T) -> usize {
        let key = item.span().index_key();
        let pos = self.items.partition_point(|a| a.span().index_key() <= key);
        self.items.insert(pos, item);
        pos
    }

    pub fn remove(&mut self, pos: usize) -> T {
        self.items.remove(pos)
    }

    pub fn retain(&mut self, f: impl FnMut(&T) -> bool) {
        self.items.retain(f);
    }

    /// Substitui todo o conteúdo (reordenando).
    pub fn replace_all(&mut self, items: Vec<T>) {
        self.items = items;
        self.items.sort_by_key(|a| a.span().index_key());
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, pos: usize) -> Option<&T> {
        self.items.get(pos)
    }

    pub fn get_mut(&mut self, pos: usize) -> Option<&mut T> {
        self.items.get_mut(pos)
    }

    /// Anotações inteiramente cobertas por `span` (equivalente a `selectCovered`).
    pub fn covered_by(&self, span: Span) -> impl Iterator<Item = &T> {
        let start = self.items.partition_point(|a| a.begin() < span.begin);
        self.items[start..]
            .iter()
            .take_while(move |a| a.begin() < span.end)
            .filter(move |a| a.end() <= span.end)
    }

    /// Posições (no índice) das anotações cobertas por `span`.
    pub fn positions_covered_by(&self, span: Span) -> Vec<usize> {
        let start = self.items.partition_point(|a| a.begin() < span.begin);
        (start..self.items.len())
            .take_while(|&i| self.items[i].begin() < span.end)
            .filter(|&i| self.items[i].end() <= span.end)
            .collect()
    }
}

impl<'a, T> IntoIterator for &'a AnnotationIndex<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

macro_rules! impl_annotation {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Annotation for $ty {
                fn span(&self) -> Span {
                    self.span
                }
            }
        )*
    };
}

/// Segmento (seção) do documento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub span: Span,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub span: Span,
    pub sentence_number: usize,
}

/// Classe ortográfica do token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Word,
    Number,
    Punctuation,
    Symbol,
    Contraction,
}

impl TokenKind {
    /// Nome do tipo correspondente na serialização XMI.
    pub fn type_name(&self) -> &'static str {
        match self {
            TokenKind::Word => "WordToken",
            TokenKind::Number => "NumToken",
            TokenKind::Punctuation => "PunctuationToken",
            TokenKind::Symbol => "SymbolToken",
            TokenKind::Contraction => "ContractionToken",
        }
    }
}

/// Token base: a unidade mínima sobre a qual POS, chunks e dicionário operam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseToken {
    pub span: Span,
    pub token_number: usize,
    pub kind: TokenKind,
    /// Tag Penn Treebank atribuída pelo `PosTagger`.
    pub part_of_speech: Option<String>,
    /// Forma canônica (minúscula e lematizada) atribuída pelo `LvgAnnotator`.
    pub canonical_form: Option<String>,
}

/// Tipos de token contextual (sequências que só fazem sentido juntas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Date,
    Time,
    Measurement,
    Fraction,
    Range,
}

impl ContextKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextKind::Date => "DateAnnotation",
            ContextKind::Time => "TimeAnnotation",
            ContextKind::Measurement => "MeasurementAnnotation",
            ContextKind::Fraction => "FractionAnnotation",
            ContextKind::Range => "RangeAnnotation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextAnnotation {
    pub span: Span,
    pub kind: ContextKind,
}

/// Chunk sintático raso (NP, VP, PP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub span: Span,
    pub chunk_type: String,
}

/// Janela de texto sobre a qual a busca no dicionário é feita.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupWindow {
    pub span: Span,
}

/// Nó da árvore de constituintes. `id` é único no documento; `parent` e
/// `children` referenciam ids de outros nós.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreebankNode {
    pub span: Span,
    pub id: usize,
    pub node_type: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Palavra do texto, apenas para nós folha.
    pub word: Option<String>,
}

impl TreebankNode {
    pub fn is_leaf(&self) -> bool {
        self.word.is_some()
    }
}

/// Nó de dependência em formato CoNLL: `id` e `head` contam a partir de 1
/// dentro da sentença e `head == 0` indica a raiz.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub span: Span,
    pub id: usize,
    pub form: String,
    pub postag: String,
    pub head: usize,
    pub deprel: String,
}

/// Grupo semântico de uma entidade reconhecida.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SemanticGroup {
    Medication,
    DiseaseDisorder,
    SignSymptom,
    Procedure,
    AnatomicalSite,
}

impl SemanticGroup {
    /// Grupo a partir do TUI (tipo semântico).
    pub fn from_tui(tui: &str) -> Option<Self> {
        let group = match tui {
            "T109" | "T110" | "T114" | "T115" | "T116" | "T118" | "T119" | "T121" | "T122"
            | "T123" | "T124" | "T125" | "T126" | "T127" | "T129" | "T130" | "T131" | "T195"
            | "T196" | "T197" | "T200" | "T203" => SemanticGroup::Medication,
            "T019" | "T020" | "T037" | "T046" | "T047" | "T048" | "T049" | "T050" | "T190"
            | "T191" => SemanticGroup::DiseaseDisorder,
            "T033" | "T040" | "T041" | "T042" | "T043" | "T044" | "T045" | "T056" | "T057"
            | "T184" => SemanticGroup::SignSymptom,
            "T059" | "T060" | "T061" => SemanticGroup::Procedure,
            "T021" | "T022" | "T023" | "T024" | "T025" | "T026" | "T029" | "T030" => {
                SemanticGroup::AnatomicalSite
            }
            _ => return None,
        };
        Some(group)
    }

    pub fn type_id(&self) -> u8 {
        match self {
            SemanticGroup::Medication => constants::NE_TYPE_ID_DRUG,
            SemanticGroup::DiseaseDisorder => constants::NE_TYPE_ID_DISORDER,
            SemanticGroup::SignSymptom => constants::NE_TYPE_ID_FINDING,
            SemanticGroup::Procedure => constants::NE_TYPE_ID_PROCEDURE,
            SemanticGroup::AnatomicalSite => constants::NE_TYPE_ID_ANATOMICAL_SITE,
        }
    }

    /// Nome do tipo de menção na serialização XMI.
    pub fn mention_type(&self) -> &'static str {
        match self {
            SemanticGroup::Medication => "MedicationMention",
            SemanticGroup::DiseaseDisorder => "DiseaseDisorderMention",
            SemanticGroup::SignSymptom => "SignSymptomMention",
            SemanticGroup::Procedure => "ProcedureMention",
            SemanticGroup::AnatomicalSite => "AnatomicalSiteMention",
        }
    }
}

/// Conceito de ontologia ligado a uma entidade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UmlsConcept {
    pub cui: String,
    pub tui: Option<String>,
    pub preferred_text: String,
    pub coding_scheme: String,
}

impl UmlsConcept {
    /// Código exibido: `CUI` ou `CUI_TUI` quando há tipo semântico.
    pub fn code(&self) -> String {
        match self.tui.as_deref() {
            Some(tui) if !tui.is_empty() => format!("{}_{}", self.cui, tui),
            _ => self.cui.clone(),
        }
    }
}

/// Entidade reconhecida no texto, com os atributos de asserção.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifiedAnnotation {
    pub span: Span,
    pub covered_text: String,
    pub group: SemanticGroup,
    pub discovery_technique: String,
    pub confidence: f32,
    pub polarity: i32,
    pub uncertainty: i32,
    pub conditional: bool,
    pub generic: bool,
    pub subject: Option<String>,
    pub history_of: i32,
    pub concepts: Vec<UmlsConcept>,
}

impl IdentifiedAnnotation {
    /// Entidade recém-criada: afirmada, certa, do próprio paciente.
    pub fn new(span: Span, covered_text: impl Into<String>, group: SemanticGroup) -> Self {
        Self {
            span,
            covered_text: covered_text.into(),
            group,
            discovery_technique: "dictionary_lookup".to_string(),
            confidence: 1.0,
            polarity: constants::NE_POLARITY_NEGATION_ABSENT,
            uncertainty: constants::NE_UNCERTAINTY_ABSENT,
            conditional: false,
            generic: false,
            subject: None,
            history_of: constants::NE_HISTORY_OF_ABSENT,
            concepts: Vec::new(),
        }
    }

    /// Lista de códigos (`CUI` ou `CUI_TUI`) na ordem dos conceitos.
    pub fn codes(&self) -> Vec<String> {
        self.concepts.iter().map(UmlsConcept::code).collect()
    }
}

impl_annotation!(
    Segment,
    Sentence,
    BaseToken,
    ContextAnnotation,
    Chunk,
    LookupWindow,
    TreebankNode,
    DependencyNode,
    IdentifiedAnnotation,
);

/// O documento e todas as suas anotações.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cas {
    text: String,
    pub segments: AnnotationIndex<Segment>,
    pub sentences: AnnotationIndex<Sentence>,
    pub tokens: AnnotationIndex<BaseToken>,
    pub context_annotations: AnnotationIndex<ContextAnnotation>,
    pub chunks: AnnotationIndex<Chunk>,
    pub lookup_windows: AnnotationIndex<LookupWindow>,
    pub treebank_nodes: AnnotationIndex<TreebankNode>,
    pub dependency_nodes: AnnotationIndex<DependencyNode>,
    pub entities: AnnotationIndex<IdentifiedAnnotation>,
}

impl Cas {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Substitui o texto e descarta todas as anotações existentes.
    pub fn set_document_text(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    /// Texto coberto por `span`. Spans inválidos resultam em string vazia.
    pub fn covered_text(&self, span: Span) -> &str {
        self.text.get(span.begin..span.end).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_orders_enclosing_first() {
        let mut idx: AnnotationIndex<Span> = AnnotationIndex::new();
        idx.add(Span::new(2, 5));
        idx.add(Span::new(0, 3));
        idx.add(Span::new(0, 10));
        let spans: Vec<Span> = idx.iter().copied().collect();
        assert_eq!(
            spans,
            vec![Span::new(0, 10), Span::new(0, 3), Span::new(2, 5)]
        );
    }

    #[test]
    fn test_covered_by() {
        let mut idx: AnnotationIndex<Span> = AnnotationIndex::new();
        for (b, e) in [(0, 4), (5, 9), (8, 12), (13, 20)] {
            idx.add(Span::new(b, e));
        }
        let covered: Vec<Span> = idx.covered_by(Span::new(0, 12)).copied().collect();
        assert_eq!(
            covered,
            vec![Span::new(0, 4), Span::new(5, 9), Span::new(8, 12)]
        );
        assert_eq!(idx.positions_covered_by(Span::new(5, 10)), vec![1]);
    }

    #[test]
    fn test_concept_code_with_and_without_tui() {
        let with_tui = UmlsConcept {
            cui: "C0008031".into(),
            tui: Some("T184".into()),
            preferred_text: "Chest Pain".into(),
            coding_scheme: "SNOMEDCT_US".into(),
        };
        let without_tui = UmlsConcept { tui: Some(String::new()), ..with_tui.clone() };
        assert_eq!(with_tui.code(), "C0008031_T184");
        assert_eq!(without_tui.code(), "C0008031");
    }

    #[test]
    fn test_semantic_group_from_tui() {
        assert_eq!(SemanticGroup::from_tui("T184"), Some(SemanticGroup::SignSymptom));
        assert_eq!(SemanticGroup::from_tui("T047"), Some(SemanticGroup::DiseaseDisorder));
        assert_eq!(SemanticGroup::from_tui("T121"), Some(SemanticGroup::Medication));
        assert_eq!(SemanticGroup::from_tui("T999"), None);
    }
}
