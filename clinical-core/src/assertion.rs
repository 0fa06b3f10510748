//! # Classificadores de Asserção
//!
//! Seis anotadores que preenchem os atributos de cada entidade reconhecida:
//!
//! | Anotador                 | Atributo       | Exemplo de gatilho              |
//! |--------------------------|----------------|---------------------------------|
//! | [`PolarityAnnotator`]    | `polarity`     | "denies", "no", "negative for"  |
//! | [`UncertaintyAnnotator`] | `uncertainty`  | "possible", "rule out", "?"     |
//! | [`HistoryAnnotator`]     | `history_of`   | "history of", "s/p", "PMH:"     |
//! | [`ConditionalAnnotator`] | `conditional`  | "if", "should", "in case"       |
//! | [`GenericAnnotator`]     | `generic`      | "risk of", "education about"    |
//! | [`SubjectAnnotator`]     | `subject`      | "mother", "donor", "wife"       |
//!
//! ## Escopo (estilo NegEx)
//!
//! Para cada entidade olhamos até `scope` palavras à esquerda (gatilhos
//! anteriores) e à direita (gatilhos posteriores), sem sair da sentença. Um
//! terminador de escopo ("but", "however", ";") corta o contexto. Os gatilhos
//! são sequências de tokens comparadas com a forma de superfície (minúscula)
//! ou com a forma canônica do LVG, então "denies", "denied" e "deny" casam com
//! o mesmo gatilho.
//!
//! ## Paralelismo
//!
//! Os atributos são calculados para todas as entidades em paralelo (Rayon),
//! lendo o documento sem modificá-lo, e só então escritos de volta.

use rayon::prelude::*;

use crate::cas::{constants, Cas, IdentifiedAnnotation, Span, TokenKind};
use crate::engine::Annotator;
use crate::error::Result;

/// Escopo padrão, em palavras, de cada lado da entidade.
pub const DEFAULT_SCOPE: usize = 5;

const SCOPE_BREAKERS: &[&str] = &[
    "but", "however", "although", "though", "except", "yet", "which", "who", "aside", "apart", ";",
];

/// Pontuação mantida no contexto (faz parte de gatilhos como "h/o" e "PMH:").
const CONTEXT_PUNCTUATION: &[&str] = &["/", "?", ":", ";"];

const NEGATION_PRE: &[&str] = &[
    "no", "not", "deny", "denies", "denied", "without", "negative for", "free of", "absence of",
    "never", "none", "nor", "resolved", "neither",
];
const NEGATION_POST: &[&str] = &["absent", "negative", "ruled out", "be rule out", "not seen", "resolved"];
const NEGATION_PSEUDO: &[&str] = &[
    "no increase", "no change", "not only", "not necessarily", "no significant change",
    "not cause", "without difficulty",
];

const UNCERTAINTY_PRE: &[&str] = &[
    "possible", "possibly", "probable", "probably", "likely", "suspect", "suspected",
    "suspicious for", "question of", "questionable", "rule out", "r / o", "may", "might",
    "could", "concern for", "cannot exclude", "differential", "presumed", "suggestive of",
];
const UNCERTAINTY_POST: &[&str] = &["?", "suspected", "possible", "likely", "not excluded", "vs"];

const HISTORY_PRE: &[&str] = &[
    "history of", "h / o", "hx of", "hx", "status post", "s / p", "prior", "previous",
    "previously", "past", "history :", "pmh :",
];
const HISTORY_HEADERS: &[&str] = &["history", "pmh", "psh"];

const CONDITIONAL_PRE: &[&str] = &["if", "should", "in case", "in the event", "unless", "return if", "whenever"];

const GENERIC_PRE: &[&str] = &[
    "risk of", "risk for", "education about", "educate about", "educated about", "educated on",
    "information on", "information about", "instructions for", "warning signs of", "signs of",
    "prevention of",
];

const FAMILY_MEMBERS: &[&str] = &[
    "mother", "father", "sister", "brother", "aunt", "uncle", "grandmother", "grandfather",
    "son", "daughter", "cousin", "sibling", "parent", "niece", "nephew", "family", "mom", "dad",
];
const DONOR: &[&str] = &["donor"];
const OTHER_PERSONS: &[&str] = &[
    "wife", "husband", "friend", "partner", "roommate", "boyfriend", "girlfriend", "coworker",
    "neighbor",
];

/// Palavra do contexto de uma entidade.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextToken {
    pub surface: String,
    pub canonical: String,
}

impl ContextToken {
    fn is(&self, word: &str) -> bool {
        self.surface == word || self.canonical == word
    }
}

/// Contexto de uma entidade dentro da sua sentença.
#[derive(Debug, Clone, Default)]
pub struct EntityContext {
    /// Palavras à esquerda, em ordem do texto.
    pub left: Vec<ContextToken>,
    /// Palavras à direita, em ordem do texto.
    pub right: Vec<ContextToken>,
    /// Cabeçalho de seção mais próximo (linha terminada em ':'), em minúsculas.
    pub section_header: Option<String>,
}

impl EntityContext {
    /// Extrai o contexto de `entity` limitado a `scope` palavras de cada lado.
    pub fn build(cas: &Cas, entity: &IdentifiedAnnotation, scope: usize) -> Self {
        let Some(position) = cas
            .sentences
            .iter()
            .position(|s| s.span.encloses(&entity.span))
        else {
            return Self::default();
        };
        let sentences = cas.sentences.as_slice();
        let sentence = sentences[position].span;

        let words: Vec<(Span, ContextToken)> = cas
            .tokens
            .covered_by(sentence)
            .filter(|t| {
                t.kind != TokenKind::Punctuation
                    || CONTEXT_PUNCTUATION.contains(&cas.covered_text(t.span))
            })
            .map(|t| {
                let surface = cas.covered_text(t.span).to_lowercase();
                let canonical = t.canonical_form.clone().unwrap_or_else(|| surface.clone());
                (t.span, ContextToken { surface, canonical })
            })
            .collect();

        let mut left: Vec<ContextToken> = Vec::new();
        for (_, token) in words.iter().rev().filter(|(s, _)| s.end <= entity.span.begin) {
            if left.len() >= scope || SCOPE_BREAKERS.contains(&token.surface.as_str()) {
                break;
            }
            left.push(token.clone());
        }
        left.reverse();

        let mut right: Vec<ContextToken> = Vec::new();
        for (_, token) in words.iter().filter(|(s, _)| s.begin >= entity.span.end) {
            if right.len() >= scope || SCOPE_BREAKERS.contains(&token.surface.as_str()) {
                break;
            }
            right.push(token.clone());
        }

        let section_header = sentences[..position]
            .iter()
            .rev()
            .map(|s| cas.covered_text(s.span))
            .find(|text| text.trim_end().ends_with(':'))
            .map(str::to_lowercase);

        Self {
            left,
            right,
            section_header,
        }
    }

    pub fn left_has(&self, triggers: &[&str], pseudo: &[&str]) -> bool {
        contains_trigger(&self.left, triggers, pseudo)
    }

    pub fn right_has(&self, triggers: &[&str]) -> bool {
        contains_trigger(&self.right, triggers, &[])
    }

    /// Alguma palavra de `words` aparece em qualquer lado do contexto?
    pub fn mentions_any(&self, words: &[&str]) -> bool {
        self.left
            .iter()
            .chain(&self.right)
            .any(|t| words.iter().any(|w| t.is(w)))
    }
}

/// Procura qualquer gatilho (sequência de palavras separadas por espaço) em
/// `tokens`. Posições onde um pseudo-gatilho casa são ignoradas.
fn contains_trigger(tokens: &[ContextToken], triggers: &[&str], pseudo: &[&str]) -> bool {
    let matches_at = |trigger: &str, at: usize| {
        let words: Vec<&str> = trigger.split_whitespace().collect();
        at + words.len() <= tokens.len()
            && words.iter().enumerate().all(|(k, w)| tokens[at + k].is(w))
    };

    (0..tokens.len()).any(|at| {
        !pseudo.iter().any(|p| matches_at(p, at)) && triggers.iter().any(|t| matches_at(t, at))
    })
}

/// Regra de classificação de um atributo.
trait AssertionRule: Sync {
    type Value: Send;

    fn classify(&self, context: &EntityContext) -> Self::Value;

    fn apply(entity: &mut IdentifiedAnnotation, value: Self::Value);
}

/// Calcula o atributo de todas as entidades em paralelo e o escreve de volta.
fn annotate<R: AssertionRule>(rule: &R, cas: &mut Cas, scope: usize) {
    let snapshot: &Cas = cas;
    let values: Vec<R::Value> = snapshot
        .entities
        .as_slice()
        .par_iter()
        .map(|entity| rule.classify(&EntityContext::build(snapshot, entity, scope)))
        .collect();

    for (entity, value) in cas.entities.iter_mut().zip(values) {
        R::apply(entity, value);
    }
}

macro_rules! assertion_annotator {
    ($(#[$doc:meta])* $ty:ident, $name:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $ty {
            scope: usize,
        }

        impl $ty {
            pub fn new(scope: usize) -> Self {
                Self { scope }
            }
        }

        impl Default for $ty {
            fn default() -> Self {
                Self::new(DEFAULT_SCOPE)
            }
        }

        impl Annotator for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn parameters(&self) -> Vec<(String, String)> {
                vec![("scope".to_string(), self.scope.to_string())]
            }

            fn process(&self, cas: &mut Cas) -> Result<()> {
                annotate(self, cas, self.scope);
                Ok(())
            }
        }
    };
}

assertion_annotator!(
    /// Negação: `polarity = -1` quando há gatilho de negação no escopo.
    PolarityAnnotator,
    "PolarityCleartkAnalysisEngine"
);
assertion_annotator!(
    /// Incerteza (hedging).
    UncertaintyAnnotator,
    "UncertaintyCleartkAnalysisEngine"
);
assertion_annotator!(
    /// Menção a condição pregressa.
    HistoryAnnotator,
    "HistoryCleartkAnalysisEngine"
);
assertion_annotator!(
    /// Menção condicional ("return if fever develops").
    ConditionalAnnotator,
    "ConditionalCleartkAnalysisEngine"
);
assertion_annotator!(
    /// Menção genérica, não ligada a um evento concreto.
    GenericAnnotator,
    "GenericCleartkAnalysisEngine"
);
assertion_annotator!(
    /// Sujeito da menção (paciente, familiar, doador, outro).
    SubjectAnnotator,
    "SubjectCleartkAnalysisEngine"
);

impl AssertionRule for PolarityAnnotator {
    type Value = i32;

    fn classify(&self, context: &EntityContext) -> i32 {
        if context.left_has(NEGATION_PRE, NEGATION_PSEUDO) || context.right_has(NEGATION_POST) {
            constants::NE_POLARITY_NEGATION_PRESENT
        } else {
            constants::NE_POLARITY_NEGATION_ABSENT
        }
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: i32) {
        entity.polarity = value;
    }
}

impl AssertionRule for UncertaintyAnnotator {
    type Value = i32;

    fn classify(&self, context: &EntityContext) -> i32 {
        if context.left_has(UNCERTAINTY_PRE, &[]) || context.right_has(UNCERTAINTY_POST) {
            constants::NE_UNCERTAINTY_PRESENT
        } else {
            constants::NE_UNCERTAINTY_ABSENT
        }
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: i32) {
        entity.uncertainty = value;
    }
}

impl AssertionRule for HistoryAnnotator {
    type Value = i32;

    fn classify(&self, context: &EntityContext) -> i32 {
        let in_history_section = context.section_header.as_deref().is_some_and(|h| {
            HISTORY_HEADERS.iter().any(|w| h.contains(w)) && !h.contains("present illness")
        });
        if in_history_section || context.left_has(HISTORY_PRE, &[]) {
            constants::NE_HISTORY_OF_PRESENT
        } else {
            constants::NE_HISTORY_OF_ABSENT
        }
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: i32) {
        entity.history_of = value;
    }
}

impl AssertionRule for ConditionalAnnotator {
    type Value = bool;

    fn classify(&self, context: &EntityContext) -> bool {
        context.left_has(CONDITIONAL_PRE, &[])
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: bool) {
        entity.conditional = value;
    }
}

impl AssertionRule for GenericAnnotator {
    type Value = bool;

    fn classify(&self, context: &EntityContext) -> bool {
        context.left_has(GENERIC_PRE, &[])
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: bool) {
        entity.generic = value;
    }
}

impl AssertionRule for SubjectAnnotator {
    type Value = &'static str;

    fn classify(&self, context: &EntityContext) -> &'static str {
        let family_section = context
            .section_header
            .as_deref()
            .is_some_and(|h| h.contains("family"));
        let family = family_section || context.mentions_any(FAMILY_MEMBERS);

        if context.mentions_any(DONOR) {
            if family {
                constants::ATTR_SUBJECT_DONOR_FAMILY_MEMBER
            } else {
                constants::ATTR_SUBJECT_DONOR_OTHER
            }
        } else if family {
            constants::ATTR_SUBJECT_FAMILY_MEMBER
        } else if context.mentions_any(OTHER_PERSONS) {
            constants::ATTR_SUBJECT_OTHER
        } else {
            constants::ATTR_SUBJECT_PATIENT
        }
    }

    fn apply(entity: &mut IdentifiedAnnotation, value: &'static str) {
        entity.subject = Some(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::run_pipeline;
    use crate::factory::fast_pipeline;

    fn entities(text: &str) -> Vec<IdentifiedAnnotation> {
        let mut cas = Cas::new(text);
        run_pipeline(&mut cas, &fast_pipeline().unwrap()).unwrap();
        cas.entities.iter().cloned().collect()
    }

    fn entity<'a>(found: &'a [IdentifiedAnnotation], text: &str) -> &'a IdentifiedAnnotation {
        found
            .iter()
            .find(|e| e.covered_text == text)
            .unwrap_or_else(|| panic!("entidade '{}' não encontrada em {:?}", text, found))
    }

    fn tokens(words: &[&str]) -> Vec<ContextToken> {
        words
            .iter()
            .map(|w| ContextToken {
                surface: w.to_string(),
                canonical: w.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_negated_finding() {
        let found = entities("Patient denies chest pain.");
        let pain = entity(&found, "chest pain");
        assert_eq!(pain.polarity, constants::NE_POLARITY_NEGATION_PRESENT);
        assert_eq!(pain.subject.as_deref(), Some(constants::ATTR_SUBJECT_PATIENT));
    }

    #[test]
    fn test_affirmed_finding() {
        let found = entities("Patient reports fever.");
        let fever = entity(&found, "fever");
        assert_eq!(fever.polarity, constants::NE_POLARITY_NEGATION_ABSENT);
        assert_eq!(fever.uncertainty, constants::NE_UNCERTAINTY_ABSENT);
        assert!(!fever.conditional);
        assert!(!fever.generic);
    }

    #[test]
    fn test_negation_list_and_scope_breaker() {
        let found = entities("No fever or cough but has headache.");
        assert_eq!(entity(&found, "fever").polarity, -1);
        assert_eq!(entity(&found, "cough").polarity, -1);
        assert_eq!(entity(&found, "headache").polarity, 1);
    }

    #[test]
    fn test_contraction_negation() {
        let found = entities("She doesn't have diabetes.");
        assert_eq!(entity(&found, "diabetes").polarity, -1);
    }

    #[test]
    fn test_uncertainty_and_post_trigger() {
        let found = entities("Possible pneumonia.\nAsthma?");
        assert_eq!(entity(&found, "pneumonia").uncertainty, constants::NE_UNCERTAINTY_PRESENT);
        assert_eq!(entity(&found, "Asthma").uncertainty, constants::NE_UNCERTAINTY_PRESENT);
    }

    #[test]
    fn test_history_trigger_and_section() {
        let found = entities("He has a history of hypertension.\nPAST MEDICAL HISTORY:\nAsthma.\nHPI:\nCough.");
        assert_eq!(entity(&found, "hypertension").history_of, constants::NE_HISTORY_OF_PRESENT);
        assert_eq!(entity(&found, "Asthma").history_of, constants::NE_HISTORY_OF_PRESENT);
        assert_eq!(entity(&found, "Cough").history_of, constants::NE_HISTORY_OF_ABSENT);
    }

    #[test]
    fn test_conditional_and_generic() {
        let found = entities("Return if fever develops. Discussed risk of stroke.");
        assert!(entity(&found, "fever").conditional);
        assert!(entity(&found, "stroke").generic);
        assert!(!entity(&found, "stroke").conditional);
    }

    #[test]
    fn test_subjects() {
        let found = entities("Mother has breast cancer.\nKidney donor with hypertension.\nHis wife has asthma.");
        assert_eq!(entity(&found, "breast cancer").subject.as_deref(), Some("family_member"));
        assert_eq!(entity(&found, "hypertension").subject.as_deref(), Some("donor_other"));
        assert_eq!(entity(&found, "asthma").subject.as_deref(), Some("other"));
    }

    #[test]
    fn test_pseudo_trigger_is_ignored() {
        let context = tokens(&["no", "change", "in"]);
        assert!(!contains_trigger(&context, NEGATION_PRE, NEGATION_PSEUDO));
        assert!(contains_trigger(&tokens(&["no"]), NEGATION_PRE, NEGATION_PSEUDO));
    }

    #[test]
    fn test_multiword_trigger_matches_split_tokens() {
        assert!(contains_trigger(&tokens(&["s", "/", "p"]), HISTORY_PRE, &[]));
        assert!(!contains_trigger(&tokens(&["s", "p"]), HISTORY_PRE, &[]));
    }
}
