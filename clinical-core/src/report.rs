//! # Relatório de Entidades
//!
//! Formato de linha impresso pelo driver para cada entidade:
//!
//! ```text
//! Entity: chest pain === Polarity: -1 === Uncertain? false === Subject: patient === Generic? false === Conditional? false === History? false
//! C0008031_T184
//! ```
//!
//! A segunda linha (códigos, cada um seguido de espaço) só aparece quando
//! pedida.

use std::io::{self, Write};

use crate::cas::{constants, Cas, IdentifiedAnnotation};

/// Sujeito impresso quando o atributo não foi preenchido.
pub const UNSET_SUBJECT: &str = "null";

pub fn entity_line(entity: &IdentifiedAnnotation) -> String {
    format!(
        "Entity: {} === Polarity: {} === Uncertain? {} === Subject: {} === Generic? {} === Conditional? {} === History? {}",
        entity.covered_text,
        entity.polarity,
        entity.uncertainty == constants::NE_UNCERTAINTY_PRESENT,
        entity.subject.as_deref().unwrap_or(UNSET_SUBJECT),
        entity.generic == constants::NE_GENERIC_TRUE,
        entity.conditional == constants::NE_CONDITIONAL_TRUE,
        entity.history_of == constants::NE_HISTORY_OF_PRESENT,
    )
}

/// Códigos da entidade, cada um seguido de um espaço.
pub fn codes_line(entity: &IdentifiedAnnotation) -> String {
    entity.codes().iter().map(|c| format!("{c} ")).collect()
}

/// Escreve o relatório de todas as entidades, em ordem de texto.
pub fn write_report<W: Write>(cas: &Cas, print_codes: bool, mut out: W) -> io::Result<()> {
    for entity in &cas.entities {
        writeln!(out, "{}", entity_line(entity))?;
        if print_codes {
            writeln!(out, "{}", codes_line(entity))?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::{SemanticGroup, Span, UmlsConcept};

    fn negated_pain() -> IdentifiedAnnotation {
        let mut entity = IdentifiedAnnotation::new(Span::new(15, 25), "chest pain", SemanticGroup::SignSymptom);
        entity.polarity = constants::NE_POLARITY_NEGATION_PRESENT;
        entity.subject = Some(constants::ATTR_SUBJECT_PATIENT.to_string());
        entity.concepts.push(UmlsConcept {
            cui: "C0008031".into(),
            tui: Some("T184".into()),
            preferred_text: "chest pain".into(),
            coding_scheme: "UMLS".into(),
        });
        entity.concepts.push(UmlsConcept {
            cui: "C0000000".into(),
            tui: None,
            preferred_text: "x".into(),
            coding_scheme: "UMLS".into(),
        });
        entity
    }

    #[test]
    fn test_entity_line_format() {
        assert_eq!(
            entity_line(&negated_pain()),
            "Entity: chest pain === Polarity: -1 === Uncertain? false === Subject: patient === Generic? false === Conditional? false === History? false"
        );
    }

    #[test]
    fn test_codes_line() {
        assert_eq!(codes_line(&negated_pain()), "C0008031_T184 C0000000 ");
    }

    #[test]
    fn test_unset_subject() {
        let entity = IdentifiedAnnotation::new(Span::new(0, 5), "fever", SemanticGroup::SignSymptom);
        assert!(entity_line(&entity).contains("Subject: null"));
    }

    #[test]
    fn test_write_report_with_codes() {
        let mut cas = Cas::new("Patient denies chest pain.");
        cas.entities.add(negated_pain());
        let mut out = Vec::new();
        write_report(&cas, true, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Entity: chest pain"));
        assert_eq!(lines[1], "C0008031_T184 C0000000 ");
    }
}
