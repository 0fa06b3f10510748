//! # Serialização XMI
//!
//! Escreve o documento anotado no formato XMI do UIMA: um elemento `cas:Sofa`
//! com o texto, um elemento por anotação (com `xmi:id`, `begin`, `end` e os
//! atributos do tipo) e, ao final, um `cas:View` listando os membros indexados.
//!
//! ## Identificadores
//!
//! | xmi:id | Elemento                    |
//! |--------|-----------------------------|
//! | 0      | `cas:NULL`                  |
//! | 1      | `cas:Sofa`                  |
//! | 2..    | anotações, em ordem de tipo |
//!
//! Referências entre elementos (filhos de nós da árvore, conceitos de uma
//! entidade) usam esses ids.
//!
//! Quebras de linha e tabulações do texto são escritas como referências de
//! caractere (`&#10;`), porque parsers XML normalizam espaços em atributos.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Writer;

use crate::cas::Cas;
use crate::error::Result;

const SOFA_ID: usize = 1;

const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:xmi", "http://www.omg.org/XMI"),
    ("xmlns:cas", "http:///uima/cas.ecore"),
    ("xmlns:tcas", "http:///uima/tcas.ecore"),
    ("xmlns:textspan", "http:///org/apache/ctakes/typesystem/type/textspan.ecore"),
    ("xmlns:syntax", "http:///org/apache/ctakes/typesystem/type/syntax.ecore"),
    ("xmlns:textsem", "http:///org/apache/ctakes/typesystem/type/textsem.ecore"),
    ("xmlns:refsem", "http:///org/apache/ctakes/typesystem/type/refsem.ecore"),
];

/// Um elemento a ser escrito.
struct Element {
    tag: String,
    id: usize,
    attrs: Vec<(&'static str, String)>,
}

impl Element {
    fn annotation(tag: impl Into<String>, id: usize, begin: usize, end: usize) -> Self {
        Self {
            tag: tag.into(),
            id,
            attrs: vec![
                ("sofa", SOFA_ID.to_string()),
                ("begin", begin.to_string()),
                ("end", end.to_string()),
            ],
        }
    }

    fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.attrs.push((key, value.to_string()));
        self
    }

    fn with_opt(self, key: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.with(key, v),
            None => self,
        }
    }
}

fn join_ids(ids: impl IntoIterator<Item = usize>) -> String {
    ids.into_iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Monta a lista de elementos na ordem de escrita.
fn build_elements(cas: &Cas) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut next_id = SOFA_ID + 1;
    let mut id = || {
        let current = next_id;
        next_id += 1;
        current
    };

    elements.push(
        Element::annotation("tcas:DocumentAnnotation", id(), 0, cas.text().len()).with("language", "en"),
    );
    for s in &cas.segments {
        elements.push(Element::annotation("textspan:Segment", id(), s.span.begin, s.span.end).with("id", &s.id));
    }
    for s in &cas.sentences {
        elements.push(
            Element::annotation("textspan:Sentence", id(), s.span.begin, s.span.end)
                .with("sentenceNumber", s.sentence_number),
        );
    }
    for t in &cas.tokens {
        let tag = format!("syntax:{}", t.kind.type_name());
        elements.push(
            Element::annotation(tag, id(), t.span.begin, t.span.end)
                .with("tokenNumber", t.token_number)
                .with_opt("partOfSpeech", t.part_of_speech.as_deref())
                .with_opt("canonicalForm", t.canonical_form.as_deref()),
        );
    }
    for c in &cas.context_annotations {
        let tag = format!("textsem:{}", c.kind.type_name());
        elements.push(Element::annotation(tag, id(), c.span.begin, c.span.end));
    }
    for c in &cas.chunks {
        elements.push(
            Element::annotation("syntax:Chunk", id(), c.span.begin, c.span.end).with("chunkType", &c.chunk_type),
        );
    }
    for w in &cas.lookup_windows {
        elements.push(Element::annotation("textspan:LookupWindowAnnotation", id(), w.span.begin, w.span.end));
    }

    // ids dos nós da árvore são atribuídos antes para resolver pai e filhos
    let node_ids: HashMap<usize, usize> = cas.treebank_nodes.iter().map(|n| (n.id, id())).collect();
    for n in &cas.treebank_nodes {
        let tag = match (n.parent, n.is_leaf()) {
            (None, _) => "syntax:TopTreebankNode",
            (_, true) => "syntax:TerminalTreebankNode",
            _ => "syntax:TreebankNode",
        };
        let children = join_ids(n.children.iter().filter_map(|c| node_ids.get(c).copied()));
        let mut element = Element::annotation(tag, node_ids[&n.id], n.span.begin, n.span.end)
            .with("nodeType", &n.node_type)
            .with_opt("nodeValue", n.word.as_deref());
        if let Some(parent) = n.parent.and_then(|p| node_ids.get(&p)) {
            element = element.with("parent", parent);
        }
        if !children.is_empty() {
            element = element.with("children", children);
        }
        elements.push(element);
    }

    for d in &cas.dependency_nodes {
        elements.push(
            Element::annotation("syntax:ConllDependencyNode", id(), d.span.begin, d.span.end)
                .with("id", d.id)
                .with("form", &d.form)
                .with("postag", &d.postag)
                .with("head", d.head)
                .with("deprel", &d.deprel),
        );
    }

    for e in &cas.entities {
        let entity_id = id();
        let concept_ids: Vec<usize> = e.concepts.iter().map(|_| id()).collect();
        let mut element = Element::annotation(format!("textsem:{}", e.group.mention_type()), entity_id, e.span.begin, e.span.end)
            .with("typeID", e.group.type_id())
            .with("discoveryTechnique", &e.discovery_technique)
            .with("confidence", e.confidence)
            .with("polarity", e.polarity)
            .with("uncertainty", e.uncertainty)
            .with("conditional", e.conditional)
            .with("generic", e.generic)
            .with_opt("subject", e.subject.as_deref())
            .with("historyOf", e.history_of);
        if !concept_ids.is_empty() {
            element = element.with("ontologyConceptArr", join_ids(concept_ids.iter().copied()));
        }
        elements.push(element);

        for (concept, concept_id) in e.concepts.iter().zip(concept_ids) {
            elements.push(
                Element {
                    tag: "refsem:UmlsConcept".to_string(),
                    id: concept_id,
                    attrs: Vec::new(),
                }
                .with("codingScheme", &concept.coding_scheme)
                .with("cui", &concept.cui)
                .with_opt("tui", concept.tui.as_deref())
                .with("preferredText", &concept.preferred_text),
            );
        }
    }

    elements
}

/// Escapa um valor de atributo, incluindo espaços que seriam normalizados.
/// Caracteres proibidos pelo XML 1.0 (ex: form feed de quebra de página) são
/// substituídos.
fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            // fora do XML 1.0; a troca mantém o tamanho em bytes e os offsets
            '\u{0}'..='\u{1F}' => out.push(' '),
            '\u{FFFE}' | '\u{FFFF}' => out.push('\u{FFFD}'),
            _ => out.push(c),
        }
    }
    out
}

fn attribute<'a>(key: &'a str, value: &str) -> Attribute<'a> {
    Attribute {
        key: QName(key.as_bytes()),
        value: Cow::Owned(escape_attribute(value).into_bytes()),
    }
}

/// Serializa o documento em XMI.
pub fn serialize_xmi<W: Write>(cas: &Cas, writer: W) -> Result<()> {
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("xmi:XMI");
    for (key, value) in NAMESPACES {
        root.push_attribute(attribute(key, value));
    }
    root.push_attribute(attribute("xmi:version", "2.0"));
    xml.write_event(Event::Start(root))?;

    let mut null = BytesStart::new("cas:NULL");
    null.push_attribute(attribute("xmi:id", "0"));
    xml.write_event(Event::Empty(null))?;

    let mut sofa = BytesStart::new("cas:Sofa");
    sofa.push_attribute(attribute("xmi:id", &SOFA_ID.to_string()));
    sofa.push_attribute(attribute("sofaNum", "1"));
    sofa.push_attribute(attribute("sofaID", "_InitialView"));
    sofa.push_attribute(attribute("mimeType", "text"));
    sofa.push_attribute(attribute("sofaString", cas.text()));
    xml.write_event(Event::Empty(sofa))?;

    let elements = build_elements(cas);
    for element in &elements {
        let mut start = BytesStart::new(element.tag.as_str());
        start.push_attribute(attribute("xmi:id", &element.id.to_string()));
        for (key, value) in &element.attrs {
            start.push_attribute(attribute(key, value));
        }
        xml.write_event(Event::Empty(start))?;
    }

    let mut view = BytesStart::new("cas:View");
    view.push_attribute(attribute("sofa", &SOFA_ID.to_string()));
    view.push_attribute(attribute("members", &join_ids(elements.iter().map(|e| e.id))));
    xml.write_event(Event::Empty(view))?;

    xml.write_event(Event::End(BytesEnd::new("xmi:XMI")))?;
    xml.into_inner().flush()?;
    Ok(())
}

/// Serializa o documento em XMI no arquivo `path`.
pub fn write_xmi(cas: &Cas, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serialize_xmi(cas, BufWriter::new(file))?;
    tracing::info!("XMI escrito em {}", path.display());
    Ok(())
}
