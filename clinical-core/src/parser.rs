//! # Análise Sintática
//!
//! Dois analisadores determinísticos construídos sobre as tags POS e os
//! sintagmas do [`Chunker`]:
//!
//! ## Constituintes
//!
//! Uma árvore rasa por sentença:
//!
//! ```text
//! TOP
//! └── S
//!     ├── NP ── NN "Patient"
//!     ├── VP ── VBZ "denies"
//!     ├── NP ─┬ NN "chest"
//!     │       └ NN "pain"
//!     └── . "."
//! ```
//!
//! ## Dependências
//!
//! Cada token recebe um `head` e uma relação no estilo CoNLL:
//! - modificadores internos ao sintagma ligam-se ao núcleo (`det`, `amod`, `nn`, `aux`...);
//! - núcleos de sintagma ligam-se à raiz da sentença (núcleo do primeiro VP,
//!   senão primeiro nome), com `nsubj` antes da raiz e `dobj` depois dela;
//! - o NP após uma preposição liga-se a ela como `pobj`.
//!
//! Os sintagmas são recalculados a partir das tags, de modo que os analisadores
//! funcionam em pipelines sem o estágio de chunking.

use crate::cas::{BaseToken, Cas, DependencyNode, Span, TreebankNode};
use crate::chunker::Chunker;
use crate::engine::Annotator;
use crate::error::Result;

/// Sintagmas de uma sentença: `(tipo, início, fim exclusivo)` em índices de token.
fn sentence_chunks(tokens: &[&BaseToken], cas: &Cas) -> Vec<(String, usize, usize)> {
    let words: Vec<(&str, &str)> = tokens
        .iter()
        .map(|t| (cas.covered_text(t.span), pos_of(t)))
        .collect();
    Chunker.chunk(&words)
}

fn pos_of(token: &BaseToken) -> &str {
    token.part_of_speech.as_deref().unwrap_or("NN")
}

/// Analisador de constituintes raso.
#[derive(Debug, Clone, Default)]
pub struct ConstituencyParser;

impl Annotator for ConstituencyParser {
    fn name(&self) -> &str {
        "ConstituencyParser"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        let mut nodes: Vec<TreebankNode> = Vec::new();
        let mut next_id = cas.treebank_nodes.len();

        for sentence in sentences {
            let tokens: Vec<&BaseToken> = cas.tokens.covered_by(sentence).collect();
            if tokens.is_empty() {
                continue;
            }
            let chunks = sentence_chunks(&tokens, cas);

            let top_id = next_id;
            let s_id = next_id + 1;
            next_id += 2;
            let top = TreebankNode {
                span: sentence,
                id: top_id,
                node_type: "TOP".to_string(),
                parent: None,
                children: vec![s_id],
                word: None,
            };
            let mut s = TreebankNode {
                span: sentence,
                id: s_id,
                node_type: "S".to_string(),
                parent: Some(top_id),
                children: Vec::new(),
                word: None,
            };
            let mut sentence_nodes = Vec::new();

            let mut i = 0;
            let mut c = 0;
            while i < tokens.len() {
                match chunks.get(c) {
                    Some((chunk_type, start, end)) if *start == i => {
                        let phrase_id = next_id;
                        next_id += 1;
                        let mut phrase = TreebankNode {
                            span: Span::new(tokens[*start].span.begin, tokens[*end - 1].span.end),
                            id: phrase_id,
                            node_type: chunk_type.clone(),
                            parent: Some(s_id),
                            children: Vec::new(),
                            word: None,
                        };
                        for token in &tokens[*start..*end] {
                            phrase.children.push(next_id);
                            sentence_nodes.push(leaf_node(cas, token, next_id, phrase_id));
                            next_id += 1;
                        }
                        s.children.push(phrase_id);
                        sentence_nodes.push(phrase);
                        i = *end;
                        c += 1;
                    }
                    _ => {
                        s.children.push(next_id);
                        sentence_nodes.push(leaf_node(cas, tokens[i], next_id, s_id));
                        next_id += 1;
                        i += 1;
                    }
                }
            }

            nodes.push(top);
            nodes.push(s);
            nodes.extend(sentence_nodes);
        }

        for node in nodes {
            cas.treebank_nodes.add(node);
        }
        Ok(())
    }
}

fn leaf_node(cas: &Cas, token: &BaseToken, id: usize, parent: usize) -> TreebankNode {
    TreebankNode {
        span: token.span,
        id,
        node_type: pos_of(token).to_string(),
        parent: Some(parent),
        children: Vec::new(),
        word: Some(cas.covered_text(token.span).to_string()),
    }
}

/// Analisador de dependências por regras de núcleo.
#[derive(Debug, Clone, Default)]
pub struct DependencyParser;

impl DependencyParser {
    /// `(head, deprel)` para cada token; `head` é 1-based e 0 marca a raiz.
    pub fn parse(&self, tags: &[&str], chunks: &[(String, usize, usize)]) -> Vec<(usize, String)> {
        let n = tags.len();
        let mut arcs: Vec<(usize, String)> = vec![(0, "dep".to_string()); n];
        if n == 0 {
            return arcs;
        }

        let heads: Vec<usize> = chunks
            .iter()
            .map(|(kind, start, end)| chunk_head(kind, tags, *start, *end))
            .collect();

        let root = chunks
            .iter()
            .position(|(kind, _, _)| kind == "VP")
            .map(|c| heads[c])
            .or_else(|| tags.iter().position(|t| t.starts_with("VB")))
            .or_else(|| tags.iter().position(|t| t.starts_with("NN")))
            .unwrap_or(0);
        arcs[root] = (0, "ROOT".to_string());

        let mut seen_object = false;
        for (c, (kind, start, end)) in chunks.iter().enumerate() {
            let head = heads[c];
            for i in *start..*end {
                if i != head && i != root {
                    arcs[i] = (head + 1, modifier_relation(tags[i]).to_string());
                }
            }
            if head == root {
                continue;
            }

            let previous_is_pp = c > 0 && chunks[c - 1].0 == "PP" && chunks[c - 1].2 == *start;
            let relation = match kind.as_str() {
                "NP" if previous_is_pp => {
                    arcs[head] = (heads[c - 1] + 1, "pobj".to_string());
                    continue;
                }
                "NP" if head < root => "nsubj",
                "NP" if !seen_object => {
                    seen_object = true;
                    "dobj"
                }
                "NP" => "dep",
                "PP" => "prep",
                "VP" => "conj",
                "ADJP" => "acomp",
                "ADVP" => "advmod",
                "SBAR" => "mark",
                _ => "dep",
            };
            arcs[head] = (root + 1, relation.to_string());
        }

        // tokens fora de sintagmas
        for i in 0..n {
            if i == root || chunks.iter().any(|(_, s, e)| (*s..*e).contains(&i)) {
                continue;
            }
            let relation = if is_punctuation(tags[i]) { "punct" } else if tags[i] == "CC" { "cc" } else { "dep" };
            arcs[i] = (root + 1, relation.to_string());
        }

        arcs
    }
}

fn chunk_head(kind: &str, tags: &[&str], start: usize, end: usize) -> usize {
    let range = start..end;
    match kind {
        "VP" => range.clone().rev().find(|&i| tags[i].starts_with("VB")).unwrap_or(end - 1),
        "NP" => range
            .clone()
            .rev()
            .find(|&i| tags[i].starts_with("NN") || matches!(tags[i], "PRP" | "CD" | "EX"))
            .unwrap_or(end - 1),
        _ => end - 1,
    }
}

fn modifier_relation(tag: &str) -> &'static str {
    match tag {
        "DT" => "det",
        "PRP$" => "poss",
        "JJ" | "JJR" | "JJS" | "VBN" | "VBG" => "amod",
        "CD" => "num",
        "MD" => "aux",
        "RB" => "advmod",
        "POS" => "possessive",
        t if t.starts_with("NN") => "nn",
        t if t.starts_with("VB") => "aux",
        _ => "dep",
    }
}

fn is_punctuation(tag: &str) -> bool {
    matches!(tag, "." | "," | ":" | "''" | "-LRB-" | "-RRB-" | "SYM")
}

impl Annotator for DependencyParser {
    fn name(&self) -> &str {
        "ClearNLPDependencyParserAE"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let sentences: Vec<Span> = cas.sentences.iter().map(|s| s.span).collect();
        let mut nodes = Vec::new();

        for sentence in sentences {
            let tokens: Vec<&BaseToken> = cas.tokens.covered_by(sentence).collect();
            let chunks = sentence_chunks(&tokens, cas);
            let tags: Vec<&str> = tokens.iter().map(|t| pos_of(t)).collect();
            let arcs = self.parse(&tags, &chunks);

            for (i, (token, (head, deprel))) in tokens.iter().zip(arcs).enumerate() {
                nodes.push(DependencyNode {
                    span: token.span,
                    id: i + 1,
                    form: cas.covered_text(token.span).to_string(),
                    postag: tags[i].to_string(),
                    head,
                    deprel,
                });
            }
        }

        tracing::debug!("{} nós de dependência", nodes.len());
        for node in nodes {
            cas.dependency_nodes.add(node);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::token_processing_pipeline;
    use crate::engine::run_pipeline;

    fn processed(text: &str) -> Cas {
        let mut cas = Cas::new(text);
        run_pipeline(&mut cas, &token_processing_pipeline().unwrap()).unwrap();
        cas
    }

    #[test]
    fn test_dependency_arcs() {
        let tags = ["NN", "VBZ", "NN", "NN", "."];
        let chunks = vec![
            ("NP".to_string(), 0, 1),
            ("VP".to_string(), 1, 2),
            ("NP".to_string(), 2, 4),
        ];
        let arcs = DependencyParser.parse(&tags, &chunks);
        let expected = [(2, "nsubj"), (0, "ROOT"), (4, "nn"), (2, "dobj"), (2, "punct")];
        for (arc, (head, rel)) in arcs.iter().zip(expected) {
            assert_eq!(arc.0, head);
            assert_eq!(arc.1, rel);
        }
    }

    #[test]
    fn test_prepositional_object() {
        // "history of hypertension"
        let tags = ["NN", "IN", "NN"];
        let chunks = vec![
            ("NP".to_string(), 0, 1),
            ("PP".to_string(), 1, 2),
            ("NP".to_string(), 2, 3),
        ];
        let arcs = DependencyParser.parse(&tags, &chunks);
        assert_eq!(arcs[0], (0, "ROOT".to_string()));
        assert_eq!(arcs[1], (1, "prep".to_string()));
        assert_eq!(arcs[2], (2, "pobj".to_string()));
    }

    #[test]
    fn test_constituency_tree_shape() {
        let mut cas = processed("Patient denies chest pain.");
        ConstituencyParser.process(&mut cas).unwrap();

        let top = cas.treebank_nodes.iter().find(|n| n.node_type == "TOP").unwrap();
        assert_eq!(top.children.len(), 1);
        let s = cas.treebank_nodes.iter().find(|n| n.id == top.children[0]).unwrap();
        assert_eq!(s.node_type, "S");

        let phrase_types: Vec<&str> = s
            .children
            .iter()
            .filter_map(|id| cas.treebank_nodes.iter().find(|n| n.id == *id))
            .map(|n| n.node_type.as_str())
            .collect();
        assert_eq!(phrase_types, vec!["NP", "VP", "NP", "."]);

        let leaves = cas.treebank_nodes.iter().filter(|n| n.is_leaf()).count();
        assert_eq!(leaves, 5);
    }

    #[test]
    fn test_dependency_nodes_per_token() {
        let mut cas = processed("Patient denies chest pain.");
        DependencyParser.process(&mut cas).unwrap();
        assert_eq!(cas.dependency_nodes.len(), cas.tokens.len());
        let root = cas.dependency_nodes.iter().find(|n| n.head == 0).unwrap();
        assert_eq!(root.form, "denies");
    }
}
