//! # Janelas de Busca
//!
//! A busca no dicionário é restrita a janelas de texto. No pipeline padrão as
//! janelas são os NPs (já estendidos pelo [`ChunkAdjuster`](crate::chunker::ChunkAdjuster)):
//!
//! 1. [`CopyNpChunksToLookupWindows`]: cada chunk `NP` vira uma janela com o mesmo span.
//! 2. [`RemoveEnclosedLookupWindows`]: remove janelas contidas na janela
//!    **imediatamente anterior** na ordem do índice.
//!
//! ## Política de Remoção
//!
//! Só a predecessora imediata é considerada. Com o índice ordenado por
//! `begin` crescente e `end` decrescente, uma janela contida numa janela
//! anterior não adjacente sobrevive se a janela entre elas não a contiver.
//! Janelas que apenas se sobrepõem são mantidas.

use crate::cas::{Cas, LookupWindow, Span};
use crate::engine::Annotator;
use crate::error::Result;

/// Tipo de chunk copiado para janelas de busca.
pub const NP_CHUNK_TYPE: &str = "NP";

/// Cria uma janela de busca para cada chunk `NP`.
#[derive(Debug, Clone, Default)]
pub struct CopyNpChunksToLookupWindows;

impl Annotator for CopyNpChunksToLookupWindows {
    fn name(&self) -> &str {
        "CopyNPChunksToLookupWindowAnnotations"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let windows: Vec<LookupWindow> = cas
            .chunks
            .iter()
            .filter(|c| c.chunk_type == NP_CHUNK_TYPE)
            .map(|c| LookupWindow { span: c.span })
            .collect();

        tracing::debug!("{} janelas copiadas de chunks NP", windows.len());
        for window in windows {
            cas.lookup_windows.add(window);
        }
        Ok(())
    }
}

/// Remove janelas contidas na janela imediatamente anterior.
#[derive(Debug, Clone, Default)]
pub struct RemoveEnclosedLookupWindows;

impl Annotator for RemoveEnclosedLookupWindows {
    fn name(&self) -> &str {
        "RemoveEnclosedLookupWindows"
    }

    fn process(&self, cas: &mut Cas) -> Result<()> {
        let mut spans: Vec<Span> = cas.lookup_windows.iter().map(|w| w.span).collect();
        let before = spans.len();
        remove_enclosed(&mut spans);

        if spans.len() != before {
            tracing::debug!("{} janelas contidas removidas", before - spans.len());
            cas.lookup_windows
                .replace_all(spans.into_iter().map(|span| LookupWindow { span }).collect());
        }
        Ok(())
    }
}

/// Remove de `spans` (em ordem de índice) cada span contido no seu
/// predecessor imediato.
///
/// A varredura vai do fim para o começo, comparando cada par adjacente
/// `(i, i + 1)`; por isso uma cadeia de janelas aninhadas colapsa na mais
/// externa.
///
/// ```
/// use clinical_core::cas::Span;
/// use clinical_core::lookup_window::remove_enclosed;
///
/// let mut spans = vec![Span::new(0, 10), Span::new(2, 5), Span::new(12, 20)];
/// remove_enclosed(&mut spans);
/// assert_eq!(spans, vec![Span::new(0, 10), Span::new(12, 20)]);
/// ```
pub fn remove_enclosed(spans: &mut Vec<Span>) {
    if spans.len() < 2 {
        return;
    }
    for i in (0..spans.len() - 1).rev() {
        if spans[i].encloses(&spans[i + 1]) {
            spans.remove(i + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::Chunk;

    fn spans(pairs: &[(usize, usize)]) -> Vec<Span> {
        pairs.iter().map(|&(b, e)| Span::new(b, e)).collect()
    }

    #[test]
    fn test_enclosed_window_removed() {
        let mut s = spans(&[(0, 10), (2, 5), (12, 20)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 10), (12, 20)]));
    }

    #[test]
    fn test_overlapping_windows_kept() {
        let mut s = spans(&[(0, 10), (5, 15)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 10), (5, 15)]));
    }

    #[test]
    fn test_nested_chain_collapses() {
        let mut s = spans(&[(0, 10), (2, 5), (3, 4)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 10)]));
    }

    #[test]
    fn test_deep_chain_and_trailing_removal() {
        let mut s = spans(&[(0, 10), (1, 9), (2, 8), (3, 7), (20, 30), (21, 22)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 10), (20, 30)]));
    }

    #[test]
    fn test_only_immediate_predecessor_checked() {
        // (5, 8) está dentro de (0, 10), mas era comparada com (2, 4)
        let mut s = spans(&[(0, 10), (2, 4), (5, 8)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 10), (5, 8)]));

        let mut s = spans(&[(0, 20), (2, 12), (11, 14)]);
        remove_enclosed(&mut s);
        assert_eq!(s, spans(&[(0, 20), (11, 14)]));
    }

    #[test]
    fn test_empty_and_single() {
        let mut s: Vec<Span> = Vec::new();
        remove_enclosed(&mut s);
        assert!(s.is_empty());
        let mut s = spans(&[(1, 2)]);
        remove_enclosed(&mut s);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_copy_only_np_chunks() {
        let mut cas = Cas::new("a history of chronic hypertension");
        for (b, e, t) in [(0, 9, "NP"), (10, 12, "PP"), (13, 33, "NP")] {
            cas.chunks.add(Chunk { span: Span::new(b, e), chunk_type: t.to_string() });
        }
        CopyNpChunksToLookupWindows.process(&mut cas).unwrap();
        let windows: Vec<Span> = cas.lookup_windows.iter().map(|w| w.span).collect();
        assert_eq!(windows, spans(&[(0, 9), (13, 33)]));
    }

    #[test]
    fn test_remove_annotator_updates_index() {
        let mut cas = Cas::new("0123456789abcdefghij");
        for (b, e) in [(0, 10), (2, 5), (12, 20)] {
            cas.lookup_windows.add(LookupWindow { span: Span::new(b, e) });
        }
        RemoveEnclosedLookupWindows.process(&mut cas).unwrap();
        assert_eq!(cas.lookup_windows.len(), 2);
    }
}
