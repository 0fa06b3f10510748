//! # Fábrica de Pipelines
//!
//! Monta as cinco variantes nomeadas de pipeline como árvores de
//! [`AnalysisEngineDescription`]:
//!
//! | Variante           | Composição                                                          |
//! |--------------------|---------------------------------------------------------------------|
//! | `token-processing` | segmento → sentença → tokens → LVG → tokens contextuais → POS       |
//! | `np-chunker`       | chunker → ajustes de chunk → NPs como janelas → remove contidas     |
//! | `default`          | tokens → NP chunker → constituintes → dicionário (janelas) → dependências → asserções |
//! | `fast`             | tokens → dicionário (sentenças) → dependências → asserções          |
//! | `parsing`          | tokens → dependências → constituintes                               |
//!
//! As funções `*_with` recebem uma [`PipelineConfig`]; as demais usam a
//! configuração padrão. Falhas de montagem (dicionário ausente, padrão de
//! ajuste inválido) são erros de inicialização.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::assertion::{
    ConditionalAnnotator, GenericAnnotator, HistoryAnnotator, PolarityAnnotator, SubjectAnnotator,
    UncertaintyAnnotator,
};
use crate::chunker::{ChunkAdjuster, Chunker};
use crate::config::PipelineConfig;
use crate::context::ContextDependentTokenizer;
use crate::dictionary::{Dictionary, DictionaryLookup, LookupWindowKind};
use crate::engine::{AggregateBuilder, AnalysisEngineDescription};
use crate::error::{PipelineError, Result};
use crate::lookup_window::{CopyNpChunksToLookupWindows, RemoveEnclosedLookupWindows};
use crate::lvg::LvgAnnotator;
use crate::parser::{ConstituencyParser, DependencyParser};
use crate::pos::PosTagger;
use crate::segment::{SentenceDetector, SimpleSegmentAnnotator};
use crate::tokenizer::TokenizerAnnotatorPtb;

/// Segmentação, tokenização, normalização e POS.
pub fn token_processing_pipeline() -> Result<AnalysisEngineDescription> {
    let mut builder = AggregateBuilder::named("TokenProcessingPipeline");
    builder
        .add(SimpleSegmentAnnotator::new())
        .add(SentenceDetector)
        .add(TokenizerAnnotatorPtb)
        .add(LvgAnnotator::new())
        .add(ContextDependentTokenizer::new()?)
        .add(PosTagger::new());
    Ok(builder.create_aggregate_description())
}

/// Dois ajustes: `NP NP` (índice 1) e `NP PP NP` (índice 2).
pub fn standard_chunk_adjuster() -> Result<AnalysisEngineDescription> {
    let mut builder = AggregateBuilder::named("StandardChunkAdjuster");
    builder
        .add(ChunkAdjuster::new(&["NP", "NP"], 1)?)
        .add(ChunkAdjuster::new(&["NP", "PP", "NP"], 2)?);
    Ok(builder.create_aggregate_description())
}

/// Chunks NP ajustados como janelas de busca, sem janelas contidas.
pub fn np_chunker_pipeline() -> Result<AnalysisEngineDescription> {
    let mut builder = AggregateBuilder::named("NpChunkerPipeline");
    builder
        .add(Chunker)
        .add(standard_chunk_adjuster()?)
        .add(CopyNpChunksToLookupWindows)
        .add(RemoveEnclosedLookupWindows);
    Ok(builder.create_aggregate_description())
}

pub fn default_pipeline() -> Result<AnalysisEngineDescription> {
    default_pipeline_with(&PipelineConfig::default())
}

pub fn default_pipeline_with(config: &PipelineConfig) -> Result<AnalysisEngineDescription> {
    let dictionary = load_dictionary(config)?;
    let mut builder = AggregateBuilder::named("DefaultPipeline");
    builder
        .add(token_processing_pipeline()?)
        .add(np_chunker_pipeline()?)
        .add(ConstituencyParser)
        .add(DictionaryLookup::new(dictionary, LookupWindowKind::LookupWindows))
        .add(DependencyParser);
    add_assertion_annotators(&mut builder, config.assertion.scope);
    Ok(builder.create_aggregate_description())
}

pub fn fast_pipeline() -> Result<AnalysisEngineDescription> {
    fast_pipeline_with(&PipelineConfig::default())
}

/// Como o padrão, mas sem chunking nem constituintes: a busca usa sentenças
/// inteiras como janelas.
pub fn fast_pipeline_with(config: &PipelineConfig) -> Result<AnalysisEngineDescription> {
    let dictionary = load_dictionary(config)?;
    let mut builder = AggregateBuilder::named("FastPipeline");
    builder
        .add(token_processing_pipeline()?)
        .add(DictionaryLookup::new(dictionary, LookupWindowKind::Sentences))
        .add(DependencyParser);
    add_assertion_annotators(&mut builder, config.assertion.scope);
    Ok(builder.create_aggregate_description())
}

pub fn parsing_pipeline() -> Result<AnalysisEngineDescription> {
    let mut builder = AggregateBuilder::named("ParsingPipeline");
    builder
        .add(token_processing_pipeline()?)
        .add(DependencyParser)
        .add(ConstituencyParser);
    Ok(builder.create_aggregate_description())
}

fn add_assertion_annotators(builder: &mut AggregateBuilder, scope: usize) {
    builder
        .add(PolarityAnnotator::new(scope))
        .add(UncertaintyAnnotator::new(scope))
        .add(HistoryAnnotator::new(scope))
        .add(ConditionalAnnotator::new(scope))
        .add(GenericAnnotator::new(scope))
        .add(SubjectAnnotator::new(scope));
}

fn load_dictionary(config: &PipelineConfig) -> Result<Arc<Dictionary>> {
    let min = config.dictionary.min_term_length;
    let dictionary = match &config.dictionary.path {
        Some(path) => Dictionary::load(path, min)?,
        None => Dictionary::bundled(min)?,
    };
    Ok(Arc::new(dictionary))
}

/// As variantes de pipeline disponíveis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineKind {
    #[default]
    Default,
    Fast,
    Parsing,
    TokenProcessing,
    NpChunker,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::Default,
        PipelineKind::Fast,
        PipelineKind::Parsing,
        PipelineKind::TokenProcessing,
        PipelineKind::NpChunker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Default => "default",
            PipelineKind::Fast => "fast",
            PipelineKind::Parsing => "parsing",
            PipelineKind::TokenProcessing => "token-processing",
            PipelineKind::NpChunker => "np-chunker",
        }
    }

    /// Monta a descrição da variante.
    pub fn build(&self, config: &PipelineConfig) -> Result<AnalysisEngineDescription> {
        match self {
            PipelineKind::Default => default_pipeline_with(config),
            PipelineKind::Fast => fast_pipeline_with(config),
            PipelineKind::Parsing => parsing_pipeline(),
            PipelineKind::TokenProcessing => token_processing_pipeline(),
            PipelineKind::NpChunker => np_chunker_pipeline(),
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        PipelineKind::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| PipelineError::UnknownPipeline(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::Cas;
    use crate::engine::run_pipeline;

    #[test]
    fn test_token_processing_order() {
        let aed = token_processing_pipeline().unwrap();
        assert_eq!(
            aed.flattened_names(),
            vec![
                "SimpleSegmentAnnotator",
                "SentenceDetector",
                "TokenizerAnnotatorPTB",
                "LvgAnnotator",
                "ContextDependentTokenizerAnnotator",
                "POSTagger",
            ]
        );
    }

    #[test]
    fn test_np_chunker_order() {
        let aed = np_chunker_pipeline().unwrap();
        assert_eq!(
            aed.flattened_names(),
            vec![
                "Chunker",
                "ChunkAdjuster",
                "ChunkAdjuster",
                "CopyNPChunksToLookupWindowAnnotations",
                "RemoveEnclosedLookupWindows",
            ]
        );
    }

    #[test]
    fn test_default_pipeline_order() {
        let names = default_pipeline().unwrap().flattened_names();
        assert_eq!(names.len(), 6 + 5 + 1 + 1 + 1 + 6);
        let after_tokens: Vec<&str> = names[11..].iter().map(String::as_str).collect();
        assert_eq!(
            after_tokens,
            vec![
                "ConstituencyParser",
                "DictionaryLookupAnnotator",
                "ClearNLPDependencyParserAE",
                "PolarityCleartkAnalysisEngine",
                "UncertaintyCleartkAnalysisEngine",
                "HistoryCleartkAnalysisEngine",
                "ConditionalCleartkAnalysisEngine",
                "GenericCleartkAnalysisEngine",
                "SubjectCleartkAnalysisEngine",
            ]
        );
    }

    #[test]
    fn test_fast_and_parsing_composition() {
        let fast = fast_pipeline().unwrap().flattened_names();
        assert_eq!(fast[6], "DictionaryLookupAnnotator");
        assert_eq!(fast[7], "ClearNLPDependencyParserAE");
        assert_eq!(fast.len(), 6 + 2 + 6);

        let parsing = parsing_pipeline().unwrap().flattened_names();
        assert_eq!(&parsing[6..], &["ClearNLPDependencyParserAE", "ConstituencyParser"]);
    }

    #[test]
    fn test_missing_dictionary_fails_initialization() {
        let mut config = PipelineConfig::default();
        config.dictionary.path = Some("/nonexistent/terms.bsv".into());
        let err = default_pipeline_with(&config).unwrap_err();
        assert!(matches!(err, PipelineError::Initialization { .. }));
    }

    #[test]
    fn test_pipeline_kind_parsing() {
        assert_eq!("fast".parse::<PipelineKind>().unwrap(), PipelineKind::Fast);
        assert_eq!("NP_CHUNKER".parse::<PipelineKind>().unwrap(), PipelineKind::NpChunker);
        assert!("rapido".parse::<PipelineKind>().is_err());
        for kind in PipelineKind::ALL {
            assert_eq!(kind.to_string().parse::<PipelineKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_np_chunker_windows() {
        let mut cas = Cas::new("He has a history of chronic hypertension.");
        run_pipeline(&mut cas, &token_processing_pipeline().unwrap()).unwrap();
        run_pipeline(&mut cas, &np_chunker_pipeline().unwrap()).unwrap();

        let windows: Vec<&str> = cas.lookup_windows.iter().map(|w| cas.covered_text(w.span)).collect();
        assert_eq!(windows, vec!["He", "a history of chronic hypertension"]);
    }

    #[test]
    fn test_every_kind_runs() {
        for kind in PipelineKind::ALL {
            let aed = kind.build(&PipelineConfig::default()).unwrap();
            let mut cas = Cas::new("Patient denies chest pain.\n");
            run_pipeline(&mut cas, &aed).unwrap();
            assert!(!cas.sentences.is_empty() || kind == PipelineKind::NpChunker);
        }
    }
}
