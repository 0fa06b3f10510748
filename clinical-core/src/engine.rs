//! # Motor de Análise — Anotadores, Agregados e Execução
//!
//! Um pipeline é uma árvore de descrições de motores de análise:
//!
//! - **Primitivo**: um único [`Annotator`] (ex: tokenizador).
//! - **Agregado**: uma sequência ordenada de outras descrições (fluxo fixo).
//!
//! O [`AggregateBuilder`] monta agregados; [`run_pipeline`] percorre a árvore em
//! profundidade e executa cada anotador sobre o mesmo [`Cas`]. Qualquer falha
//! aborta a execução inteira (não há recuperação parcial).

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::cas::Cas;
use crate::error::{PipelineError, Result};

/// Um passo de análise que lê e escreve anotações no documento.
pub trait Annotator: Send + Sync {
    /// Nome estável do componente (usado no descritor XML e nos logs).
    fn name(&self) -> &str;

    /// Parâmetros de configuração, exportados no descritor.
    fn parameters(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn process(&self, cas: &mut Cas) -> Result<()>;
}

/// Descrição (executável) de um motor de análise.
#[derive(Clone)]
pub enum AnalysisEngineDescription {
    Primitive(Arc<dyn Annotator>),
    Aggregate {
        name: String,
        delegates: Vec<AnalysisEngineDescription>,
    },
}

impl AnalysisEngineDescription {
    pub fn primitive(annotator: impl Annotator + 'static) -> Self {
        AnalysisEngineDescription::Primitive(Arc::new(annotator))
    }

    pub fn name(&self) -> &str {
        match self {
            AnalysisEngineDescription::Primitive(a) => a.name(),
            AnalysisEngineDescription::Aggregate { name, .. } => name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, AnalysisEngineDescription::Primitive(_))
    }

    /// Nomes dos anotadores primitivos, na ordem de execução.
    pub fn flattened_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.visit(&mut |a| names.push(a.name().to_string()));
        names
    }

    fn visit(&self, f: &mut dyn FnMut(&Arc<dyn Annotator>)) {
        match self {
            AnalysisEngineDescription::Primitive(a) => f(a),
            AnalysisEngineDescription::Aggregate { delegates, .. } => {
                for d in delegates {
                    d.visit(f);
                }
            }
        }
    }
}

impl std::fmt::Debug for AnalysisEngineDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisEngineDescription::Primitive(a) => {
                f.debug_tuple("Primitive").field(&a.name()).finish()
            }
            AnalysisEngineDescription::Aggregate { name, delegates } => f
                .debug_struct("Aggregate")
                .field("name", name)
                .field("delegates", delegates)
                .finish(),
        }
    }
}

impl<A: Annotator + 'static> From<A> for AnalysisEngineDescription {
    fn from(annotator: A) -> Self {
        AnalysisEngineDescription::primitive(annotator)
    }
}

/// Monta um agregado de fluxo fixo.
#[derive(Debug, Default)]
pub struct AggregateBuilder {
    name: Option<String>,
    delegates: Vec<AnalysisEngineDescription>,
}

impl AggregateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            delegates: Vec::new(),
        }
    }

    pub fn add(&mut self, description: impl Into<AnalysisEngineDescription>) -> &mut Self {
        self.delegates.push(description.into());
        self
    }

    pub fn create_aggregate_description(self) -> AnalysisEngineDescription {
        AnalysisEngineDescription::Aggregate {
            name: self.name.unwrap_or_else(|| "AggregateAnalysisEngine".to_string()),
            delegates: self.delegates,
        }
    }
}

/// Tempo gasto por cada anotador em uma execução.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    pub timings: Vec<(String, u64)>,
    pub processing_ms: u64,
}

/// Executa todos os anotadores da descrição, em ordem, sobre o documento.
pub fn run_pipeline(cas: &mut Cas, description: &AnalysisEngineDescription) -> Result<RunStats> {
    let start = Instant::now();
    let mut stats = RunStats::default();
    run_description(cas, description, &mut stats)?;
    stats.processing_ms = start.elapsed().as_millis() as u64;
    info!(
        "pipeline '{}' concluído em {} ms ({} entidades)",
        description.name(),
        stats.processing_ms,
        cas.entities.len()
    );
    Ok(stats)
}

fn run_description(
    cas: &mut Cas,
    description: &AnalysisEngineDescription,
    stats: &mut RunStats,
) -> Result<()> {
    match description {
        AnalysisEngineDescription::Primitive(annotator) => {
            let t = Instant::now();
            annotator.process(cas).map_err(|e| match e {
                PipelineError::Process { .. } => e,
                other => PipelineError::process(annotator.name(), other.to_string()),
            })?;
            let elapsed = t.elapsed().as_millis() as u64;
            debug!("{} processou o documento em {} ms", annotator.name(), elapsed);
            stats.timings.push((annotator.name().to_string(), elapsed));
        }
        AnalysisEngineDescription::Aggregate { delegates, .. } => {
            for delegate in delegates {
                run_description(cas, delegate, stats)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cas::{LookupWindow, Span};

    struct AddWindow(usize, usize);

    impl Annotator for AddWindow {
        fn name(&self) -> &str {
            "AddWindow"
        }

        fn process(&self, cas: &mut Cas) -> Result<()> {
            cas.lookup_windows.add(LookupWindow { span: Span::new(self.0, self.1) });
            Ok(())
        }
    }

    struct Fails;

    impl Annotator for Fails {
        fn name(&self) -> &str {
            "Fails"
        }

        fn process(&self, _cas: &mut Cas) -> Result<()> {
            Err(PipelineError::Io(std::io::Error::other("boom")))
        }
    }

    #[test]
    fn test_nested_aggregate_runs_in_order() {
        let mut inner = AggregateBuilder::named("Inner");
        inner.add(AddWindow(0, 2)).add(AddWindow(3, 4));
        let mut outer = AggregateBuilder::new();
        outer.add(inner.create_aggregate_description()).add(AddWindow(5, 9));
        let aed = outer.create_aggregate_description();

        assert_eq!(aed.flattened_names(), vec!["AddWindow", "AddWindow", "AddWindow"]);

        let mut cas = Cas::new("0123456789");
        let stats = run_pipeline(&mut cas, &aed).unwrap();
        assert_eq!(cas.lookup_windows.len(), 3);
        assert_eq!(stats.timings.len(), 3);
    }

    #[test]
    fn test_failure_aborts_run() {
        let mut builder = AggregateBuilder::new();
        builder.add(Fails).add(AddWindow(0, 1));
        let aed = builder.create_aggregate_description();

        let mut cas = Cas::new("abc");
        let err = run_pipeline(&mut cas, &aed).unwrap_err();
        assert!(matches!(err, PipelineError::Process { ref component, .. } if component == "Fails"));
        assert!(cas.lookup_windows.is_empty());
    }
}
