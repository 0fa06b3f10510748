//! # clinical-core — Pipeline de Anotação de Textos Clínicos
//!
//! Este crate monta e executa pipelines de análise de notas clínicas em inglês, no
//! modelo de anotadores encadeados sobre um documento compartilhado ([`Cas`]).
//! Cada estágio lê as anotações dos anteriores e acrescenta as suas.
//!
//! ## Arquitetura do Sistema
//!
//! 1.  **Entrada**: Texto bruto da nota (String), dentro de um [`Cas`].
//! 2.  **Segmentação** ([`segment`]): Um segmento cobrindo o documento e as sentenças.
//! 3.  **Tokenização** ([`tokenizer`], [`lvg`], [`context`]): Tokens PTB, formas
//!     canônicas e tokens contextuais (datas, medidas, horários...).
//! 4.  **Sintaxe** ([`pos`], [`chunker`], [`parser`]): Classes gramaticais, chunks,
//!     árvore de constituintes e dependências.
//! 5.  **Busca em Dicionário** ([`lookup_window`], [`dictionary`]): Janelas de busca
//!     e entidades com conceitos UMLS.
//! 6.  **Asserção** ([`assertion`]): Polaridade, incerteza, histórico, condição,
//!     genericidade e sujeito de cada entidade.
//! 7.  **Saída**: XMI do documento ([`xmi`]), descritor do pipeline ([`descriptor`])
//!     e relatório textual ([`report`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use clinical_core::{factory, run_pipeline, Cas};
//!
//! // 1. Monta a descrição do pipeline rápido (dicionário embutido)
//! let pipeline = factory::fast_pipeline().unwrap();
//!
//! // 2. Executa sobre uma nota
//! let mut cas = Cas::new("Patient denies chest pain.\n");
//! run_pipeline(&mut cas, &pipeline).unwrap();
//!
//! // 3. Lê as entidades anotadas
//! let pain = cas.entities.iter().find(|e| e.covered_text == "chest pain").unwrap();
//! assert_eq!(pain.polarity, -1);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`factory`]: As variantes nomeadas de pipeline.
//! - [`engine`]: Anotadores, descrições agregadas e execução.
//! - [`cas`]: O documento e seus índices de anotação.
//! - [`config`]: Configuração TOML (dicionário e escopo das asserções).

pub mod assertion;
pub mod cas;
pub mod chunker;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod dictionary;
pub mod engine;
pub mod error;
pub mod factory;
pub mod lookup_window;
pub mod lvg;
pub mod parser;
pub mod pos;
pub mod report;
pub mod segment;
pub mod tokenizer;
pub mod xmi;

pub use cas::{Cas, IdentifiedAnnotation, Span, UmlsConcept};
pub use config::PipelineConfig;
pub use engine::{run_pipeline, AggregateBuilder, AnalysisEngineDescription, Annotator, RunStats};
pub use error::{PipelineError, Result};
pub use factory::PipelineKind;
pub use xmi::{serialize_xmi, write_xmi};
