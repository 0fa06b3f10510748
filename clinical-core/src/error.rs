//! # Erros do Pipeline
//!
//! Todos os estágios retornam [`PipelineError`]. Falhas durante a montagem do
//! pipeline (ex: dicionário ausente) são `Initialization`; falhas de um anotador
//! durante o processamento abortam a execução inteira com `Process`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Um componente não pôde ser construído (recurso ausente, parâmetro inválido).
    #[error("falha ao inicializar '{component}': {message}")]
    Initialization { component: String, message: String },

    /// Um anotador falhou ao processar o documento.
    #[error("falha ao processar com '{component}': {message}")]
    Process { component: String, message: String },

    #[error("erro de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("erro de XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("configuração inválida: {0}")]
    Config(#[from] toml::de::Error),

    /// Nome de pipeline desconhecido (ex: `--pipeline rapido`).
    #[error("pipeline desconhecido: {0}")]
    UnknownPipeline(String),
}

impl PipelineError {
    pub fn init(component: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Initialization {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn process(component: impl Into<String>, message: impl Into<String>) -> Self {
        PipelineError::Process {
            component: component.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
