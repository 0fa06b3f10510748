//! # Configuração do Pipeline
//!
//! Arquivo TOML opcional; toda chave ausente assume o valor padrão, então um
//! arquivo vazio reproduz o comportamento embutido.
//!
//! ```toml
//! [dictionary]
//! path = "/opt/dicts/cardio.bsv"   # substitui o dicionário embutido
//! min_term_length = 3
//!
//! [assertion]
//! scope = 6
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::assertion::DEFAULT_SCOPE;
use crate::error::Result;

fn default_min_term_length() -> usize {
    2
}

fn default_scope() -> usize {
    DEFAULT_SCOPE
}

/// Fonte de termos da busca em dicionário.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryConfig {
    /// Arquivo BSV (`CUI|TUI|termo`); `None` usa o dicionário embutido.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_min_term_length")]
    pub min_term_length: usize,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            path: None,
            min_term_length: default_min_term_length(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssertionConfig {
    /// Palavras consideradas de cada lado da entidade.
    #[serde(default = "default_scope")]
    pub scope: usize,
}

impl Default for AssertionConfig {
    fn default() -> Self {
        Self {
            scope: default_scope(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub dictionary: DictionaryConfig,
    #[serde(default)]
    pub assertion: AssertionConfig,
}

impl PipelineConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Lê a configuração de `path`. Caminhos relativos do dicionário são
    /// resolvidos a partir do diretório do arquivo.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml(&content)?;
        if let (Some(dict), Some(dir)) = (config.dictionary.path.as_mut(), path.parent()) {
            if dict.is_relative() {
                *dict = dir.join(&*dict);
            }
        }
        tracing::debug!("configuração carregada de {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.assertion.scope, DEFAULT_SCOPE);
        assert!(config.dictionary.path.is_none());
    }

    #[test]
    fn test_partial_config() {
        let config = PipelineConfig::from_toml("[assertion]\nscope = 8\n").unwrap();
        assert_eq!(config.assertion.scope, 8);
        assert_eq!(config.dictionary.min_term_length, 2);
    }

    #[test]
    fn test_invalid_config() {
        let err = PipelineConfig::from_toml("[assertion]\nscope = \"largo\"\n").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_relative_dictionary_path_resolved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[dictionary]\npath = \"terms.bsv\"\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.dictionary.path, Some(dir.path().join("terms.bsv")));
    }
}
