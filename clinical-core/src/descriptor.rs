//! # Descritor XML do Pipeline
//!
//! Exporta uma [`AnalysisEngineDescription`] como `analysisEngineDescription`
//! no formato de especificadores de recursos do UIMA. Agregados listam seus
//! delegados e a ordem de execução (`fixedFlow`); primitivos exportam o nome
//! do anotador e os parâmetros de configuração.
//!
//! Cada delegado recebe a chave `<nome>-<posição>`, única dentro do agregado
//! mesmo quando o mesmo anotador aparece duas vezes (ex: dois `ChunkAdjuster`).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::engine::AnalysisEngineDescription;
use crate::error::Result;

const RESOURCE_SPECIFIER_NS: &str = "http://uima.apache.org/resourceSpecifier";

fn text_element<W: Write>(xml: &mut Writer<W>, tag: &str, text: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(tag)))?;
    xml.write_event(Event::Text(BytesText::new(text)))?;
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn start<W: Write>(xml: &mut Writer<W>, tag: &str) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new(tag)))?;
    Ok(())
}

fn end<W: Write>(xml: &mut Writer<W>, tag: &str) -> Result<()> {
    xml.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

fn delegate_keys(delegates: &[AnalysisEngineDescription]) -> Vec<String> {
    delegates
        .iter()
        .enumerate()
        .map(|(i, d)| format!("{}-{}", d.name(), i))
        .collect()
}

fn write_description<W: Write>(
    xml: &mut Writer<W>,
    description: &AnalysisEngineDescription,
    root: bool,
) -> Result<()> {
    let mut element = BytesStart::new("analysisEngineDescription");
    if root {
        element.push_attribute(("xmlns", RESOURCE_SPECIFIER_NS));
    }
    xml.write_event(Event::Start(element))?;
    text_element(xml, "frameworkImplementation", "org.apache.uima.java")?;
    text_element(xml, "primitive", &description.is_primitive().to_string())?;

    match description {
        AnalysisEngineDescription::Primitive(annotator) => {
            text_element(xml, "annotatorImplementationName", annotator.name())?;
            start(xml, "analysisEngineMetaData")?;
            text_element(xml, "name", annotator.name())?;

            let parameters = annotator.parameters();
            if !parameters.is_empty() {
                start(xml, "configurationParameterSettings")?;
                for (name, value) in &parameters {
                    start(xml, "nameValuePair")?;
                    text_element(xml, "name", name)?;
                    start(xml, "value")?;
                    text_element(xml, "string", value)?;
                    end(xml, "value")?;
                    end(xml, "nameValuePair")?;
                }
                end(xml, "configurationParameterSettings")?;
            }
            end(xml, "analysisEngineMetaData")?;
        }
        AnalysisEngineDescription::Aggregate { name, delegates } => {
            let keys = delegate_keys(delegates);

            start(xml, "delegateAnalysisEngineSpecifiers")?;
            for (key, delegate) in keys.iter().zip(delegates) {
                let mut element = BytesStart::new("delegateAnalysisEngine");
                element.push_attribute(("key", key.as_str()));
                xml.write_event(Event::Start(element))?;
                write_description(xml, delegate, false)?;
                end(xml, "delegateAnalysisEngine")?;
            }
            end(xml, "delegateAnalysisEngineSpecifiers")?;

            start(xml, "analysisEngineMetaData")?;
            text_element(xml, "name", name)?;
            start(xml, "flowConstraints")?;
            start(xml, "fixedFlow")?;
            for key in &keys {
                text_element(xml, "node", key)?;
            }
            end(xml, "fixedFlow")?;
            end(xml, "flowConstraints")?;
            end(xml, "analysisEngineMetaData")?;
        }
    }

    end(xml, "analysisEngineDescription")
}

impl AnalysisEngineDescription {
    /// Escreve o descritor XML em `writer`.
    pub fn to_xml<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new_with_indent(writer, b' ', 2);
        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        write_description(&mut xml, self, true)?;
        xml.into_inner().flush()?;
        Ok(())
    }

    /// Escreve o descritor XML no arquivo `path` (sobrescrevendo-o).
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.to_xml(BufWriter::new(file))?;
        tracing::info!("descritor '{}' escrito em {}", self.name(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::ChunkAdjuster;
    use crate::engine::AggregateBuilder;
    use crate::segment::SimpleSegmentAnnotator;

    fn xml_of(description: &AnalysisEngineDescription) -> String {
        let mut out = Vec::new();
        description.to_xml(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_primitive_descriptor_exports_parameters() {
        let xml = xml_of(&AnalysisEngineDescription::from(SimpleSegmentAnnotator::new()));
        assert!(xml.contains("<primitive>true</primitive>"));
        assert!(xml.contains("<name>SegmentID</name>"));
        assert!(xml.contains("<string>SIMPLE_SEGMENT</string>"));
        assert!(xml.contains(RESOURCE_SPECIFIER_NS));
    }

    #[test]
    fn test_aggregate_keys_are_unique() {
        let mut builder = AggregateBuilder::named("Adjusters");
        builder
            .add(ChunkAdjuster::new(&["NP", "NP"], 1).unwrap())
            .add(ChunkAdjuster::new(&["NP", "PP", "NP"], 2).unwrap());
        let xml = xml_of(&builder.create_aggregate_description());

        assert!(xml.contains("<primitive>false</primitive>"));
        assert!(xml.contains("<node>ChunkAdjuster-0</node>"));
        assert!(xml.contains("<node>ChunkAdjuster-1</node>"));
        assert!(xml.contains("<string>NP PP NP</string>"));
        assert_eq!(xml.matches("xmlns=").count(), 1);
    }

    #[test]
    fn test_write_to_overwrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        std::fs::write(&path, "texto original").unwrap();
        AnalysisEngineDescription::from(SimpleSegmentAnnotator::new())
            .write_to(&path)
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("analysisEngineDescription"));
        assert!(!content.contains("texto original"));
    }
}
