//! File-level conversion pipeline: load, transform, translate, write.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::encoding::{EncodingError, decode_xml};
use crate::parser::{ParseError, parse_document};
use crate::rdm::Document;
use crate::serializer::{to_yaml, write_file};
use crate::translator::{TranslateError, Translation, translate};

/// External XSLT processor used for `Transform::Xslt`.
const XSLT_PROCESSOR: &str = "xsltproc";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Source file does not exist: {}", .0.display())]
    SourceMissing(PathBuf),
    #[error("Transformation template does not exist: {}", .0.display())]
    TemplateMissing(PathBuf),
    #[error("Failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("Failed to decode {}: {source}", .path.display())]
    Encoding { path: PathBuf, source: EncodingError },
    #[error("Transformation with {} failed: {message}", .template.display())]
    Transform { template: PathBuf, message: String },
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Translation error: {0}")]
    Translate(#[from] TranslateError),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// How the source export is brought into canonical `<table>` shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Transform {
    /// The source already uses the canonical shape.
    #[default]
    None,
    /// Run an XSL template over the source first.
    Xslt { template: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Path(PathBuf),
    Stdout,
}

impl Output {
    /// `-` means stdout.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdout
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    pub source: PathBuf,
    pub output: Output,
    pub transform: Transform,
}

/// Parse and translate an in-memory XML document.
pub fn convert_str(xml: &str) -> Result<Translation, ConvertError> {
    let doc = parse_document(xml)?;
    Ok(translate(&doc)?)
}

pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    /// Check preconditions and load the canonical document.
    pub fn load(&self) -> Result<Document, ConvertError> {
        let source = &self.options.source;
        if !source.exists() {
            return Err(ConvertError::SourceMissing(source.clone()));
        }

        let xml = match &self.options.transform {
            Transform::None => read_source(source)?,
            Transform::Xslt { template } => {
                if !template.exists() {
                    return Err(ConvertError::TemplateMissing(template.clone()));
                }
                tracing::info!("transforming {} with {}", source.display(), template.display());
                run_xslt(template, source)?
            }
        };

        let doc = parse_document(&xml)?;
        tracing::info!("loaded {}", source.display());
        Ok(doc)
    }

    /// Run the whole conversion and write the YAML to the configured output.
    pub fn run(&self) -> Result<Translation, ConvertError> {
        let doc = self.load()?;
        let translation = translate(&doc)?;
        tracing::info!(
            classes = translation.schema.len(),
            warnings = translation.warnings.len(),
            "translated schema"
        );
        if translation.schema.is_empty() {
            tracing::warn!("no <table> elements in {}", self.options.source.display());
        }
        for warning in &translation.warnings {
            tracing::warn!("{warning}");
        }

        let yaml = to_yaml(&translation.schema)?;
        match &self.options.output {
            Output::Path(path) => {
                write_file(path, &yaml).map_err(|source| ConvertError::Io {
                    path: path.clone(),
                    source,
                })?;
                tracing::info!("wrote {}", path.display());
            }
            Output::Stdout => {
                io::stdout()
                    .write_all(yaml.as_bytes())
                    .map_err(|source| ConvertError::Io {
                        path: PathBuf::from("-"),
                        source,
                    })?;
            }
        }

        Ok(translation)
    }
}

fn read_source(path: &Path) -> Result<String, ConvertError> {
    let bytes = fs::read(path).map_err(|source| ConvertError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_xml(bytes).map_err(|source| ConvertError::Encoding {
        path: path.to_path_buf(),
        source,
    })
}

fn run_xslt(template: &Path, source: &Path) -> Result<String, ConvertError> {
    let transform_error = |message: String| ConvertError::Transform {
        template: template.to_path_buf(),
        message,
    };

    let output = Command::new(XSLT_PROCESSOR)
        .arg(template)
        .arg(source)
        .output()
        .map_err(|e| transform_error(format!("could not run {XSLT_PROCESSOR}: {e}")))?;

    if !output.status.success() {
        return Err(transform_error(format!(
            "{XSLT_PROCESSOR} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    decode_xml(output.stdout).map_err(|e| transform_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOP: &str = r#"<?xml version="1.0"?>
        <database name="shop">
            <table name="customer">
                <column name="id" type="INTEGER" primaryKey="true" autoIncrement="true"/>
                <column name="email" type="STRING" size="120" required="true"/>
                <unique name="customer_email"><unique-column name="email"/></unique>
            </table>
            <table name="sales_order">
                <column name="id" type="INTEGER" primaryKey="true"/>
                <column name="customer_id" type="INTEGER"/>
                <foreign-key foreignTable="customer" onDelete="setnull">
                    <reference local="customer_id" foreign="id"/>
                </foreign-key>
                <foreign-key foreignTable="coupon"/>
            </table>
        </database>
    "#;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dbdoctrine-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_convert_str() {
        let t = convert_str(SHOP).unwrap();
        assert_eq!(t.schema.len(), 2);
        let order = t.schema.get("SalesOrder").unwrap();
        assert_eq!(order.relations["Customer"].on_delete, "null");
        assert_eq!(order.relations["Customer"].foreign_alias, "SalesOrders");
        assert_eq!(t.warnings.len(), 1);
    }

    #[test]
    fn test_convert_str_parse_error() {
        assert!(matches!(
            convert_str("<database><table name=\"a\"></database>"),
            Err(ConvertError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_source() {
        let converter = Converter::new(ConvertOptions {
            source: PathBuf::from("/nonexistent/model.xml"),
            output: Output::Stdout,
            transform: Transform::None,
        });
        assert!(matches!(converter.run(), Err(ConvertError::SourceMissing(_))));
    }

    #[test]
    fn test_missing_template() {
        let dir = scratch_dir("template");
        let source = dir.join("model.xml");
        fs::write(&source, SHOP).unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Path(dir.join("schema.yml")),
            transform: Transform::Xslt {
                template: dir.join("missing.xsl"),
            },
        });
        assert!(matches!(converter.run(), Err(ConvertError::TemplateMissing(_))));
        assert!(!dir.join("schema.yml").exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_writes_yaml() {
        let dir = scratch_dir("run");
        let source = dir.join("model.xml");
        let output = dir.join("config").join("doctrine").join("schema.yml");
        fs::write(&source, SHOP).unwrap();
        fs::create_dir_all(output.parent().unwrap()).unwrap();
        fs::write(&output, "stale: true\n").unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Path(output.clone()),
            transform: Transform::None,
        });
        let translation = converter.run().unwrap();
        assert_eq!(translation.schema.len(), 2);

        let written = fs::read_to_string(&output).unwrap();
        assert!(!written.contains("stale"));
        assert_eq!(written, to_yaml(&translation.schema).unwrap());

        // Same input, same bytes.
        converter.run().unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), written);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_template_is_transform_error() {
        let dir = scratch_dir("badxsl");
        let source = dir.join("model.xml");
        let template = dir.join("broken.xsl");
        let output = dir.join("schema.yml");
        fs::write(&source, SHOP).unwrap();
        fs::write(&template, "this is not a stylesheet").unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Path(output.clone()),
            transform: Transform::Xslt {
                template: template.clone(),
            },
        });
        // Fails whether xsltproc is missing or rejects the template.
        match converter.run() {
            Err(ConvertError::Transform { template: t, message }) => {
                assert_eq!(t, template);
                assert!(message.contains(XSLT_PROCESSOR));
            }
            other => panic!("expected transform error, got {other:?}"),
        }
        assert!(!output.exists());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_latin1_source() {
        let dir = scratch_dir("latin1");
        let source = dir.join("model.xml");
        let output = dir.join("schema.yml");
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<database>\
            <table name=\"caf".to_vec();
        bytes.extend_from_slice(b"\xE9\"><column name=\"id\" type=\"INTEGER\"/></table></database>");
        fs::write(&source, bytes).unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Path(output.clone()),
            transform: Transform::None,
        });
        let translation = converter.run().unwrap();
        assert_eq!(translation.schema.get("Café").unwrap().table_name, "café");
        assert!(fs::read_to_string(&output).unwrap().contains("café"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unsupported_source_encoding() {
        let dir = scratch_dir("encoding");
        let source = dir.join("model.xml");
        fs::write(&source, "<?xml version=\"1.0\" encoding=\"EBCDIC\"?><database/>").unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Stdout,
            transform: Transform::None,
        });
        assert!(matches!(converter.run(), Err(ConvertError::Encoding { .. })));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_run_without_tables() {
        let dir = scratch_dir("empty");
        let source = dir.join("model.xml");
        let output = dir.join("schema.yml");
        fs::write(&source, "<database name=\"blank\"/>").unwrap();

        let converter = Converter::new(ConvertOptions {
            source,
            output: Output::Path(output.clone()),
            transform: Transform::None,
        });
        let translation = converter.run().unwrap();
        assert!(translation.schema.is_empty());
        assert!(translation.warnings.is_empty());
        assert_eq!(fs::read_to_string(&output).unwrap().trim(), "{}");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_output_from_arg() {
        assert_eq!(Output::from_arg("-"), Output::Stdout);
        assert_eq!(
            Output::from_arg("schema.yml"),
            Output::Path(PathBuf::from("schema.yml"))
        );
    }
}
