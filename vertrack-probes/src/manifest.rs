use crate::drain::scalar_to_string;
use crate::error::ProbeError;
use crate::probe::{Probe, ProbeContext, ProbeKind};
use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;
use tracing::{debug, warn};
use vertrack_types::component::{ProbeResult, SubVersion};

/// What to pull out of a dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionRule {
    /// Attribute values of `element` nodes, e.g. `<androidPackage spec="group:artifact:1.2.3"/>`.
    XmlAttribute {
        element: String,
        attribute: String,
        /// Only values containing this substring are kept.
        contains: Option<String>,
        delimiter: char,
    },
    /// Nested key lookup in a JSON document, e.g. `["version"]` in a package.json.
    JsonKey { path: Vec<String> },
}

/// Reads versions out of a manifest file found under the project root.
#[derive(Debug, Clone)]
pub struct ManifestFileProbe {
    pattern: String,
    rule: ExtractionRule,
}

impl ManifestFileProbe {
    pub fn new(pattern: impl Into<String>, rule: ExtractionRule) -> Self {
        Self {
            pattern: pattern.into(),
            rule,
        }
    }

    pub fn xml(
        pattern: impl Into<String>,
        element: &str,
        attribute: &str,
        contains: &str,
        delimiter: char,
    ) -> Self {
        Self::new(
            pattern,
            ExtractionRule::XmlAttribute {
                element: element.to_string(),
                attribute: attribute.to_string(),
                contains: Some(contains.to_string()),
                delimiter,
            },
        )
    }

    pub fn json(pattern: impl Into<String>, path: &[&str]) -> Self {
        Self::new(
            pattern,
            ExtractionRule::JsonKey {
                path: path.iter().map(|s| s.to_string()).collect(),
            },
        )
    }
}

impl Probe for ManifestFileProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::ManifestFile
    }

    fn describe(&self) -> String {
        self.pattern.clone()
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let found = ctx.project.glob(&self.pattern).map_err(|e| ProbeError::Io {
            path: self.pattern.clone(),
            message: format!("{e:#}"),
        })?;

        let Some(path) = found.first() else {
            warn!(pattern = %self.pattern, "manifest not found");
            return Ok(ProbeResult::absent());
        };
        if found.len() > 1 {
            debug!(pattern = %self.pattern, count = found.len(), using = %path, "several manifests match");
        }

        let contents = ctx
            .project
            .read_to_string(path)
            .map_err(|e| ProbeError::Io {
                path: path.to_string(),
                message: format!("{e:#}"),
            })?;

        let result = match &self.rule {
            ExtractionRule::XmlAttribute {
                element,
                attribute,
                contains,
                delimiter,
            } => {
                let values = extract_xml_attribute(&contents, element, attribute, contains.as_deref())
                    .map_err(|message| ProbeError::Xml {
                        path: path.to_string(),
                        message,
                    })?;
                let sub_versions: Vec<SubVersion> = values
                    .iter()
                    .map(|spec| {
                        let (name, version) = split_spec(spec, *delimiter);
                        SubVersion::new(name, Some(version.to_string()))
                    })
                    .collect();
                ProbeResult {
                    version: sub_versions.first().and_then(|s| s.version.clone()),
                    sub_versions,
                }
            }
            ExtractionRule::JsonKey { path: key_path } => {
                let doc: Value =
                    serde_json::from_str(&contents).map_err(|e| ProbeError::Json {
                        path: path.to_string(),
                        message: e.to_string(),
                    })?;
                match extract_json_key(&doc, key_path) {
                    Some(version) => ProbeResult::version(version),
                    None => ProbeResult::absent(),
                }
            }
        };

        if result.is_absent() {
            warn!(path = %path, "manifest holds no matching version");
        } else {
            debug!(path = %path, version = ?result.version, "resolved from manifest");
        }
        Ok(result)
    }
}

/// Values of `attribute` on every `element` node, in document order.
///
/// Namespace prefixes are ignored on both element and attribute names.
pub fn extract_xml_attribute(
    xml: &str,
    element: &str,
    attribute: &str,
    contains: Option<&str>,
) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) | Event::Empty(e) => {
                if e.local_name().as_ref() != element.as_bytes() {
                    continue;
                }
                for attr in e.attributes() {
                    let attr = attr.map_err(|e| e.to_string())?;
                    if attr.key.local_name().as_ref() != attribute.as_bytes() {
                        continue;
                    }
                    let raw = std::str::from_utf8(&attr.value).map_err(|e| e.to_string())?;
                    let value = quick_xml::escape::unescape(raw).map_err(|e| e.to_string())?;
                    if contains.is_none_or(|needle| value.contains(needle)) {
                        out.push(value.into_owned());
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(out)
}

/// Split a dependency spec into `(name, version)`.
///
/// The version is the last segment and the name the one before it:
/// `com.example:widget:1.2.3` gives `("widget", "1.2.3")`. A spec without the delimiter is
/// returned as both name and version.
pub fn split_spec(spec: &str, delimiter: char) -> (&str, &str) {
    match spec.rsplit_once(delimiter) {
        Some((head, version)) => {
            let name = head.rsplit(delimiter).next().unwrap_or(head);
            (name, version)
        }
        None => (spec, spec),
    }
}

/// String or number at a nested key path.
pub fn extract_json_key<S: AsRef<str>>(doc: &Value, path: &[S]) -> Option<String> {
    path.iter()
        .try_fold(doc, |node, key| node.get(key.as_ref()))
        .and_then(scalar_to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIREBASE_DEPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<dependencies>
  <androidPackages>
    <androidPackage spec="com.google.firebase:firebase-common:21.0.0">
      <repositories><repository>Assets/Firebase/m2repository</repository></repositories>
    </androidPackage>
    <androidPackage spec="com.google.firebase:firebase-app-unity:12.1.0"/>
  </androidPackages>
  <iosPods>
    <iosPod name="Firebase/Core" version="11.0.0"/>
  </iosPods>
</dependencies>
"#;

    #[test]
    fn split_spec_takes_last_two_segments() {
        assert_eq!(split_spec("com.example:widget:1.2.3", ':'), ("widget", "1.2.3"));
        assert_eq!(split_spec("widget:1.2.3", ':'), ("widget", "1.2.3"));
        assert_eq!(split_spec("1.2.3", ':'), ("1.2.3", "1.2.3"));
    }

    #[test]
    fn xml_attribute_filters_by_substring() {
        let values =
            extract_xml_attribute(FIREBASE_DEPS, "androidPackage", "spec", Some("unity"))
                .expect("valid xml");
        assert_eq!(values, vec!["com.google.firebase:firebase-app-unity:12.1.0"]);
    }

    #[test]
    fn xml_attribute_without_filter_keeps_document_order() {
        let values = extract_xml_attribute(FIREBASE_DEPS, "androidPackage", "spec", None)
            .expect("valid xml");
        assert_eq!(values.len(), 2);
        assert!(values[0].contains("firebase-common"));
    }

    #[test]
    fn xml_attribute_unescapes_entities() {
        let xml = r#"<deps><pkg spec="a&amp;b:1.0"/></deps>"#;
        let values = extract_xml_attribute(xml, "pkg", "spec", None).expect("valid xml");
        assert_eq!(values, vec!["a&b:1.0"]);
    }

    #[test]
    fn malformed_xml_is_an_error() {
        let xml = "<deps><pkg spec=\"a:1.0\"></deps>";
        assert!(extract_xml_attribute(xml, "pkg", "spec", None).is_err());
    }

    #[test]
    fn json_key_accepts_strings_and_numbers() {
        let doc = json!({ "version": "5.0.1", "meta": { "build": 42 }, "flag": true });
        assert_eq!(extract_json_key(&doc, &["version"]).as_deref(), Some("5.0.1"));
        assert_eq!(extract_json_key(&doc, &["meta", "build"]).as_deref(), Some("42"));
        assert_eq!(extract_json_key(&doc, &["flag"]), None);
        assert_eq!(extract_json_key(&doc, &["missing"]), None);
    }
}
