use crate::error::ProbeError;
use crate::probe::{Probe, ProbeContext, ProbeKind};
use tracing::{debug, warn};
use vertrack_types::component::{ProbeResult, SubVersion};

const VERSION_DELIMITER: &str = "_version-";
const MANIFEST_SUFFIX: &str = "_manifest";

/// Recover `(name, version)` from a `<name>_version-<version>_manifest.<ext>` file name.
pub fn parse_manifest_file_name(file_name: &str) -> Option<(&str, &str)> {
    let stem = file_name
        .rsplit_once('.')
        .map_or(file_name, |(stem, _ext)| stem);
    let body = stem.strip_suffix(MANIFEST_SUFFIX)?;
    let (name, version) = body.split_once(VERSION_DELIMITER)?;
    if name.is_empty() || version.is_empty() {
        return None;
    }
    Some((name, version))
}

/// Versions encoded in file names, one sub-version per file.
#[derive(Debug, Clone)]
pub struct FilenameConventionProbe {
    dir_pattern: String,
    prefix: String,
    extension: String,
}

impl FilenameConventionProbe {
    pub fn new(
        dir_pattern: impl Into<String>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            dir_pattern: dir_pattern.into(),
            prefix: prefix.into(),
            extension: extension.into(),
        }
    }

    fn pattern(&self) -> String {
        format!(
            "{}/{}*{}*{}.{}",
            self.dir_pattern.trim_end_matches('/'),
            self.prefix,
            VERSION_DELIMITER,
            MANIFEST_SUFFIX,
            self.extension
        )
    }
}

impl Probe for FilenameConventionProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::FilenameConvention
    }

    fn describe(&self) -> String {
        self.pattern()
    }

    fn probe(&self, ctx: &ProbeContext<'_>) -> Result<ProbeResult, ProbeError> {
        let pattern = self.pattern();
        let found = ctx.project.glob(&pattern).map_err(|e| ProbeError::Io {
            path: pattern.clone(),
            message: format!("{e:#}"),
        })?;

        let mut names: Vec<&str> = found.iter().filter_map(|p| p.file_name()).collect();
        names.sort_unstable();
        names.dedup();

        let mut sub_versions = Vec::new();
        for file_name in names {
            match parse_manifest_file_name(file_name) {
                Some((name, version)) if name.starts_with(&self.prefix) => {
                    sub_versions.push(SubVersion::new(name, Some(version.to_string())));
                }
                _ => debug!(file = %file_name, "skipping non-conforming manifest name"),
            }
        }

        if sub_versions.is_empty() {
            warn!(pattern = %pattern, "no version manifests found");
            return Ok(ProbeResult::absent());
        }

        let version = sub_versions[0].version.clone();
        debug!(pattern = %pattern, count = sub_versions.len(), "resolved from file names");
        Ok(ProbeResult {
            version,
            sub_versions,
        })
    }
}
