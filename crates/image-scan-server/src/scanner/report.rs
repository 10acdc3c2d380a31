use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use super::errors::Result;

/// The subset of a Trivy JSON report used to take a decision.
///
/// Only the top level document has to be a JSON object. Everything below it
/// is read leniently: missing keys and values of an unexpected type decode to
/// their default, so they contribute nothing to the vulnerability count.
#[derive(Debug, Default, Deserialize)]
pub struct ScanReport {
    #[serde(rename = "ArtifactName", default, deserialize_with = "lenient")]
    pub artifact_name: Option<String>,

    #[serde(rename = "Results", default, deserialize_with = "lenient_seq")]
    pub results: Vec<ScanTarget>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanTarget {
    #[serde(rename = "Target", default, deserialize_with = "lenient")]
    pub target: Option<String>,

    #[serde(rename = "Vulnerabilities", default, deserialize_with = "lenient_seq")]
    pub vulnerabilities: Vec<Vulnerability>,
}

/// A single finding. Every entry of a `Vulnerabilities` list is counted,
/// whatever its shape, the identifiers are only used for logging.
#[derive(Debug, Default, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "VulnerabilityID", default, deserialize_with = "lenient")]
    pub id: Option<String>,

    #[serde(rename = "PkgName", default, deserialize_with = "lenient")]
    pub package: Option<String>,
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let id = self.id.as_deref().unwrap_or("unknown");
        match &self.package {
            Some(package) => write!(f, "{id} ({package})"),
            None => write!(f, "{id}"),
        }
    }
}

impl ScanReport {
    /// Decode a raw scanner report. Fails when the input is not a JSON object.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let document: serde_json::Map<String, Value> = serde_json::from_slice(raw)?;
        Ok(ScanReport::deserialize(Value::Object(document))?)
    }

    /// Number of entries found inside of all the `Vulnerabilities` lists.
    /// The severity filter is applied by the scanner invocation.
    pub fn critical_vulnerabilities(&self) -> usize {
        self.results
            .iter()
            .map(|result| result.vulnerabilities.len())
            .sum()
    }

    /// Human readable list of the findings, as `<id> (<package>)`
    pub fn findings(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|result| result.vulnerabilities.iter())
            .map(|vulnerability| vulnerability.to_string())
            .collect()
    }
}

/// Count the CRITICAL vulnerabilities reported inside of `raw`.
pub fn count_critical_vulnerabilities(raw: &[u8]) -> Result<usize> {
    Ok(ScanReport::from_slice(raw)?.critical_vulnerabilities())
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

// Items that cannot be decoded are kept as default values: a list entry always
// counts, even when its content is unexpected
fn lenient_seq<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| T::deserialize(item).unwrap_or_default())
            .collect(),
        _ => Vec::new(),
    };
    Ok(items)
}
