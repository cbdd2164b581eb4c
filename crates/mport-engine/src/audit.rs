//! CVE Audit: for every installed package with a CPE, fetch and report
//! matching advisories from a remote endpoint.
//!
//! A network or parse failure for one package is a `Warn`, not a `Fatal` —
//! the audit keeps going and reports what it could gather, the same way the
//! teacher's index refresh degrades per-mirror rather than aborting.

use crate::callbacks::Callbacks;
use crate::error::{EngineError, Severity};
use mport_schema::PackageName;
use mport_store::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RawAdvisory {
    #[serde(rename = "cveId")]
    cve_id: Option<String>,
    description: Option<String>,
}

/// One matched advisory against one installed package.
#[derive(Debug, Clone, Serialize)]
pub struct Advisory {
    /// The CVE identifier, if the document carried one.
    pub cve_id: Option<String>,
    /// A human-readable summary, if the document carried one.
    pub description: Option<String>,
}

/// One package's audit section: the package name and whatever advisories
/// matched its CPE, or the warning that kept it from being checked.
#[derive(Debug)]
pub struct PackageAudit {
    /// The audited package.
    pub package: PackageName,
    /// Advisories returned for this package's CPE, empty if none matched.
    pub advisories: Vec<Advisory>,
    /// Set when the fetch or parse for this package failed; the overall
    /// audit still continues to the next package.
    pub warning: Option<EngineError>,
}

/// Fetch and report CVE advisories for every installed package carrying a
/// CPE, against `endpoint` (a base URL taking `?cpe=<value>`).
pub async fn audit(
    catalog: &Catalog,
    endpoint: &str,
    client: &reqwest::Client,
    callbacks: &Arc<dyn Callbacks>,
) -> Result<Vec<PackageAudit>, EngineError> {
    let packages = catalog.list_packages()?;
    let targets: Vec<_> = packages.into_iter().filter(|p| p.cpe.is_some()).collect();

    callbacks.progress_init("auditing", targets.len() as u64);
    let mut reports = Vec::with_capacity(targets.len());

    for pkg in targets {
        let cpe = pkg.cpe.clone().expect("filtered above");
        let report = match fetch_advisories(endpoint, &cpe, client).await {
            Ok(advisories) => PackageAudit {
                package: pkg.name,
                advisories,
                warning: None,
            },
            Err(e) => PackageAudit {
                package: pkg.name.clone(),
                advisories: Vec::new(),
                warning: Some(EngineError {
                    severity: Severity::Warn,
                    operation: "audit",
                    package: Some(pkg.name),
                    source: Box::new(e),
                }),
            },
        };
        callbacks.progress_step();
        reports.push(report);
    }
    callbacks.progress_done();

    Ok(reports)
}

async fn fetch_advisories(
    endpoint: &str,
    cpe: &str,
    client: &reqwest::Client,
) -> Result<Vec<Advisory>, reqwest::Error> {
    let response = client.get(endpoint).query(&[("cpe", cpe)]).send().await?;
    let raw: Vec<RawAdvisory> = response.error_for_status()?.json().await?;
    Ok(raw
        .into_iter()
        .map(|a| Advisory {
            cve_id: a.cve_id,
            description: a.description,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::NullCallbacks;

    #[tokio::test]
    async fn skips_packages_with_no_cpe() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog
            .raw()
            .execute(
                "INSERT INTO packages (name, version, origin, prefix, status, install_date, cpe) \
                 VALUES ('no-cpe', '1.0', '', '/usr/local', 'clean', '', NULL)",
                [],
            )
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let client = reqwest::Client::new();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);

        let reports = audit(&catalog, &server.url(), &client, &callbacks).await.unwrap();
        assert!(reports.is_empty());
        server.checkpoint();
    }

    #[tokio::test]
    async fn matches_one_advisory_for_a_cpe() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog
            .raw()
            .execute(
                "INSERT INTO packages (name, version, origin, prefix, status, install_date, cpe) \
                 VALUES ('openssl', '3.0', '', '/usr/local', 'clean', '', 'cpe:/a:openssl:openssl:3.0')",
                [],
            )
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .match_query(mockito::Matcher::UrlEncoded("cpe".into(), "cpe:/a:openssl:openssl:3.0".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"cveId":"CVE-2024-0001","description":"example"}]"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        let reports = audit(&catalog, &server.url(), &client, &callbacks).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert!(reports[0].warning.is_none());
        assert_eq!(reports[0].advisories.len(), 1);
        assert_eq!(reports[0].advisories[0].cve_id.as_deref(), Some("CVE-2024-0001"));
    }

    #[tokio::test]
    async fn network_failure_warns_without_aborting() {
        let mut catalog = Catalog::open_in_memory().unwrap();
        catalog
            .raw()
            .execute(
                "INSERT INTO packages (name, version, origin, prefix, status, install_date, cpe) \
                 VALUES ('broken', '1.0', '', '/usr/local', 'clean', '', 'cpe:/a:broken:broken:1.0')",
                [],
            )
            .unwrap();

        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let callbacks: Arc<dyn Callbacks> = Arc::new(NullCallbacks);
        let reports = audit(&catalog, &server.url(), &client, &callbacks).await.unwrap();

        assert_eq!(reports.len(), 1);
        assert!(reports[0].warning.is_some());
        assert_eq!(reports[0].warning.as_ref().unwrap().severity, Severity::Warn);
    }
}
