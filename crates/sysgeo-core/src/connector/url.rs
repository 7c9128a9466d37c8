use super::error::ConnectorError;
use std::fmt;
use std::str::FromStr;

/// Which kind of document state a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WvmKind {
    Workspace,
    Version,
    Microversion,
}

impl WvmKind {
    /// The single-letter path segment used by the Onshape API (`w`, `v` or `m`).
    pub fn code(&self) -> &'static str {
        match self {
            WvmKind::Workspace => "w",
            WvmKind::Version => "v",
            WvmKind::Microversion => "m",
        }
    }
}

impl FromStr for WvmKind {
    type Err = ConnectorError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "w" => Ok(WvmKind::Workspace),
            "v" => Ok(WvmKind::Version),
            "m" => Ok(WvmKind::Microversion),
            _ => Err(ConnectorError::InvalidUrl {
                url: s.to_string(),
                reason: "expected 'w', 'v' or 'm'".to_string(),
            }),
        }
    }
}

impl fmt::Display for WvmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A reference to one element of an Onshape document at a workspace, version or microversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentRef {
    pub document_id: String,
    pub wvm: WvmKind,
    pub wvm_id: String,
    pub element_id: String,
}

impl DocumentRef {
    pub fn workspace(
        document_id: impl Into<String>,
        workspace_id: impl Into<String>,
        element_id: impl Into<String>,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            wvm: WvmKind::Workspace,
            wvm_id: workspace_id.into(),
            element_id: element_id.into(),
        }
    }

    /// The `d/{did}/{wvm}/{wvmid}/e/{eid}` path fragment shared by element endpoints.
    pub fn api_path(&self) -> String {
        format!(
            "d/{}/{}/{}/e/{}",
            self.document_id, self.wvm, self.wvm_id, self.element_id
        )
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/documents/{}/{}/{}/e/{}",
            self.document_id, self.wvm, self.wvm_id, self.element_id
        )
    }
}

/// Extracts the document reference from an Onshape document URL.
///
/// Accepts any URL containing `/documents/{did}/{w|v|m}/{id}/e/{eid}`; a query string or
/// fragment after the element id is ignored.
///
/// # Errors
///
/// Returns [`ConnectorError::InvalidUrl`] if the pattern is not found.
pub fn parse_onshape_url(url: &str) -> Result<DocumentRef, ConnectorError> {
    let invalid = |reason: &str| ConnectorError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let (_, rest) = url
        .split_once("/documents/")
        .ok_or_else(|| invalid("missing '/documents/' segment"))?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = rest.split('/').collect();

    match segments.as_slice() {
        [did, wvm, wvm_id, "e", eid, ..]
            if !did.is_empty() && !wvm_id.is_empty() && !eid.is_empty() =>
        {
            let wvm = wvm
                .parse::<WvmKind>()
                .map_err(|_| invalid("expected 'w', 'v' or 'm' after the document id"))?;
            Ok(DocumentRef {
                document_id: did.to_string(),
                wvm,
                wvm_id: wvm_id.to_string(),
                element_id: eid.to_string(),
            })
        }
        _ => Err(invalid("expected /documents/{did}/{w|v|m}/{id}/e/{eid}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_workspace_url() {
        let url = "https://cad.onshape.com/documents/91f152e2325e166b5ae98f4d/w/a89e4484f3b58b05d188dde4/e/ac851a7987c86e8a7e563127";
        let doc = parse_onshape_url(url).unwrap();
        assert_eq!(doc.document_id, "91f152e2325e166b5ae98f4d");
        assert_eq!(doc.wvm, WvmKind::Workspace);
        assert_eq!(doc.wvm_id, "a89e4484f3b58b05d188dde4");
        assert_eq!(doc.element_id, "ac851a7987c86e8a7e563127");
        assert_eq!(
            doc.api_path(),
            "d/91f152e2325e166b5ae98f4d/w/a89e4484f3b58b05d188dde4/e/ac851a7987c86e8a7e563127"
        );
    }

    #[test]
    fn parses_version_and_microversion_urls_with_query() {
        let url = "https://cad.onshape.com/documents/d1/v/v1/e/e1?renderMode=0";
        let v = parse_onshape_url(url).unwrap();
        assert_eq!(v.wvm, WvmKind::Version);
        assert_eq!(v.element_id, "e1");

        let m = parse_onshape_url("https://cad.onshape.com/documents/d1/m/m1/e/e1#tab").unwrap();
        assert_eq!(m.wvm, WvmKind::Microversion);
        assert_eq!(m.element_id, "e1");
    }

    #[test]
    fn rejects_urls_without_element() {
        for url in [
            "https://cad.onshape.com/documents/d1/w/w1",
            "https://cad.onshape.com/documents/d1/x/w1/e/e1",
            "https://example.com/not-onshape",
            "https://cad.onshape.com/documents/d1/w/w1/e/",
        ] {
            assert!(
                matches!(parse_onshape_url(url), Err(ConnectorError::InvalidUrl { .. })),
                "{url} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips_through_parser() {
        let doc = DocumentRef::workspace("d", "w", "e");
        let url = format!("https://cad.onshape.com{doc}");
        assert_eq!(parse_onshape_url(&url).unwrap(), doc);
    }
}
