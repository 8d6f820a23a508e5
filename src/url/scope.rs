use crate::config::SiteEntry;

/// Checks whether `candidate` lies under the site rooted at `root`
///
/// The candidate must start with the root URL. When the root does not end in
/// `/`, the prefix must also end on a boundary, so `https://a.test` claims
/// `https://a.test/page` but not `https://a.test.example.net/`.
pub fn is_within_site(root: &str, candidate: &str) -> bool {
    let Some(rest) = candidate.strip_prefix(root) else {
        return false;
    };

    if root.ends_with('/') {
        return true;
    }

    matches!(rest.chars().next(), None | Some('/') | Some('?') | Some('#'))
}

/// The configured sites, used to decide which site owns a URL
#[derive(Debug, Clone, Default)]
pub struct SiteScopes {
    sites: Vec<SiteEntry>,
}

impl SiteScopes {
    pub fn from_config(sites: &[SiteEntry]) -> Self {
        Self {
            sites: sites.to_vec(),
        }
    }

    /// Returns the first configured site whose root covers `url`
    pub fn find_site(&self, url: &str) -> Option<&SiteEntry> {
        self.sites.iter().find(|site| is_within_site(&site.url, url))
    }

    pub fn sites(&self) -> &[SiteEntry] {
        &self.sites
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
