/// Which download hosts get renamed. An empty filter allows every host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostFilter {
    hosts: Vec<String>,
}

impl HostFilter {
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| h.as_ref().trim().to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Filter that allows everything.
    pub fn any() -> Self {
        Self::default()
    }

    /// True when downloads from `url` should be renamed. With a non-empty
    /// filter, URLs that do not parse are never allowed.
    pub fn allows(&self, url: &str) -> bool {
        if self.hosts.is_empty() {
            return true;
        }
        let Some(host) = url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) else {
            return false;
        };
        self.hosts.iter().any(|h| h.eq_ignore_ascii_case(&host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filter_allows_everything() {
        let filter = HostFilter::any();
        assert!(filter.allows("https://anything.example/x.pdf"));
        assert!(filter.allows("not a url"));
    }

    #[test]
    fn listed_hosts_only() {
        let filter = HostFilter::new(["exambase-lib-hku-hk.eproxy.lib.hku.hk"]);
        assert!(filter.allows("https://exambase-lib-hku-hk.eproxy.lib.hku.hk/archive/files/a.pdf"));
        assert!(filter.allows("https://EXAMBASE-LIB-HKU-HK.eproxy.lib.hku.hk/a.pdf"));
        assert!(!filter.allows("https://example.com/a.pdf"));
        assert!(!filter.allows("not a url"));
    }

    #[test]
    fn blank_entries_are_ignored() {
        assert_eq!(HostFilter::new(["", "  "]), HostFilter::any());
    }
}
