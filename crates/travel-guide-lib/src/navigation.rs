//! Fragment routes between the list, detail and admin pages

use crate::store::GuideStore;
use std::fmt;

/// A page of the application, addressed by a URL-style fragment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    List,
    Admin,
    CountryDetail(String),
}

const ADMIN_FRAGMENT: &str = "admin";
const COUNTRY_PREFIX: &str = "country/";

impl Page {
    /// Parse a fragment such as `#country/3`; unknown fragments mean the list
    pub fn parse(fragment: &str) -> Page {
        let fragment = fragment.trim().trim_start_matches('#').trim_start_matches('/');
        if fragment == ADMIN_FRAGMENT {
            return Page::Admin;
        }
        match fragment.strip_prefix(COUNTRY_PREFIX) {
            Some(id) if !id.is_empty() => Page::CountryDetail(id.to_string()),
            _ => Page::List,
        }
    }

    /// Fragment without the leading `#`
    pub fn fragment(&self) -> String {
        match self {
            Page::List => String::new(),
            Page::Admin => ADMIN_FRAGMENT.to_string(),
            Page::CountryDetail(id) => format!("{COUNTRY_PREFIX}{id}"),
        }
    }

    /// Replace a detail page whose country no longer exists with the list
    pub fn resolve(self, store: &GuideStore) -> Page {
        match self {
            Page::CountryDetail(id) if store.find_country(&id).is_none() => {
                tracing::debug!("Country {id} not found, showing the list");
                Page::List
            }
            page => page,
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.fragment())
    }
}

/// Holds the current fragment and reports when it changes
///
/// Views call [`Navigator::navigate`]; the shell calls [`Navigator::poll`]
/// once per frame and switches page when it returns `Some`.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    fragment: String,
    observed: Option<String>,
}

impl Navigator {
    pub fn new(initial_fragment: &str) -> Self {
        Self {
            fragment: Page::parse(initial_fragment).fragment(),
            observed: None,
        }
    }

    pub fn navigate(&mut self, page: &Page) {
        self.fragment = page.fragment();
        tracing::debug!("Navigating to #{}", self.fragment);
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn current(&self) -> Page {
        Page::parse(&self.fragment)
    }

    /// The new page if the fragment changed since the last poll
    pub fn poll(&mut self) -> Option<Page> {
        if self.observed.as_deref() == Some(self.fragment.as_str()) {
            return None;
        }
        self.observed = Some(self.fragment.clone());
        Some(self.current())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fragments() {
        assert_eq!(Page::parse(""), Page::List);
        assert_eq!(Page::parse("#"), Page::List);
        assert_eq!(Page::parse("#admin"), Page::Admin);
        assert_eq!(Page::parse("admin"), Page::Admin);
        assert_eq!(
            Page::parse("#country/3"),
            Page::CountryDetail("3".to_string())
        );
        assert_eq!(Page::parse("#country/"), Page::List);
        assert_eq!(Page::parse("#somewhere"), Page::List);
    }

    #[test]
    fn test_fragment_round_trip() {
        for page in [
            Page::List,
            Page::Admin,
            Page::CountryDetail("city_42".into()),
        ] {
            assert_eq!(Page::parse(&page.fragment()), page);
        }
        assert_eq!(Page::CountryDetail("7".into()).to_string(), "#country/7");
    }

    #[test]
    fn test_unknown_country_resolves_to_list() {
        let store = GuideStore::from_json(r#"[{"id":"1","country":"Japan"}]"#).unwrap();
        assert_eq!(
            Page::CountryDetail("1".into()).resolve(&store),
            Page::CountryDetail("1".into())
        );
        assert_eq!(Page::CountryDetail("9".into()).resolve(&store), Page::List);
        assert_eq!(Page::Admin.resolve(&store), Page::Admin);
    }

    #[test]
    fn test_poll_reports_changes_once() {
        let mut navigator = Navigator::new("#admin");
        assert_eq!(navigator.poll(), Some(Page::Admin));
        assert_eq!(navigator.poll(), None);

        navigator.navigate(&Page::CountryDetail("2".into()));
        assert_eq!(navigator.fragment(), "country/2");
        assert_eq!(navigator.poll(), Some(Page::CountryDetail("2".into())));
        assert_eq!(navigator.poll(), None);

        // Navigating to the page already shown is not a change
        navigator.navigate(&Page::CountryDetail("2".into()));
        assert_eq!(navigator.poll(), None);

        navigator.navigate(&Page::List);
        assert_eq!(navigator.poll(), Some(Page::List));
    }
}
