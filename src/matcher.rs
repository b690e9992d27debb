//! Location resolution against the route table.
//!
//! The matcher owns the [`RouteMap`] and turns normalized locations into
//! [`Route`] snapshots, following redirects and aliases along the way.
//! Matching never fails: an unresolvable location yields a route with an
//! empty matched chain, and the caller decides what that means.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::RouterError;
use crate::location::{normalize_location, Location, LocationSpec, RawLocation};
use crate::map::{Redirect, RedirectTarget, RouteConfig, RouteMap, RouteRecord};
use crate::path::resolve_path;
use crate::pattern::{fill_params, PATH_MATCH};
use crate::query::{ParseQuery, StringifyQuery};
use crate::route::{create_route, Route};

pub struct Matcher {
    map: RefCell<RouteMap>,
    parse_query: ParseQuery,
    stringify_query: StringifyQuery,
}

impl Matcher {
    pub fn new(
        configs: &[RouteConfig],
        parse_query: ParseQuery,
        stringify_query: StringifyQuery,
    ) -> Self {
        Self {
            map: RefCell::new(RouteMap::build(configs)),
            parse_query,
            stringify_query,
        }
    }

    /// Appends routes to the table. Existing registrations win conflicts.
    pub fn add_routes(&self, configs: &[RouteConfig]) {
        self.map.borrow_mut().add_routes(configs);
    }

    pub(crate) fn stringify_query(&self) -> StringifyQuery {
        self.stringify_query
    }

    pub(crate) fn parse_query(&self) -> ParseQuery {
        self.parse_query
    }

    /// Resolves a raw navigation intent into a route snapshot.
    pub fn match_location(
        &self,
        raw: &RawLocation,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Route {
        let location = normalize_location(raw, current, false, self.parse_query);
        self.match_normalized(location, current, redirected_from)
    }

    fn match_normalized(
        &self,
        mut location: Location,
        current: Option<&Route>,
        redirected_from: Option<&Location>,
    ) -> Route {
        if let Some(name) = location.name.clone() {
            let record = self.map.borrow().by_name(&name).cloned();
            let record = match record {
                Some(record) => record,
                None => {
                    tracing::warn!(name = %name, "no route named this; check route configuration");
                    return self.unmatched(&location, redirected_from);
                }
            };

            // A named navigation inherits the required params it does not
            // supply from the current route.
            if let Some(current) = current {
                for key in record.pattern.required_keys() {
                    if !location.params.contains_key(key) {
                        if let Some(value) = current.params.get(key) {
                            location.params.insert(key.to_string(), value.clone());
                        }
                    }
                }
            }

            match fill_params(&record.path, &location.params) {
                Ok(path) => location.path = Some(path),
                Err(err) => {
                    tracing::warn!(%err, "cannot build path for named route");
                    location.path = Some(String::new());
                }
            }
            return self.finish(&record, location, redirected_from);
        }

        if location.path.is_some() {
            if let Some(record) = self.match_path(&mut location) {
                return self.finish(&record, location, redirected_from);
            }
        }

        self.unmatched(&location, redirected_from)
    }

    /// Scans the ordered path list for the first pattern that matches,
    /// filling `location.params` from the captures.
    fn match_path(&self, location: &mut Location) -> Option<Rc<RouteRecord>> {
        let path = location.path.clone()?;
        let map = self.map.borrow();
        for candidate in map.path_list() {
            let record = map.by_path(candidate)?;
            if let Some(captures) = record.pattern.captures(&path) {
                for (key, value) in record.pattern.keys().iter().zip(captures) {
                    if let Some(value) = value {
                        let name = key.name.as_deref().unwrap_or(PATH_MATCH);
                        location.params.insert(name.to_string(), decode_param(&value));
                    }
                }
                return Some(Rc::clone(record));
            }
        }
        None
    }

    fn finish(
        &self,
        record: &Rc<RouteRecord>,
        location: Location,
        redirected_from: Option<&Location>,
    ) -> Route {
        if record.redirect.is_some() {
            let original = redirected_from.cloned().unwrap_or_else(|| location.clone());
            return self.redirect(record, location, &original);
        }
        if let Some(match_as) = record.match_as.clone() {
            return self.alias(record, location, &match_as, redirected_from);
        }
        let matched = self.map.borrow().ancestors(record);
        create_route(
            Some(record),
            &location,
            matched,
            redirected_from,
            self.stringify_query,
        )
    }

    /// Evaluates a record's redirect and re-enters matching at the target.
    ///
    /// Target fields the redirect omits (params, query, hash) are
    /// inherited from the original location, so `/a -> /b` keeps
    /// `?foo=bar#frag` intact.
    fn redirect(
        &self,
        record: &Rc<RouteRecord>,
        location: Location,
        original: &Location,
    ) -> Route {
        let target = match record.redirect.as_ref() {
            Some(Redirect::Target(target)) => target.clone(),
            Some(Redirect::Dynamic(eval)) => {
                // The callback sees the route as it would have resolved
                // without the redirect.
                let matched = self.map.borrow().ancestors(record);
                let provisional =
                    create_route(Some(record), &location, matched, None, self.stringify_query);
                eval(&provisional)
            }
            None => return self.unmatched(&location, None),
        };

        let spec = match target {
            RedirectTarget::Path(path) => LocationSpec::path(path),
            RedirectTarget::Spec(spec) => spec,
        };

        let params = spec.params.unwrap_or_else(|| original.params.clone());
        let query = spec.query.unwrap_or_else(|| original.query.clone());
        let mut hash = spec.hash.unwrap_or_else(|| original.hash.clone());
        if !hash.is_empty() && !hash.starts_with('#') {
            hash.insert(0, '#');
        }

        if let Some(name) = spec.name {
            if self.map.borrow().by_name(&name).is_none() {
                tracing::warn!(name = %name, "redirect target route does not exist");
                return self.unmatched(original, None);
            }
            return self.match_normalized(
                Location { name: Some(name), path: None, params, query, hash },
                None,
                Some(original),
            );
        }

        if let Some(path) = spec.path {
            // A relative redirect target resolves against the record's
            // parent, the same base its own template was joined with.
            let parent = self.parent_path(record);
            let raw_path = resolve_path(&path, &parent, true);
            let resolved = match fill_params(&raw_path, &params) {
                Ok(resolved) => resolved,
                Err(err) => {
                    tracing::warn!(%err, "cannot build redirect target path");
                    return self.unmatched(original, None);
                }
            };
            return self.match_normalized(
                Location { name: None, path: Some(resolved), params, query, hash },
                None,
                Some(original),
            );
        }

        let err = RouterError::InvalidRedirect { path: record.path.clone() };
        tracing::warn!(%err, "redirect target ignored");
        self.unmatched(original, None)
    }

    /// Re-matches an alias record's canonical path and adopts the
    /// canonical matched chain, keeping the requested location.
    fn alias(
        &self,
        record: &Rc<RouteRecord>,
        mut location: Location,
        match_as: &str,
        redirected_from: Option<&Location>,
    ) -> Route {
        let aliased_path = match fill_params(match_as, &location.params) {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(%err, "cannot build canonical path for alias");
                return self.unmatched(&location, redirected_from);
            }
        };

        let aliased = self.match_normalized(
            Location::from_path(aliased_path),
            None,
            None,
        );
        if let Some(canonical) = aliased.matched.last() {
            location.params = aliased.params.clone();
            let matched = self.map.borrow().ancestors(canonical);
            return create_route(
                Some(canonical),
                &location,
                matched,
                redirected_from,
                self.stringify_query,
            );
        }

        tracing::warn!(path = %record.path, canonical = %match_as, "alias target did not match");
        self.unmatched(&location, redirected_from)
    }

    fn parent_path(&self, record: &Rc<RouteRecord>) -> String {
        record
            .parent
            .as_deref()
            .map(|p| if p.is_empty() { "/" } else { p })
            .unwrap_or("/")
            .to_string()
    }

    fn unmatched(&self, location: &Location, redirected_from: Option<&Location>) -> Route {
        create_route(None, location, Vec::new(), redirected_from, self.stringify_query)
    }
}

fn decode_param(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(value) => value.into_owned(),
        Err(_) => raw.to_string(),
    }
}
