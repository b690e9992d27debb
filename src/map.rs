//! Route configuration and the compiled route table.
//!
//! [`RouteMap::build`] walks a declarative [`RouteConfig`] tree and
//! produces the lookup structure the matcher scans: an insertion-ordered
//! list of distinct normalized paths (wildcards demoted to the tail), a
//! path → record map and a name → record map. Records are immutable once
//! built and shared via `Rc`; the map is the arena, and a record points at
//! its parent by normalized path rather than by reference, so ancestor
//! chains are reconstructed by lookup and no reference cycles exist.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::guard::{GuardDecision, NavigationGuard};
use crate::location::LocationSpec;
use crate::path::clean_path;
use crate::pattern::{PatternOptions, RoutePattern};
use crate::route::Route;

/// The view-slot name used when a config declares a single component.
pub const DEFAULT_SLOT: &str = "default";

/// How params are passed to one view slot's component.
#[derive(Debug, Clone, PartialEq)]
pub enum PropsMode {
    /// Forward the route params as component props.
    Params,
    /// Pass a fixed set of values.
    Values(HashMap<String, String>),
}

/// Prop-passing configuration as written in a [`RouteConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum PropsSpec {
    /// Applies to the single (default) slot.
    Single(PropsMode),
    /// Explicit per-slot configuration.
    PerSlot(HashMap<String, PropsMode>),
}

/// Where a redirect points once evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum RedirectTarget {
    /// Path shorthand, promoted to a path-only location spec.
    Path(String),
    /// Full location spec; omitted fields inherit from the original
    /// location.
    Spec(LocationSpec),
}

/// A record's redirect: a fixed target or a function of the provisionally
/// resolved route.
#[derive(Clone)]
pub enum Redirect {
    Target(RedirectTarget),
    Dynamic(Rc<dyn Fn(&Route) -> RedirectTarget>),
}

impl Redirect {
    pub fn path(path: impl Into<String>) -> Self {
        Redirect::Target(RedirectTarget::Path(path.into()))
    }

    pub fn spec(spec: LocationSpec) -> Self {
        Redirect::Target(RedirectTarget::Spec(spec))
    }

    pub fn dynamic(f: impl Fn(&Route) -> RedirectTarget + 'static) -> Self {
        Redirect::Dynamic(Rc::new(f))
    }
}

impl fmt::Debug for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redirect::Target(target) => f.debug_tuple("Target").field(target).finish(),
            Redirect::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// One entry of the declarative route configuration.
///
/// # Examples
///
/// ```
/// use waymark::map::RouteConfig;
///
/// let config = RouteConfig::new("/user/:id")
///     .with_name("user")
///     .with_component("UserView")
///     .with_child(RouteConfig::new("posts").with_component("UserPosts"));
/// ```
#[derive(Clone, Default)]
pub struct RouteConfig {
    pub path: String,
    pub name: Option<String>,
    pub component: Option<String>,
    pub components: HashMap<String, String>,
    pub children: Vec<RouteConfig>,
    pub redirect: Option<Redirect>,
    pub alias: Vec<String>,
    pub before_enter: Option<Rc<NavigationGuard>>,
    pub meta: HashMap<String, String>,
    pub props: Option<PropsSpec>,
    pub case_sensitive: Option<bool>,
    pub strict: Option<bool>,
}

impl fmt::Debug for RouteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteConfig")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("children", &self.children)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), ..Self::default() }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Declares named view slots explicitly.
    pub fn with_components<I, K, V>(mut self, components: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.components
            .extend(components.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_child(mut self, child: RouteConfig) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = RouteConfig>,
    {
        self.children.extend(children);
        self
    }

    pub fn with_redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alias.extend(aliases.into_iter().map(|s| s.into()));
        self
    }

    pub fn with_before_enter(
        mut self,
        guard: impl Fn(&Route, &Route) -> GuardDecision + 'static,
    ) -> Self {
        self.before_enter = Some(Rc::new(guard));
        self
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn with_props(mut self, props: PropsSpec) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = Some(case_sensitive);
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }
}

/// The compiled, immutable description of one configured path.
pub struct RouteRecord {
    /// Normalized path template.
    pub path: String,
    /// Compiled matcher for the template.
    pub pattern: RoutePattern,
    /// View-slot name → component handle.
    pub components: HashMap<String, String>,
    pub name: Option<String>,
    /// Parent record's normalized path; the owning map is the arena.
    pub parent: Option<String>,
    /// Set when this record is an alias: the canonical record's path.
    pub match_as: Option<String>,
    pub redirect: Option<Redirect>,
    pub before_enter: Option<Rc<NavigationGuard>>,
    pub meta: HashMap<String, String>,
    /// Per-slot prop-passing configuration.
    pub props: HashMap<String, PropsMode>,
}

impl fmt::Debug for RouteRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteRecord")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("match_as", &self.match_as)
            .finish_non_exhaustive()
    }
}

/// The compiled route table.
#[derive(Default)]
pub struct RouteMap {
    path_list: Vec<String>,
    path_map: HashMap<String, Rc<RouteRecord>>,
    name_map: HashMap<String, Rc<RouteRecord>>,
}

impl RouteMap {
    /// Builds a table from a configuration tree.
    pub fn build(configs: &[RouteConfig]) -> Self {
        let mut map = Self::default();
        map.add_routes(configs);
        map
    }

    /// Appends additional configuration entries.
    ///
    /// Previously returned records stay valid: the collections are
    /// append-only apart from the wildcard demotion pass.
    pub fn add_routes(&mut self, configs: &[RouteConfig]) {
        for config in configs {
            self.add_route_record(config, None, None);
        }

        // Wildcard routes are matching candidates of last resort: move
        // them to the tail, preserving their relative order.
        let (wildcards, normal): (Vec<_>, Vec<_>) =
            self.path_list.drain(..).partition(|p| p == "*");
        self.path_list = normal;
        self.path_list.extend(wildcards);
    }

    fn add_route_record(
        &mut self,
        config: &RouteConfig,
        parent: Option<&Rc<RouteRecord>>,
        match_as: Option<String>,
    ) {
        let strict = config.strict.unwrap_or(false);
        let path = normalize_record_path(&config.path, parent.map(|p| p.path.as_str()), strict);
        let options = PatternOptions {
            sensitive: config.case_sensitive.unwrap_or(false),
            strict,
        };

        let components = if !config.components.is_empty() {
            config.components.clone()
        } else if let Some(component) = &config.component {
            HashMap::from([(DEFAULT_SLOT.to_string(), component.clone())])
        } else {
            HashMap::new()
        };

        let props = match &config.props {
            None => HashMap::new(),
            Some(PropsSpec::Single(mode)) => {
                HashMap::from([(DEFAULT_SLOT.to_string(), mode.clone())])
            }
            Some(PropsSpec::PerSlot(per_slot)) => per_slot.clone(),
        };

        let record = Rc::new(RouteRecord {
            pattern: RoutePattern::compile(&path, options),
            path,
            components,
            name: config.name.clone(),
            parent: parent.map(|p| p.path.clone()),
            match_as: match_as.clone(),
            redirect: config.redirect.clone(),
            before_enter: config.before_enter.clone(),
            meta: config.meta.clone(),
            props,
        });

        if config.name.is_some()
            && config.redirect.is_none()
            && config
                .children
                .iter()
                .any(|child| matches!(child.path.as_str(), "" | "/"))
        {
            tracing::warn!(
                name = config.name.as_deref().unwrap_or(""),
                "named route has a default child; navigating to it by name will not \
                 resolve the child. Name the default child instead"
            );
        }

        for child in &config.children {
            let child_match_as = match_as
                .as_ref()
                .map(|m| clean_path(&format!("{}/{}", m, child.path)));
            self.add_route_record(child, Some(&record), child_match_as);
        }

        // First registration wins; later duplicates are silently ignored
        // so an alias cannot clobber a canonical record.
        if !self.path_map.contains_key(&record.path) {
            self.path_list.push(record.path.clone());
            self.path_map.insert(record.path.clone(), Rc::clone(&record));
        }

        for alias in &config.alias {
            if alias == &record.path {
                tracing::warn!(path = %record.path, "alias is identical to the route path");
                continue;
            }
            let alias_config = RouteConfig {
                path: alias.clone(),
                children: config.children.clone(),
                ..RouteConfig::default()
            };
            let canonical = if record.path.is_empty() {
                "/".to_string()
            } else {
                record.path.clone()
            };
            self.add_route_record(&alias_config, parent, Some(canonical));
        }

        if let Some(name) = &config.name {
            if !self.name_map.contains_key(name) {
                self.name_map.insert(name.clone(), Rc::clone(&record));
            } else if match_as.is_none() {
                tracing::warn!(name = %name, path = %record.path, "duplicate named route definition");
            }
        }
    }

    /// Ordered matching candidates (wildcards last).
    pub fn path_list(&self) -> &[String] {
        &self.path_list
    }

    pub fn by_path(&self, path: &str) -> Option<&Rc<RouteRecord>> {
        self.path_map.get(path)
    }

    pub fn by_name(&self, name: &str) -> Option<&Rc<RouteRecord>> {
        self.name_map.get(name)
    }

    /// Reconstructs the ancestor chain for a record, root first.
    pub fn ancestors(&self, record: &Rc<RouteRecord>) -> Vec<Rc<RouteRecord>> {
        let mut chain = vec![Rc::clone(record)];
        let mut parent = record.parent.clone();
        while let Some(path) = parent {
            match self.path_map.get(&path) {
                Some(record) => {
                    chain.push(Rc::clone(record));
                    parent = record.parent.clone();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }
}

fn normalize_record_path(path: &str, parent: Option<&str>, strict: bool) -> String {
    let path = if strict { path } else { path.trim_end_matches('/') };
    if path.starts_with('/') {
        return path.to_string();
    }
    match parent {
        None => path.to_string(),
        Some(parent_path) => clean_path(&format!("{}/{}", parent_path, path)),
    }
}
