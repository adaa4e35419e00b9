//! Partitioning of the effective route set into named documentation groups.
//!
//! Groups are declared as an ordered list of `(name, patterns)` pairs. Each route
//! is assigned to the first group whose patterns match its path; routes matching
//! nothing stay ungrouped. Membership is computed from the effective set only, so
//! an inactive route can never show up in a group.

use crate::{
    profile::Profile,
    routes::registry::{EffectiveRoute, EffectiveRouteSet},
};

/// PathPattern
///
/// Glob-style path matcher.
/// - `/a/**` matches `/a` itself and anything below `/a/`.
/// - `/a/*` matches exactly one segment below `/a`.
/// - anything else matches the path exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathPattern {
    Exact(String),
    SingleLevel(String),
    Subtree(String),
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        if let Some(base) = pattern.strip_suffix("/**") {
            PathPattern::Subtree(base.to_string())
        } else if let Some(base) = pattern.strip_suffix("/*") {
            PathPattern::SingleLevel(base.to_string())
        } else {
            PathPattern::Exact(pattern.to_string())
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Exact(expected) => path == expected,
            PathPattern::Subtree(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            PathPattern::SingleLevel(base) => path
                .strip_prefix(base.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains('/')),
        }
    }
}

/// A declared documentation group, optionally present only under one profile.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupDeclaration {
    pub name: String,
    pub patterns: Vec<PathPattern>,
    pub profile: Option<Profile>,
}

impl GroupDeclaration {
    pub fn new<'a>(name: impl Into<String>, patterns: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(PathPattern::parse).collect(),
            profile: None,
        }
    }

    pub fn for_profile(mut self, profile: Profile) -> Self {
        self.profile = Some(profile);
        self
    }

    fn is_declared_for(&self, profile: Profile) -> bool {
        self.profile.is_none_or(|declared| declared == profile)
    }

    fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }
}

/// A group and its member routes, in effective-set order.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub name: String,
    pub routes: Vec<EffectiveRoute>,
}

/// GroupingIndex
///
/// Frozen group membership for the running process.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupingIndex {
    groups: Vec<Group>,
    ungrouped: Vec<EffectiveRoute>,
}

impl GroupingIndex {
    /// build
    ///
    /// Declarations gated on another profile are skipped. Declarations sharing a
    /// name are merged into the first one, keeping its position.
    pub fn build(
        declarations: &[GroupDeclaration],
        routes: &EffectiveRouteSet,
        profile: Profile,
    ) -> Self {
        let mut active: Vec<GroupDeclaration> = Vec::new();
        for declaration in declarations.iter().filter(|d| d.is_declared_for(profile)) {
            match active.iter_mut().find(|a| a.name == declaration.name) {
                Some(existing) => existing.patterns.extend(declaration.patterns.iter().cloned()),
                None => active.push(declaration.clone()),
            }
        }

        let mut groups: Vec<Group> = active
            .iter()
            .map(|declaration| Group {
                name: declaration.name.clone(),
                routes: Vec::new(),
            })
            .collect();
        let mut ungrouped = Vec::new();

        for route in routes {
            match active.iter().position(|declaration| declaration.matches(route.path())) {
                Some(index) => groups[index].routes.push(route.clone()),
                None => ungrouped.push(route.clone()),
            }
        }

        Self { groups, ungrouped }
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|group| group.name == name)
    }

    pub fn ungrouped(&self) -> &[EffectiveRoute] {
        &self.ungrouped
    }

    pub fn group_names(&self) -> Vec<&str> {
        self.groups.iter().map(|group| group.name.as_str()).collect()
    }
}
