use demo_endpoints::{
    ConfigSources, GroupDeclaration, GroupingIndex, PathPattern, Profile, effective_routes,
    routes::{
        catalog::{catalog, group_declarations},
        registry::RouteDefinition,
    },
};

fn paths(routes: &[demo_endpoints::routes::registry::EffectiveRoute]) -> Vec<&str> {
    routes.iter().map(|route| route.path()).collect()
}

// --- Patterns ---

#[test]
fn test_subtree_pattern() {
    let pattern = PathPattern::parse("/groupA/**");
    assert_eq!(pattern, PathPattern::Subtree("/groupA".into()));
    assert!(pattern.matches("/groupA"));
    assert!(pattern.matches("/groupA/x"));
    assert!(pattern.matches("/groupA/x/y"));
    assert!(!pattern.matches("/groupAB"));
    assert!(!pattern.matches("/other/groupA"));
}

#[test]
fn test_single_level_pattern() {
    let pattern = PathPattern::parse("/groupB/*");
    assert!(pattern.matches("/groupB/first"));
    assert!(!pattern.matches("/groupB"));
    assert!(!pattern.matches("/groupB/"));
    assert!(!pattern.matches("/groupB/first/deeper"));
}

#[test]
fn test_exact_pattern() {
    let pattern = PathPattern::parse("/hello/world");
    assert!(pattern.matches("/hello/world"));
    assert!(!pattern.matches("/hello/world/again"));
}

#[test]
fn test_root_subtree_matches_everything() {
    let pattern = PathPattern::parse("/**");
    assert!(pattern.matches("/"));
    assert!(pattern.matches("/anything/at/all"));
}

// --- Index ---

#[test]
fn test_grouped_profile_partitions_routes() {
    let profile = Profile::MultipleGroupedApis;
    let routes = effective_routes(&catalog(), &ConfigSources::new().into_snapshot(), profile);
    let index = GroupingIndex::build(&group_declarations(), &routes, profile);

    assert_eq!(index.group_names(), vec!["groupA", "groupB"]);
    assert_eq!(paths(&index.group("groupA").unwrap().routes), vec!["/groupA"]);
    assert_eq!(
        paths(&index.group("groupB").unwrap().routes),
        vec!["/groupB/first", "/groupB/second"]
    );
    assert_eq!(paths(index.ungrouped()), vec!["/hello/world"]);
}

#[test]
fn test_groups_are_not_declared_under_other_profiles() {
    let profile = Profile::None;
    let routes = effective_routes(&catalog(), &ConfigSources::new().into_snapshot(), profile);
    let index = GroupingIndex::build(&group_declarations(), &routes, profile);

    assert!(index.groups().is_empty());
    assert_eq!(paths(index.ungrouped()), vec!["/hello/world"]);
}

#[test]
fn test_first_matching_group_wins() {
    let catalog = vec![
        RouteDefinition::get("/api/users", "users"),
        RouteDefinition::get("/api/users/admins", "admins"),
    ];
    let routes = effective_routes(&catalog, &ConfigSources::new().into_snapshot(), Profile::None);
    let declarations = vec![
        GroupDeclaration::new("everything", ["/api/**"]),
        GroupDeclaration::new("users", ["/api/users/**"]),
    ];
    let index = GroupingIndex::build(&declarations, &routes, Profile::None);

    assert_eq!(
        paths(&index.group("everything").unwrap().routes),
        vec!["/api/users", "/api/users/admins"]
    );
    assert!(index.group("users").unwrap().routes.is_empty());
}

#[test]
fn test_no_route_in_two_groups_and_build_is_stable() {
    let profile = Profile::MultipleGroupedApis;
    let routes = effective_routes(&catalog(), &ConfigSources::new().into_snapshot(), profile);
    let declarations = vec![
        GroupDeclaration::new("all", ["/**"]),
        GroupDeclaration::new("groupA", ["/groupA/**"]),
    ];
    let index = GroupingIndex::build(&declarations, &routes, profile);

    let grouped: usize = index.groups().iter().map(|g| g.routes.len()).sum();
    assert_eq!(grouped + index.ungrouped().len(), routes.len());
    assert_eq!(index.group("all").unwrap().routes.len(), routes.len());

    assert_eq!(index, GroupingIndex::build(&declarations, &routes, profile));
}

#[test]
fn test_inactive_routes_never_grouped() {
    let profile = Profile::MultipleEndpoints;
    let routes = effective_routes(&catalog(), &ConfigSources::new().into_snapshot(), profile);
    let declarations = vec![GroupDeclaration::new("groupB", ["/groupB/**"])];
    let index = GroupingIndex::build(&declarations, &routes, profile);

    assert!(index.group("groupB").unwrap().routes.is_empty());
}

#[test]
fn test_declarations_with_same_name_are_merged() {
    let catalog = vec![
        RouteDefinition::get("/a/one", "one"),
        RouteDefinition::get("/b/two", "two"),
    ];
    let routes = effective_routes(&catalog, &ConfigSources::new().into_snapshot(), Profile::None);
    let declarations = vec![
        GroupDeclaration::new("mixed", ["/a/**"]),
        GroupDeclaration::new("mixed", ["/b/**"]),
    ];
    let index = GroupingIndex::build(&declarations, &routes, Profile::None);

    assert_eq!(index.group_names(), vec!["mixed"]);
    assert_eq!(paths(&index.group("mixed").unwrap().routes), vec!["/a/one", "/b/two"]);
}
