use crate::{
    grouping::GroupDeclaration,
    profile::Profile,
    routes::registry::{Activation, ResponseBody, RouteDefinition},
};

/// Supplies the response body of `GET /special`.
pub const TEST_PROPS_KEY: &str = "test.props";
/// Gates `GET /conditional`; the route exists only when this equals [`CONDITIONAL_VALUE`].
pub const CONDITIONAL_KEY: &str = "some.second.property";
pub const CONDITIONAL_VALUE: &str = "someValue";

/// Endpoint Catalog
///
/// Every route the application can ever expose, in declaration order. Which of them
/// are served is decided at startup by `effective_routes`.
pub fn catalog() -> Vec<RouteDefinition> {
    vec![
        // GET /hello/world
        // Unconditional. Present under every profile and configuration.
        RouteDefinition::get("/hello/world", "helloWorld")
            .responds(ResponseBody::Static("Hello World!"))
            .tagged("hello-world"),
        // GET /conditional
        // Present only when `some.second.property` is exactly `someValue`.
        RouteDefinition::get("/conditional", "conditional")
            .responds(ResponseBody::Static("conditional"))
            .active_when(Activation::always().when(CONDITIONAL_KEY, CONDITIONAL_VALUE))
            .tagged("conditional"),
        // GET /special
        // Echoes the configured `test.props` value.
        RouteDefinition::get("/special", "special")
            .responds(ResponseBody::Config {
                key: TEST_PROPS_KEY,
                fallback: "",
            })
            .active_when(Activation::profile(Profile::MultipleEndpoints))
            .tagged("profile"),
        // --- Grouped endpoints ---
        RouteDefinition::get("/groupA", "groupA")
            .responds(ResponseBody::Static("groupA"))
            .active_when(Activation::profile(Profile::MultipleGroupedApis))
            .tagged("grouped"),
        RouteDefinition::get("/groupB/first", "groupBFirst")
            .responds(ResponseBody::Static("groupB_first"))
            .active_when(Activation::profile(Profile::MultipleGroupedApis))
            .tagged("grouped"),
        RouteDefinition::get("/groupB/second", "groupBSecond")
            .responds(ResponseBody::Static("groupB_second"))
            .active_when(Activation::profile(Profile::MultipleGroupedApis))
            .tagged("grouped"),
    ]
}

/// Documentation groups, evaluated top-down. Only declared under `multiple-grouped-apis`.
pub fn group_declarations() -> Vec<GroupDeclaration> {
    vec![
        GroupDeclaration::new("groupA", ["/groupA/**"]).for_profile(Profile::MultipleGroupedApis),
        GroupDeclaration::new("groupB", ["/groupB/**"]).for_profile(Profile::MultipleGroupedApis),
    ]
}
