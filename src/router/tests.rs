use http::Method;

use super::{DuplicatePolicy, Lookup, PathPattern, RouteError, RouteTable, Segment};
use crate::resolver::{Dependency, DependencyError, HandlerResolutionError};
use crate::server::Request;

fn pattern(template: &str) -> PathPattern {
    PathPattern::parse(template).unwrap()
}

fn noop(_req: &Request) -> &'static str {
    ""
}

#[test]
fn test_root_path() {
    let p = pattern("/");
    assert!(p.is_static());
    assert_eq!(p.matches("/").map(|b| b.len()), Some(0));
    assert!(p.matches("").is_none());
    assert!(p.matches("/x").is_none());
}

#[test]
fn test_static_path_requires_exact_string() {
    let p = pattern("/users/list");
    assert!(p.matches("/users/list").is_some());
    assert!(p.matches("/users/list/").is_none());
    assert!(p.matches("/Users/list").is_none());
}

#[test]
fn test_parameterized_path() {
    let p = pattern("/items/:id");
    let b = p.matches("/items/123").unwrap();
    assert_eq!(b.get("id"), Some("123"));
    assert_eq!(p.variables().collect::<Vec<_>>(), vec!["id"]);
}

#[test]
fn test_trailing_sigil_is_not_part_of_name() {
    let p = pattern("/:category/:action:/:color");
    let b = p.matches("/cars/sell/blue").unwrap();
    assert_eq!(b.get("category"), Some("cars"));
    assert_eq!(b.get("action"), Some("sell"));
    assert_eq!(b.get("color"), Some("blue"));
    assert_eq!(b.get("action:"), None);
}

#[test]
fn test_segment_count_must_match() {
    let p = pattern("/users/:user/invite");
    assert!(p.matches("/users/5/invite").is_some());
    assert!(p.matches("/users/5").is_none());
    assert!(p.matches("/users/5/invite/extra").is_none());
}

#[test]
fn test_literal_mismatch() {
    let p = pattern("/:user/ban/:timeout");
    assert!(p.matches("/bob/kick/10").is_none());
    let b = p.matches("/bob/ban/10").unwrap();
    assert_eq!(b.get("user"), Some("bob"));
    assert_eq!(b.get("timeout"), Some("10"));
}

#[test]
fn test_empty_segment_binds_empty_string() {
    let p = pattern("/users/:id");
    let b = p.matches("/users/").unwrap();
    assert_eq!(b.get("id"), Some(""));
}

#[test]
fn test_values_are_not_decoded() {
    let p = pattern("/files/:name");
    let b = p.matches("/files/a%20b").unwrap();
    assert_eq!(b.get("name"), Some("a%20b"));
}

#[test]
fn test_bindings_in_template_order() {
    let p = pattern("/:a/x/:b/:c");
    let b = p.matches("/1/x/2/3").unwrap();
    let pairs: Vec<_> = b.iter().collect();
    assert_eq!(pairs, vec![("a", "1"), ("b", "2"), ("c", "3")]);
    assert_eq!(b.to_map().len(), 3);
}

#[test]
fn test_segments() {
    let p = pattern("/users/:id");
    assert_eq!(p.segments().len(), 3);
    assert_eq!(p.segments()[0], Segment::Literal(String::new()));
    assert_eq!(p.segments()[1], Segment::Literal("users".to_string()));
    assert!(matches!(&p.segments()[2], Segment::Variable(n) if n.as_ref() == "id"));
}

#[test]
fn test_invalid_patterns() {
    for bad in ["users", "", "/:", "/:1abc", "/:a-b", "/:id/:id"] {
        let err = PathPattern::parse(bad).unwrap_err();
        assert!(
            matches!(err, RouteError::InvalidPattern { .. }),
            "{bad} should be rejected, got {err:?}"
        );
    }
}

#[test]
fn test_matching_is_repeatable() {
    let p = pattern("/:user/ban/:timeout");
    assert_eq!(p.matches("/a/ban/1"), p.matches("/a/ban/1"));
}

#[test]
fn test_new_table_supports_get_and_post() {
    let table = RouteTable::new();
    assert_eq!(table.supported_methods(), &[Method::GET, Method::POST]);
    assert!(table.is_empty());
    assert_eq!(table.routes(&Method::GET).map(<[_]>::len), Some(0));
    assert!(table.routes(&Method::PUT).is_none());
}

#[test]
fn test_register_unsupported_method_fails() {
    let mut table = RouteTable::new();
    let err = table.register("PUT", "/x", noop).unwrap_err();
    assert_eq!(
        err,
        RouteError::UnsupportedMethod {
            method: "PUT".to_string()
        }
    );
    assert!(table.is_empty());
}

#[test]
fn test_register_lowercase_method() {
    let mut table = RouteTable::new();
    table.register("get", "/x", noop).unwrap();
    assert_eq!(table.routes(&Method::GET).map(<[_]>::len), Some(1));
}

#[test]
fn test_registration_order_is_priority() {
    let mut table = RouteTable::new();
    table
        .get("/:user/ban/:timeout", noop)
        .unwrap()
        .get("/admin/ban/:timeout", noop)
        .unwrap();

    let (route, bindings) = table.find(&Method::GET, "/admin/ban/10").unwrap();
    assert_eq!(route.pattern().as_str(), "/:user/ban/:timeout");
    assert_eq!(bindings.get("user"), Some("admin"));
}

#[test]
fn test_any_registers_every_method() {
    let mut table = RouteTable::with_methods([Method::GET, Method::POST, Method::DELETE]);
    table.any("/ping", noop).unwrap();
    assert_eq!(table.len(), 3);
    for method in [Method::GET, Method::POST, Method::DELETE] {
        assert!(table.find(&method, "/ping").is_some());
    }
}

#[test]
fn test_lookup_outcomes() {
    let mut table = RouteTable::new();
    table.get("/", noop).unwrap();

    assert!(matches!(table.lookup(&Method::GET, "/"), Lookup::Matched(_, _)));
    assert!(matches!(table.lookup(&Method::GET, "/nope"), Lookup::NotFound));
    assert!(matches!(table.lookup(&Method::POST, "/"), Lookup::NotFound));
    assert!(matches!(
        table.lookup(&Method::PUT, "/"),
        Lookup::MethodNotAllowed
    ));
}

#[test]
fn test_duplicate_shadowed_by_default() {
    let mut table = RouteTable::new();
    table.get("/a", |_req: &Request| "first").unwrap();
    table.get("/a", |_req: &Request| "second").unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.all_patterns().len(), 2);
}

#[test]
fn test_duplicate_rejected() {
    let mut table = RouteTable::new().with_duplicate_policy(DuplicatePolicy::Reject);
    table.get("/a", noop).unwrap();
    let err = table.get("/a", noop).unwrap_err();
    assert!(matches!(err, RouteError::DuplicateRoute { .. }));
    // the same pattern under another method is not a duplicate
    table.post("/a", noop).unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn test_any_is_all_or_nothing() {
    let mut table = RouteTable::new().with_duplicate_policy(DuplicatePolicy::Reject);
    table.post("/a", noop).unwrap();
    assert!(table.any("/a", noop).is_err());
    assert_eq!(table.routes(&Method::GET).map(<[_]>::len), Some(0));
}

#[derive(Default, Dependency)]
struct UserController;

impl UserController {
    fn show(&self, req: &Request) -> String {
        format!("user {}", req.param("user").unwrap_or_default())
    }
}

struct Broken;

impl Dependency for Broken {
    fn construct() -> Result<Self, DependencyError> {
        Err(DependencyError::new("broken"))
    }
}

#[test]
fn test_method_reference_resolves() {
    let mut table = RouteTable::new();
    table
        .controllers_mut()
        .register::<UserController>("UserController")
        .action("show", UserController::show);
    table.get("/users/:user", ("UserController", "show")).unwrap();

    let (route, _) = table.find(&Method::GET, "/users/1").unwrap();
    assert_eq!(route.handler().name(), "UserController@show");
    assert_eq!(route.handler().dependencies().len(), 1);
}

#[test]
fn test_unknown_controller_or_action_rejected() {
    let mut table = RouteTable::new();
    table
        .controllers_mut()
        .register::<UserController>("UserController")
        .action("show", UserController::show);

    let err = table.get("/x", ("Nope", "show")).unwrap_err();
    assert_eq!(
        err,
        RouteError::HandlerResolution(HandlerResolutionError::UnknownController {
            controller: "Nope".to_string()
        })
    );

    let err = table.get("/x", ("UserController", "destroy")).unwrap_err();
    assert!(matches!(
        err,
        RouteError::HandlerResolution(HandlerResolutionError::UnknownAction { .. })
    ));
    assert!(table.is_empty());
}

#[test]
fn test_failing_dependency_still_registers() {
    // construction only happens at dispatch time
    let mut table = RouteTable::new();
    table.get("/b", |_req: &Request, _b: Broken| "never").unwrap();
    assert_eq!(table.len(), 1);
}
