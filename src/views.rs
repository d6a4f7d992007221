//! View rendering for fallback responses and handlers that want templates.
//!
//! The dispatcher renders `errors.http` itself; handlers go through
//! [`crate::server::Request::view`], which uses the same renderer.
//!
//! Template names are dotted: `errors.http` lives at `errors/http.html`
//! under the templates directory. Without a directory only the built-in
//! `errors.http` template is available.

use minijinja::{Environment, ErrorKind};
use serde_json::Value as JsonValue;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use crate::config::RouterConfig;

/// Template rendered for 404 and 405 responses.
///
/// Receives `statusCode` (integer) and `statusMessage` (reason phrase).
pub const ERROR_TEMPLATE: &str = "errors.http";

/// File extension appended to dotted template names.
pub const TEMPLATE_EXTENSION: &str = "html";

const BUILTIN_ERROR_TEMPLATE: &str = include_str!("../templates/errors/http.html");

/// Renders a named template with JSON variables.
pub trait ViewRenderer: Send + Sync {
    /// Render `name` with `vars`
    ///
    /// # Errors
    ///
    /// [`ViewError`] if the template is missing or fails to render.
    fn render(&self, name: &str, vars: &JsonValue) -> Result<String, ViewError>;
}

/// Template lookup or rendering failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewError {
    /// No template with this name exists
    NotFound {
        /// Dotted template name
        name: String,
    },
    /// The template exists but could not be loaded or rendered
    Render {
        /// Dotted template name
        name: String,
        /// Engine error message
        message: String,
    },
}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewError::NotFound { name } => write!(f, "template '{name}' not found"),
            ViewError::Render { name, message } => {
                write!(f, "failed to render template '{name}': {message}")
            }
        }
    }
}

impl std::error::Error for ViewError {}

impl ViewError {
    fn from_engine(name: &str, err: &minijinja::Error) -> Self {
        if err.kind() == ErrorKind::TemplateNotFound {
            ViewError::NotFound {
                name: name.to_string(),
            }
        } else {
            ViewError::Render {
                name: name.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// `minijinja`-backed [`ViewRenderer`].
pub struct TemplateEngine {
    env: Environment<'static>,
    templates_dir: Option<PathBuf>,
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine {
    /// Engine with only the built-in `errors.http` template
    #[must_use]
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| {
            Ok((name == ERROR_TEMPLATE).then(|| BUILTIN_ERROR_TEMPLATE.to_string()))
        });
        Self {
            env,
            templates_dir: None,
        }
    }

    /// Engine loading templates from `dir`.
    ///
    /// Files are read lazily on first use. `errors.http` falls back to the
    /// built-in template when `dir` has no `errors/http.html`.
    #[must_use]
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let base = dir.clone();
        let mut env = Environment::new();
        env.set_loader(move |name| {
            let Some(path) = map_template_name(&base, name) else {
                warn!(template = %name, "Rejected template name");
                return Ok(None);
            };
            match fs::read_to_string(&path) {
                Ok(source) => {
                    debug!(template = %name, path = %path.display(), "Template loaded");
                    Ok(Some(source))
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    Ok((name == ERROR_TEMPLATE).then(|| BUILTIN_ERROR_TEMPLATE.to_string()))
                }
                Err(err) => Err(minijinja::Error::new(
                    ErrorKind::InvalidOperation,
                    format!("could not read {}", path.display()),
                )
                .with_source(err)),
            }
        });
        Self {
            env,
            templates_dir: Some(dir),
        }
    }

    /// Engine for the configured templates directory, if any
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Self {
        match &config.templates_dir {
            Some(dir) => Self::with_dir(dir),
            None => Self::new(),
        }
    }

    #[must_use]
    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }
}

impl fmt::Debug for TemplateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateEngine")
            .field("templates_dir", &self.templates_dir)
            .finish_non_exhaustive()
    }
}

impl ViewRenderer for TemplateEngine {
    fn render(&self, name: &str, vars: &JsonValue) -> Result<String, ViewError> {
        let template = self
            .env
            .get_template(name)
            .map_err(|e| ViewError::from_engine(name, &e))?;
        template
            .render(vars)
            .map_err(|e| ViewError::from_engine(name, &e))
    }
}

/// Map a dotted template name to a file under `base`.
///
/// Returns `None` for names that would escape `base`.
fn map_template_name(base: &Path, name: &str) -> Option<PathBuf> {
    let relative = format!("{}.{TEMPLATE_EXTENSION}", name.replace('.', "/"));
    let mut path = base.to_path_buf();
    for comp in Path::new(&relative).components() {
        match comp {
            Component::Normal(s) => path.push(s),
            _ => return None,
        }
    }
    // "a..b" would leave an empty component that `components()` skips
    if name.split('.').any(str::is_empty) {
        return None;
    }
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_map_template_name() {
        let base = Path::new("/srv/templates");
        assert_eq!(
            map_template_name(base, "errors.http"),
            Some(PathBuf::from("/srv/templates/errors/http.html"))
        );
        assert_eq!(
            map_template_name(base, "home"),
            Some(PathBuf::from("/srv/templates/home.html"))
        );
    }

    #[test]
    fn test_map_template_name_prevents_traversal() {
        let base = Path::new("/srv/templates");
        assert!(map_template_name(base, "..passwd").is_none());
        assert!(map_template_name(base, "a..b").is_none());
        assert!(map_template_name(base, "/etc/passwd").is_none());
        assert!(map_template_name(base, "").is_none());
    }

    #[test]
    fn test_builtin_error_template() {
        let engine = TemplateEngine::new();
        let body = engine
            .render(
                ERROR_TEMPLATE,
                &json!({"statusCode": 404, "statusMessage": "Not Found"}),
            )
            .unwrap();
        assert!(body.contains("404"));
        assert!(body.contains("Not Found"));
    }

    #[test]
    fn test_missing_template() {
        let engine = TemplateEngine::new();
        let err = engine.render("home", &json!({})).unwrap_err();
        assert_eq!(
            err,
            ViewError::NotFound {
                name: "home".to_string()
            }
        );
    }

    #[test]
    fn test_dir_templates_override_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("errors")).unwrap();
        fs::write(
            dir.path().join("errors/http.html"),
            "custom {{ statusCode }}",
        )
        .unwrap();
        fs::write(dir.path().join("hello.html"), "Hello {{ name }}!").unwrap();

        let engine = TemplateEngine::with_dir(dir.path());
        let body = engine
            .render(
                ERROR_TEMPLATE,
                &json!({"statusCode": 405, "statusMessage": "Method Not Allowed"}),
            )
            .unwrap();
        assert_eq!(body, "custom 405");
        assert_eq!(
            engine.render("hello", &json!({"name": "World"})).unwrap(),
            "Hello World!"
        );
    }

    #[test]
    fn test_dir_without_error_template_uses_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let engine = TemplateEngine::with_dir(dir.path());
        let body = engine
            .render(
                ERROR_TEMPLATE,
                &json!({"statusCode": 404, "statusMessage": "Not Found"}),
            )
            .unwrap();
        assert!(body.contains("404 Not Found"));
    }

    #[test]
    fn test_render_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.html"), "{% if %}").unwrap();
        let engine = TemplateEngine::with_dir(dir.path());
        let err = engine.render("broken", &json!({})).unwrap_err();
        assert!(matches!(err, ViewError::Render { .. }));
    }
}
