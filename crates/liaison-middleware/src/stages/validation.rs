//! Parameter validation middleware.
//!
//! Runs first in the chain (priority 5) and rejects an invocation whose
//! parameters break any rule registered for its `(controller, operation)`.
//! Operations without a schema pass through untouched.
//!
//! A rejection is a hard short-circuit: the operation never runs and the
//! caller receives an [`OperationError::Validation`] listing every failed
//! rule, in schema order.
//!
//! # Example
//!
//! ```
//! use liaison_middleware::stages::validation::{ValidationMiddleware, ValidationRule, ValidationSchema};
//!
//! let validation = ValidationMiddleware::new();
//! validation.add_schema(
//!     "ChannelController",
//!     ValidationSchema::new().operation(
//!         "createChannel",
//!         vec![
//!             ValidationRule::required("name"),
//!             ValidationRule::max_length("name", 50),
//!         ],
//!     ),
//! );
//!
//! assert_eq!(validation.stats().rules, 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, OnceLock};

use liaison_core::{BoxFuture, FieldViolation, OperationContext, OperationError, Params};
use liaison_telemetry::Logger;
use parking_lot::RwLock;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use url::Url;

use crate::middleware::{HookError, Invocation, Middleware};
use crate::sanitize::sanitize_map;

/// Stage name.
pub const NAME: &str = "ValidationMiddleware";

/// Stage priority.
pub const PRIORITY: i32 = 5;

/// The check a [`ValidationRule`] performs.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// Present, not null and not the empty string.
    Required,
    /// A JSON string.
    String,
    /// A JSON number.
    Number,
    /// A string shaped like `local@domain.tld`.
    Email,
    /// A string parsing as an absolute URI.
    Url,
    /// A string with at least this many characters.
    MinLength(usize),
    /// A string with at most this many characters.
    MaxLength(usize),
    /// A string containing a match of this expression.
    Pattern(Regex),
}

impl RuleKind {
    fn default_message(&self) -> String {
        match self {
            Self::Required => "is required".to_string(),
            Self::String => "must be a string".to_string(),
            Self::Number => "must be a number".to_string(),
            Self::Email => "must be a valid email address".to_string(),
            Self::Url => "must be a valid URL".to_string(),
            Self::MinLength(n) => format!("must be at least {n} characters"),
            Self::MaxLength(n) => format!("must be at most {n} characters"),
            Self::Pattern(_) => "has an invalid format".to_string(),
        }
    }

    fn check(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Required => !matches!(value, None | Some(Value::Null))
                && value.and_then(Value::as_str) != Some(""),
            Self::String => matches!(value, Some(Value::String(_))),
            Self::Number => matches!(value, Some(Value::Number(_))),
            Self::Email => as_str(value).is_some_and(is_email),
            Self::Url => as_str(value).is_some_and(is_absolute_url),
            Self::MinLength(n) => as_str(value).is_some_and(|s| s.chars().count() >= *n),
            Self::MaxLength(n) => as_str(value).is_some_and(|s| s.chars().count() <= *n),
            Self::Pattern(re) => as_str(value).is_some_and(|s| re.is_match(s)),
        }
    }
}

fn as_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

fn is_email(value: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(value))
}

fn is_absolute_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// One check against one dot-addressed parameter field.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    field: String,
    kind: RuleKind,
    message: Option<String>,
}

impl ValidationRule {
    /// Creates a rule of the given kind.
    pub fn new(field: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            field: field.into(),
            kind,
            message: None,
        }
    }

    /// The field must be present and non-empty.
    pub fn required(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Required)
    }

    /// The field must be a string.
    pub fn string(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::String)
    }

    /// The field must be a number.
    pub fn number(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Number)
    }

    /// The field must be an email address.
    pub fn email(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Email)
    }

    /// The field must be an absolute URL.
    pub fn url(field: impl Into<String>) -> Self {
        Self::new(field, RuleKind::Url)
    }

    /// The field must be a string of at least `min` characters.
    pub fn min_length(field: impl Into<String>, min: usize) -> Self {
        Self::new(field, RuleKind::MinLength(min))
    }

    /// The field must be a string of at most `max` characters.
    pub fn max_length(field: impl Into<String>, max: usize) -> Self {
        Self::new(field, RuleKind::MaxLength(max))
    }

    /// The field must be a string matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `pattern` does not compile.
    pub fn pattern(field: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(field, RuleKind::Pattern(Regex::new(pattern)?)))
    }

    /// Overrides the failure message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the dot-addressed field path.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Returns the rule kind.
    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Returns the failure message, custom or default.
    pub fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| self.kind.default_message())
    }

    /// Checks the rule against `params`, returning the violation if it fails.
    pub fn check(&self, params: &Params) -> Option<FieldViolation> {
        if self.kind.check(params.lookup(&self.field)) {
            None
        } else {
            Some(FieldViolation::new(&self.field, self.message()))
        }
    }
}

/// The rules of one controller, keyed by operation name.
#[derive(Debug, Clone, Default)]
pub struct ValidationSchema {
    operations: BTreeMap<String, Vec<ValidationRule>>,
}

impl ValidationSchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rules for an operation.
    #[must_use]
    pub fn operation(mut self, operation: impl Into<String>, rules: Vec<ValidationRule>) -> Self {
        self.operations.insert(operation.into(), rules);
        self
    }

    /// Returns the rules for an operation.
    pub fn rules(&self, operation: &str) -> Option<&[ValidationRule]> {
        self.operations.get(operation).map(Vec::as_slice)
    }

    /// Returns the operation names in this schema.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    /// Returns the total number of rules.
    pub fn rule_count(&self) -> usize {
        self.operations.values().map(Vec::len).sum()
    }
}

/// Registered schema totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationStats {
    /// Number of controllers with a schema.
    pub schemas: usize,
    /// Total rules across all schemas.
    pub rules: usize,
    /// Controller names, sorted.
    pub controllers: Vec<String>,
}

/// Rejects invocations whose parameters break their schema.
pub struct ValidationMiddleware {
    schemas: RwLock<HashMap<String, Arc<ValidationSchema>>>,
    logger: Logger,
}

impl fmt::Debug for ValidationMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationMiddleware")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl Default for ValidationMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationMiddleware {
    /// Creates a stage with no schemas and a local logger.
    #[must_use]
    pub fn new() -> Self {
        Self::with_logger(&Logger::new(NAME))
    }

    /// Creates a stage logging through `logger`'s sink.
    #[must_use]
    pub fn with_logger(logger: &Logger) -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
            logger: logger.for_component(NAME),
        }
    }

    /// Registers the schema for a controller, replacing any previous one.
    pub fn add_schema(&self, controller: impl Into<String>, schema: ValidationSchema) {
        let controller = controller.into();
        let operations: Vec<&str> = schema.operations().collect();
        self.logger.info(
            &format!("Validation schema added for {controller}"),
            json!({ "operations": operations }),
        );
        self.schemas.write().insert(controller, Arc::new(schema));
    }

    /// Returns the rules for `(controller, operation)`, if any.
    pub fn schema(&self, controller: &str, operation: &str) -> Option<Vec<ValidationRule>> {
        self.schemas
            .read()
            .get(controller)
            .and_then(|schema| schema.rules(operation))
            .map(<[ValidationRule]>::to_vec)
    }

    /// Returns schema totals.
    pub fn stats(&self) -> ValidationStats {
        let schemas = self.schemas.read();
        let mut controllers: Vec<String> = schemas.keys().cloned().collect();
        controllers.sort();
        ValidationStats {
            schemas: schemas.len(),
            rules: schemas.values().map(|s| s.rule_count()).sum(),
            controllers,
        }
    }

    /// Checks `params` against the rules of `(controller, operation)`.
    ///
    /// Returns every violation in rule order; empty when nothing failed or
    /// no schema is registered.
    pub fn validate(&self, controller: &str, operation: &str, params: &Params) -> Vec<FieldViolation> {
        let schema = self.schemas.read().get(controller).cloned();
        schema
            .as_deref()
            .and_then(|schema| schema.rules(operation))
            .map(|rules| rules.iter().filter_map(|rule| rule.check(params)).collect())
            .unwrap_or_default()
    }

    fn has_rules(&self, controller: &str, operation: &str) -> bool {
        self.schemas
            .read()
            .get(controller)
            .is_some_and(|schema| schema.rules(operation).is_some())
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &str {
        NAME
    }

    fn priority(&self) -> i32 {
        PRIORITY
    }

    fn before<'a>(
        &'a self,
        invocation: Invocation<'a>,
        ctx: &'a mut OperationContext,
    ) -> BoxFuture<'a, Result<(), HookError>> {
        Box::pin(async move {
            if !self.has_rules(invocation.controller, invocation.operation) {
                return Ok(());
            }

            let params = sanitize_map(invocation.params.as_map());
            let violations =
                self.validate(invocation.controller, invocation.operation, invocation.params);

            if violations.is_empty() {
                self.logger.info(
                    &format!("Validation passed for {}", invocation.key()),
                    json!({ "flow_id": ctx.flow_id().to_string(), "params": params }),
                );
                return Ok(());
            }

            let errors: Vec<String> = violations.iter().map(ToString::to_string).collect();
            let message = format!("Validation failed for {}: {}", invocation.key(), errors.join(", "));
            self.logger.warn(
                &message,
                json!({
                    "flow_id": ctx.flow_id().to_string(),
                    "params": params,
                    "errors": errors,
                }),
            );

            Err(HookError::Rejected(OperationError::validation(message, violations)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liaison_core::FlowId;

    fn channel_schema() -> ValidationSchema {
        ValidationSchema::new().operation(
            "createChannel",
            vec![
                ValidationRule::required("name"),
                ValidationRule::min_length("name", 1),
                ValidationRule::max_length("name", 50),
                ValidationRule::max_length("description", 200)
                    .with_message("must be at most 200 characters long"),
            ],
        )
    }

    #[test]
    fn test_required_rule() {
        let rule = ValidationRule::required("name");
        assert!(rule.check(&Params::new().with("name", "general")).is_none());
        assert!(rule.check(&Params::new().with("name", "")).is_some());
        assert!(rule.check(&Params::new().with("name", Value::Null)).is_some());
        assert!(rule.check(&Params::new()).is_some());
        // zero and false are present values
        assert!(rule.check(&Params::new().with("name", 0)).is_none());
        assert!(rule.check(&Params::new().with("name", false)).is_none());
    }

    #[test]
    fn test_type_rules() {
        let string = ValidationRule::string("userId");
        assert!(string.check(&Params::new().with("userId", "u1")).is_none());
        assert!(string.check(&Params::new().with("userId", 7)).is_some());

        let number = ValidationRule::number("count");
        assert!(number.check(&Params::new().with("count", 2.5)).is_none());
        assert!(number.check(&Params::new().with("count", "2")).is_some());
    }

    #[test]
    fn test_email_rule() {
        let rule = ValidationRule::email("email");
        assert!(rule.check(&Params::new().with("email", "a@b.co")).is_none());
        assert!(rule.check(&Params::new().with("email", "a@b")).is_some());
        assert!(rule.check(&Params::new().with("email", "a b@c.io")).is_some());
        assert!(rule.check(&Params::new().with("email", 1)).is_some());
    }

    #[test]
    fn test_url_rule() {
        let rule = ValidationRule::url("avatar");
        assert!(rule
            .check(&Params::new().with("avatar", "https://cdn.example.com/a.png"))
            .is_none());
        assert!(rule.check(&Params::new().with("avatar", "/a.png")).is_some());
        assert!(rule.check(&Params::new().with("avatar", "not a url")).is_some());
        assert!(rule.check(&Params::new().with("avatar", "")).is_some());
    }

    #[test]
    fn test_url_rule_accepts_any_absolute_scheme() {
        let rule = ValidationRule::url("link");
        for value in ["file:///tmp/a.png", "mailto:a@b.co", "https://例え.jp/", "data:text/plain,hi"] {
            assert!(
                rule.check(&Params::new().with("link", value)).is_none(),
                "{value} should be accepted"
            );
        }
    }

    #[test]
    fn test_length_rules_count_characters() {
        let min = ValidationRule::min_length("password", 6);
        assert!(min.check(&Params::new().with("password", "secret")).is_none());
        assert!(min.check(&Params::new().with("password", "short")).is_some());
        assert!(min.check(&Params::new().with("password", 123_456)).is_some());

        let max = ValidationRule::max_length("name", 2);
        assert!(max.check(&Params::new().with("name", "한글")).is_none());
        assert!(max.check(&Params::new().with("name", "abc")).is_some());
    }

    #[test]
    fn test_pattern_rule() {
        let rule = ValidationRule::pattern("code", r"^[A-Z]{3}$").unwrap();
        assert!(rule.check(&Params::new().with("code", "ABC")).is_none());
        assert!(rule.check(&Params::new().with("code", "abc")).is_some());
        assert!(ValidationRule::pattern("code", "(").is_err());
    }

    #[test]
    fn test_nested_field_lookup() {
        let rule = ValidationRule::required("profile.email");
        let params = Params::new().with("profile", json!({ "email": "a@b.co" }));
        assert!(rule.check(&params).is_none());
        assert!(rule.check(&Params::new().with("profile", json!({}))).is_some());
    }

    #[test]
    fn test_custom_and_default_messages() {
        assert_eq!(ValidationRule::min_length("name", 2).message(), "must be at least 2 characters");
        assert_eq!(
            ValidationRule::required("email").with_message("email is required").message(),
            "email is required"
        );
    }

    #[test]
    fn test_add_schema_replaces_and_counts() {
        let validation = ValidationMiddleware::new();
        validation.add_schema("ChannelController", channel_schema());
        validation.add_schema(
            "UserController",
            ValidationSchema::new().operation("updateUser", vec![ValidationRule::required("userId")]),
        );

        let stats = validation.stats();
        assert_eq!(stats.schemas, 2);
        assert_eq!(stats.rules, 5);
        assert_eq!(stats.controllers, vec!["ChannelController", "UserController"]);

        validation.add_schema("ChannelController", ValidationSchema::new());
        assert_eq!(validation.stats().rules, 1);
        assert!(validation.schema("ChannelController", "createChannel").is_none());
    }

    #[test]
    fn test_validate_collects_every_failure_in_order() {
        let validation = ValidationMiddleware::new();
        validation.add_schema("ChannelController", channel_schema());

        let params = Params::new().with("description", "x".repeat(201));
        let violations = validation.validate("ChannelController", "createChannel", &params);
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "name", "name", "description"]);
    }

    #[tokio::test]
    async fn test_before_rejects_with_combined_message() {
        let validation = ValidationMiddleware::new();
        validation.add_schema("ChannelController", channel_schema());

        let params = Params::new().with("name", "x".repeat(51));
        let mut ctx = OperationContext::new(FlowId::new());
        let err = validation
            .before(Invocation::new("ChannelController", "createChannel", &params), &mut ctx)
            .await
            .unwrap_err();

        match err {
            HookError::Rejected(OperationError::Validation { message, violations }) => {
                assert_eq!(
                    message,
                    "Validation failed for ChannelController.createChannel: name: must be at most 50 characters"
                );
                assert_eq!(violations.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_before_passes_unregistered_operation() {
        let validation = ValidationMiddleware::new();
        validation.add_schema("ChannelController", channel_schema());

        let params = Params::new();
        let mut ctx = OperationContext::new(FlowId::new());
        for (controller, operation) in [("ChannelController", "getChannels"), ("FileController", "uploadFile")] {
            assert!(validation
                .before(Invocation::new(controller, operation, &params), &mut ctx)
                .await
                .is_ok());
        }
    }
}
