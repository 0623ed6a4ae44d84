//! Connection validation.
//!
//! The drag state machine runs a cheap structural [`prevalidate`] when a
//! candidate connector is hovered and a semantic [`validate`] before
//! committing. Both are pluggable through [`ConnectionValidator`];
//! [`DefaultValidator`] implements the standard policy and
//! [`CompositeValidator`] stacks custom rules on top.
//!
//! [`prevalidate`]: ConnectionValidator::prevalidate
//! [`validate`]: ConnectionValidator::validate

use crate::document::{Document, Flow};

/// Result of a validation step with an optional rejection reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(ValidationError),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    /// Combine two results (AND logic): the first error wins.
    pub fn and(self, other: ValidationResult) -> ValidationResult {
        match self {
            ValidationResult::Valid => other,
            invalid => invalid,
        }
    }
}

/// Why a candidate connection was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("connector {0} not found")]
    ConnectorNotFound(i32),
    #[error("cannot connect a connector to itself")]
    SameConnector,
    #[error("cannot connect two connectors on the same node")]
    SameNode,
    #[error("one connector must be an input and the other an output")]
    IncompatibleFlow,
    #[error("connector {0} already has a connection")]
    AlreadyConnected(i32),
    #[error("{0}")]
    Custom(String),
}

/// Pluggable policy for connecting two connectors.
///
/// Rejections are expected control flow, not errors: the drag machine maps
/// them to forbidden-feedback or a silent cancel, and nothing is logged.
pub trait ConnectionValidator {
    /// Cheap structural check run on hover entry: both connectors resolve
    /// and are distinct.
    fn prevalidate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult;

    /// Semantic check run on hover entry and again at release time.
    fn validate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult;

    /// Type tag for a connection committed between the pair.
    fn connection_kind(&self, _document: &Document, _source: i32, _candidate: i32) -> String {
        "standard".to_string()
    }

    /// Type tag for joints allocated when committing the pair.
    fn joint_kind(&self, _document: &Document, _source: i32, _candidate: i32) -> String {
        "standard".to_string()
    }
}

/// Default policy: strict input-to-output pairing across different nodes,
/// with at most one connection per connector unless configured otherwise.
#[derive(Clone, Copy, Debug)]
pub struct DefaultValidator {
    allow_multiple: bool,
}

impl Default for DefaultValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultValidator {
    pub fn new() -> Self {
        Self { allow_multiple: false }
    }

    /// Permit connectors to hold more than one connection. Used together
    /// with the detach-on-drag flag for fan-out style diagrams.
    pub fn allow_multiple(mut self, allow: bool) -> Self {
        self.allow_multiple = allow;
        self
    }
}

impl ConnectionValidator for DefaultValidator {
    fn prevalidate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult {
        if source == candidate {
            return ValidationResult::Invalid(ValidationError::SameConnector);
        }
        for id in [source, candidate] {
            if document.connector(id).is_none() {
                return ValidationResult::Invalid(ValidationError::ConnectorNotFound(id));
            }
        }
        ValidationResult::Valid
    }

    fn validate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult {
        let structural = self.prevalidate(document, source, candidate);
        if !structural.is_valid() {
            return structural;
        }
        let source_connector = document.connector(source).expect("prevalidated");
        let candidate_connector = document.connector(candidate).expect("prevalidated");

        if source_connector.node == candidate_connector.node {
            return ValidationResult::Invalid(ValidationError::SameNode);
        }
        if !self.allow_multiple && !candidate_connector.connections.is_empty() {
            return ValidationResult::Invalid(ValidationError::AlreadyConnected(candidate));
        }

        let source_is_output = source_connector.kind.flow == Flow::Output;
        let candidate_is_output = candidate_connector.kind.flow == Flow::Output;
        if source_is_output == candidate_is_output {
            return ValidationResult::Invalid(ValidationError::IncompatibleFlow);
        }

        ValidationResult::Valid
    }
}

/// Combines validators with AND logic; the first rejection short-circuits.
/// Delegates kind selection to the first validator added.
#[derive(Default)]
pub struct CompositeValidator {
    validators: Vec<Box<dyn ConnectionValidator>>,
}

impl CompositeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validator; validators run in the order they were added.
    pub fn add<V: ConnectionValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Box::new(validator));
        self
    }
}

impl ConnectionValidator for CompositeValidator {
    fn prevalidate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult {
        for validator in &self.validators {
            let result = validator.prevalidate(document, source, candidate);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }

    fn validate(&self, document: &Document, source: i32, candidate: i32) -> ValidationResult {
        for validator in &self.validators {
            let result = validator.validate(document, source, candidate);
            if !result.is_valid() {
                return result;
            }
        }
        ValidationResult::Valid
    }

    fn connection_kind(&self, document: &Document, source: i32, candidate: i32) -> String {
        match self.validators.first() {
            Some(validator) => validator.connection_kind(document, source, candidate),
            None => "standard".to_string(),
        }
    }

    fn joint_kind(&self, document: &Document, source: i32, candidate: i32) -> String {
        match self.validators.first() {
            Some(validator) => validator.joint_kind(document, source, candidate),
            None => "standard".to_string(),
        }
    }
}
