//! Resource path utilities.

use crate::error::{Error, Result};

/// Names routed under a collection that would shadow a member path.
const RESERVED_IDS: &[&str] = &["upcoming"];

/// Builder for resource paths under an API prefix (`/v1` by default).
#[derive(Clone, Debug)]
pub struct PathBuilder<'a> {
    prefix: &'a str,
}

impl<'a> PathBuilder<'a> {
    pub fn new(prefix: &'a str) -> Self {
        PathBuilder { prefix }
    }

    /// `/v1/invoices`
    pub fn collection(&self, resource: &str) -> String {
        Self::build_composite(&[self.prefix, resource])
    }

    /// `/v1/invoices/upcoming`: a fixed name under a collection, not an id.
    pub fn nested(&self, resource: &str, name: &str) -> String {
        Self::build_composite(&[self.prefix, resource, name])
    }

    /// `/v1/invoices/in_123`
    pub fn member(&self, resource: &str, id: &str) -> Result<String> {
        Ok(Self::build_composite(&[self.prefix, resource, Self::segment(id)?]))
    }

    /// `/v1/invoices/in_123/pay`
    pub fn action(&self, resource: &str, id: &str, action: &str) -> Result<String> {
        Ok(Self::build_composite(&[
            self.prefix,
            resource,
            Self::segment(id)?,
            action,
        ]))
    }

    /// Join parts with `/`, without doubling separators.
    pub fn build_composite(parts: &[&str]) -> String {
        let mut path = String::new();
        for part in parts.iter().map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            path.push('/');
            path.push_str(part);
        }
        path
    }

    /// Split a path into its non-empty segments.
    pub fn parse(path: &str) -> Vec<&str> {
        path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Validate an id before it becomes a path segment.
    fn segment(id: &str) -> Result<&str> {
        if id.is_empty() || id.contains('/') || id.contains('?') || RESERVED_IDS.contains(&id) {
            return Err(Error::Validation {
                message: format!("invalid resource id: {:?}", id),
                param: Some("id".to_string()),
            });
        }
        Ok(id)
    }
}
