//! Logical name to backend identifier bindings.

use crate::error::GraphError;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashMap;

/// Mapping from logical name to backend identifier, built one binding at a
/// time. A name, once bound, is never rebound.
///
/// For the declarative backend the identifier is the template logical ID
/// itself; for the imperative backend it is the live resource ID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceGraph {
    bindings: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ResourceGraph {
    pub fn new() -> ResourceGraph {
        ResourceGraph::default()
    }

    /// Bind `name` to `id`. Fails if `name` is already bound.
    pub fn bind(
        &mut self,
        name: impl Into<String>,
        id: impl Into<String>,
    ) -> Result<(), GraphError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(GraphError::AlreadyBound(name));
        }
        let id = id.into();
        log::trace!("bind {name} => {id}");
        self.index.insert(name.clone(), self.bindings.len());
        self.bindings.push((name, id));
        Ok(())
    }

    /// Identifier bound to `name`. Fails if nothing was bound yet.
    pub fn resolve(&self, name: &str) -> Result<&str, GraphError> {
        self.index
            .get(name)
            .map(|&i| self.bindings[i].1.as_str())
            .ok_or_else(|| GraphError::Unbound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Bindings in the order they were made.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings.iter().map(|(n, id)| (n.as_str(), id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Serialize for ResourceGraph {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.bindings.len()))?;
        for (name, id) in &self.bindings {
            map.serialize_entry(name, id)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_resolve() {
        let mut graph = ResourceGraph::new();
        graph.bind("VPC", "vpc-0123").unwrap();
        graph.bind("PublicSubnet0", "subnet-aaaa").unwrap();

        assert_eq!(graph.resolve("VPC").unwrap(), "vpc-0123");
        assert_eq!(graph.len(), 2);
        assert!(graph.contains("PublicSubnet0"));
        assert_eq!(
            graph.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            vec!["VPC", "PublicSubnet0"]
        );
    }

    #[test]
    fn test_never_rebound() {
        let mut graph = ResourceGraph::new();
        graph.bind("VPC", "vpc-1").unwrap();
        assert_eq!(
            graph.bind("VPC", "vpc-2").unwrap_err(),
            GraphError::AlreadyBound("VPC".to_string())
        );
        assert_eq!(graph.resolve("VPC").unwrap(), "vpc-1");
    }

    #[test]
    fn test_unbound() {
        let graph = ResourceGraph::new();
        assert!(graph.is_empty());
        assert_eq!(
            graph.resolve("IGW").unwrap_err(),
            GraphError::Unbound("IGW".to_string())
        );
    }

    #[test]
    fn test_serialize_keeps_order() {
        let mut graph = ResourceGraph::new();
        graph.bind("VPC", "vpc-1").unwrap();
        graph.bind("IGW", "igw-1").unwrap();
        assert_eq!(
            serde_json::to_string(&graph).unwrap(),
            r#"{"VPC":"vpc-1","IGW":"igw-1"}"#
        );
    }
}
