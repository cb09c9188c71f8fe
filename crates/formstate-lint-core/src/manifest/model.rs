//! Typed, borrowing views over the merged manifest tree.
//!
//! The tree itself stays a `serde_yaml::Mapping`: the manifest schema is loose
//! and only a handful of fields matter to the rules. Views skip records that
//! lack a string `name` instead of failing.

use std::fmt;

use serde_yaml::{Mapping, Number, Value};

use super::raw::{ABILITIES_SECTION, EFFECTS_SECTION};

/// The merged manifest document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    root: Mapping,
}

impl Document {
    /// Wraps a merged root mapping.
    #[must_use]
    pub fn new(root: Mapping) -> Self {
        Self { root }
    }

    /// Returns the root mapping.
    #[must_use]
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Looks up a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Iterates abilities in document order.
    pub fn abilities(&self) -> impl Iterator<Item = Ability<'_>> {
        self.records(ABILITIES_SECTION).filter_map(Ability::from_value)
    }

    /// Iterates effects in document order.
    pub fn effects(&self) -> impl Iterator<Item = Effect<'_>> {
        self.records(EFFECTS_SECTION).filter_map(Effect::from_value)
    }

    /// Finds the first ability named `name`.
    #[must_use]
    pub fn find_ability(&self, name: &str) -> Option<Ability<'_>> {
        self.abilities().find(|a| a.name() == name)
    }

    /// Finds the first effect named `name`.
    #[must_use]
    pub fn find_effect(&self, name: &str) -> Option<Effect<'_>> {
        self.effects().find(|e| e.name() == name)
    }

    fn records(&self, key: &str) -> impl Iterator<Item = &Value> {
        self.get(key)
            .and_then(Value::as_sequence)
            .into_iter()
            .flatten()
    }
}

/// An ability record.
#[derive(Debug, Clone, Copy)]
pub struct Ability<'a> {
    name: &'a str,
    record: &'a Mapping,
}

impl<'a> Ability<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        let record = value.as_mapping()?;
        let name = record.get("name")?.as_str()?;
        Some(Self { name, record })
    }

    /// The ability's name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// The ability's inline event graph, if it has one.
    #[must_use]
    pub fn event_graph(&self) -> Option<EventGraph<'a>> {
        self.record
            .get("event_graph")
            .and_then(Value::as_mapping)
            .map(EventGraph::from_mapping)
    }

    /// Entries of `tags.activation_required_tags`, in declaration order.
    #[must_use]
    pub fn required_tags(&self) -> Vec<&'a str> {
        self.record
            .get("tags")
            .and_then(|tags| tags.get("activation_required_tags"))
            .and_then(Value::as_sequence)
            .map(|seq| seq.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// An effect record.
#[derive(Debug, Clone, Copy)]
pub struct Effect<'a> {
    name: &'a str,
}

impl<'a> Effect<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        let name = value.as_mapping()?.get("name")?.as_str()?;
        Some(Self { name })
    }

    /// The effect's name.
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }
}

/// Nodes and connections of one ability's event graph.
#[derive(Debug, Clone, Default)]
pub struct EventGraph<'a> {
    nodes: Vec<Node<'a>>,
    connections: Vec<Connection<'a>>,
}

impl<'a> EventGraph<'a> {
    fn from_mapping(graph: &'a Mapping) -> Self {
        Self {
            nodes: sequence(graph, "nodes")
                .iter()
                .filter_map(Node::from_value)
                .collect(),
            connections: sequence(graph, "connections")
                .iter()
                .filter_map(Connection::from_value)
                .collect(),
        }
    }

    /// All nodes, in declaration order.
    #[must_use]
    pub fn nodes(&self) -> &[Node<'a>] {
        &self.nodes
    }

    /// All connections, in declaration order.
    #[must_use]
    pub fn connections(&self) -> &[Connection<'a>] {
        &self.connections
    }

    /// Finds a node by id.
    #[must_use]
    pub fn node<'q>(&self, id: impl Into<NodeId<'q>>) -> Option<&Node<'a>> {
        let id = id.into();
        self.nodes.iter().find(|n| n.id() == Some(id))
    }

    /// Nodes whose `function` property equals `function`.
    #[must_use]
    pub fn nodes_with_function(&self, function: &str) -> Vec<&Node<'a>> {
        self.nodes
            .iter()
            .filter(|n| n.function() == Some(function))
            .collect()
    }

    /// Connections leaving `node_id`.
    #[must_use]
    pub fn outgoing<'q>(&self, node_id: impl Into<NodeId<'q>>) -> Vec<&Connection<'a>> {
        let node_id = node_id.into();
        self.connections.iter().filter(|c| c.from == node_id).collect()
    }

    /// Connections entering `node_id`.
    #[must_use]
    pub fn incoming<'q>(&self, node_id: impl Into<NodeId<'q>>) -> Vec<&Connection<'a>> {
        let node_id = node_id.into();
        self.connections
            .iter()
            .filter(|c| c.to == Some(node_id))
            .collect()
    }
}

/// A node id as written in the manifest.
///
/// Ids are scalars. `1` and `"1"` are different ids, as they are different
/// YAML values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeId<'a> {
    /// A string id.
    Name(&'a str),
    /// A numeric id.
    Number(&'a Number),
    /// A boolean id.
    Bool(bool),
}

impl<'a> NodeId<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Name(s)),
            Value::Number(n) => Some(Self::Number(n)),
            Value::Bool(b) => Some(Self::Bool(*b)),
            _ => None,
        }
    }
}

impl<'a> From<&'a str> for NodeId<'a> {
    fn from(id: &'a str) -> Self {
        Self::Name(id)
    }
}

impl fmt::Display for NodeId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// One node of an event graph.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    id: Option<NodeId<'a>>,
    node_type: Option<&'a str>,
    properties: Option<&'a Mapping>,
}

impl<'a> Node<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        let record = value.as_mapping()?;
        Some(Self {
            id: record.get("id").and_then(NodeId::from_value),
            node_type: record.get("type").and_then(Value::as_str),
            properties: record.get("properties").and_then(Value::as_mapping),
        })
    }

    /// The node id, unique within its graph.
    #[must_use]
    pub fn id(&self) -> Option<NodeId<'a>> {
        self.id
    }

    /// The node type (e.g., `CallFunction`).
    #[must_use]
    pub fn node_type(&self) -> Option<&'a str> {
        self.node_type
    }

    /// A string-valued property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&'a str> {
        self.properties?.get(key)?.as_str()
    }

    /// The `function` property naming the node's role.
    #[must_use]
    pub fn function(&self) -> Option<&'a str> {
        self.property("function")
    }
}

/// A directed edge between two nodes of the same graph.
///
/// Endpoints are written either as `[NodeId, PinName]` or as a bare node id;
/// only the node id is kept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection<'a> {
    /// Source node id.
    pub from: NodeId<'a>,
    /// Target node id, when the edge names one.
    pub to: Option<NodeId<'a>>,
}

impl<'a> Connection<'a> {
    fn from_value(value: &'a Value) -> Option<Self> {
        let record = value.as_mapping()?;
        Some(Self {
            from: endpoint(record.get("from")?)?,
            to: record.get("to").and_then(endpoint),
        })
    }
}

fn sequence<'a>(map: &'a Mapping, key: &str) -> &'a [Value] {
    map.get(key)
        .and_then(Value::as_sequence)
        .map_or(&[][..], Vec::as_slice)
}

fn endpoint(value: &Value) -> Option<NodeId<'_>> {
    match value {
        Value::Sequence(parts) => parts.first().and_then(NodeId::from_value),
        other => NodeId::from_value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(yaml: &str) -> Document {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        Document::new(value.as_mapping().unwrap().clone())
    }

    const GRAPH: &str = r"
gameplay_abilities:
  - name: GA_FatherCrawler
    tags:
      activation_required_tags:
        - Effect.Father.FormState.Armor
        - 42
    event_graph:
      nodes:
        - id: Apply
          type: CallFunction
          properties:
            function: ApplyGameplayEffectToSelf
            gameplay_effect_class: GE_CrawlerState
        - id: Tag
          properties:
            function: MakeLiteralGameplayTag
            literal_value: Effect.Father.FormState
        - type: Orphan
      connections:
        - from: [Tag, ReturnValue]
          to: [Apply, Tags]
        - from: Apply
  - description: no name, skipped
gameplay_effects:
  - name: GE_CrawlerState
";

    #[test]
    fn finds_abilities_and_effects() {
        let d = doc(GRAPH);
        assert_eq!(d.abilities().count(), 1);
        assert!(d.find_ability("GA_FatherCrawler").is_some());
        assert!(d.find_ability("GA_FatherArmor").is_none());
        assert!(d.find_effect("GE_CrawlerState").is_some());
        assert!(d.find_effect("GE_ArmorState").is_none());
    }

    #[test]
    fn required_tags_skip_non_strings() {
        let d = doc(GRAPH);
        let ability = d.find_ability("GA_FatherCrawler").unwrap();
        assert_eq!(ability.required_tags(), vec!["Effect.Father.FormState.Armor"]);
    }

    #[test]
    fn nodes_with_function_and_properties() {
        let d = doc(GRAPH);
        let graph = d.find_ability("GA_FatherCrawler").unwrap().event_graph().unwrap();
        assert_eq!(graph.nodes().len(), 3);

        let apply = graph.nodes_with_function("ApplyGameplayEffectToSelf");
        assert_eq!(apply.len(), 1);
        assert_eq!(apply[0].property("gameplay_effect_class"), Some("GE_CrawlerState"));
        assert_eq!(apply[0].node_type(), Some("CallFunction"));
        assert!(graph.nodes_with_function("RemoveGameplayEffectFromOwnerWithGrantedTags").is_empty());
    }

    #[test]
    fn connections_accept_pairs_and_bare_ids() {
        let d = doc(GRAPH);
        let graph = d.find_ability("GA_FatherCrawler").unwrap().event_graph().unwrap();
        assert_eq!(graph.outgoing("Tag").len(), 1);
        assert_eq!(graph.incoming("Apply").len(), 1);
        assert_eq!(graph.outgoing("Apply")[0].to, None);
        assert!(graph.node("Tag").is_some());
    }

    #[test]
    fn numeric_ids_link_nodes() {
        let d = doc(
            "gameplay_abilities:\n  - name: GA_N\n    event_graph:\n      nodes:\n        - id: 1\n        - id: 2\n        - id: \"1\"\n      connections:\n        - from: [1, ReturnValue]\n          to: [2, Tags]\n",
        );
        let graph = d.find_ability("GA_N").unwrap().event_graph().unwrap();
        let one = graph.nodes()[0].id().unwrap();
        assert_eq!(one.to_string(), "1");
        assert_eq!(graph.outgoing(one).len(), 1);
        assert_eq!(graph.incoming(graph.nodes()[1].id().unwrap()).len(), 1);
        // The string "1" is a different id.
        assert!(graph.outgoing("1").is_empty());
        assert_eq!(graph.connections()[0].to.map(|id| id.to_string()), Some("2".to_string()));
    }

    #[test]
    fn ability_without_graph() {
        let d = doc("gameplay_abilities:\n  - name: GA_Empty\n");
        assert!(d.find_ability("GA_Empty").unwrap().event_graph().is_none());
    }

    #[test]
    fn missing_sections_yield_nothing() {
        let d = doc("other: 1\n");
        assert_eq!(d.abilities().count(), 0);
        assert_eq!(d.effects().count(), 0);
    }
}
