//! An in-memory [`Host`] that counts the mutations applied to it.
//!
//! Useful for tests and for reconciling trees that are serialized afterwards.

use crate::{attributes::Value, record::RecordKey, Host, TEXT};
use core::{any::Any, fmt};
use hashbrown::HashMap;
use std::rc::Rc;

/// Handle to a node in a [`MemoryTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An opaque property payload, compared by identity.
#[derive(Clone)]
pub struct Object(pub Rc<dyn Any>);

impl Object {
	pub fn new(value: impl Any) -> Self {
		Self(Rc::new(value))
	}

	#[must_use]
	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.0.downcast_ref()
	}
}

impl PartialEq for Object {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl fmt::Debug for Object {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Object({:p})", Rc::as_ptr(&self.0))
	}
}

/// How often each kind of mutation was applied through [`Host`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MutationCounts {
	pub nodes_created: usize,
	pub insertions: usize,
	pub replacements: usize,
	pub removals: usize,
	pub attribute_writes: usize,
	pub attribute_removals: usize,
	pub property_writes: usize,
	pub text_writes: usize,
	pub style_writes: usize,
	/// How often a move or removal took input focus away.
	pub focus_losses: usize,
}

impl MutationCounts {
	#[must_use]
	pub fn structural(&self) -> usize {
		self.nodes_created + self.insertions + self.replacements + self.removals
	}

	#[must_use]
	pub fn attribute(&self) -> usize {
		self.attribute_writes + self.attribute_removals + self.property_writes + self.style_writes
	}
}

#[derive(Debug)]
enum Data {
	Element {
		tag: String,
		namespace: Option<String>,
		/// In insertion order.
		attributes: Vec<(String, String)>,
		properties: HashMap<String, Value<Object>>,
	},
	Text(String),
}

#[derive(Debug)]
struct MemoryNode {
	data: Data,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	record: Option<RecordKey>,
}

/// A tree of elements and text nodes with a single focus.
///
/// Nodes are never freed, so [`NodeId`]s stay valid for the lifetime of the tree.
#[derive(Debug)]
pub struct MemoryTree {
	nodes: Vec<MemoryNode>,
	focused: Option<NodeId>,
	counts: MutationCounts,
}

impl Default for MemoryTree {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryTree {
	/// Creates a tree with a detached `body` element as its root.
	#[must_use]
	pub fn new() -> Self {
		let mut tree = Self {
			nodes: Vec::new(),
			focused: None,
			counts: MutationCounts::default(),
		};
		tree.push(Data::Element {
			tag: "body".to_owned(),
			namespace: None,
			attributes: Vec::new(),
			properties: HashMap::new(),
		});
		tree
	}

	#[must_use]
	pub fn body(&self) -> NodeId {
		NodeId(0)
	}

	fn push(&mut self, data: Data) -> NodeId {
		self.nodes.push(MemoryNode {
			data,
			parent: None,
			children: Vec::new(),
			record: None,
		});
		NodeId(self.nodes.len() - 1)
	}

	fn node(&self, node: NodeId) -> &MemoryNode {
		&self.nodes[node.0]
	}

	fn node_mut(&mut self, node: NodeId) -> &mut MemoryNode {
		&mut self.nodes[node.0]
	}

	/// Appends an element without counting it as mutation. The `key` is stored as `key` attribute.
	pub fn append_element(&mut self, parent: NodeId, tag: &str, key: Option<&str>) -> NodeId {
		let element = self.push(Data::Element {
			tag: tag.to_owned(),
			namespace: None,
			attributes: key.map(|key| ("key".to_owned(), key.to_owned())).into_iter().collect(),
			properties: HashMap::new(),
		});
		self.attach(parent, element, None);
		element
	}

	/// Appends a text node without counting it as mutation.
	pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
		let node = self.push(Data::Text(text.to_owned()));
		self.attach(parent, node, None);
		node
	}

	/// Gives input focus to `node`.
	pub fn focus(&mut self, node: NodeId) {
		self.focused = Some(node);
	}

	pub fn blur(&mut self) {
		self.focused = None;
	}

	#[must_use]
	pub fn counts(&self) -> MutationCounts {
		self.counts
	}

	/// Returns the counts so far and starts over from zero.
	pub fn take_counts(&mut self) -> MutationCounts {
		core::mem::take(&mut self.counts)
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.node(node).parent
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> &[NodeId] {
		&self.node(node).children
	}

	/// The tag of an element, or [`None`] for text.
	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<&str> {
		match &self.node(node).data {
			Data::Element { tag, .. } => Some(tag.as_str()),
			Data::Text(_) => None,
		}
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<&str> {
		match &self.node(node).data {
			Data::Text(text) => Some(text.as_str()),
			Data::Element { .. } => None,
		}
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
		match &self.node(node).data {
			Data::Element { attributes, .. } => attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str()),
			Data::Text(_) => None,
		}
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<&Value<Object>> {
		match &self.node(node).data {
			Data::Element { properties, .. } => properties.get(name),
			Data::Text(_) => None,
		}
	}

	/// Whether `ancestor` is `node` or contains it.
	#[must_use]
	pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
		let mut current = Some(node);
		while let Some(node) = current {
			if node == ancestor {
				return true;
			}
			current = self.parent(node);
		}
		false
	}

	/// Serializes the children of `node` as HTML-like markup.
	///
	/// Attributes are written in the order they were first set. Nothing is escaped.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		for &child in self.children(node) {
			self.write_html(child, &mut html);
		}
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.write_html(node, &mut html);
		html
	}

	fn write_html(&self, node: NodeId, html: &mut String) {
		match &self.node(node).data {
			Data::Text(text) => html.push_str(text),
			Data::Element { tag, attributes, .. } => {
				html.push('<');
				html.push_str(tag);
				for (name, value) in attributes {
					html.push(' ');
					html.push_str(name);
					html.push_str("=\"");
					html.push_str(value);
					html.push('"');
				}
				html.push('>');
				for &child in self.children(node) {
					self.write_html(child, html);
				}
				html.push_str("</");
				html.push_str(tag);
				html.push('>');
			}
		}
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.node_mut(node).parent.take() {
			self.node_mut(parent).children.retain(|&child| child != node);
			if let Some(focused) = self.focused {
				if self.contains(node, focused) {
					self.focused = None;
					self.counts.focus_losses += 1;
				}
			}
		}
	}

	fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) {
		self.detach(child);
		let children = &mut self.node_mut(parent).children;
		let index = reference
			.and_then(|reference| children.iter().position(|&c| c == reference))
			.unwrap_or(children.len());
		children.insert(index, child);
		self.node_mut(child).parent = Some(parent);
	}

	fn element_mut(&mut self, node: NodeId) -> Option<(&mut Vec<(String, String)>, &mut HashMap<String, Value<Object>>)> {
		match &mut self.node_mut(node).data {
			Data::Element { attributes, properties, .. } => Some((attributes, properties)),
			Data::Text(_) => None,
		}
	}
}

impl Host for MemoryTree {
	type Node = NodeId;
	type Property = Object;

	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Self::Node {
		self.counts.nodes_created += 1;
		self.push(Data::Element {
			tag: tag.to_owned(),
			namespace: namespace.map(ToOwned::to_owned),
			attributes: Vec::new(),
			properties: HashMap::new(),
		})
	}

	fn create_text(&mut self) -> Self::Node {
		self.counts.nodes_created += 1;
		self.push(Data::Text(String::new()))
	}

	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) {
		self.counts.insertions += 1;
		self.attach(*parent, *child, reference.copied());
	}

	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) {
		self.counts.replacements += 1;
		let reference = {
			let siblings = self.children(*parent);
			siblings
				.iter()
				.position(|child| child == old_child)
				.and_then(|index| siblings[index + 1..].iter().find(|&child| child != new_child).copied())
		};
		self.detach(*old_child);
		self.detach(*new_child);
		self.attach(*parent, *new_child, reference);
	}

	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) {
		debug_assert_eq!(self.parent(*child), Some(*parent));
		self.counts.removals += 1;
		self.detach(*child);
	}

	fn set_text(&mut self, node: &Self::Node, text: &str) {
		self.counts.text_writes += 1;
		if let Data::Text(data) = &mut self.node_mut(*node).data {
			text.clone_into(data);
		}
	}

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) {
		self.counts.attribute_writes += 1;
		if let Some((attributes, _)) = self.element_mut(*node) {
			match attributes.iter_mut().find(|(n, _)| n == name) {
				Some((_, existing)) => value.clone_into(existing),
				None => attributes.push((name.to_owned(), value.to_owned())),
			}
		}
	}

	fn remove_attribute(&mut self, node: &Self::Node, name: &str) {
		self.counts.attribute_removals += 1;
		if let Some((attributes, _)) = self.element_mut(*node) {
			attributes.retain(|(n, _)| n != name);
		}
	}

	fn set_property(&mut self, node: &Self::Node, name: &str, value: Option<&Value<Self::Property>>) {
		self.counts.property_writes += 1;
		if let Some((_, properties)) = self.element_mut(*node) {
			match value {
				Some(value) => {
					properties.insert(name.to_owned(), value.clone());
				}
				None => {
					properties.remove(name);
				}
			}
		}
	}

	/// Inline styles are kept as `style` attribute. Object styles are declaration lists of type `Vec<(String, String)>`.
	fn set_style(&mut self, node: &Self::Node, style: Option<&Value<Self::Property>>) {
		self.counts.style_writes += 1;
		let text = match style {
			None => String::new(),
			Some(Value::Object(object)) => object
				.downcast_ref::<Vec<(String, String)>>()
				.map(|declarations| {
					declarations
						.iter()
						.map(|(name, value)| format!("{}: {};", name, value))
						.collect::<Vec<_>>()
						.join(" ")
				})
				.unwrap_or_default(),
			Some(primitive) => primitive.to_attribute_string().unwrap_or_default().into_owned(),
		};

		if let Some((attributes, _)) = self.element_mut(*node) {
			match attributes.iter().position(|(n, _)| n == "style") {
				Some(index) if text.is_empty() => {
					attributes.remove(index);
				}
				Some(index) => attributes[index].1 = text,
				None if text.is_empty() => (),
				None => attributes.push(("style".to_owned(), text)),
			}
		}
	}

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node> {
		self.parent(*node)
	}

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
		self.children(*node).first().copied()
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		let siblings = self.children(self.parent(*node)?);
		let index = siblings.iter().position(|sibling| sibling == node)?;
		siblings.get(index + 1).copied()
	}

	fn node_name(&self, node: &Self::Node) -> String {
		self.tag(*node).unwrap_or(TEXT).to_owned()
	}

	fn key_attribute(&self, node: &Self::Node) -> Option<String> {
		self.attribute(*node, "key").map(ToOwned::to_owned)
	}

	fn namespace(&self, node: &Self::Node) -> Option<String> {
		match &self.node(*node).data {
			Data::Element { namespace, .. } => namespace.clone(),
			Data::Text(_) => None,
		}
	}

	fn focused(&self) -> Option<Self::Node> {
		self.focused
	}

	fn record(&self, node: &Self::Node) -> Option<RecordKey> {
		self.node(*node).record
	}

	fn set_record(&mut self, node: &Self::Node, record: Option<RecordKey>) {
		self.node_mut(*node).record = record;
	}
}
