//! A [`Host`] backed by the browser DOM through [`web_sys`].

use crate::{
	attributes::{number_text, Value},
	record::RecordKey,
	Host, TEXT,
};
use js_sys::{Array, Object, Reflect};
use slotmap::{Key, KeyData};
use tracing::{error, instrument, warn};
use wasm_bindgen::{throw_val, JsCast, JsValue, UnwrapThrowExt};
use web_sys::{CssStyleDeclaration, Document, Element, Node};

/// Name of the expando property that holds a node's [`RecordKey`].
const RECORD_PROPERTY: &str = "__xylemRecord";

/// Patches DOM nodes owned by `document`.
///
/// Non-primitive attribute values are arbitrary [`JsValue`]s.
#[derive(Debug, Clone)]
pub struct WebHost {
	document: Document,
}

impl WebHost {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self { document }
	}

	/// Uses the document of the current window.
	///
	/// # Panics
	///
	/// Throws into JavaScript if there is no window or document.
	#[must_use]
	pub fn from_window() -> Self {
		let document = web_sys::window()
			.expect_throw("xylem-dom: No `window` found.")
			.document()
			.expect_throw("xylem-dom: No `document` found.");
		Self::new(document)
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

fn to_js(value: Option<&Value<JsValue>>) -> JsValue {
	match value {
		None => JsValue::UNDEFINED,
		Some(Value::String(string)) => JsValue::from_str(string),
		Some(Value::Number(number)) => JsValue::from_f64(*number),
		Some(Value::Bool(bool)) => JsValue::from_bool(*bool),
		Some(Value::Object(object)) => object.clone(),
	}
}

impl Host for WebHost {
	type Node = Node;
	type Property = JsValue;

	#[instrument]
	fn create_element(&mut self, tag: &str, namespace: Option<&str>) -> Self::Node {
		let element = match namespace {
			Some(namespace) => self.document.create_element_ns(Some(namespace), tag),
			None => self.document.create_element(tag),
		};
		match element {
			Ok(element) => element.into(),
			Err(error) => {
				error!("Failed to create element: {:?}", error);
				throw_val(error)
			}
		}
	}

	fn create_text(&mut self) -> Self::Node {
		self.document.create_text_node("").into()
	}

	fn insert_before(&mut self, parent: &Self::Node, child: &Self::Node, reference: Option<&Self::Node>) {
		if let Err(error) = parent.insert_before(child, reference) {
			error!("Failed to insert node: {:?}", error);
		}
	}

	fn replace_child(&mut self, parent: &Self::Node, new_child: &Self::Node, old_child: &Self::Node) {
		if let Err(error) = parent.replace_child(new_child, old_child) {
			error!("Failed to replace node: {:?}", error);
		}
	}

	fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) {
		if let Err(error) = parent.remove_child(child) {
			error!("Failed to remove node: {:?}", error);
		}
	}

	fn set_text(&mut self, node: &Self::Node, text: &str) {
		node.set_node_value(Some(text));
	}

	fn set_attribute(&mut self, node: &Self::Node, name: &str, value: &str) {
		let element = node.unchecked_ref::<Element>();
		if let Err(error) = element.set_attribute(name, value) {
			error!("Failed to set attribute {:?}: {:?}", name, error);
		}
	}

	fn remove_attribute(&mut self, node: &Self::Node, name: &str) {
		let element = node.unchecked_ref::<Element>();
		if let Err(error) = element.remove_attribute(name) {
			error!("Failed to remove attribute {:?}: {:?}", name, error);
		}
	}

	fn set_property(&mut self, node: &Self::Node, name: &str, value: Option<&Value<Self::Property>>) {
		if let Err(error) = Reflect::set(node, &JsValue::from_str(name), &to_js(value)) {
			error!("Failed to set property {:?}: {:?}", name, error);
		}
	}

	/// Object styles are plain JavaScript objects. Names starting with `-` go through `setProperty`,
	/// all others are assigned to the declaration directly.
	fn set_style(&mut self, node: &Self::Node, style: Option<&Value<Self::Property>>) {
		let declaration = match Reflect::get(node, &JsValue::from_str("style")) {
			Ok(declaration) if declaration.is_object() => declaration.unchecked_into::<CssStyleDeclaration>(),
			_ => {
				warn!("Node has no inline style");
				return;
			}
		};

		match style {
			None => declaration.set_css_text(""),
			Some(Value::Object(object)) => {
				declaration.set_css_text("");
				for entry in Object::entries(object.unchecked_ref()).iter() {
					let entry = entry.unchecked_into::<Array>();
					let (name, value) = match entry.get(0).as_string() {
						Some(name) => (name, entry.get(1)),
						None => continue,
					};
					let result = if name.starts_with('-') {
						let value = value.as_string().or_else(|| value.as_f64().map(|number| number_text(number).into_owned()));
						declaration.set_property(&name, &value.unwrap_or_default())
					} else {
						Reflect::set(&declaration, &JsValue::from_str(&name), &value).map(drop)
					};
					if let Err(error) = result {
						error!("Failed to set style {:?}: {:?}", name, error);
					}
				}
			}
			Some(primitive) => declaration.set_css_text(&primitive.to_attribute_string().unwrap_or_default()),
		}
	}

	fn parent_node(&self, node: &Self::Node) -> Option<Self::Node> {
		node.parent_node()
	}

	fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
		node.first_child()
	}

	fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
		node.next_sibling()
	}

	fn node_name(&self, node: &Self::Node) -> String {
		match node.dyn_ref::<Element>() {
			Some(element) => element.local_name(),
			None if node.node_type() == Node::TEXT_NODE => TEXT.to_owned(),
			None => node.node_name().to_lowercase(),
		}
	}

	fn key_attribute(&self, node: &Self::Node) -> Option<String> {
		node.dyn_ref::<Element>()?.get_attribute("key")
	}

	fn namespace(&self, node: &Self::Node) -> Option<String> {
		let namespace = node.dyn_ref::<Element>()?.namespace_uri()?;
		// HTML elements are created without an explicit namespace.
		(namespace != "http://www.w3.org/1999/xhtml").then(|| namespace)
	}

	fn focused(&self) -> Option<Self::Node> {
		self.document.active_element().map(Into::into)
	}

	fn record(&self, node: &Self::Node) -> Option<RecordKey> {
		let value = Reflect::get(node, &JsValue::from_str(RECORD_PROPERTY)).ok()?;
		let ffi = value.as_string()?.parse().ok()?;
		Some(KeyData::from_ffi(ffi).into())
	}

	fn set_record(&mut self, node: &Self::Node, record: Option<RecordKey>) {
		let value = match record {
			Some(record) => JsValue::from_str(&record.data().as_ffi().to_string()),
			None => JsValue::UNDEFINED,
		};
		Reflect::set(node, &JsValue::from_str(RECORD_PROPERTY), &value).unwrap_throw();
	}
}
