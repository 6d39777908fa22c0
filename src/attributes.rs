//! Attribute values, the [`Mutators`] table and the attribute differ.

use crate::{
	logging::content,
	record::{NodeRecord, RecordKey},
	Host, Reconciler,
};
use core::{fmt, ptr};
use hashbrown::HashMap;
use std::{borrow::Cow, rc::Rc};
use tracing::{trace, trace_span};

/// A declared attribute value.
///
/// Absent values are represented as [`None`] wherever a value is optional, and clear the attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<P> {
	String(String),
	Number(f64),
	Bool(bool),
	/// A non-primitive value, which is assigned as property by default.
	Object(P),
}

impl<P> Value<P> {
	#[must_use]
	pub fn is_primitive(&self) -> bool {
		!matches!(self, Value::Object(_))
	}

	/// The text this value has as attribute, or [`None`] for [`Value::Object`].
	///
	/// Numbers are formatted like JavaScript formats them, so `1e21` becomes `"1e+21"` and `-0` becomes `"0"`.
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<Cow<'_, str>> {
		Some(match self {
			Value::String(string) => Cow::Borrowed(string.as_str()),
			Value::Number(number) => number_text(*number),
			Value::Bool(true) => Cow::Borrowed("true"),
			Value::Bool(false) => Cow::Borrowed("false"),
			Value::Object(_) => return None,
		})
	}
}

/// Formats `number` like JavaScript's `Number.prototype.toString()`.
pub(crate) fn number_text(number: f64) -> Cow<'static, str> {
	if number.is_nan() {
		return Cow::Borrowed("NaN");
	} else if number.is_infinite() {
		return Cow::Borrowed(if number > 0.0 { "Infinity" } else { "-Infinity" });
	} else if number == 0.0 {
		return Cow::Borrowed("0");
	}

	// Shortest round-trip digits, with the decimal point after `point` of them.
	let scientific = format!("{:e}", number.abs());
	let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
	let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
	let point = exponent.parse::<i32>().unwrap_or(0) + 1;

	let mut text = String::with_capacity(digits.len() + 8);
	if number < 0.0 {
		text.push('-');
	}
	match usize::try_from(point) {
		Ok(point @ 1..=21) if digits.len() <= point => {
			text.push_str(&digits);
			text.extend(core::iter::repeat('0').take(point - digits.len()));
		}
		Ok(point @ 1..=21) => {
			text.push_str(&digits[..point]);
			text.push('.');
			text.push_str(&digits[point..]);
		}
		_ if (-5..=0).contains(&point) => {
			text.push_str("0.");
			text.extend(core::iter::repeat('0').take(usize::try_from(-point).unwrap_or(0)));
			text.push_str(&digits);
		}
		_ => {
			text.push_str(&digits[..1]);
			if digits.len() > 1 {
				text.push('.');
				text.push_str(&digits[1..]);
			}
			text.push('e');
			text.push(if point > 0 { '+' } else { '-' });
			text.push_str(&(point - 1).unsigned_abs().to_string());
		}
	}
	Cow::Owned(text)
}

impl<P> From<&str> for Value<P> {
	fn from(string: &str) -> Self {
		Value::String(string.to_owned())
	}
}

impl<P> From<String> for Value<P> {
	fn from(string: String) -> Self {
		Value::String(string)
	}
}

impl<P> From<f64> for Value<P> {
	fn from(number: f64) -> Self {
		Value::Number(number)
	}
}

impl<P> From<i32> for Value<P> {
	fn from(number: i32) -> Self {
		Value::Number(number.into())
	}
}

impl<P> From<u32> for Value<P> {
	fn from(number: u32) -> Self {
		Value::Number(number.into())
	}
}

impl<P> From<bool> for Value<P> {
	fn from(bool: bool) -> Self {
		Value::Bool(bool)
	}
}

/// Applies one attribute change to a node.
pub type Mutator<H> = Rc<dyn Fn(&mut H, &<H as Host>::Node, &str, Option<&Value<<H as Host>::Property>>)>;

/// Decides how attribute changes are written to the host tree.
///
/// Lookup order is: mutator registered for the attribute's name, then the catch-all mutator, then [`apply_typed`].
///
/// The table may be changed freely between patches through [`Reconciler::mutators_mut`], but is only read during one.
pub struct Mutators<H: Host> {
	by_name: HashMap<String, Mutator<H>>,
	catch_all: Option<Mutator<H>>,
}

impl<H: Host> Mutators<H> {
	/// An empty table, so that every attribute goes through [`apply_typed`].
	#[must_use]
	pub fn new() -> Self {
		Self {
			by_name: HashMap::new(),
			catch_all: None,
		}
	}

	/// Like [`Mutators::new`], but HTML attributes that only behave correctly as properties are always assigned as such,
	/// and `style` goes through [`apply_style`].
	#[must_use]
	pub fn html() -> Self {
		let mut mutators = Self::new();
		mutators.set("style", apply_style::<H>);
		for name in [
			"checked", "className", "controls", "id", "loop", "multiple", "muted", "readOnly", "selected", "srcDoc", "value",
		] {
			mutators.set(name, apply_property::<H>);
		}
		mutators
	}

	/// Registers a mutator for attributes named `name`, returning the one it replaces.
	pub fn set(
		&mut self,
		name: impl Into<String>,
		mutator: impl 'static + Fn(&mut H, &H::Node, &str, Option<&Value<H::Property>>),
	) -> Option<Mutator<H>> {
		self.by_name.insert(name.into(), Rc::new(mutator))
	}

	pub fn remove(&mut self, name: &str) -> Option<Mutator<H>> {
		self.by_name.remove(name)
	}

	/// Sets the mutator used for attributes without a specific one.
	pub fn set_catch_all(&mut self, mutator: impl 'static + Fn(&mut H, &H::Node, &str, Option<&Value<H::Property>>)) -> Option<Mutator<H>> {
		self.catch_all.replace(Rc::new(mutator))
	}

	pub fn clear_catch_all(&mut self) -> Option<Mutator<H>> {
		self.catch_all.take()
	}

	/// The mutator that would handle `name`, if it isn't handled by [`apply_typed`].
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&Mutator<H>> {
		self.by_name.get(name).or(self.catch_all.as_ref())
	}

	pub fn apply(&self, host: &mut H, node: &H::Node, name: &str, value: Option<&Value<H::Property>>) {
		match self.get(name) {
			Some(mutator) => mutator(host, node, name, value),
			None => apply_typed(host, node, name, value),
		}
	}
}

impl<H: Host> Default for Mutators<H> {
	fn default() -> Self {
		Self::html()
	}
}

impl<H: Host> Clone for Mutators<H> {
	fn clone(&self) -> Self {
		Self {
			by_name: self.by_name.clone(),
			catch_all: self.catch_all.clone(),
		}
	}
}

impl<H: Host> fmt::Debug for Mutators<H> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Mutators")
			.field("by_name", &self.by_name.keys().collect::<Vec<_>>())
			.field("catch_all", &self.catch_all.is_some())
			.finish()
	}
}

/// Sets primitive values as attribute and removes the attribute for absent ones.
///
/// [`Value::Object`] has no attribute text, so it is assigned as property instead.
pub fn apply_attribute<H: Host>(host: &mut H, node: &H::Node, name: &str, value: Option<&Value<H::Property>>) {
	match value.map(|value| (value, value.to_attribute_string())) {
		None => host.remove_attribute(node, name),
		Some((_, Some(text))) => host.set_attribute(node, name, &text),
		Some((object, None)) => host.set_property(node, name, Some(object)),
	}
}

pub fn apply_property<H: Host>(host: &mut H, node: &H::Node, name: &str, value: Option<&Value<H::Property>>) {
	host.set_property(node, name, value);
}

/// Routes the value to [`Host::set_style`], regardless of `name`.
pub fn apply_style<H: Host>(host: &mut H, node: &H::Node, _name: &str, value: Option<&Value<H::Property>>) {
	host.set_style(node, value);
}

/// The default rule: Non-primitive values are assigned as properties, everything else goes through [`apply_attribute`].
pub fn apply_typed<H: Host>(host: &mut H, node: &H::Node, name: &str, value: Option<&Value<H::Property>>) {
	match value {
		Some(Value::Object(_)) => apply_property(host, node, name, value),
		_ => apply_attribute(host, node, name, value),
	}
}

/// Applies one attribute if its value differs from the last one applied to `record`.
fn update_one<H: Host>(host: &mut H, mutators: &Mutators<H>, record: &mut NodeRecord<H::Node, H::Property>, name: &str, value: Option<&Value<H::Property>>) -> bool {
	if record.attributes.get(name) == value {
		return false;
	}

	trace!(name, value = ?value.map(|value| content(value)), "Applying attribute");
	mutators.apply(host, &record.node, name, value);
	match value {
		Some(value) => {
			record.attributes.insert(name.to_owned(), value.clone());
		}
		None => {
			record.attributes.remove(name);
		}
	}
	true
}

impl<H: Host> Reconciler<H> {
	pub(crate) fn update_attribute(&mut self, record: RecordKey, name: &str, value: Option<&Value<H::Property>>) -> bool {
		update_one(&mut self.host, &self.mutators, &mut self.records[record], name, value)
	}

	/// Aligns the dynamic attributes of an element with `attributes`.
	///
	/// Attributes that were declared in the previous pass but are now missing are cleared.
	/// Returns how many attributes were written.
	pub(crate) fn update_attributes<S: AsRef<str>>(&mut self, record: RecordKey, attributes: &[(S, Value<H::Property>)]) -> usize {
		let record = &mut self.records[record];
		{
			let previous = &record.dynamic_attributes;
			if previous.len() == attributes.len() && previous.iter().zip(attributes).all(|((n_1, v_1), (n_2, v_2))| n_1 == n_2.as_ref() && v_1 == v_2) {
				return 0;
			}
		}

		let span = trace_span!("Diffing attributes", incoming = attributes.len());
		let _enter = span.enter();

		let previous = std::mem::take(&mut record.dynamic_attributes);
		let pending = self.pending_attributes.temp();
		for (name, _) in &previous {
			pending.insert(name.as_str(), None);
		}
		for (name, value) in attributes {
			pending.insert(name.as_ref(), Some(value));
		}

		let mut applied = 0;
		for (name, value) in attributes {
			// Later duplicates win.
			if !matches!(pending.get(name.as_ref()), Some(Some(latest)) if ptr::eq(*latest, value)) {
				continue;
			}
			applied += usize::from(update_one(&mut self.host, &self.mutators, record, name.as_ref(), Some(value)));
		}
		for (name, _) in &previous {
			if matches!(pending.get(name.as_str()), Some(None)) {
				applied += usize::from(update_one(&mut self.host, &self.mutators, record, name, None));
			}
		}

		record.dynamic_attributes = attributes.iter().map(|(name, value)| (name.as_ref().to_owned(), value.clone())).collect();
		trace!(applied, "Diffed attributes");
		applied
	}
}
