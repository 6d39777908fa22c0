//! The [`Reconciler`], its entry points and the instructions descriptions are made of.

use crate::{
	attributes::{Mutators, Value},
	context::{Context, Created, Deleted, Notifications, OpenStart},
	error::{report, Error},
	record::{RecordKey, Records},
	temp_map::TempAttributeMap,
	walk::Walk,
	Host, TEXT,
};
use core::mem;
use hashbrown::HashSet;
use tracing::{debug, instrument, level_filters::STATIC_MAX_LEVEL, trace, trace_span, warn, Level};

/// Reconciler settings that are fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
	/// Whether structural caller errors are detected and reported as [`Error`]s.
	///
	/// Defaults to `cfg!(debug_assertions)`. Without it, malformed descriptions lead to unspecified (but memory-safe) tree shapes.
	pub diagnostics: bool,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			diagnostics: cfg!(debug_assertions),
		}
	}
}

/// What became of the node passed to [`Reconciler::patch_outer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outer<N> {
	/// The node was reused and is still in place.
	Updated(N),
	/// The node was removed and this one declared in its place.
	Replaced(N),
	/// Nothing was declared, so the node was removed.
	Removed,
}

impl<N> Outer<N> {
	/// The node now in place, if any.
	#[must_use]
	pub fn node(&self) -> Option<&N> {
		match self {
			Outer::Updated(node) | Outer::Replaced(node) => Some(node),
			Outer::Removed => None,
		}
	}
}

/// Aligns subtrees of a [`Host`] tree with repeatable descriptions, mutating only what changed.
///
/// A description is a closure that calls instructions like [`Reconciler::element_open`], [`Reconciler::text`]
/// and [`Reconciler::element_close`] on the reconciler it's given, in document order.
///
/// # Correct Use
///
/// Only one [`Reconciler`] should manage a given tree, and the managed subtrees must not be restructured
/// by other means between passes. Instructions must be well-nested.
///
/// With [`Config::diagnostics`] enabled, violations of the latter are reported as [`Error`].
#[derive(Debug)]
pub struct Reconciler<H: Host> {
	pub(crate) host: H,
	pub(crate) records: Records<H::Node, H::Property>,
	pub(crate) mutators: Mutators<H>,
	pub(crate) pending_attributes: TempAttributeMap<H::Property>,
	notifications: Notifications<H::Node>,
	pub(crate) config: Config,
	pub(crate) context: Option<Context<H::Node, H::Property>>,
	/// Records of deleted nodes, released once no pass is running anymore.
	pending_free: Vec<RecordKey>,
}

impl<H: Host> Reconciler<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self::with_config(host, Config::default())
	}

	#[must_use]
	pub fn with_config(host: H, config: Config) -> Self {
		Self {
			host,
			records: Records::new(),
			mutators: Mutators::default(),
			pending_attributes: TempAttributeMap::new(),
			notifications: Notifications::new(),
			config,
			context: None,
			pending_free: Vec::new(),
		}
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	/// Gives access to the host tree in between instructions.
	///
	/// Managed subtrees must not be restructured through this.
	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	/// Releases the host. Record slots on its nodes become meaningless.
	pub fn into_host(self) -> H {
		self.host
	}

	#[must_use]
	pub fn config(&self) -> Config {
		self.config
	}

	#[must_use]
	pub fn mutators(&self) -> &Mutators<H> {
		&self.mutators
	}

	pub fn mutators_mut(&mut self) -> &mut Mutators<H> {
		&mut self.mutators
	}

	pub fn notifications_mut(&mut self) -> &mut Notifications<H::Node> {
		&mut self.notifications
	}

	/// How many host nodes are currently tracked.
	#[must_use]
	pub fn record_count(&self) -> usize {
		self.records.len()
	}

	/// Whether a pass is currently running.
	#[must_use]
	pub fn in_patch(&self) -> bool {
		self.context.is_some()
	}

	/// Aligns the children of `container` with `description`. `container` itself is never replaced.
	///
	/// May be called from within a description, including on the tree that's currently being patched.
	///
	/// # Errors
	///
	/// Errors returned by `description` are passed through.
	/// Additionally, [`Error::UnclosedTags`] and [`Error::AttributesNotClosed`] are detected if [`Config::diagnostics`] is enabled.
	///
	/// The outer pass (if any) is restored and notifications about the work done so far are sent in either case.
	#[instrument(skip(self, description))]
	pub fn patch_inner<F>(&mut self, container: &H::Node, description: F) -> Result<H::Node, Error>
	where
		F: FnOnce(&mut Self) -> Result<(), Error>,
	{
		let root = self.ensure_record(container);
		self.load_children(root);

		self.run_pass(root, root, None, |this| {
			description(this)?;
			this.finish_description()?;

			let walk = this.walk("patch_inner")?;
			this.clear_unvisited(walk.current_parent, walk.current_node);
			Ok(this.records[root].node.clone())
		})
	}

	/// An alias for [`Reconciler::patch_inner`].
	///
	/// # Errors
	///
	/// See [`Reconciler::patch_inner`].
	pub fn patch<F>(&mut self, container: &H::Node, description: F) -> Result<H::Node, Error>
	where
		F: FnOnce(&mut Self) -> Result<(), Error>,
	{
		self.patch_inner(container, description)
	}

	/// Aligns `node` itself with `description`, which should declare exactly one top level node.
	///
	/// Siblings of `node` are left alone.
	///
	/// # Errors
	///
	/// [`Error::NoParent`] if `node` isn't attached to a parent.
	///
	/// Errors returned by `description` are passed through.
	/// Additionally, [`Error::OuterPatchShape`], [`Error::UnclosedTags`] and [`Error::AttributesNotClosed`]
	/// are detected if [`Config::diagnostics`] is enabled.
	#[instrument(skip(self, description))]
	pub fn patch_outer<F>(&mut self, node: &H::Node, description: F) -> Result<Outer<H::Node>, Error>
	where
		F: FnOnce(&mut Self) -> Result<(), Error>,
	{
		let parent_node = self.host.parent_node(node).ok_or_else(|| report(Error::NoParent))?;
		let parent = self.ensure_record(&parent_node);
		self.load_children(parent);
		let target = self.ensure_record(node);

		let start = self.records[target].previous_sibling;
		let expected_next = self.records[target].next_sibling;

		self.run_pass(parent, target, start, |this| {
			description(this)?;
			this.finish_description()?;

			let declared = this.walk("patch_outer")?.current_node.filter(|&current| Some(current) != start);
			if this.config.diagnostics {
				if let Some(declared) = declared {
					let record = &this.records[declared];
					let in_place = record.previous_sibling == start
						&& (record.next_sibling == expected_next || record.next_sibling == Some(target));
					if !in_place {
						return Err(report(Error::OuterPatchShape));
					}
				}
			}

			Ok(match declared {
				None => {
					debug!("Nothing declared, removing node");
					this.remove_child(parent, target);
					Outer::Removed
				}
				Some(declared) if declared == target => Outer::Updated(this.records[target].node.clone()),
				Some(declared) => {
					debug!("Replacing node");
					this.remove_child(parent, target);
					Outer::Replaced(this.records[declared].node.clone())
				}
			})
		})
	}

	/// Runs `body` in a fresh context positioned after `current_node` among the children of `parent`,
	/// then restores the enclosing one.
	fn run_pass<T>(
		&mut self,
		parent: RecordKey,
		focus_root: RecordKey,
		current_node: Option<RecordKey>,
		body: impl FnOnce(&mut Self) -> Result<T, Error>,
	) -> Result<T, Error> {
		let context = Context::new(
			Walk::new(parent, current_node),
			self.records[parent].namespace.clone(),
			self.notifications.wants_created(),
			self.config.diagnostics,
		);
		let outer = self.context.replace(context);
		if outer.is_some() {
			trace!("Entering nested pass");
		}

		let focused = self.mark_focus_path(focus_root);
		let result = body(self);
		self.unmark_focus_path(focused);

		if let Some(context) = mem::replace(&mut self.context, outer) {
			self.flush(context);
		}
		result
	}

	/// Checks the context's state at the end of a description.
	fn finish_description(&self) -> Result<(), Error> {
		let context = self.context.as_ref().ok_or(Error::NotInPatch { operation: "finish_description" })?;
		if !self.config.diagnostics {
			return Ok(());
		}

		if let Some(open) = &context.open {
			return Err(report(Error::AttributesNotClosed { tag: open.tag.clone() }));
		}
		if context.depth > 0 {
			let mut tags = Vec::with_capacity(context.depth);
			let mut parent = Some(context.walk.current_parent);
			for _ in 0..context.depth {
				let record = match parent.and_then(|parent| self.records.get(parent)) {
					Some(record) => record,
					None => break,
				};
				tags.push(record.kind.clone());
				parent = record.parent;
			}
			tags.reverse();
			return Err(report(Error::UnclosedTags { tags }));
		}
		Ok(())
	}

	/// Sends notifications for `context`'s pass and frees the records of nodes that stayed deleted.
	///
	/// Freeing waits until the outermost pass is done.
	fn flush(&mut self, context: Context<H::Node, H::Property>) {
		let span = trace_span!("flush");
		let _enter = span.enter();

		let (created, deleted) = context.into_changes();

		if let Some(created) = created {
			let created: Vec<_> = created
				.into_iter()
				.filter_map(|(record, parent)| {
					self.records.get(record).map(|record| Created {
						node: record.node.clone(),
						parent,
						kind: record.kind.clone(),
						key: record.key.clone(),
					})
				})
				.collect();
			trace!(count = created.len(), "Nodes created");
			self.notifications.nodes_created(&created);
		}

		let mut seen = HashSet::new();
		let (deleted_records, deleted): (Vec<_>, Vec<_>) = deleted
			.into_iter()
			.filter(|&(record, _)| seen.insert(record) && self.records.get(record).map_or(false, |record| record.parent.is_none()))
			.map(|(record, parent)| {
				(
					record,
					Deleted {
						node: self.records[record].node.clone(),
						parent,
					},
				)
			})
			.unzip();
		trace!(count = deleted.len(), "Nodes deleted");
		self.notifications.nodes_deleted(&deleted);

		if STATIC_MAX_LEVEL >= Level::WARN && self.pending_attributes.capacity() >= 100 {
			warn!(
				"The attribute diff heap capacity is large ({}).\n\
				This may point to elements with very many dynamic attributes.",
				self.pending_attributes.capacity()
			);
		}

		// The enclosing pass may still hold keys of these records in its walk.
		self.pending_free.extend(deleted_records);
		if self.context.is_some() {
			trace!(pending = self.pending_free.len(), "Deferring record release to the outermost pass");
			return;
		}

		let mut freed = 0_usize;
		for record in mem::take(&mut self.pending_free) {
			if !self.records.get(record).map_or(false, |record| record.parent.is_none()) {
				continue;
			}
			for node in self.records.free_subtree(record) {
				if self.host.record(&node).is_some() {
					self.host.set_record(&node, None);
				}
				freed += 1;
			}
		}
		trace!(freed, remaining = self.records.len(), "Freed records");
	}

	fn walk(&self, operation: &'static str) -> Result<Walk, Error> {
		self.context
			.as_ref()
			.map(|context| context.walk)
			.ok_or_else(|| report(Error::NotInPatch { operation }))
	}

	/// Checks that a node may be declared now.
	fn check_declare(&self, operation: &'static str) -> Result<(), Error> {
		let context = self.context.as_ref().ok_or_else(|| report(Error::NotInPatch { operation }))?;
		if self.config.diagnostics {
			if let Some(open) = &context.open {
				return Err(report(Error::InAttributes {
					operation,
					tag: open.tag.clone(),
				}));
			}
			if context.in_skip {
				return Err(report(Error::AfterSkip {
					operation,
					parent: self.records[context.walk.current_parent].kind.clone(),
				}));
			}
		}
		Ok(())
	}

	/// Checks that the tree may be inspected now.
	fn check_inspect(&self, operation: &'static str) -> Result<Walk, Error> {
		let context = self.context.as_ref().ok_or_else(|| report(Error::NotInPatch { operation }))?;
		if self.config.diagnostics {
			if let Some(open) = &context.open {
				return Err(report(Error::InAttributes {
					operation,
					tag: open.tag.clone(),
				}));
			}
		}
		Ok(context.walk)
	}

	fn open<S: AsRef<str>>(
		&mut self,
		operation: &'static str,
		tag: &str,
		key: Option<&str>,
		statics: &[(S, Value<H::Property>)],
		attributes: &[(S, Value<H::Property>)],
	) -> Result<H::Node, Error> {
		let key = key.filter(|key| !key.is_empty());
		let record = self.align(operation, tag, key, statics)?;
		self.update_attributes(record, attributes);
		self.load_children(record);

		let namespace = self.records[record].namespace.clone();
		if let Some(context) = &mut self.context {
			context.enter(record, namespace);
		}
		Ok(self.records[record].node.clone())
	}

	/// Declares an element and descends into it, so that its children are declared next.
	///
	/// `statics` are only applied if the element is created. `attributes` are diffed against those of the previous pass.
	/// An empty `key` is the same as none.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]:
	/// [`Error::InAttributes`], [`Error::AfterSkip`], [`Error::DuplicateKey`] and [`Error::KeyedKindMismatch`].
	pub fn element_open(
		&mut self,
		tag: &str,
		key: Option<&str>,
		statics: &[(&str, Value<H::Property>)],
		attributes: &[(&str, Value<H::Property>)],
	) -> Result<H::Node, Error> {
		self.check_declare("element_open")?;
		self.open("element_open", tag, key, statics, attributes)
	}

	/// Starts declaring an element whose attributes are then added one by one through [`Reconciler::attr`].
	///
	/// # Errors
	///
	/// Like [`Reconciler::element_open`]. Alignment happens in [`Reconciler::element_open_end`].
	pub fn element_open_start(&mut self, tag: &str, key: Option<&str>, statics: &[(&str, Value<H::Property>)]) -> Result<(), Error> {
		self.check_declare("element_open_start")?;
		if let Some(context) = &mut self.context {
			context.open = Some(OpenStart {
				tag: tag.to_owned(),
				key: key.map(ToOwned::to_owned),
				statics: statics.iter().map(|(name, value)| ((*name).to_owned(), value.clone())).collect(),
				attributes: Vec::new(),
			});
		}
		Ok(())
	}

	/// Adds an attribute to the element started with [`Reconciler::element_open_start`].
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`] or [`Error::NotInAttributes`].
	pub fn attr(&mut self, name: &str, value: impl Into<Value<H::Property>>) -> Result<(), Error> {
		let context = self.context.as_mut().ok_or_else(|| report(Error::NotInPatch { operation: "attr" }))?;
		match &mut context.open {
			Some(open) => {
				open.attributes.push((name.to_owned(), value.into()));
				Ok(())
			}
			None => Err(report(Error::NotInAttributes { operation: "attr" })),
		}
	}

	/// Finishes the declaration started with [`Reconciler::element_open_start`] and descends into the element.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`] or [`Error::NotInAttributes`], and otherwise like [`Reconciler::element_open`].
	pub fn element_open_end(&mut self) -> Result<H::Node, Error> {
		let context = self.context.as_mut().ok_or_else(|| report(Error::NotInPatch { operation: "element_open_end" }))?;
		let open = context
			.open
			.take()
			.ok_or_else(|| report(Error::NotInAttributes { operation: "element_open_end" }))?;
		self.open("element_open_end", &open.tag, open.key.as_deref(), &open.statics, &open.attributes)
	}

	/// Declares an element without children.
	///
	/// # Errors
	///
	/// Like [`Reconciler::element_open`] and [`Reconciler::element_close`].
	pub fn element_void(
		&mut self,
		tag: &str,
		key: Option<&str>,
		statics: &[(&str, Value<H::Property>)],
		attributes: &[(&str, Value<H::Property>)],
	) -> Result<H::Node, Error> {
		self.element_open(tag, key, statics, attributes)?;
		self.element_close(tag)
	}

	/// Closes the element opened last, removing any of its children that weren't declared in this pass.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`] or [`Error::UnmatchedClose`], and with [`Config::diagnostics`]:
	/// [`Error::InAttributes`] and [`Error::MismatchedClose`].
	pub fn element_close(&mut self, tag: &str) -> Result<H::Node, Error> {
		let diagnostics = self.config.diagnostics;
		let context = self.context.as_ref().ok_or_else(|| report(Error::NotInPatch { operation: "element_close" }))?;
		if diagnostics {
			if let Some(open) = &context.open {
				return Err(report(Error::InAttributes {
					operation: "element_close",
					tag: open.tag.clone(),
				}));
			}
		}
		if context.depth == 0 {
			return Err(report(Error::UnmatchedClose { found: tag.to_owned() }));
		}

		let Walk {
			current_node,
			current_parent: parent,
		} = context.walk;
		if diagnostics && self.records[parent].kind != tag {
			return Err(report(Error::MismatchedClose {
				expected: self.records[parent].kind.clone(),
				found: tag.to_owned(),
			}));
		}

		// After `skip`, the cursor is on the last child already.
		self.clear_unvisited(parent, current_node);
		if let Some(context) = &mut self.context {
			context.exit();
		}
		Ok(self.records[parent].node.clone())
	}

	/// Declares a text node with the given content, which is only written if it changed.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]: [`Error::InAttributes`] and [`Error::AfterSkip`].
	pub fn text(&mut self, value: &str) -> Result<H::Node, Error> {
		self.check_declare("text")?;
		let record = self.align::<&str>("text", TEXT, None, &[])?;

		let record = &mut self.records[record];
		if record.text.as_deref() != Some(value) {
			trace!(value = ?crate::logging::content(&value), "Writing text");
			self.host.set_text(&record.node, value);
			record.text = Some(value.to_owned());
		}
		Ok(record.node.clone())
	}

	/// Leaves the remaining children of the current element as they are.
	///
	/// Must be called before any child is declared, and may only be followed by [`Reconciler::element_close`].
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]: [`Error::InAttributes`] and [`Error::SkipAfterChildren`].
	pub fn skip(&mut self) -> Result<(), Error> {
		let diagnostics = self.config.diagnostics;
		let context = self.context.as_mut().ok_or_else(|| report(Error::NotInPatch { operation: "skip" }))?;
		let parent = context.walk.current_parent;
		if diagnostics {
			if let Some(open) = &context.open {
				return Err(report(Error::InAttributes {
					operation: "skip",
					tag: open.tag.clone(),
				}));
			}
			if context.walk.current_node.is_some() {
				return Err(report(Error::SkipAfterChildren {
					parent: self.records[parent].kind.clone(),
				}));
			}
		}

		context.in_skip = true;
		context.walk.current_node = self.records[parent].last_child;
		Ok(())
	}

	/// Moves past the next existing node without touching it.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]: [`Error::InAttributes`] and [`Error::AfterSkip`].
	pub fn skip_node(&mut self) -> Result<(), Error> {
		self.check_declare("skip_node")?;
		if let Some(context) = &mut self.context {
			context.walk.advance(&self.records);
		}
		Ok(())
	}

	/// The element whose children are currently being declared.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]: [`Error::InAttributes`].
	pub fn current_element(&self) -> Result<H::Node, Error> {
		let walk = self.check_inspect("current_element")?;
		Ok(self.records[walk.current_parent].node.clone())
	}

	/// The existing node the next instruction will be aligned with, if any.
	///
	/// # Errors
	///
	/// [`Error::NotInPatch`], and with [`Config::diagnostics`]: [`Error::InAttributes`].
	pub fn current_pointer(&self) -> Result<Option<H::Node>, Error> {
		let walk = self.check_inspect("current_pointer")?;
		Ok(walk.peek(&self.records).map(|next| self.records[next].node.clone()))
	}
}
