use xylem_dom::{memory::NodeId, Error, MemoryTree, Reconciler};

use memory_setup_::{listen, setup};

fn list(r: &mut Reconciler<MemoryTree>, keys: &[&str]) -> Result<(), Error> {
	for &key in keys {
		r.element_open("li", Some(key), &[], &[])?;
		r.text(key)?;
		r.element_close("li")?;
	}
	Ok(())
}

fn keyed_children(reconciler: &Reconciler<MemoryTree>, body: NodeId) -> Vec<String> {
	let host = reconciler.host();
	host.children(body)
		.iter()
		.map(|&child| host.text(host.children(child)[0]).unwrap().to_owned())
		.collect()
}

#[test]
fn reorder() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| list(r, &["a", "b", "c"])).unwrap();
	let before = reconciler.host().children(body).to_vec();
	reconciler.host_mut().take_counts();
	let (created, deleted) = listen(&mut reconciler);

	reconciler.patch_inner(&body, |r| list(r, &["c", "a", "b"])).unwrap();

	assert_eq!(keyed_children(&reconciler, body), ["c", "a", "b"]);
	assert_eq!(reconciler.host().children(body), [before[2], before[0], before[1]]);

	let counts = reconciler.host().counts();
	assert_eq!(counts.nodes_created, 0);
	assert_eq!(counts.removals, 0);
	assert_eq!(counts.replacements + counts.insertions, 3);
	assert_eq!(counts.text_writes, 0);
	assert!(created.borrow().is_empty());
	assert!(deleted.borrow().is_empty());
}

#[test]
fn removal() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| list(r, &["a", "b", "c"])).unwrap();
	let before = reconciler.host().children(body).to_vec();
	let records = reconciler.record_count();
	let (_, deleted) = listen(&mut reconciler);

	reconciler.patch_inner(&body, |r| list(r, &["a", "c"])).unwrap();

	assert_eq!(keyed_children(&reconciler, body), ["a", "c"]);
	assert_eq!(reconciler.host().children(body), [before[0], before[2]]);
	assert_eq!(reconciler.host().parent(before[1]), None);

	let deleted = deleted.borrow();
	assert_eq!(deleted.len(), 1);
	assert_eq!(deleted[0].len(), 1);
	assert_eq!(deleted[0][0].node, before[1]);
	assert_eq!(deleted[0][0].parent, body);

	// The `li` and its text node.
	assert_eq!(reconciler.record_count(), records - 2);
}

#[test]
fn prepend_and_append() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| list(r, &["b", "c"])).unwrap();
	let before = reconciler.host().children(body).to_vec();
	reconciler.host_mut().take_counts();
	let (created, _) = listen(&mut reconciler);

	reconciler.patch_inner(&body, |r| list(r, &["a", "b", "c", "d"])).unwrap();

	let host = reconciler.host();
	assert_eq!(keyed_children(&reconciler, body), ["a", "b", "c", "d"]);
	assert_eq!(&host.children(body)[1..3], &before[..]);
	assert_eq!(host.counts().nodes_created, 4);
	assert_eq!(host.counts().removals, 0);

	let created = created.borrow();
	assert_eq!(created.len(), 1);
	let keys: Vec<_> = created[0].iter().filter_map(|created| created.key.as_deref()).collect();
	assert_eq!(keys, ["a", "d"]);
}

#[test]
fn swap_back_and_forth() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| list(r, &["a", "b", "c", "d"])).unwrap();
	let before = reconciler.host().children(body).to_vec();
	let records = reconciler.record_count();

	reconciler.patch_inner(&body, |r| list(r, &["d", "b", "c", "a"])).unwrap();
	assert_eq!(keyed_children(&reconciler, body), ["d", "b", "c", "a"]);

	reconciler.patch_inner(&body, |r| list(r, &["a", "b", "c", "d"])).unwrap();
	assert_eq!(reconciler.host().children(body), before);
	assert_eq!(reconciler.record_count(), records);
}

#[test]
fn unkeyed_siblings_are_not_matched_by_key() {
	let (mut reconciler, body) = setup();
	reconciler
		.patch_inner(&body, |r| {
			r.element_void("li", None, &[], &[])?;
			r.element_void("li", Some("x"), &[], &[])?;
			Ok(())
		})
		.unwrap();
	let before = reconciler.host().children(body).to_vec();

	reconciler
		.patch_inner(&body, |r| {
			r.element_void("li", Some("x"), &[], &[])?;
			Ok(())
		})
		.unwrap();

	assert_eq!(reconciler.host().children(body), [before[1]]);
}

#[test]
fn empty_key_is_unkeyed() {
	let (mut reconciler, body) = setup();
	reconciler
		.patch_inner(&body, |r| {
			r.element_void("li", Some(""), &[], &[])?;
			r.element_void("li", Some(""), &[], &[])?;
			Ok(())
		})
		.unwrap();
	let before = reconciler.host().children(body).to_vec();
	assert_eq!(before.len(), 2);

	reconciler
		.patch_inner(&body, |r| {
			r.element_void("li", None, &[], &[])?;
			r.element_void("li", None, &[], &[])?;
			Ok(())
		})
		.unwrap();
	assert_eq!(reconciler.host().children(body), before);
}

#[test]
fn imported_keyed_nodes() {
	let (mut reconciler, body) = setup();
	let host = reconciler.host_mut();
	let a = host.append_element(body, "li", Some("a"));
	let b = host.append_element(body, "li", Some("b"));
	host.take_counts();

	reconciler
		.patch_inner(&body, |r| {
			r.element_void("li", Some("b"), &[], &[])?;
			r.element_void("li", Some("a"), &[], &[])?;
			Ok(())
		})
		.unwrap();

	let host = reconciler.host();
	assert_eq!(host.children(body), [b, a]);
	assert_eq!(host.counts().nodes_created, 0);
	assert_eq!(host.counts().removals, 0);
}

#[test]
fn same_key_in_different_parents() {
	let (mut reconciler, body) = setup();
	let description = |r: &mut Reconciler<MemoryTree>| -> Result<(), Error> {
		for outer in ["x", "y"] {
			r.element_open("ul", Some(outer), &[], &[])?;
			r.element_void("li", Some("a"), &[], &[])?;
			r.element_close("ul")?;
		}
		Ok(())
	};
	reconciler.patch_inner(&body, description).unwrap();
	reconciler.host_mut().take_counts();

	reconciler.patch_inner(&body, description).unwrap();
	assert_eq!(reconciler.host().counts().structural(), 0);
	assert_eq!(reconciler.host().inner_html(body), "<ul><li></li></ul><ul><li></li></ul>");
}
