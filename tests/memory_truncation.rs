use xylem_dom::{memory::MutationCounts, Error, MemoryTree, Reconciler};

use memory_setup_::{listen, setup};

fn texts(r: &mut Reconciler<MemoryTree>, count: usize) -> Result<(), Error> {
	for i in 0..count {
		r.text(&i.to_string())?;
	}
	Ok(())
}

#[test]
fn truncate() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| texts(r, 5)).unwrap();
	let before = reconciler.host().children(body).to_vec();
	reconciler.host_mut().take_counts();
	let (created, deleted) = listen(&mut reconciler);

	reconciler.patch_inner(&body, |r| texts(r, 2)).unwrap();

	let host = reconciler.host();
	assert_eq!(host.inner_html(body), "01");
	assert_eq!(host.children(body), &before[..2]);
	assert_eq!(
		host.counts(),
		MutationCounts {
			removals: 3,
			..MutationCounts::default()
		}
	);

	assert!(created.borrow().is_empty());
	let deleted = deleted.borrow();
	assert_eq!(deleted.len(), 1);
	let nodes: Vec<_> = deleted[0].iter().map(|deleted| deleted.node).collect();
	assert_eq!(nodes, [before[4], before[3], before[2]]);
	assert!(deleted[0].iter().all(|deleted| deleted.parent == body));

	assert_eq!(reconciler.record_count(), 3);
}

#[test]
fn grow_again() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| texts(r, 3)).unwrap();
	reconciler.patch_inner(&body, |r| texts(r, 1)).unwrap();
	reconciler.host_mut().take_counts();

	reconciler.patch_inner(&body, |r| texts(r, 3)).unwrap();

	let host = reconciler.host();
	assert_eq!(host.inner_html(body), "012");
	assert_eq!(host.counts().nodes_created, 2);
	assert_eq!(host.counts().insertions, 2);
}

#[test]
fn truncate_nested() {
	let (mut reconciler, body) = setup();
	let description = |count| {
		move |r: &mut Reconciler<MemoryTree>| -> Result<(), Error> {
			r.element_open("div", None, &[], &[])?;
			texts(r, count)?;
			r.element_close("div")?;
			r.text("after")?;
			Ok(())
		}
	};
	reconciler.patch_inner(&body, description(4)).unwrap();
	reconciler.host_mut().take_counts();

	reconciler.patch_inner(&body, description(1)).unwrap();

	let host = reconciler.host();
	assert_eq!(host.inner_html(body), "<div>0</div>after");
	assert_eq!(host.counts().removals, 3);
	assert_eq!(host.counts().structural(), 3);
}

#[test]
fn kind_change_replaces_unkeyed_node() {
	let (mut reconciler, body) = setup();
	reconciler
		.patch_inner(&body, |r| {
			r.element_void("p", None, &[], &[])?;
			r.text("tail")?;
			Ok(())
		})
		.unwrap();
	let (created, deleted) = listen(&mut reconciler);

	reconciler
		.patch_inner(&body, |r| {
			r.element_void("span", None, &[], &[])?;
			r.text("tail")?;
			Ok(())
		})
		.unwrap();

	assert_eq!(reconciler.host().inner_html(body), "<span></span>tail");
	assert_eq!(created.borrow()[0].len(), 2);
	assert_eq!(deleted.borrow()[0].len(), 2);
}
