use xylem_dom::{Error, MemoryTree, Reconciler};

use memory_setup_::{listen, setup};

fn card(r: &mut Reconciler<MemoryTree>, skip: bool) -> Result<(), Error> {
	r.element_open("section", None, &[], &[])?;
	if skip {
		r.skip()?;
	} else {
		r.element_void("h1", None, &[], &[])?;
		r.text("body")?;
	}
	r.element_close("section")?;
	r.text("footer")?;
	Ok(())
}

#[test]
fn skip_keeps_children() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| card(r, false)).unwrap();
	reconciler.host_mut().take_counts();
	let (_, deleted) = listen(&mut reconciler);

	reconciler.patch_inner(&body, |r| card(r, true)).unwrap();

	assert_eq!(reconciler.host().inner_html(body), "<section><h1></h1>body</section>footer");
	assert_eq!(reconciler.host().counts().structural(), 0);
	assert!(deleted.borrow().is_empty());
}

#[test]
fn skip_at_top_level() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| card(r, false)).unwrap();
	reconciler.host_mut().take_counts();

	reconciler.patch_inner(&body, |r| r.skip()).unwrap();

	assert_eq!(reconciler.host().inner_html(body), "<section><h1></h1>body</section>footer");
	assert_eq!(reconciler.host().counts(), Default::default());
}

#[test]
fn skip_node_leaves_foreign_node_alone() {
	let (mut reconciler, body) = setup();
	let widget = reconciler.host_mut().append_element(body, "canvas", None);
	reconciler.host_mut().take_counts();

	let description = |r: &mut Reconciler<MemoryTree>| -> Result<(), Error> {
		r.skip_node()?;
		r.text("caption")?;
		Ok(())
	};
	reconciler.patch_inner(&body, description).unwrap();
	reconciler.patch_inner(&body, description).unwrap();

	let host = reconciler.host();
	assert_eq!(host.children(body)[0], widget);
	assert_eq!(host.inner_html(body), "<canvas></canvas>caption");
	assert_eq!(host.counts().nodes_created, 1);
	assert_eq!(host.counts().removals, 0);
}

#[test]
fn pointer_and_element() {
	let (mut reconciler, body) = setup();
	reconciler.patch_inner(&body, |r| card(r, false)).unwrap();
	let section = reconciler.host().children(body)[0];
	let footer = reconciler.host().children(body)[1];
	let h1 = reconciler.host().children(section)[0];

	reconciler
		.patch_inner(&body, |r| {
			assert_eq!(r.current_element()?, body);
			assert_eq!(r.current_pointer()?, Some(section));

			r.element_open("section", None, &[], &[])?;
			assert_eq!(r.current_element()?, section);
			assert_eq!(r.current_pointer()?, Some(h1));
			r.skip()?;
			assert_eq!(r.current_pointer()?, None);
			r.element_close("section")?;

			assert_eq!(r.current_element()?, body);
			assert_eq!(r.current_pointer()?, Some(footer));
			r.text("footer")?;
			assert_eq!(r.current_pointer()?, None);
			Ok(())
		})
		.unwrap();
}

#[test]
fn pointer_outside_of_patch() {
	let (reconciler, _) = setup();
	assert_eq!(reconciler.current_pointer(), Err(Error::NotInPatch { operation: "current_pointer" }));
	assert_eq!(reconciler.current_element(), Err(Error::NotInPatch { operation: "current_element" }));
}
