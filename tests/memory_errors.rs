use xylem_dom::{Config, Error, MemoryTree, Reconciler};

use memory_setup_::{listen, setup, setup_with};

fn failing<F>(description: F) -> (Error, Reconciler<MemoryTree>)
where
	F: FnOnce(&mut Reconciler<MemoryTree>) -> Result<(), Error>,
{
	let (mut reconciler, body) = setup();
	let error = reconciler.patch_inner(&body, description).unwrap_err();
	assert!(!reconciler.in_patch());
	(error, reconciler)
}

#[test]
fn not_in_patch() {
	let (mut reconciler, _) = setup();
	assert_eq!(reconciler.text("a"), Err(Error::NotInPatch { operation: "text" }));
	assert_eq!(reconciler.element_close("div"), Err(Error::NotInPatch { operation: "element_close" }));
	assert_eq!(reconciler.attr("a", "b"), Err(Error::NotInPatch { operation: "attr" }));
	assert_eq!(reconciler.skip(), Err(Error::NotInPatch { operation: "skip" }));
	assert_eq!(reconciler.record_count(), 0);
}

#[test]
fn in_attributes() {
	let (error, _) = failing(|r| {
		r.element_open_start("input", None, &[])?;
		r.text("a")?;
		Ok(())
	});
	assert_eq!(
		error,
		Error::InAttributes {
			operation: "text",
			tag: "input".to_owned()
		}
	);
}

#[test]
fn not_in_attributes() {
	let (error, _) = failing(|r| r.attr("a", "b"));
	assert_eq!(error, Error::NotInAttributes { operation: "attr" });

	let (error, _) = failing(|r| r.element_open_end().map(drop));
	assert_eq!(error, Error::NotInAttributes { operation: "element_open_end" });
}

#[test]
fn attributes_not_closed() {
	let (error, _) = failing(|r| r.element_open_start("input", None, &[]));
	assert_eq!(error, Error::AttributesNotClosed { tag: "input".to_owned() });
}

#[test]
fn keyed_kind_mismatch() {
	let (mut reconciler, body) = setup();
	reconciler
		.patch_inner(&body, |r| r.element_void("li", Some("a"), &[], &[]).map(drop))
		.unwrap();

	let error = reconciler
		.patch_inner(&body, |r| r.element_void("div", Some("a"), &[], &[]).map(drop))
		.unwrap_err();
	assert_eq!(
		error,
		Error::KeyedKindMismatch {
			key: "a".to_owned(),
			expected: "div".to_owned(),
			found: "li".to_owned(),
		}
	);
	assert_eq!(reconciler.host().inner_html(body), "<li></li>");
}

#[test]
fn keyed_kind_change_without_diagnostics() {
	let (mut reconciler, body) = setup_with(Config { diagnostics: false });
	reconciler
		.patch_inner(&body, |r| {
			r.element_open("li", Some("a"), &[], &[])?;
			r.text("item")?;
			r.element_close("li")?;
			Ok(())
		})
		.unwrap();
	let li = reconciler.host().children(body)[0];
	let (created, deleted) = listen(&mut reconciler);

	reconciler
		.patch_inner(&body, |r| r.element_void("div", Some("a"), &[], &[]).map(drop))
		.unwrap();

	assert_eq!(reconciler.host().inner_html(body), "<div></div>");
	assert_eq!(created.borrow()[0][0].kind, "div");
	assert_eq!(deleted.borrow()[0].len(), 1);
	assert_eq!(deleted.borrow()[0][0].node, li);
	// `body` and the `div`.
	assert_eq!(reconciler.record_count(), 2);
}

#[test]
fn duplicate_key() {
	let (error, _) = failing(|r| {
		r.element_void("li", Some("a"), &[], &[])?;
		r.element_void("li", Some("a"), &[], &[])?;
		Ok(())
	});
	assert_eq!(
		error,
		Error::DuplicateKey {
			key: "a".to_owned(),
			parent: "body".to_owned()
		}
	);
}

#[test]
fn same_key_on_other_levels() {
	let (mut reconciler, body) = setup();
	reconciler
		.patch_inner(&body, |r| {
			r.element_open("ul", Some("a"), &[], &[])?;
			r.element_void("li", Some("a"), &[], &[])?;
			r.element_close("ul")?;
			r.element_void("p", Some("b"), &[], &[])?;
			Ok(())
		})
		.unwrap();
}

#[test]
fn mismatched_close() {
	let (error, _) = failing(|r| {
		r.element_open("div", None, &[], &[])?;
		r.element_close("span")?;
		Ok(())
	});
	assert_eq!(
		error,
		Error::MismatchedClose {
			expected: "div".to_owned(),
			found: "span".to_owned()
		}
	);
}

#[test]
fn unmatched_close() {
	let (error, _) = failing(|r| r.element_close("div").map(drop));
	assert_eq!(error, Error::UnmatchedClose { found: "div".to_owned() });

	let (mut reconciler, body) = setup_with(Config { diagnostics: false });
	let error = reconciler.patch_inner(&body, |r| r.element_close("div").map(drop)).unwrap_err();
	assert_eq!(error, Error::UnmatchedClose { found: "div".to_owned() });
}

#[test]
fn unclosed_tags() {
	let (error, _) = failing(|r| {
		r.element_open("div", None, &[], &[])?;
		r.element_open("span", None, &[], &[])?;
		Ok(())
	});
	assert_eq!(
		error,
		Error::UnclosedTags {
			tags: vec!["div".to_owned(), "span".to_owned()]
		}
	);
	assert_eq!(error.to_string(), "one or more tags were not closed: div, span");
}

#[test]
fn skip_after_children() {
	let (error, _) = failing(|r| {
		r.element_open("div", None, &[], &[])?;
		r.text("a")?;
		r.skip()?;
		r.element_close("div")?;
		Ok(())
	});
	assert_eq!(error, Error::SkipAfterChildren { parent: "div".to_owned() });
}

#[test]
fn after_skip() {
	let (error, _) = failing(|r| {
		r.element_open("div", None, &[], &[])?;
		r.skip()?;
		r.text("a")?;
		r.element_close("div")?;
		Ok(())
	});
	assert_eq!(
		error,
		Error::AfterSkip {
			operation: "text",
			parent: "div".to_owned()
		}
	);
}

#[test]
fn caller_errors_pass_through() {
	let (error, _) = failing(|_| Err(Error::OuterPatchShape));
	assert_eq!(error, Error::OuterPatchShape);
}

#[test]
fn recovers_after_error() {
	let (mut reconciler, body) = setup();
	let error = reconciler
		.patch_inner(&body, |r| {
			r.element_open("div", None, &[], &[])?;
			r.text("partial")?;
			Ok(())
		})
		.unwrap_err();
	assert!(matches!(error, Error::UnclosedTags { .. }));
	assert!(!reconciler.in_patch());

	reconciler
		.patch_inner(&body, |r| {
			r.element_open("div", None, &[], &[])?;
			r.text("complete")?;
			r.element_close("div")?;
			Ok(())
		})
		.unwrap();
	assert_eq!(reconciler.host().inner_html(body), "<div>complete</div>");
}
