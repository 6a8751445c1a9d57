use xylem::{Element, Props, Scope, Unbounded, Value, WorkStatus};

mod mock_host_;
use mock_host_::{renderer, Mutation};

fn list(items: &[&str]) -> Element {
	let mut list = Element::host("list");
	for item in items {
		list = list.child(Element::host("item").child_text(*item));
	}
	list
}

#[test]
fn identical_rerender_is_a_host_no_op() {
	let (host, _container, mut renderer) = renderer();

	renderer.mount(list(&["a", "b", "c"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	host.borrow_mut().take_mutations();

	renderer.mount(list(&["a", "b", "c"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	assert_eq!(host.borrow_mut().take_mutations(), Vec::new());
}

#[test]
fn kind_stable_update_keeps_the_host_node() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(Element::host("badge").prop("label", "old").prop("tone", "calm"));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	let badge = host.borrow().children(container)[0];
	host.borrow_mut().take_mutations();

	renderer.mount(Element::host("badge").prop("label", "new"));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	// Same handle, patched in place: one property set, one removed, and no
	// node was created, attached or detached.
	assert_eq!(host.borrow().children(container), vec![badge]);
	let mutations = host.borrow_mut().take_mutations();
	assert!(mutations.contains(&Mutation::SetProperty { node: badge, name: "label".to_owned() }));
	assert!(mutations.contains(&Mutation::RemoveProperty { node: badge, name: "tone".to_owned() }));
	assert_eq!(mutations.len(), 2);
	assert_eq!(host.borrow().dump(container), r#"#container(badge{label="new"})"#);
}

#[test]
fn kind_change_replaces_the_subtree() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(Element::host("row").child(Element::host("old").child_text("x")));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	let row = host.borrow().children(container)[0];
	let old = host.borrow().children(row)[0];
	host.borrow_mut().take_mutations();

	renderer.mount(Element::host("row").child(Element::host("new").child_text("x")));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	let mutations = host.borrow_mut().take_mutations();
	let removals = mutations
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::Remove { .. }))
		.collect::<Vec<_>>();
	assert_eq!(removals, vec![&Mutation::Remove { parent: row, child: old }]);
	// Exactly one replacement subtree was built and attached to the row.
	let attached = mutations
		.iter()
		.filter_map(|mutation| match mutation {
			Mutation::Append { parent, .. } => Some(*parent),
			_ => None,
		})
		.collect::<Vec<_>>();
	assert!(attached.contains(&row));
	assert_eq!(host.borrow().dump(container), r#"#container(row(new("x")))"#);
	assert_ne!(host.borrow().children(row), vec![old]);
}

#[test]
fn shrinking_child_list_deletes_exactly_the_tail() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(list(&["a", "b", "c", "d"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	host.borrow_mut().take_mutations();

	renderer.mount(list(&["a"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	let mutations = host.borrow_mut().take_mutations();
	let removals = mutations
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::Remove { .. }))
		.count();
	assert_eq!(removals, 3);
	assert!(!mutations.iter().any(|mutation| matches!(mutation, Mutation::Create { .. })));
	assert_eq!(host.borrow().dump(container), r#"#container(list(item("a")))"#);
}

#[test]
fn growing_child_list_only_appends() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(list(&["a"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	host.borrow_mut().take_mutations();

	renderer.mount(list(&["a", "b"]));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	let mutations = host.borrow_mut().take_mutations();
	assert!(!mutations.iter().any(|mutation| matches!(mutation, Mutation::Remove { .. })));
	assert_eq!(host.borrow().dump(container), r#"#container(list(item("a") item("b")))"#);
}

#[test]
fn reorder_is_observed_as_replace() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(Element::host("row").child(Element::host("p")).child(Element::host("q")));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	host.borrow_mut().take_mutations();

	// No identity tracking: swapping kinds at both positions rebuilds both.
	renderer.mount(Element::host("row").child(Element::host("q")).child(Element::host("p")));
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	let mutations = host.borrow_mut().take_mutations();
	let removals = mutations
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::Remove { .. }))
		.count();
	let creations = mutations
		.iter()
		.filter(|mutation| matches!(mutation, Mutation::Create { .. }))
		.count();
	assert_eq!((removals, creations), (2, 2));
	assert_eq!(host.borrow().dump(container), "#container(row(q p))");
}

fn count_label(_scope: &mut Scope, props: &Props) -> Element {
	let count = match props.get("count") {
		Some(Value::Int(count)) => *count,
		_ => 0,
	};
	Element::text(count.to_string())
}

#[test]
fn component_prop_change_patches_text_in_place() {
	let (host, container, mut renderer) = renderer();

	renderer.mount(
		Element::host("box")
			.child_text("A")
			.child(Element::component(count_label).prop("count", 1)),
	);
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));
	let outer = host.borrow().children(container)[0];
	let label = host.borrow().children(outer)[1];
	host.borrow_mut().take_mutations();

	renderer.mount(
		Element::host("box")
			.child_text("A")
			.child(Element::component(count_label).prop("count", 2)),
	);
	assert_eq!(renderer.run(&Unbounded), Ok(WorkStatus::Idle));

	// The box and the first text node are untouched; only the component's
	// text content is patched, with zero insertions and zero deletions.
	let mutations = host.borrow_mut().take_mutations();
	assert_eq!(mutations, vec![Mutation::SetProperty { node: label, name: "text".to_owned() }]);
	assert_eq!(host.borrow().dump(container), r#"#container(box("A" "2"))"#);
}
